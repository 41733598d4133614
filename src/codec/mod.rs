//! Scalar value encoding/decoding per dialect.
//!
//! Each dialect owns a [`ValueCodec`]: one grammar for URL/filter literals
//! and a second, distinct grammar for JSON request-body values. The OData
//! codec implements the `Edm.*` literal syntax; the JSON codec emits plain
//! typed JSON.

mod json;
mod odata;

pub use json::JsonCodec;
pub use odata::decode_odata_time;
pub use odata::escape_string;
pub use odata::ODataCodec;

use crate::error::QueryError;
use crate::model::DataType;
use crate::model::Value;

/// Encodes scalar values for one dialect.
///
/// Both methods key first on the explicit remote-type hint (e.g.
/// `Edm.Guid`), falling back to the declared semantic type. A value that
/// cannot be cast to the hinted type is a [`QueryError::ValueEncoding`].
pub trait ValueCodec {
    /// Encodes a value as a URL/filter literal.
    fn encode_literal(
        &self,
        value: &Value,
        data_type: DataType,
        remote_hint: Option<&str>,
    ) -> Result<String, QueryError>;

    /// Encodes a value for a JSON request body.
    fn encode_body(
        &self,
        value: &Value,
        data_type: DataType,
        remote_hint: Option<&str>,
    ) -> Result<serde_json::Value, QueryError>;
}

/// Renders a value as its natural typed JSON form.
pub(crate) fn to_plain_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Long(n) => serde_json::Value::from(*n),
        Value::Float(n) => serde_json::Value::from(*n),
        Value::Decimal(d) => decimal_to_json(d),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Guid(g) => serde_json::Value::String(g.to_string()),
        Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
        Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => serde_json::Value::String(t.format("%H:%M:%S").to_string()),
        Value::Binary(b) => {
            use base64::Engine;
            serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
        }
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_plain_json).collect()),
    }
}

/// Decimals that fit a JSON number stay numeric; otherwise the exact string
/// representation is kept.
fn decimal_to_json(d: &rust_decimal::Decimal) -> serde_json::Value {
    match d.to_string().parse::<f64>() {
        Ok(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(d.to_string())),
        Err(_) => serde_json::Value::String(d.to_string()),
    }
}
