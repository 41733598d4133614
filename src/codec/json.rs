//! Value codec for the generic JSON REST dialect.

use crate::error::QueryError;
use crate::model::DataType;
use crate::model::Value;

use super::to_plain_json;
use super::ValueCodec;

/// Codec for plain JSON REST services.
///
/// URL literals are the bare textual rendering (no quoting — the query
/// string is percent-encoded separately); body values are typed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ValueCodec for JsonCodec {
    fn encode_literal(
        &self,
        value: &Value,
        _data_type: DataType,
        _remote_hint: Option<&str>,
    ) -> Result<String, QueryError> {
        Ok(value.as_text())
    }

    fn encode_body(
        &self,
        value: &Value,
        _data_type: DataType,
        _remote_hint: Option<&str>,
    ) -> Result<serde_json::Value, QueryError> {
        Ok(to_plain_json(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_is_bare_text() {
        let codec = JsonCodec;
        assert_eq!(
            codec
                .encode_literal(&Value::from("open"), DataType::String, None)
                .unwrap(),
            "open"
        );
        assert_eq!(
            codec
                .encode_literal(&Value::from(42i32), DataType::Integer, None)
                .unwrap(),
            "42"
        );
    }

    #[test]
    fn test_body_is_typed_json() {
        let codec = JsonCodec;
        assert_eq!(
            codec
                .encode_body(&Value::from(true), DataType::Boolean, None)
                .unwrap(),
            json!(true)
        );
        assert_eq!(
            codec
                .encode_body(&Value::from(vec![1i32, 2]), DataType::Integer, None)
                .unwrap(),
            json!([1, 2])
        );
    }
}
