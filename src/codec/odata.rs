//! OData value formatting.
//!
//! OData needs two distinct grammars: URI literal syntax for `$filter`
//! expressions and JSON conventions for write-request bodies. Both tables
//! key first on the explicit `Edm.*` remote-type hint and fall back to the
//! declared semantic type.

use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::Timelike;
use chrono::Utc;

use crate::error::QueryError;
use crate::model::DataType;
use crate::model::Value;

use super::to_plain_json;
use super::ValueCodec;

/// Codec implementing the OData literal grammars (v2 and v4 share it).
#[derive(Debug, Clone, Copy, Default)]
pub struct ODataCodec;

impl ValueCodec for ODataCodec {
    fn encode_literal(
        &self,
        value: &Value,
        data_type: DataType,
        remote_hint: Option<&str>,
    ) -> Result<String, QueryError> {
        if value.is_null() {
            return Ok("null".to_string());
        }
        match normalize_hint(remote_hint) {
            Some("guid") => Ok(format!("guid'{}'", guid_text(value)?)),
            Some("int64") => Ok(format!("{}L", integer_text(value)?)),
            Some("datetimeoffset") => Ok(format!(
                "datetimeoffset'{}'",
                datetime_utc(value)?.to_rfc3339()
            )),
            Some("datetime") => Ok(format!(
                "datetime'{}'",
                datetime_utc(value)?.format("%Y-%m-%dT%H:%M:%S")
            )),
            Some("time") => Ok(duration_literal(&time_of_day(value)?)),
            Some("binary") => Ok(format!("binary'{}'", value.as_text())),
            Some("boolean") => Ok(boolean_text(value)?),
            Some("single") => Ok(format!("{}f", number_text(value)?)),
            Some("double") => Ok(format!("{}d", number_text(value)?)),
            Some("string") => Ok(escape_string(&value.as_text())),
            _ => match data_type {
                DataType::Date | DataType::DateTime => Ok(format!(
                    "datetime'{}'",
                    datetime_utc(value)?.format("%Y-%m-%dT%H:%M:%S")
                )),
                DataType::Time => Ok(duration_literal(&time_of_day(value)?)),
                DataType::Guid => Ok(format!("guid'{}'", guid_text(value)?)),
                DataType::Binary => Ok(format!("binary'{}'", value.as_text())),
                DataType::Boolean => boolean_text(value),
                DataType::String => Ok(escape_string(&value.as_text())),
                // No hint, non-string type: numeric-looking values go bare,
                // everything else is quoted.
                DataType::Integer | DataType::Number => {
                    let text = value.as_text();
                    if looks_numeric(&text) {
                        Ok(text)
                    } else {
                        Ok(escape_string(&text))
                    }
                }
            },
        }
    }

    fn encode_body(
        &self,
        value: &Value,
        data_type: DataType,
        remote_hint: Option<&str>,
    ) -> Result<serde_json::Value, QueryError> {
        use serde_json::Value as Json;

        if value.is_null() {
            return Ok(Json::Null);
        }
        match normalize_hint(remote_hint) {
            Some("guid") => Ok(Json::String(guid_text(value)?)),
            Some("int64" | "byte" | "sbyte" | "decimal") => {
                Ok(Json::String(integer_or_number_text(value)?))
            }
            Some("datetimeoffset") => Ok(Json::String(format!(
                "datetimeoffset'{}'",
                datetime_utc(value)?.to_rfc3339()
            ))),
            Some("datetime") => Ok(Json::String(format!(
                "/Date({}000)/",
                datetime_utc(value)?.timestamp()
            ))),
            Some("time") => Ok(Json::String(duration_literal(&time_of_day(value)?))),
            Some("binary") => Ok(Json::String(value.as_text())),
            Some("boolean") => Ok(Json::Bool(boolean_text(value)? == "true")),
            Some("single") => Ok(Json::String(format!("{}f", number_text(value)?))),
            Some("double") => Ok(Json::String(format!("{}d", number_text(value)?))),
            Some("string") => Ok(Json::String(value.as_text())),
            _ => match data_type {
                DataType::Date | DataType::DateTime => Ok(Json::String(format!(
                    "/Date({}000)/",
                    datetime_utc(value)?.timestamp()
                ))),
                DataType::Time => Ok(Json::String(duration_literal(&time_of_day(value)?))),
                DataType::String => Ok(Json::String(value.as_text())),
                _ => Ok(to_plain_json(value)),
            },
        }
    }
}

/// Escapes a string for use in OData filter literals.
///
/// OData strings are enclosed in single quotes, with internal single quotes
/// doubled.
pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Decodes the OData `Edm.Time` duration representation.
///
/// Parses `PT<H>H<M>M<S>S` with every component optional; hours and minutes
/// default to `"00"`, seconds are omitted entirely when absent. Returns
/// `HH:MM` or `HH:MM:SS`, or `None` for input that is no duration at all.
pub fn decode_odata_time(raw: &str) -> Option<String> {
    let rest = raw.trim().strip_prefix("PT")?;
    let mut hours: Option<String> = None;
    let mut minutes: Option<String> = None;
    let mut seconds: Option<String> = None;
    let mut digits = String::new();
    for c in rest.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        if digits.is_empty() {
            return None;
        }
        match c {
            'H' => hours = Some(std::mem::take(&mut digits)),
            'M' => minutes = Some(std::mem::take(&mut digits)),
            'S' => seconds = Some(std::mem::take(&mut digits)),
            _ => return None,
        }
    }
    if !digits.is_empty() {
        return None;
    }
    let pad = |s: String| if s.len() < 2 { format!("{s:0>2}") } else { s };
    let hours = pad(hours.unwrap_or_else(|| "00".to_string()));
    let minutes = pad(minutes.unwrap_or_else(|| "00".to_string()));
    Some(match seconds {
        Some(s) => format!("{hours}:{minutes}:{}", pad(s)),
        None => format!("{hours}:{minutes}"),
    })
}

fn normalize_hint(hint: Option<&str>) -> Option<&str> {
    let hint = hint?.trim();
    let stripped = hint
        .strip_prefix("Edm.")
        .or_else(|| hint.strip_prefix("edm."))
        .unwrap_or(hint);
    match stripped {
        "Guid" | "guid" => Some("guid"),
        "Int64" | "int64" => Some("int64"),
        "DateTimeOffset" | "datetimeoffset" => Some("datetimeoffset"),
        "DateTime" | "datetime" => Some("datetime"),
        "Time" | "time" | "TimeOfDay" | "timeofday" => Some("time"),
        "Binary" | "binary" => Some("binary"),
        "Boolean" | "boolean" => Some("boolean"),
        "Single" | "single" => Some("single"),
        "Double" | "double" => Some("double"),
        "Byte" | "byte" => Some("byte"),
        "SByte" | "sbyte" => Some("sbyte"),
        "Decimal" | "decimal" => Some("decimal"),
        "String" | "string" => Some("string"),
        _ => None,
    }
}

fn cast_error(value: &Value, target: &str) -> QueryError {
    QueryError::value_encoding(
        value.as_text(),
        format!("cannot cast {} value to {target}", value.type_name()),
    )
}

fn guid_text(value: &Value) -> Result<String, QueryError> {
    match value {
        Value::Guid(g) => Ok(g.to_string()),
        Value::String(s) => uuid::Uuid::parse_str(s)
            .map(|g| g.to_string())
            .map_err(|_| cast_error(value, "Edm.Guid")),
        _ => Err(cast_error(value, "Edm.Guid")),
    }
}

fn integer_text(value: &Value) -> Result<String, QueryError> {
    match value {
        Value::Int(n) => Ok(n.to_string()),
        Value::Long(n) => Ok(n.to_string()),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(|n| n.to_string())
            .map_err(|_| cast_error(value, "integer")),
        _ => Err(cast_error(value, "integer")),
    }
}

fn integer_or_number_text(value: &Value) -> Result<String, QueryError> {
    match value {
        Value::Decimal(d) => Ok(d.to_string()),
        Value::Float(n) => Ok(n.to_string()),
        other => integer_text(other),
    }
}

fn number_text(value: &Value) -> Result<String, QueryError> {
    match value {
        Value::Int(n) => Ok(n.to_string()),
        Value::Long(n) => Ok(n.to_string()),
        Value::Float(n) => Ok(n.to_string()),
        Value::Decimal(d) => Ok(d.to_string()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(|n| n.to_string())
            .map_err(|_| cast_error(value, "number")),
        _ => Err(cast_error(value, "number")),
    }
}

fn boolean_text(value: &Value) -> Result<String, QueryError> {
    match value {
        Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        Value::Int(0) => Ok("false".to_string()),
        Value::Int(1) => Ok("true".to_string()),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok("true".to_string()),
            "false" | "0" => Ok("false".to_string()),
            _ => Err(cast_error(value, "Edm.Boolean")),
        },
        _ => Err(cast_error(value, "Edm.Boolean")),
    }
}

fn datetime_utc(value: &Value) -> Result<DateTime<Utc>, QueryError> {
    match value {
        Value::DateTime(dt) => Ok(*dt),
        Value::Date(d) => Ok(DateTime::from_naive_utc_and_offset(
            d.and_hms_opt(0, 0, 0).unwrap_or_default(),
            Utc,
        )),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
            if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                return Ok(DateTime::from_naive_utc_and_offset(
                    date.and_hms_opt(0, 0, 0).unwrap_or_default(),
                    Utc,
                ));
            }
            Err(cast_error(value, "datetime"))
        }
        _ => Err(cast_error(value, "datetime")),
    }
}

fn time_of_day(value: &Value) -> Result<NaiveTime, QueryError> {
    match value {
        Value::Time(t) => Ok(*t),
        Value::DateTime(dt) => Ok(dt.time()),
        Value::String(s) => {
            let s = s.trim();
            NaiveTime::parse_from_str(s, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                .map_err(|_| cast_error(value, "time"))
        }
        _ => Err(cast_error(value, "time")),
    }
}

fn duration_literal(time: &NaiveTime) -> String {
    format!(
        "PT{}H{}M{}S",
        time.hour(),
        time.minute(),
        time.second()
    )
}

fn looks_numeric(text: &str) -> bool {
    !text.is_empty() && text.parse::<f64>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn literal(value: &Value, data_type: DataType, hint: Option<&str>) -> String {
        ODataCodec
            .encode_literal(value, data_type, hint)
            .unwrap()
    }

    fn body(value: &Value, data_type: DataType, hint: Option<&str>) -> serde_json::Value {
        ODataCodec.encode_body(value, data_type, hint).unwrap()
    }

    #[test]
    fn test_url_literals_per_hint() {
        let guid = Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap();
        assert_eq!(
            literal(&Value::Guid(guid), DataType::Guid, Some("Edm.Guid")),
            "guid'11111111-2222-3333-4444-555555555555'"
        );
        assert_eq!(
            literal(&Value::Long(42), DataType::Integer, Some("Edm.Int64")),
            "42L"
        );
        assert_eq!(
            literal(&Value::Bool(true), DataType::Boolean, Some("Edm.Boolean")),
            "true"
        );
        assert_eq!(
            literal(&Value::Float(1.5), DataType::Number, Some("Edm.Single")),
            "1.5f"
        );
        assert_eq!(
            literal(&Value::Float(1.5), DataType::Number, Some("Edm.Double")),
            "1.5d"
        );
        assert_eq!(
            literal(&Value::from("O'Brien"), DataType::String, Some("Edm.String")),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_datetime_literals() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(
            literal(&Value::DateTime(dt), DataType::DateTime, Some("Edm.DateTime")),
            "datetime'2024-03-05T14:30:00'"
        );
        assert_eq!(
            literal(
                &Value::DateTime(dt),
                DataType::DateTime,
                Some("Edm.DateTimeOffset")
            ),
            "datetimeoffset'2024-03-05T14:30:00+00:00'"
        );
        // Declared type alone drives the fallback.
        assert_eq!(
            literal(&Value::DateTime(dt), DataType::DateTime, None),
            "datetime'2024-03-05T14:30:00'"
        );
    }

    #[test]
    fn test_time_literal_and_decode_roundtrip() {
        let t = NaiveTime::from_hms_opt(9, 5, 30).unwrap();
        assert_eq!(
            literal(&Value::Time(t), DataType::Time, Some("Edm.Time")),
            "PT9H5M30S"
        );
        assert_eq!(decode_odata_time("PT9H5M30S").unwrap(), "09:05:30");
    }

    #[test]
    fn test_time_decoding_defaults() {
        assert_eq!(decode_odata_time("PT14H").unwrap(), "14:00");
        assert_eq!(decode_odata_time("PT30M").unwrap(), "00:30");
        assert_eq!(decode_odata_time("PT5S").unwrap(), "00:00:05");
        assert_eq!(decode_odata_time("PT1H2M").unwrap(), "01:02");
        assert!(decode_odata_time("garbage").is_none());
        assert!(decode_odata_time("PT").unwrap() == "00:00");
    }

    #[test]
    fn test_fallback_without_hint() {
        assert_eq!(literal(&Value::Int(7), DataType::Integer, None), "7");
        assert_eq!(
            literal(&Value::from("7x"), DataType::Integer, None),
            "'7x'"
        );
        assert_eq!(
            literal(&Value::from("open"), DataType::String, None),
            "'open'"
        );
        assert_eq!(literal(&Value::Null, DataType::String, None), "null");
    }

    #[test]
    fn test_body_values_per_hint() {
        use serde_json::json;

        let guid = Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap();
        assert_eq!(
            body(&Value::Guid(guid), DataType::Guid, Some("Edm.Guid")),
            json!("11111111-2222-3333-4444-555555555555")
        );
        assert_eq!(
            body(&Value::Long(42), DataType::Integer, Some("Edm.Int64")),
            json!("42")
        );
        assert_eq!(
            body(&Value::Bool(true), DataType::Boolean, Some("Edm.Boolean")),
            json!(true)
        );

        let dt = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        assert_eq!(
            body(&Value::DateTime(dt), DataType::DateTime, Some("Edm.DateTime")),
            json!(format!("/Date({}000)/", dt.timestamp()))
        );
        assert_eq!(
            body(
                &Value::DateTime(dt),
                DataType::DateTime,
                Some("Edm.DateTimeOffset")
            ),
            json!("datetimeoffset'2024-03-05T14:30:00+00:00'")
        );
        assert_eq!(
            body(&Value::from("plain"), DataType::String, None),
            json!("plain")
        );
    }

    #[test]
    fn test_cast_failure_is_an_error() {
        let err = ODataCodec
            .encode_literal(&Value::from("not-a-guid"), DataType::String, Some("Edm.Guid"))
            .unwrap_err();
        assert!(matches!(err, QueryError::ValueEncoding { .. }));
    }

    #[test]
    fn test_string_roundtrip_through_literal() {
        // decode(encode(v)) == v for the string grammar.
        let encoded = literal(&Value::from("O'Brien"), DataType::String, None);
        let decoded = encoded
            .trim_matches('\'')
            .replace("''", "'");
        assert_eq!(decoded, "O'Brien");
    }
}
