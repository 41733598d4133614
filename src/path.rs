//! Slash-delimited path navigation through nested JSON structures.
//!
//! Paths address values inside response bodies and insertion points inside
//! request bodies. Segments are separated by `/`. A segment is an object
//! key, an array index, or a conditional selector `name[key=value]` which
//! picks the first element of the array at `name` whose `key` member equals
//! `value` (string comparison on the rendered value).

use serde_json::Value;

/// One parsed path segment.
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
    Selector {
        name: &'a str,
        key: &'a str,
        value: &'a str,
    },
}

fn parse_segment(raw: &str) -> Segment<'_> {
    if let Some(open) = raw.find('[') {
        if raw.ends_with(']') {
            let inner = &raw[open + 1..raw.len() - 1];
            if let Some((key, value)) = inner.split_once('=') {
                return Segment::Selector {
                    name: &raw[..open],
                    key,
                    value,
                };
            }
        }
    }
    if let Ok(index) = raw.parse::<usize>() {
        return Segment::Index(index);
    }
    Segment::Key(raw)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn select<'a>(array: &'a Value, key: &str, expected: &str) -> Option<&'a Value> {
    array.as_array()?.iter().find(|element| {
        element
            .get(key)
            .map(|found| render(found) == expected)
            .unwrap_or(false)
    })
}

/// Navigates `path` through `value` and returns the addressed node.
///
/// An empty path returns the value itself. Returns `None` as soon as a
/// segment cannot be resolved.
pub fn extract<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for raw in path.split('/').filter(|s| !s.is_empty()) {
        current = match parse_segment(raw) {
            Segment::Key(key) => current.get(key)?,
            Segment::Index(index) => match current {
                Value::Array(items) => items.get(index)?,
                // Objects also accept numeric keys.
                Value::Object(map) => map.get(raw)?,
                _ => return None,
            },
            Segment::Selector { name, key, value } => {
                let array = if name.is_empty() {
                    current
                } else {
                    current.get(name)?
                };
                select(array, key, value)?
            }
        };
    }
    Some(current)
}

/// Inserts `new_value` at `path` inside `target`, creating intermediate
/// objects as needed.
///
/// Used to place CRUD values at an attribute's write address and to wrap
/// request bodies at a configured insertion path. Conditional selectors are
/// not meaningful on the write side and are treated as plain keys.
pub fn insert(target: &mut Value, path: &str, new_value: Value) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        *target = new_value;
        return;
    }
    let mut current = target;
    for segment in &segments[..segments.len() - 1] {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        current = current
            .as_object_mut()
            .expect("just ensured object")
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    if !current.is_object() {
        *current = Value::Object(serde_json::Map::new());
    }
    current
        .as_object_mut()
        .expect("just ensured object")
        .insert(segments[segments.len() - 1].to_string(), new_value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_key_path() {
        let body = json!({"d": {"results": [1, 2]}});
        assert_eq!(extract(&body, "d/results"), Some(&json!([1, 2])));
        assert_eq!(extract(&body, ""), Some(&body));
        assert_eq!(extract(&body, "d/missing"), None);
    }

    #[test]
    fn test_array_index_path() {
        let body = json!({"rows": ["a", "b", "c"]});
        assert_eq!(extract(&body, "rows/1"), Some(&json!("b")));
        assert_eq!(extract(&body, "rows/9"), None);
    }

    #[test]
    fn test_conditional_selector() {
        let body = json!({
            "sections": [
                {"id": "header", "items": [1]},
                {"id": "data", "items": [2, 3]}
            ]
        });
        assert_eq!(
            extract(&body, "sections[id=data]/items"),
            Some(&json!([2, 3]))
        );
        assert_eq!(extract(&body, "sections[id=absent]"), None);
    }

    #[test]
    fn test_selector_with_numeric_value() {
        let body = json!({"parts": [{"no": 1, "v": "x"}, {"no": 2, "v": "y"}]});
        assert_eq!(extract(&body, "parts[no=2]/v"), Some(&json!("y")));
    }

    #[test]
    fn test_insert_creates_intermediate_objects() {
        let mut body = json!({});
        insert(&mut body, "data/attributes/Name", json!("Contoso"));
        insert(&mut body, "data/attributes/Total", json!(5));
        assert_eq!(
            body,
            json!({"data": {"attributes": {"Name": "Contoso", "Total": 5}}})
        );
    }

    #[test]
    fn test_insert_with_empty_path_replaces() {
        let mut body = json!({"old": true});
        insert(&mut body, "", json!({"new": true}));
        assert_eq!(body, json!({"new": true}));
    }
}
