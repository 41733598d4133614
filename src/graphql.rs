//! GraphQL document assembly.
//!
//! Query and mutation documents are structured string templates joined with
//! fixed two-space indentation. The introspection document used to discover
//! query/mutation fields is a static template, not generated.

use serde_json::json;

use crate::request::Request;
use crate::request::RequestBody;

/// Builds a read document: `query { <name>(args) { fields } }`.
pub fn query_document(name: &str, arguments: &[(String, String)], fields: &[String]) -> String {
    operation_document("query", name, arguments, fields)
}

/// Builds a write document: `mutation { <name>(args) { returnFields } }`.
pub fn mutation_document(
    name: &str,
    arguments: &[(String, String)],
    return_fields: &[String],
) -> String {
    operation_document("mutation", name, arguments, return_fields)
}

fn operation_document(
    kind: &str,
    name: &str,
    arguments: &[(String, String)],
    fields: &[String],
) -> String {
    let argument_list = if arguments.is_empty() {
        String::new()
    } else {
        let rendered = arguments
            .iter()
            .map(|(argument, value)| format!("{argument}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("({rendered})")
    };
    let field_list = fields
        .iter()
        .map(|field| format!("    {field}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{kind} {{\n  {name}{argument_list} {{\n{field_list}\n  }}\n}}")
}

/// Renders a GraphQL string argument value (double quotes escaped).
pub fn string_argument(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Renders a model value as a GraphQL argument literal.
///
/// Numbers, booleans and null go bare; everything string-like is quoted;
/// lists become `[a, b]`.
pub fn argument_literal(value: &crate::model::Value) -> String {
    use crate::model::Value;

    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) | Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Decimal(_) => {
            value.as_text()
        }
        Value::List(items) => {
            let rendered = items
                .iter()
                .map(argument_literal)
                .collect::<Vec<_>>()
                .join(", ");
            format!("[{rendered}]")
        }
        other => string_argument(&other.as_text()),
    }
}

/// Wraps a document in the JSON envelope `{"operationName":…, "query":…}`
/// and produces the POST request.
pub fn document_request(url: impl Into<String>, operation_name: Option<&str>, document: &str) -> Request {
    Request::with_body(
        http::Method::POST,
        url,
        RequestBody::Json(json!({
            "operationName": operation_name,
            "query": document,
        })),
    )
    .header("Content-Type", "application/json")
    .header("Accept", "application/json")
}

/// The static schema introspection document.
///
/// Discovers queryType/mutationType and all object field definitions with
/// the full type-ref chain up to 7 levels of `ofType` nesting.
pub const INTROSPECTION_QUERY: &str = r#"query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    types {
      kind
      name
      description
      fields(includeDeprecated: true) {
        name
        description
        args {
          name
          description
          type { ...TypeRef }
          defaultValue
        }
        type { ...TypeRef }
        isDeprecated
      }
      inputFields {
        name
        description
        type { ...TypeRef }
        defaultValue
      }
      enumValues(includeDeprecated: true) {
        name
        description
        isDeprecated
      }
    }
  }
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}"#;

/// Builds the introspection request for a GraphQL endpoint.
pub fn introspection_request(url: impl Into<String>) -> Request {
    document_request(url, Some("IntrospectionQuery"), INTROSPECTION_QUERY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_document_layout() {
        let document = query_document(
            "orders",
            &[("status".to_string(), string_argument("open"))],
            &["id".to_string(), "total".to_string()],
        );
        assert_eq!(
            document,
            "query {\n  orders(status: \"open\") {\n    id\n    total\n  }\n}"
        );
    }

    #[test]
    fn test_mutation_document_layout() {
        let document = mutation_document(
            "createOrder",
            &[("total".to_string(), "5".to_string())],
            &["id".to_string()],
        );
        assert!(document.starts_with("mutation {\n  createOrder(total: 5) {"));
        assert!(document.ends_with("    id\n  }\n}"));
    }

    #[test]
    fn test_argument_escaping() {
        assert_eq!(string_argument("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_introspection_depth() {
        assert_eq!(INTROSPECTION_QUERY.matches("ofType").count(), 7);
        assert!(INTROSPECTION_QUERY.contains("queryType { name }"));
        assert!(INTROSPECTION_QUERY.contains("mutationType { name }"));
    }

    #[test]
    fn test_document_request_envelope() {
        let request = document_request("https://api.test/graphql", None, "query { x { y } }");
        assert_eq!(request.method, http::Method::POST);
        let Some(RequestBody::Json(body)) = &request.body else {
            panic!("expected a JSON body");
        };
        assert_eq!(body["query"], "query { x { y } }");
        assert!(body["operationName"].is_null());
    }
}
