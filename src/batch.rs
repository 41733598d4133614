//! OData `$batch` multipart request assembly.
//!
//! N already-built write requests are combined into one
//! `multipart/mixed; boundary=batch_<uuid>` request whose single part is a
//! `multipart/mixed; boundary=changeset_<uuid>` changeset carrying all
//! sub-requests in submission order.

use tracing::warn;
use uuid::Uuid;

use crate::error::ExtractError;
use crate::error::QueryError;
use crate::request::Request;
use crate::request::RequestBody;
use crate::request::Response;

/// Generates a unique boundary string.
fn generate_boundary(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Combines write sub-requests into one `$batch` request against
/// `base_url`.
///
/// The request line of each nested part uses the absolute path, computed by
/// stripping the connection's server root from the sub-request URL.
pub fn build_batch(sub_requests: &[Request], base_url: &str) -> Result<Request, QueryError> {
    let root = url::Url::parse(base_url)
        .map_err(|e| QueryError::InvalidSource(format!("invalid base URL \"{base_url}\": {e}")))?;
    let origin = root.origin().ascii_serialization();
    let host = root
        .host_str()
        .map(|host| match root.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
        .ok_or_else(|| {
            QueryError::InvalidSource(format!("base URL \"{base_url}\" has no host"))
        })?;

    let batch_boundary = generate_boundary("batch");
    let changeset_boundary = generate_boundary("changeset");

    let mut body = String::new();
    body.push_str(&format!("--{batch_boundary}\r\n"));
    body.push_str(&format!(
        "Content-Type: multipart/mixed; boundary={changeset_boundary}\r\n\r\n"
    ));

    for request in sub_requests {
        body.push_str(&format!("--{changeset_boundary}\r\n"));
        body.push_str("Content-Type: application/http\r\n");
        body.push_str("Content-Transfer-Encoding: binary\r\n");
        body.push_str("\r\n");
        body.push_str(&sub_request_text(request, &origin, &host));
        body.push_str("\r\n");
    }

    body.push_str(&format!("--{changeset_boundary}--\r\n"));
    body.push_str(&format!("--{batch_boundary}--\r\n"));

    let url = format!("{}/$batch", base_url.trim_end_matches('/'));
    Ok(Request::with_body(
        http::Method::POST,
        url,
        RequestBody::Text {
            content_type: format!("multipart/mixed; boundary={batch_boundary}"),
            content: body,
        },
    )
    .header("Accept", "application/json"))
}

/// Renders one nested part: request line, headers, blank line, body.
fn sub_request_text(request: &Request, origin: &str, host: &str) -> String {
    let absolute_path = request
        .url
        .strip_prefix(origin)
        .unwrap_or(request.url.as_str());

    let mut text = String::new();
    text.push_str(&format!(
        "{} {} HTTP/1.1\r\n",
        request.method, absolute_path
    ));
    text.push_str(&format!("Host: {host}\r\n"));
    for (name, value) in &request.headers {
        text.push_str(&format!("{name}: {value}\r\n"));
    }
    if let Some(body) = &request.body {
        let content = body.to_content();
        text.push_str(&format!("Content-Type: {}\r\n", body.content_type()));
        text.push_str(&format!("Content-Length: {}\r\n", content.len()));
        text.push_str("\r\n");
        text.push_str(&content);
    } else {
        text.push_str("\r\n");
    }
    text
}

/// Per-changeset sub-response access.
///
/// The multipart batch response is treated as atomic: the outer HTTP status
/// decides success. Individual sub-responses are not parsed; asking for
/// them surfaces a clear error instead of silently returning empty success.
pub fn sub_responses(_response: &Response) -> Result<Vec<Response>, ExtractError> {
    warn!("batch sub-responses requested; batch responses are not parsed");
    Err(ExtractError::BatchResponseNotParsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_request(path: &str, payload: serde_json::Value) -> Request {
        Request::with_body(
            http::Method::POST,
            format!("https://api.test/v2{path}"),
            RequestBody::Json(payload),
        )
    }

    #[test]
    fn test_batch_structure() {
        let subs = vec![
            write_request("/Orders", json!({"Status": "open"})),
            write_request("/Orders", json!({"Status": "closed"})),
            write_request("/Items", json!({"Name": "x"})),
        ];
        let batch = build_batch(&subs, "https://api.test/v2").unwrap();

        assert_eq!(batch.url, "https://api.test/v2/$batch");
        assert_eq!(batch.method, http::Method::POST);

        let Some(RequestBody::Text {
            content_type,
            content,
        }) = &batch.body
        else {
            panic!("expected a text body");
        };
        let batch_boundary = content_type
            .strip_prefix("multipart/mixed; boundary=")
            .unwrap();

        // One outer boundary (opening + terminator), one changeset, three
        // application/http parts in submission order.
        assert_eq!(content.matches(&format!("--{batch_boundary}\r\n")).count(), 1);
        assert_eq!(content.matches(&format!("--{batch_boundary}--")).count(), 1);
        assert_eq!(content.matches("boundary=changeset_").count(), 1);
        assert_eq!(content.matches("Content-Type: application/http").count(), 3);

        let first = content.find("POST /v2/Orders HTTP/1.1").unwrap();
        let last = content.find("POST /v2/Items HTTP/1.1").unwrap();
        assert!(first < last);
        assert!(content.contains("Host: api.test"));
        assert!(content.contains(r#"{"Status":"open"}"#));
    }

    #[test]
    fn test_sub_responses_are_not_parsed() {
        let response = Response::new(202, "--batch_x--");
        assert!(matches!(
            sub_responses(&response),
            Err(ExtractError::BatchResponseNotParsed)
        ));
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        assert!(build_batch(&[], "not a url").is_err());
    }
}
