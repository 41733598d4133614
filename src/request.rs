//! Sans-IO request and response artifacts plus the transport seam.
//!
//! The engine never performs IO itself. Compiling a query yields
//! [`CompiledQuery`] artifacts; executing them is delegated to a caller
//! supplied [`Transport`], which the engine treats as a single atomic step
//! per request (no retries, timeouts or cancellation here).

use http::Method;

use crate::error::Error;

/// Body of an outbound request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// A JSON document, serialized on send.
    Json(serde_json::Value),
    /// Pre-rendered text with an explicit content type (multipart batches,
    /// raw GraphQL documents, XML query documents).
    Text {
        /// MIME type of the content.
        content_type: String,
        /// The rendered body.
        content: String,
    },
}

impl RequestBody {
    /// Returns the content type of this body.
    pub fn content_type(&self) -> &str {
        match self {
            RequestBody::Json(_) => "application/json",
            RequestBody::Text { content_type, .. } => content_type,
        }
    }

    /// Renders the body to its wire form.
    pub fn to_content(&self) -> String {
        match self {
            RequestBody::Json(value) => value.to_string(),
            RequestBody::Text { content, .. } => content.clone(),
        }
    }
}

/// One outbound HTTP request, produced fresh per query.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Full URI including the query string.
    pub url: String,
    /// Header name/value pairs in emission order.
    pub headers: Vec<(String, String)>,
    /// Optional body.
    pub body: Option<RequestBody>,
}

impl Request {
    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a request with a method and body.
    pub fn with_body(method: Method, url: impl Into<String>, body: RequestBody) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the URL up to (excluding) the query string.
    pub fn resource_url(&self) -> &str {
        match self.url.split_once('?') {
            Some((resource, _)) => resource,
            None => &self.url,
        }
    }

    /// Returns the decoded query-string pairs.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let Some((_, query)) = self.url.split_once('?') else {
            return Vec::new();
        };
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((name, value)) => (
                    name.to_string(),
                    urlencoding::decode(value)
                        .map(|v| v.into_owned())
                        .unwrap_or_else(|_| value.to_string()),
                ),
                None => (pair.to_string(), String::new()),
            })
            .collect()
    }
}

/// A raw response returned by the transport.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl Response {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The external transport executing compiled requests.
///
/// Connection pooling, authentication, retries and caching all live behind
/// this trait; the engine calls it sequentially and surfaces its failures
/// unchanged.
pub trait Transport {
    /// Executes one request and returns the raw response.
    fn execute(&self, request: &Request) -> Result<Response, Error>;
}

/// Result of compiling a read query.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledQuery {
    /// No executable query: a placeholder lacked a value or a required
    /// filter was empty. Callers must treat this as zero rows, not as an
    /// error.
    NoQuery,
    /// A single request.
    Single(Request),
    /// Multiple requests executed strictly sequentially, rows concatenated
    /// in order (UID `IN` fan-out).
    FanOut(Vec<Request>),
}

impl CompiledQuery {
    /// Returns the requests to execute, in order.
    pub fn requests(&self) -> &[Request] {
        match self {
            CompiledQuery::NoQuery => &[],
            CompiledQuery::Single(request) => std::slice::from_ref(request),
            CompiledQuery::FanOut(requests) => requests,
        }
    }

    /// Returns `true` if nothing is to be executed.
    pub fn is_no_query(&self) -> bool {
        matches!(self, CompiledQuery::NoQuery)
    }
}

/// Uniform result of a read: rows, total count and a has-more flag.
#[derive(Debug, Clone, Default)]
pub struct ReadResult {
    /// The extracted rows.
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    /// Total number of rows matching the query, when discoverable.
    pub total_count: Option<u64>,
    /// Whether more rows exist beyond the returned window.
    pub has_more_rows: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pair_decoding() {
        let request = Request::get("https://api.test/Orders?$top=10&$filter=Status%20eq%20%27open%27");
        assert_eq!(request.resource_url(), "https://api.test/Orders");
        let pairs = request.query_pairs();
        assert_eq!(pairs[0], ("$top".into(), "10".into()));
        assert_eq!(pairs[1], ("$filter".into(), "Status eq 'open'".into()));
    }

    #[test]
    fn test_no_query_has_no_requests() {
        assert!(CompiledQuery::NoQuery.requests().is_empty());
        assert!(CompiledQuery::NoQuery.is_no_query());
    }
}
