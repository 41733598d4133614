//! Per-dialect pagination strategies.
//!
//! A strategy supplies the offset/limit parameter names and the total-count
//! discovery method: an inline counter embedded in the response, or a
//! follow-up request to `<resource>/$count` when the counter is absent.
//! GraphQL paginates by over-fetching one extra row instead (see
//! [`crate::graphql`]).

use tracing::warn;

use crate::dialect::Dialect;
use crate::model::EntityOptions;
use crate::query::QueryWindow;
use crate::request::Request;

/// Pagination parameter names and count discovery for one dialect.
#[derive(Debug, Clone)]
pub struct PaginationStrategy {
    offset_param: Option<String>,
    limit_param: Option<String>,
    /// Query parameter requesting an inline counter, e.g.
    /// `$inlinecount=allpages`.
    inline_count_param: Option<(&'static str, &'static str)>,
    /// Response path of the inline counter.
    count_path: Option<String>,
    /// Whether a `<resource>/$count` follow-up is available.
    supports_count_request: bool,
}

impl PaginationStrategy {
    /// Builds the strategy for a dialect, honoring explicit per-entity
    /// parameter-name overrides.
    pub fn for_dialect(dialect: Dialect, options: &EntityOptions) -> Self {
        let (offset_default, limit_default, inline, count_path, count_request) = match dialect {
            Dialect::OData2 => (
                Some("$skip"),
                Some("$top"),
                Some(("$inlinecount", "allpages")),
                Some("d/__count"),
                true,
            ),
            Dialect::OData4 => (
                Some("$skip"),
                Some("$top"),
                Some(("$count", "true")),
                Some("@odata.count"),
                true,
            ),
            // The legacy hybrid dialect puts a numeric offset into
            // $skiptoken, where OData defines an opaque cursor. Observed
            // behavior, preserved as-is; likely a latent defect upstream.
            Dialect::ODataHybrid => (
                Some("$skiptoken"),
                Some("$top"),
                Some(("$inlinecount", "allpages")),
                Some("@odata.count"),
                true,
            ),
            Dialect::JsonRest | Dialect::Xml => (None, None, None, None, false),
            Dialect::GraphQl | Dialect::Html => (None, None, None, None, false),
        };

        Self {
            offset_param: options
                .request_offset_param
                .clone()
                .or_else(|| offset_default.map(str::to_string)),
            limit_param: options
                .request_limit_param
                .clone()
                .or_else(|| limit_default.map(str::to_string)),
            inline_count_param: inline,
            count_path: options
                .response_total_count_path
                .clone()
                .or_else(|| count_path.map(str::to_string)),
            supports_count_request: count_request,
        }
    }

    /// Renders the pagination query parameters for a window.
    ///
    /// An unbounded window emits no limit parameter; a zero offset emits no
    /// offset parameter. The inline counter parameter is appended when
    /// `inline_count` is requested.
    pub fn query_params(&self, window: QueryWindow, inline_count: bool) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if window.offset() > 0 {
            if let Some(name) = &self.offset_param {
                if name == "$skiptoken" {
                    warn!(
                        offset = window.offset(),
                        "emitting numeric offset as $skiptoken (legacy hybrid quirk)"
                    );
                }
                params.push((name.clone(), window.offset().to_string()));
            }
        }
        if !window.is_unbounded() {
            if let Some(name) = &self.limit_param {
                params.push((name.clone(), window.limit().to_string()));
            }
        }
        if inline_count {
            if let Some((name, value)) = self.inline_count_param {
                params.push((name.to_string(), value.to_string()));
            }
        }
        params
    }

    /// Response path of the inline total counter, if the dialect has one.
    pub fn count_path(&self) -> Option<&str> {
        self.count_path.as_deref()
    }

    /// Derives the follow-up `<resource>/$count` request from a compiled
    /// read request.
    ///
    /// Limit, offset, `$format` and count parameters are stripped; the
    /// remaining parameters (notably `$filter`) are kept.
    pub fn count_request(&self, compiled: &Request) -> Option<Request> {
        if !self.supports_count_request {
            return None;
        }
        let mut url = format!("{}/$count", compiled.resource_url());
        let stripped: Vec<(String, String)> = compiled
            .query_pairs()
            .into_iter()
            .filter(|(name, _)| {
                Some(name.as_str()) != self.offset_param.as_deref()
                    && Some(name.as_str()) != self.limit_param.as_deref()
                    && name != "$format"
                    && name != "$inlinecount"
                    && name != "$count"
            })
            .collect();
        if !stripped.is_empty() {
            let query = stripped
                .iter()
                .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }
        Some(Request::get(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> EntityOptions {
        EntityOptions::default()
    }

    #[test]
    fn test_odata2_pagination_params() {
        let strategy = PaginationStrategy::for_dialect(Dialect::OData2, &options());
        assert_eq!(
            strategy.query_params(QueryWindow::new(20, 10), false),
            vec![
                ("$skip".to_string(), "20".to_string()),
                ("$top".to_string(), "10".to_string())
            ]
        );
        assert_eq!(
            strategy.query_params(QueryWindow::new(0, 0), true),
            vec![("$inlinecount".to_string(), "allpages".to_string())]
        );
        assert_eq!(strategy.count_path(), Some("d/__count"));
    }

    #[test]
    fn test_hybrid_uses_skiptoken() {
        let strategy = PaginationStrategy::for_dialect(Dialect::ODataHybrid, &options());
        assert_eq!(
            strategy.query_params(QueryWindow::new(5, 2), false),
            vec![
                ("$skiptoken".to_string(), "5".to_string()),
                ("$top".to_string(), "2".to_string())
            ]
        );
        assert_eq!(strategy.count_path(), Some("@odata.count"));
    }

    #[test]
    fn test_explicit_overrides_win() {
        let opts = EntityOptions {
            request_offset_param: Some("start".into()),
            request_limit_param: Some("rows".into()),
            ..Default::default()
        };
        let strategy = PaginationStrategy::for_dialect(Dialect::JsonRest, &opts);
        assert_eq!(
            strategy.query_params(QueryWindow::new(4, 8), false),
            vec![
                ("start".to_string(), "4".to_string()),
                ("rows".to_string(), "8".to_string())
            ]
        );
    }

    #[test]
    fn test_count_request_strips_pagination() {
        let strategy = PaginationStrategy::for_dialect(Dialect::OData4, &options());
        let compiled = Request::get(
            "https://api.test/Orders?$filter=Status%20eq%20%27open%27&$skip=20&$top=10&$count=true&$format=json",
        );
        let count = strategy.count_request(&compiled).unwrap();
        assert_eq!(
            count.url,
            "https://api.test/Orders/$count?$filter=Status%20eq%20%27open%27"
        );
    }

    #[test]
    fn test_generic_rest_has_no_count_request() {
        let strategy = PaginationStrategy::for_dialect(Dialect::JsonRest, &options());
        let compiled = Request::get("https://api.test/items?limit=5");
        assert!(strategy.count_request(&compiled).is_none());
    }
}
