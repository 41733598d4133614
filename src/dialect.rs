//! The supported backend protocol flavors.

/// One supported URL-based API dialect.
///
/// Behavioral variation between dialects is expressed as a small strategy
/// set (filter translator, value codec, pagination strategy, row extractor)
/// selected per dialect and composed by one generic compiler — not as an
/// inheritance chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Plain JSON REST: filters as query parameters, typed JSON bodies.
    JsonRest,
    /// OData v2 JSON: `$filter` with `substringof`, `d`/`d.results`
    /// envelope, `$inlinecount=allpages`.
    OData2,
    /// OData v4 JSON: `contains`, `in (…)`, `value` envelope,
    /// `$count=true`.
    OData4,
    /// Legacy OData-JSON hybrid: v4-style envelope and counter, but the
    /// offset goes into `$skiptoken` (observed quirk, see
    /// [`crate::paginate`]).
    ODataHybrid,
    /// GraphQL documents over POST.
    GraphQl,
    /// XML query documents (request side); responses use the JSON path
    /// extractor after envelope conversion.
    Xml,
    /// HTML scraping via CSS selectors.
    Html,
}

impl Dialect {
    /// Human-readable dialect name for errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            Dialect::JsonRest => "generic JSON REST",
            Dialect::OData2 => "OData v2",
            Dialect::OData4 => "OData v4",
            Dialect::ODataHybrid => "OData-JSON hybrid",
            Dialect::GraphQl => "GraphQL",
            Dialect::Xml => "XML",
            Dialect::Html => "HTML",
        }
    }

    /// Returns `true` for the OData family.
    pub fn is_odata(self) -> bool {
        matches!(
            self,
            Dialect::OData2 | Dialect::OData4 | Dialect::ODataHybrid
        )
    }
}
