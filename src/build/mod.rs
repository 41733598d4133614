//! The generic query compiler.
//!
//! [`QueryCompiler`] is the top-level entry point. It validates the entity
//! description once at construction, compiles a [`DataQuery`] into sans-IO
//! requests per dialect and, given a [`Transport`], executes them
//! sequentially and decodes the responses into a uniform [`ReadResult`].
//! The dialect-specific behavior is composed from the strategy types in
//! [`crate::translate`], [`crate::codec`], [`crate::paginate`] and
//! [`crate::extract`].

mod crud;

use tracing::debug;

use crate::dialect::Dialect;
use crate::error::Error;
use crate::error::QueryError;
use crate::extract::RowExtractor;
use crate::graphql;
use crate::html;
use crate::model::placeholders_in;
use crate::model::EntitySource;
use crate::model::Value;
use crate::paginate::PaginationStrategy;
use crate::query::Comparator;
use crate::query::DataQuery;
use crate::query::Filter;
use crate::query::FilterGroup;
use crate::query::GroupOperator;
use crate::request::CompiledQuery;
use crate::request::ReadResult;
use crate::request::Request;
use crate::request::RequestBody;
use crate::request::Transport;
use crate::translate::resolve_target;
use crate::translate::FilterTarget;
use crate::translate::FilterTranslator;
use crate::translate::JsonParamTranslator;
use crate::translate::ODataTranslator;
use crate::translate::ODataVersion;
use crate::xml;

/// Compiles dialect-neutral queries into requests for one entity.
///
/// # Example
///
/// ```no_run
/// use wirequery::build::QueryCompiler;
/// use wirequery::model::{AttributeSource, DataType, EntitySource};
/// use wirequery::query::{DataQuery, Filter};
/// use wirequery::Dialect;
///
/// let entity = EntitySource::new("https://api.test/Orders")
///     .with_attribute(AttributeSource::new("Status", "Status", DataType::String));
/// let compiler = QueryCompiler::new(Dialect::OData4, entity)?;
/// let compiled = compiler.compile_read(
///     &DataQuery::new().filter(Filter::equals("Status", "open")),
/// )?;
/// # Ok::<(), wirequery::error::QueryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    dialect: Dialect,
    entity: EntitySource,
}

/// The compiled requests plus what the extractor needs to know about them.
struct ReadPlan {
    compiled: CompiledQuery,
    /// Responses are single keyed objects (UID fetch), not row lists.
    uid_scoped: bool,
}

impl ReadPlan {
    fn none() -> Self {
        Self {
            compiled: CompiledQuery::NoQuery,
            uid_scoped: false,
        }
    }

    fn single(request: Request) -> Self {
        Self {
            compiled: CompiledQuery::Single(request),
            uid_scoped: false,
        }
    }
}

impl QueryCompiler {
    /// Creates a compiler for one dialect and entity.
    ///
    /// The entity description is validated here, not during translation.
    pub fn new(dialect: Dialect, entity: EntitySource) -> Result<Self, QueryError> {
        entity.validate()?;
        Ok(Self { dialect, entity })
    }

    /// Returns the compiler's dialect.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Returns the entity description.
    pub fn entity(&self) -> &EntitySource {
        &self.entity
    }

    /// Compiles a read query into executable requests.
    ///
    /// Returns [`CompiledQuery::NoQuery`] when an endpoint placeholder has
    /// no usable filter value or `force_filtering` is set and no remote
    /// filter survived translation; callers must treat that as zero rows.
    pub fn compile_read(&self, query: &DataQuery) -> Result<CompiledQuery, QueryError> {
        Ok(self.plan_read(query)?.compiled)
    }

    /// Compiles and executes a read query against a transport.
    ///
    /// Requests are executed strictly sequentially; rows and counters
    /// accumulate in submission order. A non-2xx response is surfaced as a
    /// transport error.
    pub fn read(&self, query: &DataQuery, transport: &dyn Transport) -> Result<ReadResult, Error> {
        let plan = self.plan_read(query)?;
        if plan.compiled.is_no_query() {
            return Ok(ReadResult {
                rows: Vec::new(),
                total_count: Some(0),
                has_more_rows: false,
            });
        }

        let extractor = RowExtractor::new(self.dialect, &self.entity).uid_scoped(plan.uid_scoped);
        let mut rows = Vec::new();
        let mut total: Option<u64> = None;
        for request in plan.compiled.requests() {
            let response = transport.execute(request)?;
            if !response.is_success() {
                return Err(Error::Transport(format!(
                    "{} {} returned status {}",
                    request.method, request.url, response.status
                )));
            }
            if self.dialect == Dialect::Html {
                rows.extend(html::extract_rows(&self.entity, &response.body)?);
            } else {
                rows.extend(extractor.rows(&response.body)?);
            }
            if let Some(count) = extractor.total_count(&response.body) {
                total = Some(total.unwrap_or(0) + count);
            }
        }

        // Counter requested but absent from the response: fall back to a
        // follow-up <resource>/$count request where the dialect has one.
        if total.is_none() && self.entity.options().inline_count {
            if let CompiledQuery::Single(request) = &plan.compiled {
                let strategy = PaginationStrategy::for_dialect(self.dialect, self.entity.options());
                if let Some(count_request) = strategy.count_request(request) {
                    let response = transport.execute(&count_request)?;
                    if response.is_success() {
                        total = response.body.trim().parse().ok();
                    }
                }
            }
        }

        let window = query.query_window();
        let mut has_more = false;
        if self.dialect == Dialect::GraphQl
            && !window.is_unbounded()
            && rows.len() as u64 > window.limit()
        {
            // The surplus over-fetched row only signals another page.
            rows.truncate(window.limit() as usize);
            has_more = true;
        } else if let Some(total) = total {
            has_more = window.offset() + (rows.len() as u64) < total;
        }

        Ok(ReadResult {
            rows,
            total_count: total,
            has_more_rows: has_more,
        })
    }

    fn plan_read(&self, query: &DataQuery) -> Result<ReadPlan, QueryError> {
        match self.dialect {
            Dialect::GraphQl => self.plan_graphql(query),
            Dialect::Xml => self.plan_xml(query),
            _ => self.plan_url(query),
        }
    }

    /// Read planning for the URL-parameter dialects (OData family, generic
    /// REST, HTML).
    fn plan_url(&self, query: &DataQuery) -> Result<ReadPlan, QueryError> {
        let entity = &self.entity;
        let (uid_filter, filters) = self.split_uid_filter(query.filters());

        let mut params: Vec<(String, String)> = Vec::new();
        let mut filtered_remotely = uid_filter.is_some();
        match self.dialect {
            Dialect::OData2 | Dialect::OData4 | Dialect::ODataHybrid => {
                let version = if self.dialect == Dialect::OData4 {
                    ODataVersion::V4
                } else {
                    ODataVersion::V2
                };
                let translator = ODataTranslator::new(version);
                if let Some(predicate) = translator.translate_group(&filters, entity)? {
                    filtered_remotely = true;
                    params.push(("$filter".to_string(), predicate));
                }
                let order_keys = self.sort_keys(query, " ");
                if !order_keys.is_empty() {
                    params.push(("$orderby".to_string(), order_keys.join(",")));
                }
                if version == ODataVersion::V2 {
                    params.push(("$format".to_string(), "json".to_string()));
                }
            }
            Dialect::JsonRest => {
                let pairs = JsonParamTranslator::new().translate_group(&filters, entity)?;
                filtered_remotely |= !pairs.is_empty();
                params.extend(pairs);
                if let Some(sort_param) = entity.options().request_sort_param.as_deref() {
                    let keys = self.sort_keys(query, ":");
                    if !keys.is_empty() {
                        params.push((sort_param.to_string(), keys.join(",")));
                    }
                }
            }
            // HTML endpoints take no remote filters or sorters.
            _ => {}
        }

        if entity.options().force_filtering && !filtered_remotely {
            debug!(
                entity = entity.data_address(),
                "force_filtering with no remote filter; compiling to no query"
            );
            return Ok(ReadPlan::none());
        }

        let strategy = PaginationStrategy::for_dialect(self.dialect, entity.options());
        params.extend(strategy.query_params(query.query_window(), entity.options().inline_count));

        if let Some(uid) = uid_filter {
            let address = entity
                .options()
                .uid_request_data_address
                .as_deref()
                .unwrap_or_default();
            let values = uid.value.to_scalars(',');
            if values.is_empty() || values.iter().any(Value::is_empty) {
                debug!(
                    entity = entity.data_address(),
                    "UID filter without usable values; compiling to no query"
                );
                return Ok(ReadPlan::none());
            }
            let mut requests: Vec<Request> = values
                .iter()
                .map(|value| {
                    let endpoint = substitute_placeholders(address, &value.as_text());
                    self.read_request(build_url(&endpoint, &params))
                })
                .collect();
            let compiled = if requests.len() == 1 {
                CompiledQuery::Single(requests.remove(0))
            } else {
                CompiledQuery::FanOut(requests)
            };
            return Ok(ReadPlan {
                compiled,
                uid_scoped: true,
            });
        }

        let Some(endpoint) = self.resolve_address(entity.data_address(), query) else {
            return Ok(ReadPlan::none());
        };
        Ok(ReadPlan::single(
            self.read_request(build_url(&endpoint, &params)),
        ))
    }

    fn plan_graphql(&self, query: &DataQuery) -> Result<ReadPlan, QueryError> {
        let options = self.entity.options();
        let operation = options.graphql_query_name.as_deref().ok_or_else(|| {
            QueryError::missing_config("graphql_query_name is required for GraphQL reads")
        })?;

        let mut arguments = self.graphql_arguments(query.filters())?;
        if options.force_filtering && arguments.is_empty() {
            return Ok(ReadPlan::none());
        }

        let window = query.query_window();
        let offset_param = options.request_offset_param.as_deref().unwrap_or("offset");
        let limit_param = options.request_limit_param.as_deref().unwrap_or("limit");
        if window.offset() > 0 {
            arguments.push((offset_param.to_string(), window.offset().to_string()));
        }
        if !window.is_unbounded() {
            // One extra row is requested; its presence signals more pages.
            arguments.push((limit_param.to_string(), (window.limit() + 1).to_string()));
        }

        let fields: Vec<String> = self
            .entity
            .attributes()
            .iter()
            .filter(|attribute| {
                let address = attribute.data_address();
                !address.is_empty() && !address.contains("[#")
            })
            .map(|attribute| attribute.data_address().to_string())
            .collect();
        if fields.is_empty() {
            return Err(QueryError::missing_config(
                "GraphQL reads need at least one attribute with a data address",
            ));
        }

        let Some(endpoint) = self.resolve_address(self.entity.data_address(), query) else {
            return Ok(ReadPlan::none());
        };
        let document = graphql::query_document(operation, &arguments, &fields);
        Ok(ReadPlan::single(graphql::document_request(
            endpoint,
            Some(operation),
            &document,
        )))
    }

    fn plan_xml(&self, query: &DataQuery) -> Result<ReadPlan, QueryError> {
        if self.entity.options().force_filtering && query.filters().is_empty() {
            return Ok(ReadPlan::none());
        }
        let Some(endpoint) = self.resolve_address(self.entity.data_address(), query) else {
            return Ok(ReadPlan::none());
        };
        let document = xml::query_document(&self.entity, query)?;
        let request = Request::with_body(
            http::Method::POST,
            endpoint,
            RequestBody::Text {
                content_type: "application/xml".to_string(),
                content: document,
            },
        )
        .header("Accept", "application/json");
        Ok(ReadPlan::single(request))
    }

    /// GraphQL read arguments: one `field: literal` pair per remote filter.
    ///
    /// Only flat `AND` semantics can be expressed as field arguments; other
    /// operators fail fast.
    fn graphql_arguments(&self, group: &FilterGroup) -> Result<Vec<(String, String)>, QueryError> {
        let group = group.flattened();
        if group.operator != GroupOperator::And {
            return Err(QueryError::unsupported_operator(group.operator, "GraphQL"));
        }
        let mut arguments = Vec::new();
        for filter in &group.filters {
            if let Some(nested) = filter.nested.as_deref() {
                arguments.extend(self.graphql_arguments(nested)?);
                continue;
            }
            let FilterTarget::Remote { param, .. } = resolve_target(filter, &self.entity) else {
                continue;
            };
            match filter.comparator {
                Comparator::Equals | Comparator::Is | Comparator::In => {
                    arguments.push((param.to_string(), graphql::argument_literal(&filter.value)));
                }
                other => return Err(QueryError::unsupported_comparator(other, "GraphQL")),
            }
        }
        for nested in &group.groups {
            arguments.extend(self.graphql_arguments(nested)?);
        }
        Ok(arguments)
    }

    /// Splits off a root-level UID filter when the entity has a dedicated
    /// placeholder UID endpoint. The UID filter is consumed by the endpoint
    /// and must not also appear in the translated predicate.
    fn split_uid_filter(&self, group: &FilterGroup) -> (Option<Filter>, FilterGroup) {
        let has_uid_endpoint = self
            .entity
            .options()
            .uid_request_data_address
            .as_deref()
            .map(|address| !placeholders_in(address).is_empty())
            .unwrap_or(false);
        let Some(uid_alias) = self.entity.uid_attribute().map(|a| a.alias().to_string()) else {
            return (None, group.clone());
        };
        if !has_uid_endpoint {
            return (None, group.clone());
        }
        let position = group.filters.iter().position(|filter| {
            !filter.is_compound()
                && !filter.apply_locally
                && filter.attribute == uid_alias
                && matches!(filter.comparator, Comparator::Equals | Comparator::In)
        });
        match position {
            Some(index) => {
                let mut remaining = group.clone();
                let uid = remaining.filters.remove(index);
                (Some(uid), remaining)
            }
            None => (None, group.clone()),
        }
    }

    /// Resolves `[#name#]` endpoint placeholders from filter values.
    ///
    /// A placeholder without a non-empty filter value makes the whole query
    /// unexecutable: `None` here compiles to [`CompiledQuery::NoQuery`].
    fn resolve_address(&self, address: &str, query: &DataQuery) -> Option<String> {
        let mut resolved = address.to_string();
        for name in placeholders_in(address) {
            match query.filters().find(&name) {
                Some(filter) if !filter.value.is_empty() => {
                    resolved = resolved.replace(&format!("[#{name}#]"), &filter.value.as_text());
                }
                _ => {
                    debug!(
                        placeholder = name.as_str(),
                        "unresolved endpoint placeholder; compiling to no query"
                    );
                    return None;
                }
            }
        }
        Some(resolved)
    }

    /// Remote sort keys in priority order, e.g. `Total desc`.
    fn sort_keys(&self, query: &DataQuery, separator: &str) -> Vec<String> {
        let mut keys = Vec::new();
        for sorter in query.sorters() {
            let param = match self.entity.attribute(&sorter.attribute) {
                Some(attribute) => match attribute.remote_sort_param() {
                    Some(param) => param,
                    None => continue,
                },
                None => sorter.attribute.as_str(),
            };
            keys.push(format!("{param}{separator}{}", sorter.direction.as_str()));
        }
        keys
    }

    fn read_request(&self, url: String) -> Request {
        let request = Request::get(url);
        match self.dialect {
            Dialect::OData4 => request
                .header("Accept", "application/json")
                .header("OData-MaxVersion", "4.0")
                .header("OData-Version", "4.0"),
            Dialect::OData2 | Dialect::ODataHybrid | Dialect::JsonRest => {
                request.header("Accept", "application/json")
            }
            _ => request,
        }
    }
}

/// Replaces every placeholder token in an address with one replacement
/// (used for UID endpoints, where all tokens mean the UID value).
fn substitute_placeholders(address: &str, replacement: &str) -> String {
    let mut resolved = address.to_string();
    for name in placeholders_in(address) {
        resolved = resolved.replace(&format!("[#{name}#]"), replacement);
    }
    resolved
}

fn build_url(endpoint: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return endpoint.to_string();
    }
    let query = params
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}{query}")
}
