//! Create, update and delete request building.
//!
//! Each value row of the query becomes one write request. The requests are
//! independent; callers that need atomicity combine them into an OData
//! `$batch` via [`crate::batch`].

use crate::codec::JsonCodec;
use crate::codec::ODataCodec;
use crate::codec::ValueCodec;
use crate::dialect::Dialect;
use crate::error::QueryError;
use crate::graphql;
use crate::model::AttributeSource;
use crate::model::DataType;
use crate::model::Value;
use crate::path;
use crate::query::Comparator;
use crate::query::DataQuery;
use crate::query::ValueRow;
use crate::request::Request;
use crate::request::RequestBody;

use super::substitute_placeholders;
use super::QueryCompiler;

impl QueryCompiler {
    /// Compiles the query's value rows into create requests, one POST per
    /// row.
    ///
    /// Values are placed at each attribute's create address inside the JSON
    /// body; the whole body is wrapped at `request_data_path` when one is
    /// configured.
    pub fn compile_create(&self, query: &DataQuery) -> Result<Vec<Request>, QueryError> {
        if self.dialect == Dialect::GraphQl {
            return self.graphql_mutations(query, false);
        }
        query
            .rows()
            .iter()
            .map(|row| {
                let body = self.write_body(row, false)?;
                Ok(self.write_request(
                    http::Method::POST,
                    self.entity.data_address().to_string(),
                    body,
                ))
            })
            .collect()
    }

    /// Compiles the query's value rows into update requests.
    ///
    /// Each row must carry a value for the UID attribute; it selects the
    /// row-scoped URL and is excluded from the body.
    pub fn compile_update(&self, query: &DataQuery) -> Result<Vec<Request>, QueryError> {
        if self.dialect == Dialect::GraphQl {
            return self.graphql_mutations(query, true);
        }
        let method = match self.dialect {
            Dialect::OData2 | Dialect::OData4 | Dialect::ODataHybrid => http::Method::PATCH,
            _ => http::Method::PUT,
        };
        query
            .rows()
            .iter()
            .map(|row| {
                let url = self.row_url(row)?;
                let body = self.write_body(row, true)?;
                Ok(self.write_request(method.clone(), url, body))
            })
            .collect()
    }

    /// Compiles delete requests, one DELETE per UID value.
    ///
    /// UID values come from the value rows; a query without rows falls back
    /// to a UID `EQUALS`/`IN` filter.
    pub fn compile_delete(&self, query: &DataQuery) -> Result<Vec<Request>, QueryError> {
        let uid = self.require_uid()?;
        let mut values: Vec<Value> = query
            .rows()
            .iter()
            .filter_map(|row| row.get(uid.alias()).cloned())
            .collect();
        if values.is_empty() {
            if let Some(filter) = query.filters().find(uid.alias()) {
                if matches!(filter.comparator, Comparator::Equals | Comparator::In) {
                    values = filter.value.to_scalars(',');
                }
            }
        }

        if self.dialect == Dialect::GraphQl {
            let name = self.require_mutation_name()?;
            return values
                .iter()
                .filter(|value| !value.is_empty())
                .map(|value| {
                    let arguments = vec![(
                        uid.data_address().to_string(),
                        graphql::argument_literal(value),
                    )];
                    let document =
                        graphql::mutation_document(name, &arguments, &[uid.data_address().to_string()]);
                    Ok(graphql::document_request(
                        self.entity.data_address().to_string(),
                        Some(name),
                        &document,
                    ))
                })
                .collect();
        }

        values
            .iter()
            .filter(|value| !value.is_empty())
            .map(|value| {
                let url = self.uid_url(uid, value)?;
                Ok(Request {
                    method: http::Method::DELETE,
                    url,
                    headers: Vec::new(),
                    body: None,
                }
                .header("Accept", "application/json"))
            })
            .collect()
    }

    /// Builds the JSON body for one row. `update` selects the update
    /// addresses and drops the UID value from the body.
    fn write_body(&self, row: &ValueRow, update: bool) -> Result<serde_json::Value, QueryError> {
        let mut body = serde_json::Value::Object(serde_json::Map::new());
        let uid_alias = self.entity.uid_attribute().map(|a| a.alias().to_string());
        for (alias, value) in row.values() {
            if update && Some(alias.as_str()) == uid_alias.as_deref() {
                continue;
            }
            let (address, data_type, hint) = match self.entity.attribute(alias) {
                Some(attribute) => (
                    if update {
                        attribute.update_address()
                    } else {
                        attribute.create_address()
                    },
                    attribute.data_type(),
                    attribute.remote_type(),
                ),
                None => (alias.as_str(), DataType::String, None),
            };
            if address.is_empty() || address.contains("[#") {
                continue;
            }
            let encoded = self
                .body_codec_encode(value, data_type, hint)
                .map_err(|source| {
                    QueryError::value_encoding(
                        format!("{alias} = {}", value.as_text()),
                        source.to_string(),
                    )
                })?;
            path::insert(&mut body, address, encoded);
        }
        Ok(match self.entity.options().request_data_path.as_deref() {
            Some(prefix) => {
                let mut wrapped = serde_json::Value::Object(serde_json::Map::new());
                path::insert(&mut wrapped, prefix, body);
                wrapped
            }
            None => body,
        })
    }

    fn body_codec_encode(
        &self,
        value: &Value,
        data_type: DataType,
        hint: Option<&str>,
    ) -> Result<serde_json::Value, QueryError> {
        match self.dialect {
            Dialect::OData2 | Dialect::OData4 | Dialect::ODataHybrid => {
                ODataCodec.encode_body(value, data_type, hint)
            }
            _ => JsonCodec.encode_body(value, data_type, hint),
        }
    }

    fn write_request(
        &self,
        method: http::Method,
        url: String,
        body: serde_json::Value,
    ) -> Request {
        let request = Request::with_body(method, url, RequestBody::Json(body))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        match self.dialect {
            Dialect::OData4 => request
                .header("OData-MaxVersion", "4.0")
                .header("OData-Version", "4.0"),
            _ => request,
        }
    }

    /// Row-scoped URL for update from the row's UID value.
    fn row_url(&self, row: &ValueRow) -> Result<String, QueryError> {
        let uid = self.require_uid()?;
        let value = row
            .get(uid.alias())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                QueryError::missing_config(format!(
                    "row is missing a value for UID attribute \"{}\"",
                    uid.alias()
                ))
            })?;
        self.uid_url(uid, value)
    }

    /// URL addressing one remote row: the dedicated UID endpoint when one
    /// is configured, else `base(literal)` for OData and `base/value` for
    /// the rest.
    fn uid_url(&self, uid: &AttributeSource, value: &Value) -> Result<String, QueryError> {
        if let Some(address) = self.entity.options().uid_request_data_address.as_deref() {
            if address.contains("[#") {
                return Ok(substitute_placeholders(address, &value.as_text()));
            }
        }
        let base = self.entity.data_address().trim_end_matches('/');
        match self.dialect {
            Dialect::OData2 | Dialect::OData4 | Dialect::ODataHybrid => {
                let literal = ODataCodec.encode_literal(value, uid.data_type(), uid.remote_type())?;
                Ok(format!("{base}({literal})"))
            }
            _ => Ok(format!("{base}/{}", value.as_text())),
        }
    }

    fn require_uid(&self) -> Result<&AttributeSource, QueryError> {
        self.entity.uid_attribute().ok_or_else(|| {
            QueryError::missing_config("a UID attribute is required for update/delete")
        })
    }

    fn require_mutation_name(&self) -> Result<&str, QueryError> {
        self.entity
            .options()
            .graphql_mutation_name
            .as_deref()
            .ok_or_else(|| {
                QueryError::missing_config("graphql_mutation_name is required for GraphQL writes")
            })
    }

    /// One mutation request per row: row values become field arguments, the
    /// UID field (or all fields) the return selection.
    fn graphql_mutations(
        &self,
        query: &DataQuery,
        update: bool,
    ) -> Result<Vec<Request>, QueryError> {
        let name = self.require_mutation_name()?;
        query
            .rows()
            .iter()
            .map(|row| {
                let mut arguments = Vec::new();
                for (alias, value) in row.values() {
                    let field = match self.entity.attribute(alias) {
                        Some(attribute) => {
                            let address = if update {
                                attribute.update_address()
                            } else {
                                attribute.create_address()
                            };
                            if address.is_empty() || address.contains("[#") {
                                continue;
                            }
                            address.to_string()
                        }
                        None => alias.clone(),
                    };
                    arguments.push((field, graphql::argument_literal(value)));
                }
                let return_fields: Vec<String> = match self.entity.uid_attribute() {
                    Some(uid) if !uid.data_address().is_empty() => {
                        vec![uid.data_address().to_string()]
                    }
                    _ => self
                        .entity
                        .attributes()
                        .iter()
                        .map(|attribute| attribute.data_address().to_string())
                        .filter(|address| !address.is_empty() && !address.contains("[#"))
                        .collect(),
                };
                let document = graphql::mutation_document(name, &arguments, &return_fields);
                Ok(graphql::document_request(
                    self.entity.data_address().to_string(),
                    Some(name),
                    &document,
                ))
            })
            .collect()
    }
}
