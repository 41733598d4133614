//! Entity and attribute source descriptors.
//!
//! Configuration is modelled as named, typed option structs with documented
//! defaults instead of string-keyed maps, and is validated once when the
//! compiler is constructed rather than looked up ad hoc during translation.

use crate::error::QueryError;

/// Primitive semantic type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    /// Character data (default).
    #[default]
    String,
    /// Whole numbers.
    Integer,
    /// Fractional numbers.
    Number,
    /// True/false.
    Boolean,
    /// Calendar date.
    Date,
    /// Date with time.
    DateTime,
    /// Time of day.
    Time,
    /// Raw binary data.
    Binary,
    /// GUID/UUID.
    Guid,
}

impl DataType {
    /// Returns `true` for string-like types, which get substring semantics
    /// for `IS`/`IS_NOT` filters.
    pub fn is_textual(self) -> bool {
        matches!(self, DataType::String)
    }

    /// Returns `true` for numeric types.
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Integer | DataType::Number)
    }

    /// Returns `true` for date/time types.
    pub fn is_temporal(self) -> bool {
        matches!(self, DataType::Date | DataType::DateTime | DataType::Time)
    }
}

/// Per-attribute configuration options.
///
/// All fields are optional; each dialect interprets only the options it
/// recognizes and falls back to its defaults otherwise.
#[derive(Debug, Clone, Default)]
pub struct AttributeOptions {
    /// Force remote filtering on (`Some(true)`) or off (`Some(false)`).
    pub filter_remote: Option<bool>,
    /// Explicit remote filter parameter, overriding the data address.
    pub filter_remote_param: Option<String>,
    /// Prefix injected before the encoded filter value (e.g. a default
    /// operator some APIs expect inside the parameter value).
    pub filter_remote_prefix: Option<String>,
    /// Force remote sorting on or off.
    pub sort_remote: Option<bool>,
    /// Explicit remote sort parameter, overriding the data address.
    pub sort_remote_param: Option<String>,
    /// Wire-protocol type annotation (e.g. `Edm.Guid`) overriding the
    /// semantic type for value encoding.
    pub remote_type: Option<String>,
    /// Data address to use in create request bodies.
    pub create_data_address: Option<String>,
    /// Data address to use in update request bodies.
    pub update_data_address: Option<String>,
}

/// Describes one attribute (field) of a remote entity.
#[derive(Debug, Clone)]
pub struct AttributeSource {
    alias: String,
    data_address: String,
    data_type: DataType,
    options: AttributeOptions,
}

impl AttributeSource {
    /// Creates a new attribute descriptor.
    pub fn new(
        alias: impl Into<String>,
        data_address: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            alias: alias.into(),
            data_address: data_address.into(),
            data_type,
            options: AttributeOptions::default(),
        }
    }

    /// Sets the attribute options.
    pub fn with_options(mut self, options: AttributeOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the model-side alias of this attribute.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns the data address (endpoint field name or slash-path).
    pub fn data_address(&self) -> &str {
        &self.data_address
    }

    /// Returns the semantic data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the attribute options.
    pub fn options(&self) -> &AttributeOptions {
        &self.options
    }

    /// Returns the remote-type hint, if configured.
    pub fn remote_type(&self) -> Option<&str> {
        self.options.remote_type.as_deref()
    }

    /// Resolves the effective remote filter parameter.
    ///
    /// The explicit per-attribute override wins; otherwise the raw data
    /// address is used when it denotes a true remote expression. `None`
    /// means: do not filter remotely — the filter is applied locally after
    /// the fetch, and the attribute must still be projected so local
    /// filtering has data to work on.
    pub fn remote_filter_param(&self) -> Option<&str> {
        if self.options.filter_remote == Some(false) {
            return None;
        }
        if let Some(param) = self.options.filter_remote_param.as_deref() {
            if !param.is_empty() {
                return Some(param);
            }
        }
        if self.options.filter_remote == Some(true) || self.is_remote_address() {
            if self.data_address.is_empty() {
                return None;
            }
            return Some(&self.data_address);
        }
        None
    }

    /// Resolves the effective remote sort parameter, analogous to
    /// [`remote_filter_param`](Self::remote_filter_param).
    pub fn remote_sort_param(&self) -> Option<&str> {
        if self.options.sort_remote == Some(false) {
            return None;
        }
        if let Some(param) = self.options.sort_remote_param.as_deref() {
            if !param.is_empty() {
                return Some(param);
            }
        }
        if self.options.sort_remote == Some(true) || self.is_remote_address() {
            if self.data_address.is_empty() {
                return None;
            }
            return Some(&self.data_address);
        }
        None
    }

    /// Returns the data address used when writing this attribute in a
    /// create request body.
    pub fn create_address(&self) -> &str {
        self.options
            .create_data_address
            .as_deref()
            .unwrap_or(&self.data_address)
    }

    /// Returns the data address used when writing this attribute in an
    /// update request body.
    pub fn update_address(&self) -> &str {
        self.options
            .update_data_address
            .as_deref()
            .unwrap_or(&self.data_address)
    }

    /// An address is a true remote expression if it is non-empty and free of
    /// placeholder tokens (a placeholder address only makes sense in the
    /// endpoint, not as a filter parameter).
    fn is_remote_address(&self) -> bool {
        !self.data_address.is_empty() && !self.data_address.contains("[#")
    }
}

/// Per-entity configuration options with documented per-dialect defaults.
#[derive(Debug, Clone, Default)]
pub struct EntityOptions {
    /// Refuse to compile an unfiltered read query.
    pub force_filtering: bool,
    /// Path to the row data inside the response body.
    pub response_data_path: Option<String>,
    /// Path to the total row counter inside the response body.
    pub response_total_count_path: Option<String>,
    /// Path inside the request body at which CRUD values are placed.
    pub request_data_path: Option<String>,
    /// Name of the offset query parameter (dialect default otherwise).
    pub request_offset_param: Option<String>,
    /// Name of the limit query parameter (dialect default otherwise).
    pub request_limit_param: Option<String>,
    /// Name of the sort query parameter (generic REST only).
    pub request_sort_param: Option<String>,
    /// Dedicated endpoint for UID-scoped reads, e.g. `Orders([#uid#])`.
    pub uid_request_data_address: Option<String>,
    /// Request an inline total counter (`$inlinecount` / `$count`).
    pub inline_count: bool,
    /// GraphQL query (read) operation name.
    pub graphql_query_name: Option<String>,
    /// GraphQL mutation (write) operation name.
    pub graphql_mutation_name: Option<String>,
    /// CSS selector addressing one result row (HTML dialect).
    pub html_row_selector: Option<String>,
}

/// Describes a remote entity: base address, UID attribute and options.
#[derive(Debug, Clone)]
pub struct EntitySource {
    data_address: String,
    uid_alias: Option<String>,
    attributes: Vec<AttributeSource>,
    options: EntityOptions,
}

impl EntitySource {
    /// Creates a new entity descriptor for the given base address.
    ///
    /// The address may contain `[#placeholder#]` tokens which are resolved
    /// from filter values at compile time.
    pub fn new(data_address: impl Into<String>) -> Self {
        Self {
            data_address: data_address.into(),
            uid_alias: None,
            attributes: Vec::new(),
            options: EntityOptions::default(),
        }
    }

    /// Adds an attribute descriptor.
    pub fn with_attribute(mut self, attribute: AttributeSource) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Marks the attribute with the given alias as the UID attribute.
    pub fn with_uid(mut self, alias: impl Into<String>) -> Self {
        self.uid_alias = Some(alias.into());
        self
    }

    /// Sets the entity options.
    pub fn with_options(mut self, options: EntityOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the base data address.
    pub fn data_address(&self) -> &str {
        &self.data_address
    }

    /// Returns the entity options.
    pub fn options(&self) -> &EntityOptions {
        &self.options
    }

    /// Returns all attribute descriptors.
    pub fn attributes(&self) -> &[AttributeSource] {
        &self.attributes
    }

    /// Looks up an attribute by alias.
    pub fn attribute(&self, alias: &str) -> Option<&AttributeSource> {
        self.attributes.iter().find(|a| a.alias() == alias)
    }

    /// Returns the UID attribute, if one is declared.
    pub fn uid_attribute(&self) -> Option<&AttributeSource> {
        self.uid_alias.as_deref().and_then(|a| self.attribute(a))
    }

    /// Validates the descriptor. Called once at compiler construction.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.data_address.is_empty() {
            return Err(QueryError::InvalidSource(
                "entity data address must not be empty".into(),
            ));
        }
        if let Some(alias) = self.uid_alias.as_deref() {
            if self.attribute(alias).is_none() {
                return Err(QueryError::InvalidSource(format!(
                    "UID attribute \"{alias}\" is not among the entity's attributes"
                )));
            }
        }
        for address in [
            Some(self.data_address.as_str()),
            self.options.uid_request_data_address.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if address.matches("[#").count() != address.matches("#]").count() {
                return Err(QueryError::InvalidSource(format!(
                    "unbalanced placeholder tokens in address \"{address}\""
                )));
            }
        }
        for param in [
            self.options.request_offset_param.as_deref(),
            self.options.request_limit_param.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if param.is_empty() {
                return Err(QueryError::InvalidSource(
                    "pagination parameter names must not be empty when set".into(),
                ));
            }
        }
        Ok(())
    }
}

/// Lists the `[#name#]` placeholder tokens embedded in an address.
pub(crate) fn placeholders_in(address: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = address;
    while let Some(start) = rest.find("[#") {
        let tail = &rest[start + 2..];
        match tail.find("#]") {
            Some(end) => {
                names.push(tail[..end].to_string());
                rest = &tail[end + 2..];
            }
            None => break,
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_listing() {
        assert_eq!(placeholders_in("items/[#id#]"), vec!["id"]);
        assert_eq!(
            placeholders_in("a/[#x#]/b/[#y#]"),
            vec!["x".to_string(), "y".to_string()]
        );
        assert!(placeholders_in("plain/path").is_empty());
    }

    #[test]
    fn test_remote_filter_param_resolution() {
        let plain = AttributeSource::new("Status", "Status", DataType::String);
        assert_eq!(plain.remote_filter_param(), Some("Status"));

        let overridden = AttributeSource::new("Status", "Status", DataType::String)
            .with_options(AttributeOptions {
                filter_remote_param: Some("status_eq".into()),
                ..Default::default()
            });
        assert_eq!(overridden.remote_filter_param(), Some("status_eq"));

        let local_only = AttributeSource::new("Status", "Status", DataType::String)
            .with_options(AttributeOptions {
                filter_remote: Some(false),
                ..Default::default()
            });
        assert_eq!(local_only.remote_filter_param(), None);

        let placeholder = AttributeSource::new("Id", "items/[#id#]", DataType::Integer);
        assert_eq!(placeholder.remote_filter_param(), None);
    }

    #[test]
    fn test_validation_catches_unknown_uid() {
        let entity = EntitySource::new("Orders").with_uid("missing");
        assert!(matches!(
            entity.validate(),
            Err(QueryError::InvalidSource(_))
        ));
    }

    #[test]
    fn test_validation_catches_unbalanced_placeholders() {
        let entity = EntitySource::new("items/[#id");
        assert!(entity.validate().is_err());
    }
}
