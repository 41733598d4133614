//! Error types

/// Errors raised while compiling a query into a request.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A comparator has no mapping in the target dialect's grammar.
    #[error("Comparator {comparator} is not supported by the {dialect} dialect")]
    UnsupportedComparator {
        /// The offending comparator, e.g. `IN`.
        comparator: String,
        /// The dialect that rejected it.
        dialect: &'static str,
    },

    /// A logical group operator has no mapping in the target dialect.
    #[error("Filter group operator {operator} is not supported by the {dialect} dialect")]
    UnsupportedGroupOperator {
        /// The offending operator, e.g. `XOR`.
        operator: String,
        /// The dialect that rejected it.
        dialect: &'static str,
    },

    /// A required configuration value is absent from the entity description.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// The entity description itself is inconsistent.
    #[error("Invalid entity source: {0}")]
    InvalidSource(String),

    /// A filter value could not be encoded for the wire.
    #[error("Cannot encode value for condition \"{condition}\": {message}")]
    ValueEncoding {
        /// Human-readable rendering of the offending condition.
        condition: String,
        /// What went wrong.
        message: String,
    },
}

impl QueryError {
    /// Creates an unsupported-comparator error.
    pub fn unsupported_comparator(comparator: impl ToString, dialect: &'static str) -> Self {
        Self::UnsupportedComparator {
            comparator: comparator.to_string(),
            dialect,
        }
    }

    /// Creates an unsupported-group-operator error.
    pub fn unsupported_operator(operator: impl ToString, dialect: &'static str) -> Self {
        Self::UnsupportedGroupOperator {
            operator: operator.to_string(),
            dialect,
        }
    }

    /// Creates a missing-configuration error.
    pub fn missing_config(message: impl Into<String>) -> Self {
        Self::MissingConfig(message.into())
    }

    /// Creates a value-encoding error naming the offending condition.
    pub fn value_encoding(condition: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValueEncoding {
            condition: condition.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while decoding a response body into rows.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The response body could not be parsed at all.
    #[error("Response parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },

    /// The configured data path does not resolve to rows.
    #[error("No row data found at path \"{0}\"")]
    PathNotFound(String),

    /// Batch sub-responses are treated as atomic and are not parsed
    /// individually.
    #[error("Batch response not parsed; the batch is treated as atomic")]
    BatchResponseNotParsed,
}

impl ExtractError {
    /// Creates a new parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: None,
        }
    }

    /// Creates a new parse error carrying the raw response body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }
}

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Query compilation failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Response decoding failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The external transport reported a failure. Surfaced unchanged; the
    /// engine performs no retries or reinterpretation.
    #[error("Transport error: {0}")]
    Transport(String),
}
