//! Query translation engine for URL-based API dialects
//!
//! This crate compiles a dialect-neutral structured query (filter trees,
//! sorters, a pagination window, CRUD value rows) against a described entity
//! into concrete outbound HTTP requests for several URL-based API dialects,
//! and decodes the heterogeneous response bodies back into a uniform
//! sequence of rows.
//!
//! Supported dialects: generic JSON REST, OData v2 JSON, OData v4 JSON, a
//! legacy OData-JSON hybrid, GraphQL, XML and HTML scraping.
//!
//! The engine is sans-IO: it produces [`request::Request`] artifacts and
//! consumes [`request::Response`] bodies. Actually sending requests is the
//! job of a [`request::Transport`] implementation supplied by the caller.

pub mod batch;
pub mod build;
pub mod codec;
pub mod dialect;
pub mod error;
pub mod extract;
pub mod graphql;
pub mod html;
pub mod model;
pub mod paginate;
pub mod path;
pub mod query;
pub mod request;
pub mod translate;
pub mod xml;

pub use build::QueryCompiler;
pub use dialect::Dialect;
pub use error::Error;
pub use model::AttributeSource;
pub use model::EntitySource;
pub use model::Value;
pub use query::DataQuery;
pub use query::Filter;
pub use query::FilterGroup;
pub use request::CompiledQuery;
pub use request::ReadResult;
pub use request::Request;
pub use request::Response;
pub use request::Transport;
