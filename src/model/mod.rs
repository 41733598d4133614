//! Entity and attribute descriptors plus the dynamic value model.
//!
//! The engine never talks to a metamodel directly: callers describe the
//! remote entity with an [`EntitySource`] (base address, UID attribute,
//! typed options) and its fields with [`AttributeSource`]s. Everything the
//! translation needs is read from these descriptors.

mod source;
mod value;

pub(crate) use source::placeholders_in;
pub use source::AttributeOptions;
pub use source::AttributeSource;
pub use source::DataType;
pub use source::EntityOptions;
pub use source::EntitySource;
pub use value::Value;
