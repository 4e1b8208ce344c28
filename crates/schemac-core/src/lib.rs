#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Schema model for schemac.
//!
//! - `schema` - groups, arrays, mappings and named types
//! - `scalar` - leaf value kinds with defaults, bounds and path checks
//! - `binding` - command-line options and environment variables
//! - `path` - locating a node relative to the schema root
//! - `document` - loading schemas from JSON documents

mod binding;
mod document;
mod ident;
mod path;
mod scalar;
mod schema;
pub mod utils;

#[cfg(test)]
mod binding_tests;
#[cfg(test)]
mod document_tests;
#[cfg(test)]
mod ident_tests;

pub use binding::{Binding, CliOption, OptionClass};
pub use document::{load_str, load_value};
pub use ident::{Ident, SourcePos};
pub use path::{SchemaPath, Segment};
pub use scalar::{Literal, PathChecks, ScalarKind, ScalarSpec};
pub use schema::{
    CompositeSpec, Group, NodeMeta, Schema, SchemaBuilder, SchemaMeta, Spec, SpecKind, TypeDef,
};

/// Errors raised while building or loading a schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("`{0}` is not a valid identifier")]
    InvalidIdentifier(String),

    #[error("type `{0}` is defined more than once")]
    DuplicateType(Ident),

    #[error("member `{0}` is defined more than once")]
    DuplicateMember(Ident),

    /// An attribute that the scalar kind does not support, or a literal of
    /// the wrong shape for it.
    #[error("attribute `{attribute}` is not valid for {kind}")]
    AttributeMismatch {
        kind: ScalarKind,
        attribute: &'static str,
    },

    #[error("invalid command-line binding `{0}`")]
    InvalidBinding(String),

    #[error("malformed schema document: {0}")]
    Syntax(String),

    #[error("{path}: {message}")]
    Document { path: String, message: String },

    #[error("{path}: {source}")]
    At {
        path: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// The innermost error, with path context stripped.
    pub fn root_cause(&self) -> &SchemaError {
        match self {
            SchemaError::At { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
