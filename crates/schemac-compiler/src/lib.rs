//! schemac compiler: schema lowering, code tree, and C generation.
//!
//! This crate turns a sealed [`schemac_core::Schema`] into generated C:
//! - `lower` - assigns stable table indices and storage paths (the Layout)
//! - `codetree` - generic node tree, deferred scope builder, and renderer
//! - `cgen` - descriptor tables, printer/defaults functions, option tables

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod cgen;
pub mod codetree;
mod invariants;
pub mod lower;

#[cfg(test)]
mod test_utils;

use schemac_core::{Ident, SchemaError, SchemaPath, SourcePos};

pub use cgen::{Config, check, generate, generate_header};
pub use codetree::TreeError;
pub use lower::{Layout, lower};

/// Errors that can occur while compiling a schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A `NamedType` (or an inheritance base) names a type that was never registered.
    #[error("{path}{}: unresolved type reference `{name}`", at(.pos))]
    UnresolvedTypeReference {
        name: Ident,
        path: SchemaPath,
        pos: Option<SourcePos>,
    },

    /// A schema shape with no lowering or synthesis rule.
    #[error("{path}{}: unsupported schema shape: {reason}", at(.pos))]
    UnsupportedSchemaShape {
        path: SchemaPath,
        pos: Option<SourcePos>,
        reason: String,
    },

    /// Misuse of the code tree; a defect in the generator, not bad input.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

fn at(pos: &Option<SourcePos>) -> String {
    pos.map(|p| format!(" ({p})")).unwrap_or_default()
}

impl Error {
    pub(crate) fn unsupported(
        path: &SchemaPath,
        pos: Option<SourcePos>,
        reason: impl Into<String>,
    ) -> Self {
        Error::UnsupportedSchemaShape {
            path: path.clone(),
            pos,
            reason: reason.into(),
        }
    }
}

/// Result type for compiler operations.
pub type Result<T> = std::result::Result<T, Error>;
