//! Target-agnostic code tree.
//!
//! - `node` - the closed node taxonomy and per-variant templates
//! - `registry` - forward slots and their one-time resolution
//! - `builder` - deferred, nested scope population
//! - `render` - indented text output

mod builder;
mod node;
mod registry;
mod render;

#[cfg(test)]
mod render_tests;

pub use builder::{Ast, ScopeBuilder};
pub use node::{Dim, FieldValue, Node, NodeKind, Row, Storage, Template, declarator, float_literal};
pub use registry::{KindSet, TypeRegistry};
pub use render::Renderer;

/// Misuse of the code tree. Always a generator defect, never bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("scope builder finalized twice")]
    AlreadyFinalized,

    #[error("{kind:?}.{field} is still a forward slot")]
    UnresolvedSlot { kind: NodeKind, field: &'static str },

    #[error("no variant set named `{0}`")]
    UnknownVariantSet(String),

    #[error("forward slots were already fixed")]
    SlotsAlreadyFixed,

    #[error("{kind:?}.{field} does not accept {found:?}")]
    FieldKindMismatch {
        kind: NodeKind,
        field: &'static str,
        found: NodeKind,
    },
}
