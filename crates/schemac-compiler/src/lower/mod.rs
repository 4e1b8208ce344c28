//! Lowering: schema model to per-kind descriptor tables.

mod layout;
mod visitor;

#[cfg(test)]
mod visitor_tests;

pub use layout::{
    Aggregate, AggregateBody, AggregateKind, DescData, DescRef, Descriptor, FieldPath, Layout,
    TableKind, TagEntry, TransitionEntry,
};
pub use visitor::lower;
