//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use crate::codetree::NodeKind;
use crate::lower::DescRef;

#[inline]
pub fn assert_scope_open(finalized: bool) {
    assert!(
        !finalized,
        "scope builder: append after finalize (generator must not reuse a closed scope)"
    );
}

#[inline]
pub fn ensure_block_body<T>(body: Option<T>, kind: NodeKind) -> T {
    body.unwrap_or_else(|| panic!("scope builder: {kind:?} is not a block node and cannot be opened"))
}

#[inline]
pub fn unknown_template_field(kind: NodeKind, field: &str) -> ! {
    panic!("render: template of {kind:?} names field `{field}` which the variant does not have")
}

#[inline]
pub fn not_inline(kind: NodeKind) -> ! {
    panic!("render: {kind:?} is a line or block node and cannot appear inside an expression")
}

#[inline]
pub fn missing_slot(kind: NodeKind, field: &str) -> ! {
    panic!("type registry: {kind:?} has child field `{field}` with no declared slot")
}

#[inline]
pub fn ensure_descriptor<T>(descriptor: Option<T>, r: DescRef) -> T {
    descriptor.unwrap_or_else(|| {
        panic!(
            "layout: no descriptor at {:?}[{}] (lowering hands out only valid refs)",
            r.kind, r.index
        )
    })
}

#[inline]
pub fn ensure_aggregate_finished<T>(body: Option<T>, name: &str) -> T {
    body.unwrap_or_else(|| panic!("layout: aggregate `{name}` was never finished"))
}

#[inline]
pub fn ensure_transition<T>(entry: Option<T>, index: usize) -> T {
    entry.unwrap_or_else(|| {
        panic!("layout: transition {index} is a sentinel where a member was expected")
    })
}

#[inline]
pub fn assert_builtin_registry(result: Result<(), crate::TreeError>) {
    if let Err(e) = result {
        panic!("builtin type registry failed to resolve its forward slots: {e}");
    }
}

#[inline]
pub fn ensure_aggregate<T>(aggregate: Option<T>, name: &str) -> T {
    aggregate.unwrap_or_else(|| panic!("layout: no aggregate named `{name}`"))
}

#[inline]
pub fn ensure_member<T>(last: Option<T>, owner: &str) -> T {
    last.unwrap_or_else(|| {
        panic!("layout: list storage at the root of `{owner}` (lists always live in a member)")
    })
}
