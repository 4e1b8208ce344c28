//! Slot declarations for every node variant.
//!
//! A variant declares each child-bearing field by naming a variant set
//! (`"Expression"`, `"Statement"`, ...). Names stay unresolved until
//! [`TypeRegistry::fix_forward_slots`] runs once, after the whole taxonomy and
//! every set is known; this is what lets `Expression` and `Statement` refer to
//! each other.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use super::TreeError;
use super::node::{Node, NodeKind};
use crate::invariants::{assert_builtin_registry, missing_slot};

/// Allowed child kinds of one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KindSet {
    Forward(&'static str),
    Resolved(BTreeSet<NodeKind>),
}

/// Field holding the children a scope builder appends.
pub const BODY: &str = "body";
/// Pseudo-slot of the root scope.
pub const TOP_LEVEL: &str = "TopLevel";

const EXPRESSION: &[NodeKind] = &[
    NodeKind::Ident,
    NodeKind::Int,
    NodeKind::UInt,
    NodeKind::Float,
    NodeKind::Str,
    NodeKind::Member,
    NodeKind::Arrow,
    NodeKind::Subscript,
    NodeKind::Ref,
    NodeKind::Deref,
    NodeKind::Not,
    NodeKind::Binary,
    NodeKind::Ternary,
    NodeKind::Cast,
    NodeKind::Sizeof,
    NodeKind::OffsetOf,
    NodeKind::Call,
];

const AGGREGATE_INIT: &[NodeKind] = &[NodeKind::Array, NodeKind::Designated];

const STATEMENT: &[NodeKind] = &[
    NodeKind::Blank,
    NodeKind::Comment,
    NodeKind::Var,
    NodeKind::VarInit,
    NodeKind::Statement,
    NodeKind::Assign,
    NodeKind::Return,
    NodeKind::For,
    NodeKind::If,
];

const STRUCT_MEMBER: &[NodeKind] = &[
    NodeKind::Blank,
    NodeKind::Comment,
    NodeKind::Var,
    NodeKind::Struct,
];

const TOP_LEVEL_KINDS: &[NodeKind] = &[
    NodeKind::Blank,
    NodeKind::Comment,
    NodeKind::StdInclude,
    NodeKind::Include,
    NodeKind::Define,
    NodeKind::Ifndef,
    NodeKind::Endif,
    NodeKind::Var,
    NodeKind::VarInit,
    NodeKind::Typedef,
    NodeKind::Prototype,
    NodeKind::Struct,
    NodeKind::Function,
    NodeKind::Table,
    NodeKind::StructInit,
];

/// Child slots of each variant: `(field, variant set)`.
const SLOTS: &[(NodeKind, &str, &str)] = &[
    (NodeKind::Member, "base", "Expression"),
    (NodeKind::Arrow, "base", "Expression"),
    (NodeKind::Subscript, "base", "Expression"),
    (NodeKind::Subscript, "index", "Expression"),
    (NodeKind::Ref, "expr", "Expression"),
    (NodeKind::Deref, "expr", "Expression"),
    (NodeKind::Not, "expr", "Expression"),
    (NodeKind::Binary, "left", "Expression"),
    (NodeKind::Binary, "right", "Expression"),
    (NodeKind::Ternary, "cond", "Expression"),
    (NodeKind::Ternary, "then", "Expression"),
    (NodeKind::Ternary, "otherwise", "Expression"),
    (NodeKind::Cast, "expr", "Expression"),
    (NodeKind::Call, "args", "Expression"),
    (NodeKind::Array, "items", "Initializer"),
    (NodeKind::Designated, "fields", "Designator"),
    (NodeKind::FieldInit, "value", "Initializer"),
    (NodeKind::VarInit, "init", "Initializer"),
    (NodeKind::Prototype, "params", "Param"),
    (NodeKind::Statement, "expr", "Expression"),
    (NodeKind::Assign, "target", "Expression"),
    (NodeKind::Assign, "value", "Expression"),
    (NodeKind::Return, "expr", "Expression"),
    (NodeKind::Struct, BODY, "StructMember"),
    (NodeKind::Function, "params", "Param"),
    (NodeKind::Function, BODY, "Statement"),
    (NodeKind::For, "init", "Expression"),
    (NodeKind::For, "cond", "Expression"),
    (NodeKind::For, "step", "Expression"),
    (NodeKind::For, BODY, "Statement"),
    (NodeKind::If, "cond", "Expression"),
    (NodeKind::If, BODY, "Statement"),
    (NodeKind::Table, "rows", "Initializer"),
    (NodeKind::StructInit, "fields", "Designator"),
];

/// Variant sets and the slots that refer to them.
#[derive(Clone, Debug)]
pub struct TypeRegistry {
    sets: BTreeMap<&'static str, BTreeSet<NodeKind>>,
    slots: BTreeMap<(NodeKind, &'static str), KindSet>,
    top_level: KindSet,
    fixed: bool,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// The built-in taxonomy with every slot still a forward reference.
    pub fn new() -> Self {
        let mut registry = Self {
            sets: BTreeMap::new(),
            slots: BTreeMap::new(),
            top_level: KindSet::Forward(TOP_LEVEL),
            fixed: false,
        };
        for &(kind, field, set) in SLOTS {
            registry.declare_slot(kind, field, set);
        }

        let initializer = EXPRESSION.iter().chain(AGGREGATE_INIT).copied();
        registry.define_set("Expression", EXPRESSION.iter().copied());
        registry.define_set("Initializer", initializer);
        registry.define_set("Designator", [NodeKind::FieldInit]);
        registry.define_set("Param", [NodeKind::Param]);
        registry.define_set("Statement", STATEMENT.iter().copied());
        registry.define_set("StructMember", STRUCT_MEMBER.iter().copied());
        registry.define_set(TOP_LEVEL, TOP_LEVEL_KINDS.iter().copied());
        registry
    }

    /// The process-wide registry, resolved on first use and read-only after.
    pub fn builtin() -> &'static TypeRegistry {
        static BUILTIN: OnceLock<TypeRegistry> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let mut registry = TypeRegistry::new();
            assert_builtin_registry(registry.fix_forward_slots());
            registry
        })
    }

    pub fn define_set(&mut self, name: &'static str, kinds: impl IntoIterator<Item = NodeKind>) {
        self.sets.entry(name).or_default().extend(kinds);
    }

    pub fn declare_slot(&mut self, kind: NodeKind, field: &'static str, set: &'static str) {
        self.slots.insert((kind, field), KindSet::Forward(set));
    }

    /// Resolve every forward slot against the defined sets. Runs once.
    pub fn fix_forward_slots(&mut self) -> Result<(), TreeError> {
        if self.fixed {
            return Err(TreeError::SlotsAlreadyFixed);
        }
        let resolve = |slot: &KindSet| -> Result<KindSet, TreeError> {
            match slot {
                KindSet::Forward(name) => self
                    .sets
                    .get(name)
                    .cloned()
                    .map(KindSet::Resolved)
                    .ok_or_else(|| TreeError::UnknownVariantSet(name.to_string())),
                resolved => Ok(resolved.clone()),
            }
        };

        let mut slots = BTreeMap::new();
        for (key, slot) in &self.slots {
            slots.insert(*key, resolve(slot)?);
        }
        let top_level = resolve(&self.top_level)?;

        self.slots = slots;
        self.top_level = top_level;
        self.fixed = true;
        Ok(())
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    pub fn slot(&self, kind: NodeKind, field: &'static str) -> Option<&KindSet> {
        self.slots.get(&(kind, field))
    }

    /// Kinds a scope opened on `kind` accepts; `None` for the root scope.
    pub(crate) fn scope_slot(&self, kind: Option<NodeKind>) -> (NodeKind, &'static str, &KindSet) {
        match kind {
            Some(kind) => match self.slots.get(&(kind, BODY)) {
                Some(set) => (kind, BODY, set),
                None => missing_slot(kind, BODY),
            },
            None => (NodeKind::Blank, TOP_LEVEL, &self.top_level),
        }
    }

    /// Check `child` against one slot.
    pub fn check(
        &self,
        kind: NodeKind,
        field: &'static str,
        set: &KindSet,
        child: &Node,
    ) -> Result<(), TreeError> {
        match set {
            KindSet::Forward(_) => Err(TreeError::UnresolvedSlot { kind, field }),
            KindSet::Resolved(kinds) if kinds.contains(&child.kind()) => Ok(()),
            KindSet::Resolved(_) => Err(TreeError::FieldKindMismatch {
                kind,
                field,
                found: child.kind(),
            }),
        }
    }

    /// Check every child of `node`, recursively.
    pub fn validate(&self, node: &Node) -> Result<(), TreeError> {
        let kind = node.kind();
        for (field, child) in node.children() {
            let Some(set) = self.slots.get(&(kind, field)) else {
                missing_slot(kind, field);
            };
            self.check(kind, field, set, child)?;
            self.validate(child)?;
        }
        Ok(())
    }
}
