//! Layout: flat, per-kind descriptor tables produced by lowering.
//!
//! Every table is insertion ordered and addressed by [`DescRef`]. Children are
//! referenced by index, never by pointer, so the Generator can emit them as
//! `&<prefix>_<Table>_vars[<index>]` without further bookkeeping.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use schemac_core::{Binding, Ident, ScalarKind, ScalarSpec, SchemaPath, SourcePos};

use crate::invariants::{ensure_aggregate_finished, ensure_descriptor, ensure_transition};

/// One emitted table per kind, in emission order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKind {
    Int,
    UInt,
    Float,
    Bool,
    String,
    File,
    Dir,
    Array,
    Mapping,
    Custom,
    Usertype,
    Group,
    Tag,
    Transition,
}

impl TableKind {
    pub const ALL: [TableKind; 14] = [
        TableKind::Int,
        TableKind::UInt,
        TableKind::Float,
        TableKind::Bool,
        TableKind::String,
        TableKind::File,
        TableKind::Dir,
        TableKind::Array,
        TableKind::Mapping,
        TableKind::Custom,
        TableKind::Usertype,
        TableKind::Group,
        TableKind::Tag,
        TableKind::Transition,
    ];

    pub fn from_scalar(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Integer => TableKind::Int,
            ScalarKind::UnsignedInteger => TableKind::UInt,
            ScalarKind::Float => TableKind::Float,
            ScalarKind::Boolean => TableKind::Bool,
            ScalarKind::String => TableKind::String,
            ScalarKind::FilePath => TableKind::File,
            ScalarKind::DirectoryPath => TableKind::Dir,
        }
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            TableKind::Int
                | TableKind::UInt
                | TableKind::Float
                | TableKind::Bool
                | TableKind::String
                | TableKind::File
                | TableKind::Dir
        )
    }

    /// Name fragment of the emitted table and of the runtime callbacks.
    pub fn table_suffix(self) -> &'static str {
        match self {
            TableKind::Int => "CInt",
            TableKind::UInt => "CUInt",
            TableKind::Float => "CFloat",
            TableKind::Bool => "CBool",
            TableKind::String => "CString",
            TableKind::File => "CFile",
            TableKind::Dir => "CDir",
            TableKind::Array => "CArray",
            TableKind::Mapping => "CMapping",
            TableKind::Custom => "CCustom",
            TableKind::Usertype => "CUsertype",
            TableKind::Group => "CGroup",
            TableKind::Tag => "CTag",
            TableKind::Transition => "CTransition",
        }
    }

    /// Runtime struct type of one table row.
    pub fn row_type(self) -> &'static str {
        match self {
            TableKind::Int => "schemac_int_t",
            TableKind::UInt => "schemac_uint_t",
            TableKind::Float => "schemac_float_t",
            TableKind::Bool => "schemac_bool_t",
            TableKind::String => "schemac_string_t",
            TableKind::File => "schemac_file_t",
            TableKind::Dir => "schemac_dir_t",
            TableKind::Array => "schemac_array_t",
            TableKind::Mapping => "schemac_mapping_t",
            TableKind::Custom => "schemac_custom_t",
            TableKind::Usertype => "schemac_usertype_t",
            TableKind::Group => "schemac_group_t",
            TableKind::Tag => "schemac_tag_t",
            TableKind::Transition => "schemac_transition_t",
        }
    }
}

/// Address of a descriptor: its table and its position in that table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescRef {
    pub kind: TableKind,
    pub index: usize,
}

impl DescRef {
    pub fn new(kind: TableKind, index: usize) -> Self {
        Self { kind, index }
    }
}

/// Storage location of a value: owning aggregate plus member chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub owner: String,
    pub chain: Vec<Ident>,
}

impl FieldPath {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            chain: Vec::new(),
        }
    }

    pub fn member(&self, name: &Ident) -> Self {
        let mut chain = self.chain.clone();
        chain.push(name.clone());
        Self {
            owner: self.owner.clone(),
            chain,
        }
    }

    /// Dotted member chain, e.g. `server.port`; empty at the aggregate itself.
    pub fn dotted(&self) -> String {
        let parts: Vec<&str> = self.chain.iter().map(Ident::as_str).collect();
        parts.join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.chain.is_empty() {
            write!(f, "{}", self.owner)
        } else {
            write!(f, "{}::{}", self.owner, self.dotted())
        }
    }
}

/// Kind-specific payload of a descriptor.
#[derive(Clone, Debug, PartialEq)]
pub enum DescData {
    Scalar(ScalarSpec),
    /// First transition of this group's run, `None` for an empty group.
    Group { transitions: Option<usize> },
    Array { element: DescRef, aggregate: String },
    Mapping {
        key: DescRef,
        value: DescRef,
        aggregate: String,
    },
    /// A `NamedType` use site; the usertype is shared by all use sites.
    Custom { type_name: Ident },
    Usertype {
        name: Ident,
        group: DescRef,
        /// First tag of this type's run in the tag table.
        tags: Option<usize>,
        tag_member: Option<Ident>,
    },
}

/// One lowered schema node.
#[derive(Clone, Debug, PartialEq)]
pub struct Descriptor {
    pub index: usize,
    pub path: SchemaPath,
    pub pos: Option<SourcePos>,
    pub field: FieldPath,
    pub description: Option<String>,
    pub binding: Binding,
    pub data: DescData,
}

/// Named edge from a group to one of its members.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionEntry {
    /// Key matched in configuration files.
    pub symbol: String,
    /// Storage member in the owning struct.
    pub name: Ident,
    pub target: DescRef,
    pub path: SchemaPath,
    pub pos: Option<SourcePos>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagEntry {
    pub name: Ident,
    pub value: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AggregateKind {
    /// The schema root.
    Main,
    TypeDef(Ident),
    ArrayElement,
    MappingElement,
}

/// What an aggregate stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateBody {
    /// Root or type definition group.
    Group(DescRef),
    /// Array element: a list head followed by `value`.
    Element(DescRef),
    /// Mapping element: a list head followed by `key` and `value`.
    Entry { key: DescRef, value: DescRef },
}

/// A distinct generated struct type.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    pub name: String,
    pub kind: AggregateKind,
    pub(crate) body: Option<AggregateBody>,
}

impl Aggregate {
    pub fn body(&self) -> AggregateBody {
        ensure_aggregate_finished(self.body, &self.name)
    }

    pub fn is_element(&self) -> bool {
        matches!(
            self.kind,
            AggregateKind::ArrayElement | AggregateKind::MappingElement
        )
    }
}

/// Complete lowering result.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Layout {
    pub(crate) tables: BTreeMap<TableKind, Vec<Descriptor>>,
    pub(crate) transitions: Vec<Option<TransitionEntry>>,
    pub(crate) tags: Vec<Option<TagEntry>>,
    pub(crate) aggregates: IndexMap<String, Aggregate>,
    pub(crate) usertypes: IndexMap<Ident, DescRef>,
    pub(crate) bound: Vec<DescRef>,
    pub(crate) root: Option<DescRef>,
}

impl Layout {
    /// Descriptor table of `kind`; empty for Tag and Transition.
    pub fn table(&self, kind: TableKind) -> &[Descriptor] {
        self.tables.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn get(&self, r: DescRef) -> &Descriptor {
        ensure_descriptor(self.tables.get(&r.kind).and_then(|t| t.get(r.index)), r)
    }

    /// Number of rows the emitted table of `kind` has, sentinels included.
    pub fn len(&self, kind: TableKind) -> usize {
        match kind {
            TableKind::Transition => self.transitions.len(),
            TableKind::Tag => self.tags.len(),
            _ => self.table(kind).len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        TableKind::ALL.iter().all(|&k| self.len(k) == 0)
    }

    /// The root group descriptor.
    pub fn root(&self) -> DescRef {
        ensure_descriptor(self.root, DescRef::new(TableKind::Group, 0))
    }

    pub fn transitions(&self) -> &[Option<TransitionEntry>] {
        &self.transitions
    }

    pub fn tags(&self) -> &[Option<TagEntry>] {
        &self.tags
    }

    /// Members of a group, in declaration order.
    pub fn members(&self, group: DescRef) -> impl Iterator<Item = &TransitionEntry> {
        let start = match &self.get(group).data {
            DescData::Group { transitions } => *transitions,
            _ => None,
        };
        let run = start.map(|s| &self.transitions[s..]).unwrap_or_default();
        run.iter().map_while(Option::as_ref)
    }

    pub fn transition(&self, index: usize) -> &TransitionEntry {
        ensure_transition(self.transitions.get(index).and_then(Option::as_ref), index)
    }

    /// Aggregates in first-visit order; `main` is always first.
    pub fn aggregates(&self) -> impl Iterator<Item = &Aggregate> {
        self.aggregates.values()
    }

    pub fn aggregate(&self, name: &str) -> Option<&Aggregate> {
        self.aggregates.get(name)
    }

    /// Usertype descriptor for a type name.
    pub fn usertype(&self, name: &str) -> Option<DescRef> {
        self.usertypes.get(name).copied()
    }

    /// Usertype descriptors in the order their types were lowered.
    pub fn usertypes(&self) -> impl Iterator<Item = (&Ident, DescRef)> {
        self.usertypes.iter().map(|(n, &r)| (n, r))
    }

    /// Descriptors that carry a command-line or environment binding, in
    /// first-encounter order.
    pub fn bound(&self) -> &[DescRef] {
        &self.bound
    }
}
