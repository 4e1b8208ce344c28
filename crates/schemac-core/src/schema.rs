//! The typed schema model.
//!
//! A [`Schema`] is assembled through [`SchemaBuilder`], which validates type
//! registration, and is immutable afterwards. Consumers only traverse it:
//! ordered iteration over group members and resolution of named types.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::{Binding, Ident, ScalarSpec, SchemaError, SourcePos};

/// Metadata every node may carry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeMeta {
    pub description: Option<String>,
    pub binding: Binding,
    pub pos: Option<SourcePos>,
}

/// One node of the schema tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Spec {
    kind: SpecKind,
    meta: NodeMeta,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SpecKind {
    Scalar(ScalarSpec),
    Composite(CompositeSpec),
}

#[derive(Clone, Debug, PartialEq)]
pub enum CompositeSpec {
    Group(Group),
    Array(Box<Spec>),
    Mapping { key: Box<Spec>, value: Box<Spec> },
    /// Reference to a [`TypeDef`] by name, resolved against the schema.
    NamedType(Ident),
}

impl Spec {
    fn with_kind(kind: SpecKind) -> Self {
        Self {
            kind,
            meta: NodeMeta::default(),
        }
    }

    pub fn scalar(spec: ScalarSpec) -> Self {
        Self::with_kind(SpecKind::Scalar(spec))
    }

    pub fn group(group: Group) -> Self {
        Self::with_kind(SpecKind::Composite(CompositeSpec::Group(group)))
    }

    pub fn array(element: Spec) -> Self {
        Self::with_kind(SpecKind::Composite(CompositeSpec::Array(Box::new(element))))
    }

    pub fn mapping(key: Spec, value: Spec) -> Self {
        Self::with_kind(SpecKind::Composite(CompositeSpec::Mapping {
            key: Box::new(key),
            value: Box::new(value),
        }))
    }

    pub fn named(type_name: Ident) -> Self {
        Self::with_kind(SpecKind::Composite(CompositeSpec::NamedType(type_name)))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.meta.description = Some(description.into());
        self
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.meta.binding = binding;
        self
    }

    pub fn with_pos(mut self, pos: SourcePos) -> Self {
        self.meta.pos = Some(pos);
        self
    }

    pub fn kind(&self) -> &SpecKind {
        &self.kind
    }

    pub fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    pub fn pos(&self) -> Option<SourcePos> {
        self.meta.pos
    }

    pub fn as_scalar(&self) -> Option<&ScalarSpec> {
        match &self.kind {
            SpecKind::Scalar(s) => Some(s),
            SpecKind::Composite(_) => None,
        }
    }
}

/// Ordered mapping of member name to member spec.
///
/// Declaration order is preserved; it becomes the emitted table order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Group {
    members: IndexMap<Ident, Spec>,
    /// Document keys that differ from their member name (`log-level`).
    keys: IndexMap<Ident, String>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: Ident, spec: Spec) -> Result<(), SchemaError> {
        if self.members.contains_key(&name) {
            return Err(SchemaError::DuplicateMember(name));
        }
        self.members.insert(name, spec);
        Ok(())
    }

    /// Insert a member whose document key is not a valid C name.
    ///
    /// `name` is the storage name; `key` is what configuration files and
    /// printed configurations use.
    pub fn insert_keyed(&mut self, key: &str, name: Ident, spec: Spec) -> Result<(), SchemaError> {
        let renamed = key != name.as_str();
        self.insert(name.clone(), spec)?;
        if renamed {
            self.keys.insert(name, key.to_string());
        }
        Ok(())
    }

    /// Document key of member `name`.
    pub fn key<'a>(&'a self, name: &'a str) -> &'a str {
        self.keys.get(name).map_or(name, String::as_str)
    }

    /// Builder form of [`Group::insert`].
    pub fn with(mut self, name: &str, spec: Spec) -> Result<Self, SchemaError> {
        self.insert(Ident::new(name)?, spec)?;
        Ok(self)
    }

    pub fn members(&self) -> impl Iterator<Item = (&Ident, &Spec)> {
        self.members.iter()
    }

    /// Members with their document keys, in declaration order.
    pub fn keyed_members(&self) -> impl Iterator<Item = (&str, &Ident, &Spec)> {
        self.members
            .iter()
            .map(move |(name, spec)| (self.key(name.as_str()), name, spec))
    }

    pub fn get(&self, name: &str) -> Option<&Spec> {
        self.members.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A named, reusable composite definition.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDef {
    name: Ident,
    members: Group,
    inherits: Option<Ident>,
    tag: Option<Ident>,
    tag_values: IndexMap<Ident, i64>,
    pos: Option<SourcePos>,
}

impl TypeDef {
    pub fn new(name: Ident, members: Group) -> Self {
        Self {
            name,
            members,
            inherits: None,
            tag: None,
            tag_values: IndexMap::new(),
            pos: None,
        }
    }

    pub fn with_inherits(mut self, base: Ident) -> Self {
        self.inherits = Some(base);
        self
    }

    /// Name the member whose value selects among tagged variants.
    pub fn with_tag(mut self, member: Ident) -> Self {
        self.tag = Some(member);
        self
    }

    pub fn with_tag_value(mut self, name: Ident, value: i64) -> Result<Self, SchemaError> {
        if self.tag_values.contains_key(&name) {
            return Err(SchemaError::DuplicateMember(name));
        }
        self.tag_values.insert(name, value);
        Ok(self)
    }

    pub fn with_pos(mut self, pos: SourcePos) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn name(&self) -> &Ident {
        &self.name
    }

    pub fn members(&self) -> &Group {
        &self.members
    }

    pub fn inherits(&self) -> Option<&Ident> {
        self.inherits.as_ref()
    }

    pub fn tag(&self) -> Option<&Ident> {
        self.tag.as_ref()
    }

    pub fn tag_values(&self) -> impl Iterator<Item = (&Ident, i64)> {
        self.tag_values.iter().map(|(k, &v)| (k, v))
    }

    pub fn pos(&self) -> Option<SourcePos> {
        self.pos
    }
}

/// Program-level metadata from the reserved `__meta__` key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaMeta {
    pub program_name: String,
    pub description: String,
    pub default_config: String,
}

/// A sealed schema: root group, registered types and metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    meta: SchemaMeta,
    types: IndexMap<Ident, TypeDef>,
    root: Group,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn meta(&self) -> &SchemaMeta {
        &self.meta
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Registered types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    pub fn resolve(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }
}

/// Accumulates types and the root group, then seals them into a [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    meta: SchemaMeta,
    types: IndexMap<Ident, TypeDef>,
    root: Group,
}

impl SchemaBuilder {
    pub fn meta(mut self, meta: SchemaMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn root(mut self, root: Group) -> Self {
        self.root = root;
        self
    }

    /// Register a type definition; names must be unique.
    pub fn add_type(&mut self, type_def: TypeDef) -> Result<(), SchemaError> {
        if self.types.contains_key(type_def.name()) {
            return Err(SchemaError::DuplicateType(type_def.name().clone()));
        }
        self.types.insert(type_def.name().clone(), type_def);
        Ok(())
    }

    /// Builder form of [`SchemaBuilder::add_type`].
    pub fn with_type(mut self, type_def: TypeDef) -> Result<Self, SchemaError> {
        self.add_type(type_def)?;
        Ok(self)
    }

    pub fn build(self) -> Schema {
        Schema {
            meta: self.meta,
            types: self.types,
            root: self.root,
        }
    }
}
