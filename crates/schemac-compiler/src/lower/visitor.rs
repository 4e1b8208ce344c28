//! The lowering visitor.
//!
//! Walks the schema depth-first, children before their own descriptor, and
//! appends to the per-kind tables of a [`Layout`]. Named types are lowered
//! lazily at their first use site; types nobody references are lowered after
//! the root walk, in declaration order.

use std::collections::HashSet;

use schemac_core::{
    CompositeSpec, Ident, NodeMeta, Schema, SchemaError, SchemaPath, Segment, SourcePos, Spec,
    SpecKind, TypeDef,
};
use tracing::{debug, trace};

use super::layout::{
    Aggregate, AggregateBody, AggregateKind, DescData, DescRef, Descriptor, FieldPath, Layout,
    TableKind, TagEntry, TransitionEntry,
};
use crate::{Error, Result};

const MAIN: &str = "main";

/// Lower a sealed schema into its Layout.
pub fn lower(schema: &Schema) -> Result<Layout> {
    Lowerer::new(schema)?.run()
}

type Members<'s> = Vec<(&'s str, &'s Ident, &'s Spec)>;

struct Lowerer<'s> {
    schema: &'s Schema,
    layout: Layout,
    /// Named types entered so far, including those still being lowered.
    types: HashSet<Ident>,
    /// Types being lowered since the last array or mapping boundary.
    by_value: Vec<Ident>,
    used_names: HashSet<String>,
    key: Ident,
    value: Ident,
}

impl<'s> Lowerer<'s> {
    fn new(schema: &'s Schema) -> Result<Self> {
        Ok(Self {
            schema,
            layout: Layout::default(),
            types: HashSet::new(),
            by_value: Vec::new(),
            used_names: HashSet::new(),
            key: Ident::new("key")?,
            value: Ident::new("value")?,
        })
    }

    fn run(mut self) -> Result<Layout> {
        self.used_names.insert(MAIN.to_string());
        for type_def in self.schema.types() {
            if type_def.name().as_str() == MAIN {
                return Err(Error::unsupported(
                    &SchemaPath::type_def(type_def.name()),
                    type_def.pos(),
                    "type name `main` is reserved for the schema root",
                ));
            }
            self.used_names.insert(type_def.name().to_string());
        }

        let main = self.begin_aggregate(MAIN.to_string(), AggregateKind::Main);
        let members: Members<'s> = self.schema.root().keyed_members().collect();
        let root = self.lower_group(
            &members,
            &SchemaPath::root(),
            FieldPath::new(MAIN),
            &NodeMeta::default(),
        )?;
        self.finish_aggregate(main, AggregateBody::Group(root));
        self.layout.root = Some(root);
        self.reverse_root_walk_groups();

        for type_def in self.schema.types() {
            if !self.types.contains(type_def.name()) {
                let path = SchemaPath::type_def(type_def.name());
                self.lower_usertype(type_def.name(), &path, type_def.pos())?;
            }
        }

        debug!(
            groups = self.layout.len(TableKind::Group),
            transitions = self.layout.len(TableKind::Transition),
            usertypes = self.layout.len(TableKind::Usertype),
            aggregates = self.layout.aggregates.len(),
            bound = self.layout.bound.len(),
            "lowered schema"
        );
        Ok(self.layout)
    }

    fn lower_spec(&mut self, spec: &'s Spec, path: &SchemaPath, field: FieldPath) -> Result<DescRef> {
        let meta = spec.meta();
        match spec.kind() {
            SpecKind::Scalar(scalar) => Ok(self.push(
                TableKind::from_scalar(scalar.kind()),
                path,
                field,
                meta,
                DescData::Scalar(scalar.clone()),
            )),
            SpecKind::Composite(CompositeSpec::Group(group)) => {
                let members: Members<'s> = group.keyed_members().collect();
                self.lower_group(&members, path, field, meta)
            }
            SpecKind::Composite(CompositeSpec::Array(element)) => {
                let aggregate = self.unique_name(&format!("{}_a", path.mangle()));
                let slot = self.begin_aggregate(aggregate.clone(), AggregateKind::ArrayElement);
                let element_field = FieldPath::new(&aggregate).member(&self.value);
                let element_path = path.child(Segment::Element);
                let element = self
                    .behind_pointer(|this| this.lower_spec(element, &element_path, element_field))?;
                self.finish_aggregate(slot, AggregateBody::Element(element));
                Ok(self.push(
                    TableKind::Array,
                    path,
                    field,
                    meta,
                    DescData::Array { element, aggregate },
                ))
            }
            SpecKind::Composite(CompositeSpec::Mapping { key, value }) => {
                let aggregate = self.unique_name(&format!("{}_m", path.mangle()));
                let slot = self.begin_aggregate(aggregate.clone(), AggregateKind::MappingElement);
                let key_field = FieldPath::new(&aggregate).member(&self.key);
                let value_field = FieldPath::new(&aggregate).member(&self.value);
                let (key, value) = self.behind_pointer(|this| {
                    let key = this.lower_spec(key, &path.child(Segment::Key), key_field)?;
                    let value = this.lower_spec(value, &path.child(Segment::Value), value_field)?;
                    Ok((key, value))
                })?;
                self.finish_aggregate(slot, AggregateBody::Entry { key, value });
                Ok(self.push(
                    TableKind::Mapping,
                    path,
                    field,
                    meta,
                    DescData::Mapping {
                        key,
                        value,
                        aggregate,
                    },
                ))
            }
            SpecKind::Composite(CompositeSpec::NamedType(name)) => {
                self.lower_usertype(name, path, spec.pos())?;
                Ok(self.push(
                    TableKind::Custom,
                    path,
                    field,
                    meta,
                    DescData::Custom {
                        type_name: name.clone(),
                    },
                ))
            }
        }
    }

    /// Members first, then their transition run and its sentinel, then the
    /// group descriptor itself.
    fn lower_group(
        &mut self,
        members: &[(&'s str, &'s Ident, &'s Spec)],
        path: &SchemaPath,
        field: FieldPath,
        meta: &NodeMeta,
    ) -> Result<DescRef> {
        let mut entries = Vec::with_capacity(members.len() + 1);
        for &(key, name, spec) in members {
            let member_path = path.member(name);
            let target = self.lower_spec(spec, &member_path, field.member(name))?;
            entries.push(Some(TransitionEntry {
                symbol: key.to_string(),
                name: name.clone(),
                target,
                path: member_path,
                pos: spec.pos(),
            }));
        }

        let transitions = if entries.is_empty() {
            None
        } else {
            let first = self.layout.transitions.len();
            entries.push(None);
            self.layout.transitions.extend(entries);
            Some(first)
        };
        Ok(self.push(
            TableKind::Group,
            path,
            field,
            meta,
            DescData::Group { transitions },
        ))
    }

    fn lower_usertype(
        &mut self,
        name: &Ident,
        use_path: &SchemaPath,
        pos: Option<SourcePos>,
    ) -> Result<()> {
        if self.by_value.contains(name) {
            return Err(Error::unsupported(
                use_path,
                pos,
                format!("type `{name}` embeds itself by value"),
            ));
        }
        if self.types.contains(name) {
            return Ok(());
        }
        let Some(type_def) = self.schema.resolve(name.as_str()) else {
            return Err(Error::UnresolvedTypeReference {
                name: name.clone(),
                path: use_path.clone(),
                pos,
            });
        };

        self.types.insert(name.clone());
        self.by_value.push(name.clone());
        let result = self.lower_type_def(type_def);
        self.by_value.pop();
        result
    }

    fn lower_type_def(&mut self, type_def: &'s TypeDef) -> Result<()> {
        let name = type_def.name();
        let path = SchemaPath::type_def(name);
        let slot = self.begin_aggregate(name.to_string(), AggregateKind::TypeDef(name.clone()));

        let members = self.effective_members(type_def, &path)?;
        if let Some(tag) = type_def.tag()
            && !members.iter().any(|(_, member, _)| *member == tag)
        {
            return Err(Error::unsupported(
                &path,
                type_def.pos(),
                format!("tag member `{tag}` is not a member of `{name}`"),
            ));
        }
        if type_def.tag().is_none() && type_def.tag_values().next().is_some() {
            return Err(Error::unsupported(
                &path,
                type_def.pos(),
                "tag values given without a tag member",
            ));
        }

        let meta = NodeMeta {
            pos: type_def.pos(),
            ..NodeMeta::default()
        };
        let group = self.lower_group(&members, &path, FieldPath::new(name.as_str()), &meta)?;
        let tags = self.push_tags(type_def);
        let usertype = self.push(
            TableKind::Usertype,
            &path,
            FieldPath::new(name.as_str()),
            &meta,
            DescData::Usertype {
                name: name.clone(),
                group,
                tags,
                tag_member: type_def.tag().cloned(),
            },
        );
        self.layout.usertypes.insert(name.clone(), usertype);
        self.finish_aggregate(slot, AggregateBody::Group(group));
        debug!(type_name = %name, members = members.len(), "lowered type");
        Ok(())
    }

    /// Base members first, then the type's own.
    fn effective_members(&self, type_def: &'s TypeDef, path: &SchemaPath) -> Result<Members<'s>> {
        let mut lineage = vec![type_def];
        let mut seen = HashSet::from([type_def.name()]);
        let mut current = type_def;
        while let Some(base) = current.inherits() {
            let Some(base_def) = self.schema.resolve(base.as_str()) else {
                return Err(Error::UnresolvedTypeReference {
                    name: base.clone(),
                    path: SchemaPath::type_def(current.name()),
                    pos: current.pos(),
                });
            };
            if !seen.insert(base_def.name()) {
                return Err(Error::unsupported(
                    path,
                    type_def.pos(),
                    format!("inheritance cycle through `{base}`"),
                ));
            }
            lineage.push(base_def);
            current = base_def;
        }

        let mut members: Members<'s> = Vec::new();
        for &def in lineage.iter().rev() {
            for (key, name, spec) in def.members().keyed_members() {
                if members.iter().any(|(_, existing, _)| *existing == name) {
                    return Err(SchemaError::At {
                        path: path.member(name).to_string(),
                        source: Box::new(SchemaError::DuplicateMember(name.clone())),
                    }
                    .into());
                }
                members.push((key, name, spec));
            }
        }
        Ok(members)
    }

    fn push_tags(&mut self, type_def: &TypeDef) -> Option<usize> {
        let mut values = type_def.tag_values().peekable();
        values.peek()?;
        let first = self.layout.tags.len();
        self.layout.tags.extend(values.map(|(name, value)| {
            Some(TagEntry {
                name: name.clone(),
                value,
            })
        }));
        self.layout.tags.push(None);
        Some(first)
    }

    fn push(
        &mut self,
        kind: TableKind,
        path: &SchemaPath,
        field: FieldPath,
        meta: &NodeMeta,
        data: DescData,
    ) -> DescRef {
        let table = self.layout.tables.entry(kind).or_default();
        let index = table.len();
        table.push(Descriptor {
            index,
            path: path.clone(),
            pos: meta.pos,
            field,
            description: meta.description.clone(),
            binding: meta.binding.clone(),
            data,
        });
        let r = DescRef::new(kind, index);
        if !meta.binding.is_empty() {
            self.layout.bound.push(r);
        }
        trace!(?kind, index, path = %path, "descriptor");
        r
    }

    /// Run `f` with the by-value chain cleared: array and mapping elements are
    /// reached through a pointer, so recursion through them is allowed.
    fn behind_pointer<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = std::mem::take(&mut self.by_value);
        let result = f(self);
        self.by_value = saved;
        result
    }

    fn begin_aggregate(&mut self, name: String, kind: AggregateKind) -> usize {
        let aggregate = Aggregate {
            name: name.clone(),
            kind,
            body: None,
        };
        self.layout.aggregates.insert_full(name, aggregate).0
    }

    fn finish_aggregate(&mut self, slot: usize, body: AggregateBody) {
        if let Some((_, aggregate)) = self.layout.aggregates.get_index_mut(slot) {
            aggregate.body = Some(body);
        }
    }

    fn unique_name(&mut self, base: &str) -> String {
        if self.used_names.insert(base.to_string()) {
            return base.to_string();
        }

        let mut counter = 2;
        loop {
            let name = format!("{base}{counter}");
            if self.used_names.insert(name.clone()) {
                return name;
            }
            counter += 1;
        }
    }

    /// The root walk appends groups children-first, so the root lands last.
    /// Reverse that run so the root is at index 0 and remap every reference.
    fn reverse_root_walk_groups(&mut self) {
        let Some(groups) = self.layout.tables.get_mut(&TableKind::Group) else {
            return;
        };
        groups.reverse();
        for (index, group) in groups.iter_mut().enumerate() {
            group.index = index;
        }
        let n = groups.len();
        let flip = |r: &mut DescRef| {
            if r.kind == TableKind::Group && r.index < n {
                r.index = n - 1 - r.index;
            }
        };

        for entry in self.layout.transitions.iter_mut().flatten() {
            flip(&mut entry.target);
        }
        for descriptor in self.layout.tables.values_mut().flatten() {
            match &mut descriptor.data {
                DescData::Array { element, .. } => flip(element),
                DescData::Mapping { key, value, .. } => {
                    flip(key);
                    flip(value);
                }
                DescData::Usertype { group, .. } => flip(group),
                DescData::Scalar(_) | DescData::Group { .. } | DescData::Custom { .. } => {}
            }
        }
        for aggregate in self.layout.aggregates.values_mut() {
            match &mut aggregate.body {
                Some(AggregateBody::Group(r) | AggregateBody::Element(r)) => flip(r),
                Some(AggregateBody::Entry { key, value }) => {
                    flip(key);
                    flip(value);
                }
                None => {}
            }
        }
        for r in &mut self.layout.bound {
            flip(r);
        }
        if let Some(root) = &mut self.layout.root {
            flip(root);
        }
    }
}
