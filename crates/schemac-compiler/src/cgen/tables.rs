//! Descriptor tables: one static array per table kind.

use schemac_core::{ScalarKind, ScalarSpec};

use super::generator::{Generator, fn_ref, literal};
use crate::codetree::{Node, Row, ScopeBuilder, Storage};
use crate::lower::{DescData, DescRef, Descriptor, TableKind};
use crate::{Error, Result};

const PLACEHOLDER: &str = "schemac_placeholder_t *";
const STATE_FUN: &str = "schemac_state_fun";
const DEFAULTS_FUN: &str = "schemac_defaults_fun";

impl Generator<'_> {
    pub(super) fn tables(&self, scope: &ScopeBuilder<'_>) -> Result<()> {
        for kind in TableKind::ALL {
            let rows = match kind {
                TableKind::Tag => self.tag_rows(),
                TableKind::Transition => self.transition_rows(),
                _ => self
                    .layout
                    .table(kind)
                    .iter()
                    .map(|d| self.descriptor_row(d).map(Some))
                    .collect::<Result<Vec<_>>>()?,
            };
            if rows.is_empty() {
                continue;
            }
            scope.append(Node::Blank)?;
            scope.append(Node::Table {
                storage: Storage::Static,
                ty: kind.row_type().to_string(),
                name: self.table_name(kind),
                rows,
            })?;
        }
        Ok(())
    }

    fn descriptor_row(&self, d: &Descriptor) -> Result<Row> {
        let mut fields = vec![Node::field_init("baseoffset", self.baseoffset(&d.field))];
        match &d.data {
            DescData::Scalar(spec) => scalar_fields(spec, &mut fields),
            DescData::Group { transitions } => {
                let transitions = transitions
                    .map(|i| self.table_ref(TableKind::Transition, i))
                    .unwrap_or_else(null);
                fields.push(Node::field_init("transitions", transitions));
            }
            DescData::Array { element, aggregate } => {
                fields.push(self.element_size(aggregate));
                fields.push(Node::field_init("element_prop", self.prop(*element)));
                fields.push(Node::field_init("element_callback", callback(*element)));
                fields.push(self.element_defaults(aggregate));
            }
            DescData::Mapping {
                key,
                value,
                aggregate,
            } => {
                fields.push(self.element_size(aggregate));
                fields.push(Node::field_init("key_prop", self.prop(*key)));
                fields.push(Node::field_init("value_prop", self.prop(*value)));
                fields.push(Node::field_init("key_callback", callback(*key)));
                fields.push(Node::field_init("value_callback", callback(*value)));
                fields.push(self.element_defaults(aggregate));
            }
            DescData::Custom { type_name } => {
                let usertype = self.layout.usertype(type_name.as_str()).ok_or_else(|| {
                    Error::UnresolvedTypeReference {
                        name: type_name.clone(),
                        path: d.path.clone(),
                        pos: d.pos,
                    }
                })?;
                fields.push(Node::field_init("usertype", self.row_ref(usertype)));
            }
            DescData::Usertype {
                name,
                group,
                tags,
                tag_member,
            } => {
                fields.push(Node::field_init("group", self.row_ref(*group)));
                let tags = tags
                    .map(|i| self.table_ref(TableKind::Tag, i))
                    .unwrap_or_else(null);
                fields.push(Node::field_init("tags", tags));
                if let Some(member) = tag_member {
                    fields.push(Node::field_init(
                        "tag_offset",
                        Node::OffsetOf {
                            ty: self.agg_type(name.as_str()),
                            member: member.to_string(),
                        },
                    ));
                }
                fields.push(Node::field_init(
                    "defaults",
                    fn_ref(DEFAULTS_FUN, &self.defaults_name(name.as_str())),
                ));
            }
        }
        let pos = d.pos.map(|p| p.to_string());
        Ok(Row::new(Node::Designated(fields), d.path.to_string()).with_pos(pos))
    }

    fn tag_rows(&self) -> Vec<Option<Row>> {
        self.layout
            .tags()
            .iter()
            .map(|entry| {
                entry.as_ref().map(|tag| {
                    let fields = vec![
                        Node::field_init("tagname", Node::str(tag.name.as_str())),
                        Node::field_init("tagvalue", Node::Int(tag.value)),
                    ];
                    Row::new(Node::Designated(fields), tag.name.as_str())
                })
            })
            .collect()
    }

    fn transition_rows(&self) -> Vec<Option<Row>> {
        self.layout
            .transitions()
            .iter()
            .map(|entry| {
                entry.as_ref().map(|t| {
                    let fields = vec![
                        Node::field_init("symbol", Node::str(t.symbol.as_str())),
                        Node::field_init("callback", callback(t.target)),
                        Node::field_init("prop", self.prop(t.target)),
                    ];
                    Row::new(Node::Designated(fields), t.path.to_string())
                        .with_pos(t.pos.map(|p| p.to_string()))
                })
            })
            .collect()
    }

    /// `(schemac_placeholder_t *)&<table>[i]`
    pub(super) fn prop(&self, r: DescRef) -> Node {
        Node::cast(PLACEHOLDER, self.row_ref(r))
    }

    fn element_size(&self, aggregate: &str) -> Node {
        Node::field_init("element_size", Node::Sizeof(self.agg_type(aggregate)))
    }

    fn element_defaults(&self, aggregate: &str) -> Node {
        Node::field_init(
            "element_defaults",
            fn_ref(DEFAULTS_FUN, &self.defaults_name(aggregate)),
        )
    }
}

/// Parse callback of the row kind, `(schemac_state_fun)&schemac_C<Kind>`.
fn callback(r: DescRef) -> Node {
    fn_ref(STATE_FUN, &format!("schemac_{}", r.kind.table_suffix()))
}

fn null() -> Node {
    Node::ident("NULL")
}

fn bitmask(present: impl IntoIterator<Item = bool>) -> Node {
    let mask = present
        .into_iter()
        .enumerate()
        .filter(|(_, p)| *p)
        .fold(0u64, |mask, (bit, _)| mask | (1 << bit));
    Node::field_init("bitmask", Node::UInt(mask))
}

fn scalar_fields(spec: &ScalarSpec, fields: &mut Vec<Node>) {
    let kind = spec.kind();
    if kind.is_numeric() {
        let bounds = [("min", spec.min()), ("max", spec.max())];
        fields.push(bitmask(bounds.iter().map(|(_, v)| v.is_some())));
        for (name, value) in bounds {
            if let Some(value) = value {
                fields.push(Node::field_init(name, literal(kind, value)));
            }
        }
    } else if kind.is_path() {
        let checks = spec.checks();
        let flags = [
            ("check_existence", checks.existence),
            ("check_dir", checks.is_dir),
            ("check_writable", checks.writable),
        ];
        fields.push(bitmask(flags.iter().map(|(_, v)| v.is_some())));
        for (name, flag) in flags {
            if let Some(flag) = flag {
                fields.push(Node::field_init(name, Node::ident(flag.to_string())));
            }
        }
    } else {
        debug_assert!(matches!(kind, ScalarKind::Boolean | ScalarKind::String));
    }
}
