//! The companion header: aggregate types and the public prototypes.

use std::collections::HashSet;

use schemac_core::ScalarKind;
use tracing::debug;

use super::generator::Generator;
use crate::codetree::{Ast, Node, ScopeBuilder, Storage};
use crate::invariants::ensure_aggregate;
use crate::lower::{AggregateBody, AggregateKind, DescData, DescRef};
use crate::{Error, Result};

impl Generator<'_> {
    /// Top-level nodes of the header file.
    pub fn header(&self) -> Result<Vec<Node>> {
        self.check_shapes()?;
        let guard = include_guard(self.config.target_name());

        let ast = Ast::new(self.registry);
        self.banner(&ast)?;
        ast.append(Node::Ifndef(guard.clone()))?;
        ast.append(Node::Define {
            name: guard,
            value: String::new(),
        })?;
        ast.append(Node::Blank)?;
        ast.append(Node::StdInclude(self.config.runtime_header.clone()))?;
        ast.append(Node::Blank)?;

        let layout = self.layout;
        for aggregate in layout.aggregates() {
            let tag = format!("struct {}_{}_s", self.prefix(), aggregate.name);
            ast.append(Node::Typedef {
                ty: tag,
                name: self.agg_type(&aggregate.name),
            })?;
        }
        ast.append(Node::Blank)?;

        let order = self.definition_order();
        for name in &order {
            self.struct_definition(&ast, name)?;
            ast.append(Node::Blank)?;
        }

        for aggregate in layout.aggregates() {
            self.public_prototype(&ast, &self.defaults_header(&aggregate.name))?;
            if self.is_printable(&aggregate.name) {
                self.public_prototype(&ast, &self.printer_header(&aggregate.name))?;
            }
        }
        self.public_prototype(&ast, &self.print_config_header())?;
        self.public_prototype(&ast, &self.readfile_header())?;
        ast.append(Node::Var {
            storage: Storage::Extern,
            ty: "schemac_cmdline_t".into(),
            name: format!("{}_cmdline", self.prefix()),
            dim: Default::default(),
        })?;
        ast.append(Node::Blank)?;
        ast.append(Node::Endif)?;

        let nodes = ast.finish()?;
        debug!(structs = order.len(), "generated header");
        Ok(nodes)
    }

    fn public_prototype(&self, ast: &ScopeBuilder<'_>, function: &Node) -> Result<()> {
        if let Some(prototype) = Node::prototype_of(function) {
            ast.append(prototype)?;
        }
        Ok(())
    }

    /// Aggregates with every by-value dependency ahead of its dependents:
    /// type definitions first, then list elements, `main` last.
    fn definition_order(&self) -> Vec<String> {
        let layout = self.layout;
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let type_defs = layout
            .aggregates()
            .filter(|a| matches!(a.kind, AggregateKind::TypeDef(_)));
        let elements = layout.aggregates().filter(|a| a.is_element());
        let main = layout.aggregates().filter(|a| a.kind == AggregateKind::Main);
        for aggregate in type_defs.chain(elements).chain(main) {
            self.visit_definition(&aggregate.name, &mut visited, &mut order);
        }
        order
    }

    fn visit_definition(&self, name: &str, visited: &mut HashSet<String>, order: &mut Vec<String>) {
        if !visited.insert(name.to_string()) {
            return;
        }
        let mut deps = Vec::new();
        for part in self.parts(name) {
            self.by_value_types(part, &mut deps);
        }
        for dep in deps {
            self.visit_definition(&dep, visited, order);
        }
        order.push(name.to_string());
    }

    /// Named types stored inline, not behind a list pointer.
    fn by_value_types(&self, r: DescRef, deps: &mut Vec<String>) {
        let layout = self.layout;
        match &layout.get(r).data {
            DescData::Group { .. } => {
                for member in layout.members(r) {
                    self.by_value_types(member.target, deps);
                }
            }
            DescData::Custom { type_name } => deps.push(type_name.to_string()),
            DescData::Scalar(_)
            | DescData::Array { .. }
            | DescData::Mapping { .. }
            | DescData::Usertype { .. } => {}
        }
    }

    fn parts(&self, aggregate: &str) -> Vec<DescRef> {
        match ensure_aggregate(self.layout.aggregate(aggregate), aggregate).body() {
            AggregateBody::Group(group) => vec![group],
            AggregateBody::Element(value) => vec![value],
            AggregateBody::Entry { key, value } => vec![key, value],
        }
    }

    fn struct_definition(&self, ast: &ScopeBuilder<'_>, name: &str) -> Result<()> {
        let layout = self.layout;
        let aggregate = ensure_aggregate(layout.aggregate(name), name);
        let node = Node::Struct {
            tag: Some(format!("{}_{name}_s", self.prefix())),
            declarator: None,
            body: Vec::new(),
        };
        ast.scoped(node, |body| match aggregate.body() {
            AggregateBody::Group(group) => self.struct_members(body, group),
            AggregateBody::Element(value) => {
                body.append(Node::var("schemac_arrayel_head_t", "head"))?;
                self.member_declaration(body, "value", value)
            }
            AggregateBody::Entry { key, value } => {
                body.append(Node::var("schemac_mappingel_head_t", "head"))?;
                self.member_declaration(body, "key", key)?;
                self.member_declaration(body, "value", value)
            }
        })
    }

    fn struct_members(&self, scope: &ScopeBuilder<'_>, group: DescRef) -> Result<()> {
        let mut members = self.layout.members(group).peekable();
        if members.peek().is_none() {
            // ISO C has no empty structs.
            scope.append(Node::var("char", "_unused"))?;
            return Ok(());
        }
        for member in members {
            self.member_declaration(scope, member.name.as_str(), member.target)?;
        }
        Ok(())
    }

    fn member_declaration(&self, scope: &ScopeBuilder<'_>, name: &str, r: DescRef) -> Result<()> {
        let d = self.layout.get(r);
        match &d.data {
            DescData::Scalar(spec) => scope.append(Node::var(scalar_ctype(spec.kind()), name))?,
            DescData::Group { .. } => {
                let node = Node::Struct {
                    tag: None,
                    declarator: Some(name.to_string()),
                    body: Vec::new(),
                };
                scope.scoped(node, |inner| self.struct_members(inner, r))?;
            }
            DescData::Custom { type_name } => {
                scope.append(Node::var(self.agg_type(type_name.as_str()), name))?;
            }
            DescData::Array { aggregate, .. } | DescData::Mapping { aggregate, .. } => {
                scope.append(Node::var(format!("{} *", self.agg_type(aggregate)), name))?;
                scope.append(Node::var("int", format!("{name}_len")))?;
            }
            DescData::Usertype { .. } => {
                return Err(Error::unsupported(
                    &d.path,
                    d.pos,
                    "a type definition cannot be a member",
                ));
            }
        }
        Ok(())
    }
}

/// C storage type of a scalar kind.
pub(super) fn scalar_ctype(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Integer | ScalarKind::Boolean => "int",
        ScalarKind::UnsignedInteger => "unsigned int",
        ScalarKind::Float => "double",
        ScalarKind::String | ScalarKind::FilePath | ScalarKind::DirectoryPath => "char *",
    }
}

/// `CONFIG_H` for target `config`.
fn include_guard(target: &str) -> String {
    let mut guard: String = target
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    guard.push_str("_H");
    guard
}
