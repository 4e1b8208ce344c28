//! Generator state and the source file layout.

use std::collections::HashSet;

use schemac_core::{Ident, Literal, ScalarKind, Schema};
use tracing::debug;

use super::Config;
use super::options::OptionPlan;
use crate::codetree::{Ast, Dim, Node, ScopeBuilder, Storage, TypeRegistry};
use crate::lower::{DescData, DescRef, FieldPath, Layout, TableKind};
use crate::{Error, Result};

/// Zone receiving the prototypes of synthesized functions.
const PROTOTYPES: &str = "prototypes";

/// C generator over one lowered schema.
pub(crate) struct Generator<'a> {
    pub(super) schema: &'a Schema,
    pub(super) layout: &'a Layout,
    pub(super) config: &'a Config,
    pub(super) registry: &'static TypeRegistry,
    /// Support functions already synthesized, by function name
    pub(super) emitted: HashSet<String>,
}

impl<'a> Generator<'a> {
    pub fn new(schema: &'a Schema, layout: &'a Layout, config: &'a Config) -> Self {
        Self {
            schema,
            layout,
            config,
            registry: TypeRegistry::builtin(),
            emitted: HashSet::new(),
        }
    }

    /// Reject layout shapes no table or function can express.
    pub fn check_shapes(&self) -> Result<()> {
        for descriptor in self.layout.table(TableKind::Mapping) {
            if let DescData::Mapping { key, .. } = &descriptor.data
                && !key.kind.is_scalar()
            {
                return Err(Error::unsupported(
                    &descriptor.path,
                    descriptor.pos,
                    "mapping keys must be scalars",
                ));
            }
        }
        Ok(())
    }

    /// Top-level nodes of the source file.
    pub fn source(&mut self) -> Result<Vec<Node>> {
        self.check_shapes()?;
        let options = OptionPlan::build(self.layout)?;

        let ast = Ast::new(self.registry);
        self.banner(&ast)?;
        ast.append(Node::StdInclude(self.config.runtime_header.clone()))?;
        ast.append(Node::Include(format!("{}.h", self.config.target_name())))?;
        ast.append(Node::Blank)?;

        for kind in TableKind::ALL {
            let len = self.layout.len(kind);
            if len == 0 {
                continue;
            }
            ast.append(Node::Var {
                storage: Storage::Static,
                ty: kind.row_type().to_string(),
                name: self.table_name(kind),
                dim: Dim::Sized(len),
            })?;
        }
        ast.append(Node::Blank)?;
        let prototypes = ast.zone(PROTOTYPES);

        self.tables(&ast)?;
        let layout = self.layout;
        for aggregate in layout.aggregates() {
            self.ensure_defaults(&ast, &prototypes, &aggregate.name)?;
            if self.is_printable(&aggregate.name) {
                self.ensure_printer(&ast, &prototypes, &aggregate.name)?;
            }
        }
        self.print_config(&ast)?;
        self.readfile(&ast)?;
        self.option_tables(&ast, &options)?;

        let nodes = ast.finish()?;
        debug!(functions = self.emitted.len(), "generated source");
        Ok(nodes)
    }

    pub(super) fn banner(&self, scope: &ScopeBuilder<'_>) -> Result<()> {
        scope.append(Node::Comment(vec![
            "THIS IS AUTOGENERATED FILE".to_string(),
            "DO NOT EDIT!!!".to_string(),
        ]))?;
        scope.append(Node::Blank)?;
        Ok(())
    }

    pub(super) fn prefix(&self) -> &str {
        self.config.prefix()
    }

    pub(super) fn program_name(&self) -> &str {
        let name = self.schema.meta().program_name.as_str();
        if name.is_empty() {
            self.prefix()
        } else {
            name
        }
    }

    /// `<prefix>_<aggregate>_t`
    pub(super) fn agg_type(&self, aggregate: &str) -> String {
        format!("{}_{aggregate}_t", self.prefix())
    }

    pub(super) fn table_name(&self, kind: TableKind) -> String {
        format!("{}_{}_vars", self.prefix(), kind.table_suffix())
    }

    pub(super) fn printer_name(&self, aggregate: &str) -> String {
        format!("{}_print_{aggregate}", self.prefix())
    }

    pub(super) fn defaults_name(&self, aggregate: &str) -> String {
        format!("{}_defaults_{aggregate}", self.prefix())
    }

    /// `&<prefix>_<Table>_vars[<index>]`
    pub(super) fn table_ref(&self, kind: TableKind, index: usize) -> Node {
        Node::addr(Node::Subscript {
            base: Box::new(Node::ident(self.table_name(kind))),
            index: Box::new(Node::UInt(index as u64)),
        })
    }

    pub(super) fn row_ref(&self, r: DescRef) -> Node {
        self.table_ref(r.kind, r.index)
    }

    /// `offsetof(<owner_t>, a.b)`, or `0` at the aggregate itself.
    pub(super) fn baseoffset(&self, field: &FieldPath) -> Node {
        if field.chain.is_empty() {
            Node::Int(0)
        } else {
            Node::OffsetOf {
                ty: self.agg_type(&field.owner),
                member: field.dotted(),
            }
        }
    }

    /// Whether a print function exists for the aggregate.
    pub(super) fn is_printable(&self, aggregate: &str) -> bool {
        use crate::lower::{AggregateBody, AggregateKind};

        let Some(aggregate) = self.layout.aggregate(aggregate) else {
            return false;
        };
        match (&aggregate.kind, aggregate.body()) {
            (AggregateKind::Main | AggregateKind::TypeDef(_), _) => true,
            (_, AggregateBody::Element(value) | AggregateBody::Entry { value, .. }) => {
                !value.kind.is_scalar()
            }
            (_, AggregateBody::Group(_)) => false,
        }
    }
}

/// `base->a.b.c`
pub(super) fn access(base: &str, chain: &[Ident]) -> Node {
    let mut parts = chain.iter();
    let Some(first) = parts.next() else {
        return Node::ident(base);
    };
    let mut node = Node::arrow(Node::ident(base), first.as_str());
    for part in parts {
        node = Node::member(node, part.as_str());
    }
    node
}

/// Literal as the C expression stored for `kind`.
pub(super) fn literal(kind: ScalarKind, value: &Literal) -> Node {
    match value {
        Literal::Int(v) if kind == ScalarKind::Float => Node::Float(*v as f64),
        Literal::UInt(v) if kind == ScalarKind::Float => Node::Float(*v as f64),
        Literal::Int(v) => Node::Int(*v),
        Literal::UInt(v) => Node::UInt(*v),
        Literal::Float(v) => Node::Float(*v),
        Literal::Bool(v) => Node::Int(i64::from(*v)),
        Literal::Str(s) => Node::str(s.as_str()),
    }
}

/// `(ty)&name`
pub(super) fn fn_ref(ty: &str, name: &str) -> Node {
    Node::cast(ty, Node::addr(Node::ident(name)))
}
