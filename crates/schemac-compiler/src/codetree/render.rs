//! Template-driven text rendering.

use super::TreeError;
use super::node::{FieldValue, Node, NodeKind, Row, Template};
use super::registry::TypeRegistry;
use crate::invariants::{not_inline, unknown_template_field};

/// Renders finished trees as indented text.
pub struct Renderer<'r> {
    registry: &'r TypeRegistry,
    indent: String,
}

impl<'r> Renderer<'r> {
    pub fn new(registry: &'r TypeRegistry, indent: impl Into<String>) -> Self {
        Self {
            registry,
            indent: indent.into(),
        }
    }

    /// Validate, then render every node as a top-level line or block.
    pub fn render(&self, nodes: &[Node]) -> Result<String, TreeError> {
        let (kind, field, set) = self.registry.scope_slot(None);
        for node in nodes {
            self.registry.check(kind, field, set, node)?;
            self.registry.validate(node)?;
        }

        let mut stream = Stream {
            out: String::new(),
            depth: 0,
            unit: &self.indent,
        };
        for node in nodes {
            stream.node(node);
        }
        Ok(stream.out)
    }
}

/// Output buffer with an explicit nesting counter.
struct Stream<'a> {
    out: String,
    depth: usize,
    unit: &'a str,
}

impl Stream<'_> {
    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(self.unit);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    fn node(&mut self, node: &Node) {
        match node.kind().template() {
            Template::Line(template) => {
                let text = fill(template, node);
                self.line(&text);
            }
            Template::EachLine(template) => {
                for line in node.lines() {
                    let text = template.replace("{line}", line);
                    self.line(&text);
                }
            }
            Template::Block { start, end } => {
                self.line(&fill(start, node));
                self.depth += 1;
                for child in block_body(node) {
                    self.node(child);
                }
                self.depth -= 1;
                self.line(&fill(end, node));
            }
            Template::Rows { start, end } => {
                self.line(&fill(start, node));
                self.depth += 1;
                match node {
                    Node::Table { rows, .. } => self.table_rows(rows),
                    Node::StructInit { fields, .. } => {
                        for field in fields {
                            self.line(&format!("{},", inline(field)));
                        }
                    }
                    _ => {}
                }
                self.depth -= 1;
                self.line(&fill(end, node));
            }
        }
    }

    /// A row is `value, // i. comment`; the last row drops its comma unless it
    /// is a sentinel.
    fn table_rows(&mut self, rows: &[Option<Row>]) {
        for (index, row) in rows.iter().enumerate() {
            let last = index + 1 == rows.len();
            match row {
                Some(row) => {
                    let separator = if last { " " } else { "," };
                    let value = inline(&row.value);
                    self.line(&format!("{value}{separator} // {index}. {}", row.comment));
                    if let Some(pos) = &row.pos {
                        self.line(&format!("// {pos}"));
                    }
                }
                None => self.line(&format!("{{ NULL }}, // {index}. sentinel")),
            }
        }
    }
}

fn block_body(node: &Node) -> &[Node] {
    match node {
        Node::Struct { body, .. }
        | Node::Function { body, .. }
        | Node::For { body, .. }
        | Node::If { body, .. } => body,
        _ => &[],
    }
}

/// Render a node as an inline fragment.
pub(crate) fn inline(node: &Node) -> String {
    match node.kind().template() {
        Template::Line(template) => fill(template, node),
        _ => not_inline(node.kind()),
    }
}

fn field_text(kind: NodeKind, node: &Node, name: &str) -> String {
    match node.field(name) {
        Some(FieldValue::Text(text)) => text.into_owned(),
        Some(FieldValue::Node(child)) => inline(child),
        Some(FieldValue::List(items, separator)) => items
            .iter()
            .map(inline)
            .collect::<Vec<_>>()
            .join(separator),
        Some(FieldValue::Absent) => String::new(),
        None => unknown_template_field(kind, name),
    }
}

/// Substitute the fields of `node` into `template`.
fn fill(template: &str, node: &Node) -> String {
    let kind = node.kind();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(at) = rest.find(['{', '}']) {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];
        if let Some(after) = tail.strip_prefix("{{") {
            out.push('{');
            rest = after;
        } else if let Some(after) = tail.strip_prefix("}}") {
            out.push('}');
            rest = after;
        } else if let Some(after) = tail.strip_prefix('{')
            && let Some(close) = after.find('}')
        {
            let placeholder = &after[..close];
            let name = placeholder.trim();
            let prefix = &placeholder[..placeholder.len() - placeholder.trim_start().len()];
            let suffix = &placeholder[placeholder.trim_end().len()..];
            let value = field_text(kind, node, name);
            if !value.is_empty() {
                out.push_str(prefix);
                out.push_str(&value);
                out.push_str(suffix);
            }
            rest = &after[close + 1..];
        } else {
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
