//! Schema paths: where a node sits relative to the schema root.

use std::fmt;

use crate::Ident;

/// One step from a parent node to a child node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Named member of a group.
    Member(Ident),
    /// Entry into a type definition (`__types__.Name`).
    TypeDef(Ident),
    /// Element of an array.
    Element,
    /// Key of a mapping entry.
    Key,
    /// Value of a mapping entry.
    Value,
}

/// Sequence of segments from the schema root (or a type definition).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SchemaPath(Vec<Segment>);

impl SchemaPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn type_def(name: &Ident) -> Self {
        Self(vec![Segment::TypeDef(name.clone())])
    }

    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment);
        Self(segments)
    }

    pub fn member(&self, name: &Ident) -> Self {
        self.child(Segment::Member(name.clone()))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the path crosses an array, a mapping or a type definition.
    pub fn is_repeated(&self) -> bool {
        self.0.iter().any(|s| !matches!(s, Segment::Member(_)))
    }

    /// Flatten into a C identifier fragment (`servers_a_host`).
    pub fn mangle(&self) -> String {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|s| match s {
                Segment::Member(name) | Segment::TypeDef(name) => name.as_str(),
                Segment::Element => "a",
                Segment::Key => "k",
                Segment::Value => "v",
            })
            .collect();
        if parts.is_empty() {
            return "main".to_string();
        }
        parts.join("_")
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Member(name) if i == 0 => write!(f, "{name}")?,
                Segment::Member(name) => write!(f, ".{name}")?,
                Segment::TypeDef(name) => write!(f, "__types__.{name}")?,
                Segment::Element => f.write_str("[]")?,
                Segment::Key => f.write_str("[key]")?,
                Segment::Value => f.write_str("[value]")?,
            }
        }
        Ok(())
    }
}
