//! Scalar value specifications.

use std::fmt;

use crate::SchemaError;

/// Kind of a leaf configuration value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Integer,
    UnsignedInteger,
    Float,
    Boolean,
    String,
    FilePath,
    DirectoryPath,
}

impl ScalarKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::UnsignedInteger | Self::Float)
    }

    pub fn is_path(self) -> bool {
        matches!(self, Self::FilePath | Self::DirectoryPath)
    }

    pub fn is_textual(self) -> bool {
        matches!(self, Self::String | Self::FilePath | Self::DirectoryPath)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "Integer",
            Self::UnsignedInteger => "UnsignedInteger",
            Self::Float => "Float",
            Self::Boolean => "Boolean",
            Self::String => "String",
            Self::FilePath => "FilePath",
            Self::DirectoryPath => "DirectoryPath",
        };
        f.write_str(name)
    }
}

/// A literal value as written in the schema.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Literal {
    /// Coerce into the representation `kind` stores, if compatible.
    fn coerce(self, kind: ScalarKind) -> Option<Literal> {
        match (kind, self) {
            (ScalarKind::Integer, Literal::Int(v)) => Some(Literal::Int(v)),
            (ScalarKind::Integer, Literal::UInt(v)) => i64::try_from(v).ok().map(Literal::Int),
            (ScalarKind::UnsignedInteger, Literal::UInt(v)) => Some(Literal::UInt(v)),
            (ScalarKind::UnsignedInteger, Literal::Int(v)) => {
                u64::try_from(v).ok().map(Literal::UInt)
            }
            (ScalarKind::Float, Literal::Float(v)) => Some(Literal::Float(v)),
            (ScalarKind::Float, Literal::Int(v)) => Some(Literal::Float(v as f64)),
            (ScalarKind::Float, Literal::UInt(v)) => Some(Literal::Float(v as f64)),
            (ScalarKind::Boolean, Literal::Bool(v)) => Some(Literal::Bool(v)),
            (kind, Literal::Str(v)) if kind.is_textual() => Some(Literal::Str(v)),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Literal::Int(v) => Some(v as f64),
            Literal::UInt(v) => Some(v as f64),
            Literal::Float(v) => Some(v),
            _ => None,
        }
    }
}

/// Optional filesystem checks for path-valued scalars.
///
/// Field order is significant: it is the bit order of the emitted bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathChecks {
    pub existence: Option<bool>,
    pub is_dir: Option<bool>,
    pub writable: Option<bool>,
}

impl PathChecks {
    pub fn is_empty(&self) -> bool {
        self.existence.is_none() && self.is_dir.is_none() && self.writable.is_none()
    }
}

/// A scalar node: kind plus the constraints and default it was declared with.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarSpec {
    kind: ScalarKind,
    default: Option<Literal>,
    min: Option<Literal>,
    max: Option<Literal>,
    checks: PathChecks,
}

impl ScalarSpec {
    pub fn new(kind: ScalarKind) -> Self {
        Self {
            kind,
            default: None,
            min: None,
            max: None,
            checks: PathChecks::default(),
        }
    }

    pub fn with_default(mut self, value: Literal) -> Result<Self, SchemaError> {
        self.default = Some(self.coerce(value, "default")?);
        Ok(self)
    }

    pub fn with_min(mut self, value: Literal) -> Result<Self, SchemaError> {
        self.require_numeric("min")?;
        self.min = Some(self.coerce(value, "min")?);
        Ok(self)
    }

    pub fn with_max(mut self, value: Literal) -> Result<Self, SchemaError> {
        self.require_numeric("max")?;
        self.max = Some(self.coerce(value, "max")?);
        Ok(self)
    }

    pub fn with_checks(mut self, checks: PathChecks) -> Result<Self, SchemaError> {
        if !self.kind.is_path() && !checks.is_empty() {
            return Err(self.mismatch("check"));
        }
        self.checks = checks;
        Ok(self)
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    pub fn default_value(&self) -> Option<&Literal> {
        self.default.as_ref()
    }

    pub fn min(&self) -> Option<&Literal> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&Literal> {
        self.max.as_ref()
    }

    pub fn checks(&self) -> &PathChecks {
        &self.checks
    }

    /// Whether `min <= max` when both are present.
    ///
    /// Not enforced at construction; consumers decide what to do with an
    /// inverted range.
    pub fn bounds_consistent(&self) -> bool {
        match (
            self.min.as_ref().and_then(Literal::as_f64),
            self.max.as_ref().and_then(Literal::as_f64),
        ) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }

    fn coerce(&self, value: Literal, attribute: &'static str) -> Result<Literal, SchemaError> {
        value.coerce(self.kind).ok_or_else(|| self.mismatch(attribute))
    }

    fn require_numeric(&self, attribute: &'static str) -> Result<(), SchemaError> {
        if self.kind.is_numeric() {
            Ok(())
        } else {
            Err(self.mismatch(attribute))
        }
    }

    fn mismatch(&self, attribute: &'static str) -> SchemaError {
        SchemaError::AttributeMismatch {
            kind: self.kind,
            attribute,
        }
    }
}
