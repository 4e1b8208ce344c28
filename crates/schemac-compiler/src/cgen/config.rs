//! Configuration for C generation.

use schemac_core::{Ident, SchemaError};

/// Configuration for C generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Prefix of every emitted symbol
    pub(crate) name: String,
    /// Base name of the companion header; defaults to `name`
    pub(crate) target: Option<String>,
    /// One indentation level
    pub(crate) indent: String,
    /// Column at which help text wraps
    pub(crate) help_width: usize,
    /// Runtime header included by both outputs
    pub(crate) runtime_header: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "config".to_string(),
            target: None,
            indent: "    ".to_string(),
            help_width: 80,
            runtime_header: "schemac_rt.h".to_string(),
        }
    }
}

impl Config {
    /// Create a new Config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the symbol prefix.
    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = value.into();
        self
    }

    /// Set the companion header base name.
    pub fn target(mut self, value: impl Into<String>) -> Self {
        self.target = Some(value.into());
        self
    }

    /// Set the indentation unit.
    pub fn indent(mut self, value: impl Into<String>) -> Self {
        self.indent = value.into();
        self
    }

    /// Set the help text wrap column.
    pub fn help_width(mut self, value: usize) -> Self {
        self.help_width = value;
        self
    }

    /// Set the runtime header name.
    pub fn runtime_header(mut self, value: impl Into<String>) -> Self {
        self.runtime_header = value.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.name
    }

    pub fn target_name(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.name)
    }

    /// The prefix must itself be a C identifier.
    pub(crate) fn validate(&self) -> Result<(), SchemaError> {
        Ident::new(self.name.as_str()).map(|_| ())
    }
}
