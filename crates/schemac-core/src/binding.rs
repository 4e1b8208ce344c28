//! Command-line and environment bindings.

use crate::{Ident, SchemaError};

/// What a command-line option does to its target value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionClass {
    /// Set the value from the option argument.
    Option,
    IncrementOption,
    DecrementOption,
    EnableOption,
    DisableOption,
}

impl OptionClass {
    pub const ALL: [OptionClass; 5] = [
        OptionClass::Option,
        OptionClass::IncrementOption,
        OptionClass::DecrementOption,
        OptionClass::EnableOption,
        OptionClass::DisableOption,
    ];

    pub fn has_argument(self) -> bool {
        self == OptionClass::Option
    }
}

/// One command-line option: a short character, a long name, or both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliOption {
    class: OptionClass,
    short: Option<char>,
    long: Option<String>,
}

impl CliOption {
    pub fn new(
        class: OptionClass,
        short: Option<char>,
        long: Option<String>,
    ) -> Result<Self, SchemaError> {
        if short.is_none() && long.is_none() {
            return Err(SchemaError::InvalidBinding(String::new()));
        }
        if let Some(c) = short
            && !c.is_ascii_alphanumeric()
        {
            return Err(SchemaError::InvalidBinding(format!("-{c}")));
        }
        if let Some(name) = &long
            && !is_long_name(name)
        {
            return Err(SchemaError::InvalidBinding(format!("--{name}")));
        }
        Ok(Self { class, short, long })
    }

    /// Parse a space-separated token list such as `-p --port`.
    pub fn parse(class: OptionClass, spec: &str) -> Result<Self, SchemaError> {
        let mut short = None;
        let mut long = None;
        for token in spec.split_whitespace() {
            if let Some(name) = token.strip_prefix("--") {
                if long.replace(name.to_string()).is_some() {
                    return Err(SchemaError::InvalidBinding(spec.to_string()));
                }
            } else if let Some(rest) = token.strip_prefix('-') {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if short.replace(c).is_none() => {}
                    _ => return Err(SchemaError::InvalidBinding(spec.to_string())),
                }
            } else {
                return Err(SchemaError::InvalidBinding(spec.to_string()));
            }
        }
        Self::new(class, short, long).map_err(|_| SchemaError::InvalidBinding(spec.to_string()))
    }

    pub fn class(&self) -> OptionClass {
        self.class
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn has_argument(&self) -> bool {
        self.class.has_argument()
    }

    /// Usage form, e.g. `-p, --port=VALUE`.
    pub fn param(&self) -> String {
        let mut parts = Vec::new();
        if let Some(c) = self.short {
            if self.has_argument() && self.long.is_none() {
                parts.push(format!("-{c} VALUE"));
            } else {
                parts.push(format!("-{c}"));
            }
        }
        if let Some(name) = &self.long {
            if self.has_argument() {
                parts.push(format!("--{name}=VALUE"));
            } else {
                parts.push(format!("--{name}"));
            }
        }
        parts.join(", ")
    }
}

fn is_long_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Command-line options and environment variable attached to a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Binding {
    options: Vec<CliOption>,
    env: Option<Ident>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, option: CliOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn with_env(mut self, name: Ident) -> Self {
        self.env = Some(name);
        self
    }

    pub fn options(&self) -> &[CliOption] {
        &self.options
    }

    pub fn env(&self) -> Option<&Ident> {
        self.env.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty() && self.env.is_none()
    }
}
