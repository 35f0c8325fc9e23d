//! Attribute definitions for models and fields.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::Expression;

/// An attribute argument (named or positional).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeArg {
    /// Argument name (None for positional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<SmolStr>,
    /// Argument value.
    pub value: Expression,
}

impl AttributeArg {
    /// Create a positional argument.
    pub fn positional(value: Expression) -> Self {
        Self { name: None, value }
    }

    /// Create a named argument.
    pub fn named(name: impl Into<SmolStr>, value: Expression) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }

    /// Check if this is a positional argument.
    pub fn is_positional(&self) -> bool {
        self.name.is_none()
    }
}

/// An attribute applied to a field (`@length`) or a model (`@@validate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name including its `@`/`@@` prefix.
    pub name: SmolStr,
    /// Attribute arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<AttributeArg>,
}

impl Attribute {
    /// Create a new attribute without arguments.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            args: vec![],
        }
    }

    /// Append a positional argument.
    pub fn with_arg(mut self, value: Expression) -> Self {
        self.args.push(AttributeArg::positional(value));
        self
    }

    /// Append a named argument.
    pub fn with_named_arg(mut self, name: impl Into<SmolStr>, value: Expression) -> Self {
        self.args.push(AttributeArg::named(name, value));
        self
    }

    /// Get the attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this attribute has the given name.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Get an argument by name, falling back to its position.
    pub fn arg(&self, position: usize, name: &str) -> Option<&Expression> {
        self.args
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .or_else(|| {
                self.args
                    .iter()
                    .filter(|a| a.is_positional())
                    .nth(position)
            })
            .map(|a| &a.value)
    }

    /// String argument by name or position.
    pub fn string_arg(&self, position: usize, name: &str) -> Option<&str> {
        self.arg(position, name).and_then(Expression::as_string)
    }

    /// Numeric argument by name or position.
    pub fn number_arg(&self, position: usize, name: &str) -> Option<f64> {
        self.arg(position, name).and_then(Expression::as_number)
    }
}
