//! Error types for schema lookups and schema-level configuration defects.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised when the schema (or a policy built on top of it) is inconsistent.
///
/// These never describe bad caller input. They point at a defect in the schema
/// description or its configuration and should be surfaced loudly.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// A named schema entity could not be found.
    #[error("{kind} `{name}` not found")]
    #[diagnostic(code(gatekeep::schema::not_found))]
    NotFound { kind: String, name: String },

    /// A model declares no unique field or unique field group.
    #[error("model `{model}` does not declare any unique field")]
    #[diagnostic(
        code(gatekeep::schema::missing_unique),
        help("mark at least one field `@id` or `@unique`, or declare a `@@unique` group")
    )]
    MissingUniqueFields { model: String },

    /// Invalid model definition.
    #[error("invalid model `{name}`: {message}")]
    #[diagnostic(code(gatekeep::schema::invalid_model))]
    InvalidModel { name: String, message: String },

    /// Invalid field definition.
    #[error("invalid field `{owner}.{field}`: {message}")]
    #[diagnostic(code(gatekeep::schema::invalid_field))]
    InvalidField {
        owner: String,
        field: String,
        message: String,
    },

    /// A field type that is neither a scalar, an enum, a type def nor a model.
    #[error("unknown type `{type_name}` in `{owner}.{field}`")]
    #[diagnostic(code(gatekeep::schema::unknown_type))]
    UnknownType {
        owner: String,
        field: String,
        type_name: String,
    },

    /// Invalid attribute usage.
    #[error("invalid attribute `{attribute}`: {message}")]
    #[diagnostic(code(gatekeep::schema::invalid_attribute))]
    InvalidAttribute { attribute: String, message: String },

    /// A malformed rule expression.
    #[error("invalid expression: {message}")]
    #[diagnostic(code(gatekeep::schema::invalid_expression))]
    InvalidExpression { message: String },

    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(gatekeep::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiled schema document is not valid JSON for the expected layout.
    #[error("failed to decode schema document")]
    #[diagnostic(code(gatekeep::schema::json_error))]
    JsonError {
        #[source]
        source: serde_json::Error,
    },
}

impl SchemaError {
    /// Create a lookup failure error.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create an invalid model error.
    pub fn invalid_model(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidModel {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an invalid field error.
    pub fn invalid_field(
        owner: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            owner: owner.into(),
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unknown type error.
    pub fn unknown_type(
        owner: impl Into<String>,
        field: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Self::UnknownType {
            owner: owner.into(),
            field: field.into(),
            type_name: type_name.into(),
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Create an invalid expression error.
    pub fn invalid_expression(message: impl Into<String>) -> Self {
        Self::InvalidExpression {
            message: message.into(),
        }
    }
}
