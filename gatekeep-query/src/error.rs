//! Error types for client operations.
//!
//! Two families never mix:
//! - input errors (`P1xxx`): the caller's arguments were rejected or the
//!   operation is not exposed; recoverable by changing the call
//! - configuration errors (`P7xxx`): the schema or the client options are
//!   inconsistent; a defect to fix before serving requests
//!
//! Execution codes (`P5xxx`) are reserved for the downstream executor.
//!
//! # Error Codes
//!
//! Codes follow the pattern `P{category}{number}`:
//! - 1xxx: Input errors (not found, invalid input, operation not allowed)
//! - 2xxx: Constraint violations reported by the executor
//! - 5xxx: Execution errors reported by the executor
//! - 7xxx: Configuration errors
//! - 9xxx: Internal errors
//!
//! ```rust
//! use gatekeep_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::not_found("User");
//! assert_eq!(err.code, ErrorCode::RecordNotFound);
//! assert!(err.to_string().starts_with("[P1001]"));
//! ```

use std::fmt;
use thiserror::Error;

use gatekeep_schema::SchemaError;

use crate::operation::Operation;
use crate::validator::Issue;

/// Result type for client operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Input errors (1xxx)
    /// Record not found (P1001).
    RecordNotFound = 1001,
    /// Arguments failed validation (P1006).
    InvalidInput = 1006,
    /// Model, operation or procedure not exposed by the client (P1007).
    OperationNotAllowed = 1007,

    // Constraint errors (2xxx)
    /// Unique constraint violation (P2001).
    UniqueConstraint = 2001,
    /// Foreign key constraint violation (P2002).
    ForeignKeyConstraint = 2002,

    // Execution errors (5xxx)
    /// Query timeout (P5001).
    QueryTimeout = 5001,
    /// General database error (P5005).
    DatabaseError = 5005,

    // Configuration errors (7xxx)
    /// Invalid schema or client configuration (P7001).
    InvalidConfiguration = 7001,

    // Internal errors (9xxx)
    /// Internal error (P9001).
    Internal = 9001,
}

impl ErrorCode {
    /// The code string (e.g. "P1006").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Short description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RecordNotFound => "Record not found",
            Self::InvalidInput => "Invalid input",
            Self::OperationNotAllowed => "Operation not allowed",
            Self::UniqueConstraint => "Unique constraint violation",
            Self::ForeignKeyConstraint => "Foreign key constraint violation",
            Self::QueryTimeout => "Query timeout",
            Self::DatabaseError => "Database error",
            Self::InvalidConfiguration => "Invalid configuration",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation being performed.
    pub operation: Option<String>,
    /// The model involved.
    pub model: Option<String>,
    /// The procedure involved.
    pub procedure: Option<String>,
    /// Path of the first rejected value (e.g. `data.posts[0].title`).
    pub path: Option<String>,
    /// Every validation issue found.
    pub issues: Vec<Issue>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Error raised by client operations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the operation.
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the procedure.
    pub fn with_procedure(mut self, procedure: impl Into<String>) -> Self {
        self.context.procedure = Some(procedure.into());
        self
    }

    /// Set the rejected path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.context.path = Some(path.into());
        self
    }

    /// Add a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Set help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// No record matched an `OrThrow` lookup.
    pub fn not_found(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::RecordNotFound,
            format!("No {model} record found matching the query"),
        )
        .with_model(&model)
        .with_suggestion("Use the non-throwing variant to receive null instead of an error")
    }

    /// Arguments were rejected by validation.
    ///
    /// The message lists every issue; the context keeps the structured issues
    /// and the path of the first one.
    pub fn invalid_input(operation: Operation, model: impl Into<String>, issues: Vec<Issue>) -> Self {
        let model = model.into();
        let details = issues
            .iter()
            .map(Issue::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        let mut err = Self::new(
            ErrorCode::InvalidInput,
            format!("Invalid {operation} args for model \"{model}\": {details}"),
        )
        .with_operation(operation.as_str())
        .with_model(model);
        if let Some(first) = issues.first() {
            err.context.path = Some(first.path_string());
        }
        err.context.issues = issues;
        err
    }

    /// Procedure arguments were rejected by validation.
    pub fn invalid_procedure_input(procedure: impl Into<String>, issues: Vec<Issue>) -> Self {
        let procedure = procedure.into();
        let details = issues
            .iter()
            .map(Issue::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        let mut err = Self::new(
            ErrorCode::InvalidInput,
            format!("Invalid args for procedure \"{procedure}\": {details}"),
        )
        .with_procedure(procedure);
        if let Some(first) = issues.first() {
            err.context.path = Some(first.path_string());
        }
        err.context.issues = issues;
        err
    }

    /// The model or operation is hidden by slicing.
    pub fn operation_not_allowed(operation: Operation, model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(
            ErrorCode::OperationNotAllowed,
            format!("Operation \"{operation}\" is not allowed on model \"{model}\""),
        )
        .with_operation(operation.as_str())
        .with_model(model)
        .with_help("Check the slicing options the client was created with")
    }

    /// The procedure is hidden by slicing.
    pub fn procedure_not_allowed(procedure: impl Into<String>) -> Self {
        let procedure = procedure.into();
        Self::new(
            ErrorCode::OperationNotAllowed,
            format!("Procedure \"{procedure}\" is not allowed"),
        )
        .with_procedure(procedure)
    }

    /// Invalid schema or client configuration.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidConfiguration, message)
    }

    /// A write collided with an existing unique value.
    pub fn unique_violation(model: impl Into<String>, field: impl Into<String>) -> Self {
        let model = model.into();
        let field = field.into();
        Self::new(
            ErrorCode::UniqueConstraint,
            format!("Unique constraint violated on {model}.{field}"),
        )
        .with_model(model)
        .with_path(&field)
        .with_suggestion(format!("A record with this {field} already exists; use upsert to update it instead"))
    }

    /// A write referenced a related record that does not exist.
    pub fn foreign_key_violation(model: impl Into<String>, relation: impl Into<String>) -> Self {
        let model = model.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::ForeignKeyConstraint,
            format!("Foreign key constraint violated: {model}.{relation}"),
        )
        .with_model(&model)
        .with_path(&relation)
        .with_suggestion(format!("Ensure the related {relation} record exists before writing this {model}"))
    }

    /// The executor gave up waiting for the database.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::new(
            ErrorCode::QueryTimeout,
            format!("Query timed out after {duration_ms}ms"),
        )
        .with_help("Paginate large result sets or raise the executor's timeout")
    }

    /// General database error reported by an executor.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    // ============== Error Checks ==============

    /// Check for a not-found error.
    pub fn is_not_found(&self) -> bool {
        self.code == ErrorCode::RecordNotFound
    }

    /// Check for a rejected-input error (including slicing rejections).
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::InvalidInput | ErrorCode::OperationNotAllowed
        )
    }

    /// Check for a schema or options defect.
    pub fn is_configuration_error(&self) -> bool {
        self.code == ErrorCode::InvalidConfiguration
    }

    /// Check for an error raised by the executor.
    pub fn is_execution_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UniqueConstraint
                | ErrorCode::ForeignKeyConstraint
                | ErrorCode::QueryTimeout
                | ErrorCode::DatabaseError
        )
    }

    // ============== Display Functions ==============

    /// Multi-line rendering with context, issues and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);

        if let Some(ref op) = self.context.operation {
            output.push_str(&format!("  → While: {op}\n"));
        }
        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {model}\n"));
        }
        if let Some(ref procedure) = self.context.procedure {
            output.push_str(&format!("  → Procedure: {procedure}\n"));
        }
        for issue in &self.context.issues {
            output.push_str(&format!("  → {issue}\n"));
        }
        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }
        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {help}\n"));
        }

        output
    }
}

impl From<SchemaError> for QueryError {
    fn from(err: SchemaError) -> Self {
        Self::configuration(err.to_string()).with_source(err)
    }
}
