//! # gatekeep-query
//!
//! Schema-driven input validation for Gatekeep clients.
//!
//! This crate turns a [`gatekeep_schema::SchemaAccessor`] and a set of
//! [`ClientOptions`] into validators for every operation argument:
//! - Filters (`where`) with per-field filter-kind slicing
//! - Projections (`select`, `include`, `omit`), ordering and pagination
//! - Create and update payloads with nested relation writes
//! - Aggregations and grouping
//! - Custom `@@validate` rules evaluated against payloads
//! - Procedure call envelopes
//!
//! Validated arguments are handed to a [`QueryExecutor`] supplied by the
//! storage layer.
//!
//! ## Values
//!
//! Arguments arrive as JSON and are converted into [`Value`], which keeps
//! "absent" apart from `null`:
//!
//! ```rust
//! use gatekeep_query::Value;
//! use serde_json::json;
//!
//! let args = Value::from(json!({ "where": { "email": "a@b.co" }, "take": 10 }));
//! assert_eq!(args.get("take"), &Value::Int(10));
//! assert!(args.get("skip").is_undefined());
//! ```
//!
//! ## Operations
//!
//! ```rust
//! use gatekeep_query::Operation;
//!
//! assert_eq!(Operation::FindUniqueOrThrow.as_str(), "findUniqueOrThrow");
//! assert!(Operation::FindMany.is_read());
//! assert!(Operation::Update.requires_unique_where());
//! ```
//!
//! ## Configuration
//!
//! Options are usually loaded from TOML:
//!
//! ```rust
//! use gatekeep_query::ClientOptions;
//!
//! let options = ClientOptions::from_str(r#"
//!     validate_input = true
//!
//!     [slicing]
//!     excludedModels = ["AuditLog"]
//! "#).unwrap();
//! assert!(options.validate_input);
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use gatekeep_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::not_found("User");
//! assert_eq!(err.code, ErrorCode::RecordNotFound);
//! ```

pub mod config;
pub mod error;
pub mod expression;
pub mod input;
pub mod logging;
pub mod operation;
pub mod operations;
pub mod plugin;
mod procedure;
pub mod slicing;
pub mod validator;
pub mod value;

pub use config::{ClientOptions, FieldSlicing, FilterKind, FilterKinds, ModelSlicing, SlicingOptions};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use expression::{RuleOutcome, evaluate_rule};
pub use input::{InputValidator, ValidatedArgs};
pub use operation::{Operation, OperationGroup};
pub use operations::{Client, ModelClient, QueryExecutor, SharedExecutor};
pub use plugin::{ExtendedArgs, PluginRegistry, QueryPlugin};
pub use slicing::SlicingPolicy;
pub use validator::{CacheStats, Issue, IssueKind, Shape, ShapeKey, ValidatorFactory};
pub use value::Value;

// Re-export logging utilities
pub use logging::{get_log_format, get_log_level, init as init_logging, init_with_level, is_debug_enabled};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{ClientOptions, ModelSlicing, SlicingOptions};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::operation::Operation;
    pub use crate::operations::{Client, ModelClient, QueryExecutor};
    pub use crate::value::Value;
}
