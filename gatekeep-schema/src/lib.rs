//! # gatekeep-schema
//!
//! Schema definitions for the Gatekeep data-access toolkit.
//!
//! This crate provides:
//! - Definition types for models, fields, enums, type defs and procedures
//! - The rule expression tree used by `@@validate` and field attributes
//! - Loading of compiled schema documents (JSON)
//! - [`SchemaAccessor`], the read-only lookup layer used by query validation
//!
//! ## Example
//!
//! ```rust
//! use gatekeep_schema::{DatabaseProvider, FieldDef, ModelDef, Schema, SchemaAccessor};
//!
//! let schema = Schema::new(DatabaseProvider::PostgreSql).with_model(
//!     ModelDef::new("User")
//!         .field(FieldDef::new("id", "Int").id())
//!         .field(FieldDef::new("email", "String").unique()),
//! );
//!
//! let accessor = SchemaAccessor::new(schema);
//! assert!(accessor.require_model("User").is_ok());
//! assert!(accessor.require_model("Ghost").is_err());
//! ```

pub mod accessor;
pub mod ast;
pub mod error;

pub use accessor::{FieldOwner, SchemaAccessor, UniqueField};
pub use ast::*;
pub use error::{SchemaError, SchemaResult};
