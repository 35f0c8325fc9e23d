//! # Gatekeep
//!
//! Schema-driven argument validation and capability slicing for data-access
//! clients.
//!
//! Gatekeep provides:
//! - Schema definitions loadable from compiled JSON documents
//! - Per-model, per-operation validators derived from the schema
//! - Slicing policies hiding models, operations, procedures and filter kinds
//! - Custom `@@validate` rules with a small expression language
//! - Async operation handlers in front of a pluggable executor
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gatekeep::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), QueryError> {
//!     let schema = SchemaAccessor::new(Schema::from_file("schema.json")?);
//!     let options = ClientOptions::from_file("gatekeep.toml")?;
//!     let client = Client::with_config(schema, executor(), options);
//!     client.warm_up()?;
//!
//!     let adults = client
//!         .model("User")?
//!         .find_many(json!({ "where": { "age": { "gte": 18 } } }))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema definitions and the schema accessor.
pub mod schema {
    pub use gatekeep_schema::*;
}

/// Validation, slicing and operation handlers.
pub mod query {
    pub use gatekeep_query::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::query::prelude::*;
    pub use crate::schema::{Schema, SchemaAccessor, SchemaError};
}

// Re-export key types at the crate root
pub use query::{Client, ClientOptions, ModelClient, Operation, QueryError, QueryExecutor, QueryResult, Value};
pub use schema::{Schema, SchemaAccessor, SchemaError};
