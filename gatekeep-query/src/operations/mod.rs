//! Operation handlers.
//!
//! A [`Client`] hands out one [`ModelClient`] per model. Every handler
//! validates its arguments through the [`InputValidator`](crate::InputValidator),
//! applies operation defaults, forwards the validated arguments to the
//! [`QueryExecutor`] and post-processes the result:
//!
//! - `findUnique`, `findFirst` and `exists` ask for at most one record
//! - the `OrThrow` variants turn an empty result into `RecordNotFound`
//! - `exists` reports a boolean
//!
//! Nothing reaches the executor unless validation passed.

mod client;
mod model;
mod read;
mod write;

pub use client::Client;
pub use model::ModelClient;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{QueryError, QueryResult};
use crate::input::ValidatedArgs;
use crate::value::Value;

/// Runs validated operations against a data store.
///
/// Implemented by the storage layer; this crate never renders or runs
/// queries itself.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Execute one model operation.
    ///
    /// Single-record reads return the record or `Value::Null`; list reads
    /// return an array; bulk writes and `count` return whatever the store
    /// reports (typically `{ count }` or a number).
    async fn execute(&self, request: &ValidatedArgs) -> QueryResult<Value>;

    /// Call a procedure with validated arguments.
    async fn call_procedure(&self, name: &str, _args: Value) -> QueryResult<Value> {
        Err(QueryError::internal(format!(
            "executor does not support procedures (called `{name}`)"
        )))
    }
}

/// An executor shared across clients.
pub type SharedExecutor = Arc<dyn QueryExecutor>;
