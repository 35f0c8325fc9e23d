//! Read and aggregate operations.

use super::model::{ModelClient, exists_from};
use crate::error::QueryResult;
use crate::operation::Operation;
use crate::value::Value;

impl ModelClient {
    /// Find a record by a unique criterion. Returns `Value::Null` when none matches.
    pub async fn find_unique(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::FindUnique, args).await
    }

    /// Find a record by a unique criterion or fail with `RecordNotFound`.
    pub async fn find_unique_or_throw(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run_or_throw(Operation::FindUniqueOrThrow, args).await
    }

    /// Find the first matching record.
    pub async fn find_first(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::FindFirst, args).await
    }

    /// Find the first matching record or fail with `RecordNotFound`.
    pub async fn find_first_or_throw(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run_or_throw(Operation::FindFirstOrThrow, args).await
    }

    /// Find all matching records.
    pub async fn find_many(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::FindMany, args).await
    }

    /// Check whether any record matches.
    pub async fn exists(&self, args: impl Into<Value>) -> QueryResult<bool> {
        let result = self.run(Operation::Exists, args).await?;
        Ok(exists_from(&result))
    }

    /// Count matching records.
    pub async fn count(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::Count, args).await
    }

    /// Compute aggregates over matching records.
    pub async fn aggregate(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::Aggregate, args).await
    }

    /// Group matching records and aggregate each group.
    pub async fn group_by(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::GroupBy, args).await
    }
}
