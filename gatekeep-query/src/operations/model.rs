//! Per-model operation client.

use smol_str::SmolStr;
use tracing::{debug, trace};

use super::client::Client;
use crate::error::{QueryError, QueryResult};
use crate::operation::Operation;
use crate::value::Value;

/// Operations on a single model.
///
/// Obtained from [`Client::model`]. Each operation method takes the raw
/// argument object, validates it and hands it to the executor.
#[derive(Debug, Clone)]
pub struct ModelClient {
    client: Client,
    model: SmolStr,
}

impl ModelClient {
    pub(crate) fn new(client: Client, model: SmolStr) -> Self {
        Self { client, model }
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.model
    }

    /// The owning client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Validate, apply defaults and execute.
    pub(crate) async fn run(&self, operation: Operation, args: impl Into<Value>) -> QueryResult<Value> {
        let mut validated = self.client.validator().validate(&self.model, operation, args)?;
        if limits_to_one(operation) {
            let args = validated.args_mut();
            if !args.has("take") {
                args.insert("take", 1);
            }
        }

        debug!(model = %self.model, operation = %operation, "executing");
        let result = self.client.executor().execute(&validated).await?;
        trace!(model = %self.model, operation = %operation, result = result.type_name(), "executed");
        Ok(result)
    }

    /// Execute and reject an empty result.
    pub(crate) async fn run_or_throw(&self, operation: Operation, args: impl Into<Value>) -> QueryResult<Value> {
        match self.run(operation, args).await? {
            Value::Null | Value::Undefined => Err(QueryError::not_found(self.model.as_str())
                .with_operation(operation.as_str())),
            record => Ok(record),
        }
    }
}

fn limits_to_one(operation: Operation) -> bool {
    matches!(
        operation,
        Operation::FindUnique
            | Operation::FindUniqueOrThrow
            | Operation::FindFirst
            | Operation::FindFirstOrThrow
            | Operation::Exists
    )
}

/// Interpret an executor result as existence.
pub(crate) fn exists_from(result: &Value) -> bool {
    match result {
        Value::Undefined | Value::Null => false,
        Value::Bool(found) => *found,
        Value::Int(count) => *count > 0,
        Value::Array(rows) => !rows.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_exists_from() {
        assert!(!exists_from(&Value::Null));
        assert!(!exists_from(&Value::from(json!([]))));
        assert!(!exists_from(&Value::Int(0)));
        assert!(exists_from(&Value::from(json!({ "id": "u1" }))));
        assert!(exists_from(&Value::Bool(true)));
    }

    #[test]
    fn test_limits_to_one() {
        assert!(limits_to_one(Operation::FindFirstOrThrow));
        assert!(limits_to_one(Operation::Exists));
        assert_eq!(limits_to_one(Operation::FindMany), false);
    }
}
