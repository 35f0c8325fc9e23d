//! Write operations.

use super::model::ModelClient;
use crate::error::QueryResult;
use crate::operation::Operation;
use crate::value::Value;

impl ModelClient {
    /// Create one record.
    pub async fn create(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::Create, args).await
    }

    /// Create several records.
    pub async fn create_many(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::CreateMany, args).await
    }

    /// Create several records and return them.
    pub async fn create_many_and_return(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::CreateManyAndReturn, args).await
    }

    /// Update one record.
    pub async fn update(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::Update, args).await
    }

    /// Update all matching records.
    pub async fn update_many(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::UpdateMany, args).await
    }

    /// Update all matching records and return them.
    pub async fn update_many_and_return(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::UpdateManyAndReturn, args).await
    }

    /// Update a record or create it when missing.
    pub async fn upsert(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::Upsert, args).await
    }

    /// Delete one record.
    pub async fn delete(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::Delete, args).await
    }

    /// Delete all matching records.
    pub async fn delete_many(&self, args: impl Into<Value>) -> QueryResult<Value> {
        self.run(Operation::DeleteMany, args).await
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ClientOptions, ModelSlicing, SlicingOptions};
    use crate::error::ErrorCode;
    use crate::operation::Operation;
    use crate::operations::testing::{RecordingExecutor, client};
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    // ==================== Create Tests ====================

    #[tokio::test]
    async fn test_create_with_nested_relation() {
        let executor = RecordingExecutor::returning(json!({ "id": "u1" }));
        let users = client(executor.clone()).model("User").unwrap();

        users
            .create(json!({
                "data": {
                    "id": "u1",
                    "email": "a@b.co",
                    "age": 30,
                    "role": "ADMIN",
                    "posts": { "create": [{ "id": 1, "title": "Hello", "views": 0 }] }
                }
            }))
            .await
            .unwrap();

        let (operation, args) = executor.last().unwrap();
        assert_eq!(operation, Operation::Create);
        assert!(args.get("data").has("posts"));
        assert!(!args.has("take"));
    }

    #[tokio::test]
    async fn test_create_rejects_rule_violation() {
        let executor = RecordingExecutor::returning(Value::Null);
        let users = client(executor.clone()).model("User").unwrap();

        let err = users
            .create(json!({ "data": { "id": "u1", "email": "a@b.co", "age": 12, "role": "USER" } }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert!(executor.last().is_none());
    }

    // ==================== Update Tests ====================

    #[tokio::test]
    async fn test_update_operators() {
        let executor = RecordingExecutor::returning(json!({ "id": 1 }));
        let posts = client(executor.clone()).model("Post").unwrap();

        posts
            .update(json!({ "where": { "id": 1 }, "data": { "views": { "increment": 1 } } }))
            .await
            .unwrap();
        posts
            .update_many(json!({ "where": { "published": false }, "data": { "title": "Draft" } }))
            .await
            .unwrap();
        assert_eq!(executor.last().unwrap().0, Operation::UpdateMany);

        let err = posts
            .update(json!({ "where": { "id": 1 }, "data": { "wordCount": 5 } }))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_upsert_and_delete() {
        let executor = RecordingExecutor::returning(json!({ "count": 0 }));
        let profiles = client(executor.clone()).model("Profile").unwrap();

        profiles
            .upsert(json!({
                "where": { "userId": "u1" },
                "create": { "id": 1, "user": { "connect": { "id": "u1" } } },
                "update": { "bio": "hi" }
            }))
            .await
            .unwrap();
        assert_eq!(executor.last().unwrap().0, Operation::Upsert);

        profiles.delete(json!({ "where": { "id": 1 } })).await.unwrap();
        let result = profiles.delete_many(Value::Undefined).await.unwrap();
        assert_eq!(result.get("count"), &Value::Int(0));
        assert_eq!(executor.last().unwrap().1, Value::object());
    }

    // ==================== Slicing Tests ====================

    #[tokio::test]
    async fn test_excluded_operation_is_not_allowed() {
        let executor = RecordingExecutor::returning(Value::Null);
        let options = ClientOptions::default().with_slicing(
            SlicingOptions::default().model("Post", ModelSlicing::default().exclude_operations([Operation::DeleteMany])),
        );
        let posts = client(executor.clone()).with_options(options).model("Post").unwrap();

        let err = posts.delete_many(json!({})).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::OperationNotAllowed);
        assert!(executor.last().is_none());

        posts
            .create_many(json!({ "data": [{ "id": 2, "title": "B", "views": 0, "authorId": "u1" }] }))
            .await
            .unwrap();
        assert_eq!(executor.last().unwrap().0, Operation::CreateMany);
    }
}
