//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use gatekeep::query::input::ValidatedArgs;
use gatekeep::query::{ClientOptions, InputValidator, Operation, QueryExecutor, QueryResult, ValidatorFactory, Value};
use gatekeep::schema::{Schema, SchemaAccessor};

/// A compiled schema document: users with posts, tags, contacts, an audit log
/// and two procedures.
pub const SCHEMA: &str = r#"{
    "provider": "postgresql",
    "models": {
        "User": {
            "fields": {
                "id": { "type": "String", "id": true },
                "email": { "type": "String", "unique": true },
                "name": { "type": "String", "optional": true },
                "age": { "type": "Int" },
                "role": { "type": "Role", "hasDefault": true },
                "posts": { "type": "Post", "array": true, "relation": { "opposite": "author" } }
            },
            "attributes": [{
                "name": "@@validate",
                "args": [
                    { "value": {
                        "kind": "binary", "op": ">=",
                        "left": { "kind": "field", "field": "age" },
                        "right": { "kind": "literal", "value": 18 }
                    } },
                    { "name": "message", "value": { "kind": "literal", "value": "Must be adult" } },
                    { "name": "path", "value": { "kind": "array", "items": [{ "kind": "literal", "value": "age" }] } }
                ]
            }]
        },
        "Post": {
            "fields": {
                "id": { "type": "Int", "id": true },
                "title": { "type": "String" },
                "views": { "type": "Int", "hasDefault": true },
                "authorId": { "type": "String", "foreignKeyFor": ["author"] },
                "author": {
                    "type": "User",
                    "relation": { "opposite": "posts", "fields": ["authorId"], "references": ["id"] }
                }
            }
        },
        "Tag": {
            "fields": {
                "id": { "type": "String", "id": true },
                "label": { "type": "String" },
                "weight": { "type": "Int" }
            }
        },
        "Contact": {
            "fields": {
                "id": { "type": "Int", "id": true },
                "name": { "type": "String" },
                "email": { "type": "String", "optional": true },
                "phone": { "type": "String", "optional": true }
            },
            "attributes": [{
                "name": "@@validate",
                "args": [
                    { "value": {
                        "kind": "binary", "op": "||",
                        "left": {
                            "kind": "binary", "op": "!=",
                            "left": { "kind": "field", "field": "email" },
                            "right": { "kind": "null" }
                        },
                        "right": {
                            "kind": "binary", "op": "!=",
                            "left": { "kind": "field", "field": "phone" },
                            "right": { "kind": "null" }
                        }
                    } },
                    { "name": "message", "value": { "kind": "literal", "value": "Email or phone required" } },
                    { "name": "path", "value": { "kind": "array", "items": [{ "kind": "literal", "value": "email" }] } }
                ]
            }]
        },
        "AuditLog": {
            "fields": {
                "id": { "type": "Int", "id": true },
                "action": { "type": "String" }
            }
        }
    },
    "enums": { "Role": { "values": ["USER", "ADMIN"] } },
    "procedures": {
        "ping": { "returns": "String" },
        "search": {
            "params": [{ "name": "query", "type": "String", "optional": true }],
            "returns": "Post",
            "returnsArray": true
        }
    }
}"#;

pub fn accessor() -> SchemaAccessor {
    SchemaAccessor::new(Schema::from_json(SCHEMA).expect("fixture schema must decode"))
}

pub fn validator(options: ClientOptions) -> InputValidator {
    InputValidator::new(Arc::new(ValidatorFactory::new(accessor(), options)))
}

/// Executor echoing a canned response and recording every request.
#[derive(Default)]
pub struct StubExecutor {
    pub response: Mutex<Value>,
    pub requests: Mutex<Vec<(String, Operation, Value)>>,
}

impl StubExecutor {
    pub fn returning(response: impl Into<Value>) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(response.into()),
            requests: Mutex::default(),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl QueryExecutor for StubExecutor {
    async fn execute(&self, request: &ValidatedArgs) -> QueryResult<Value> {
        self.requests.lock().push((
            request.model().to_string(),
            request.operation(),
            request.args().clone(),
        ));
        Ok(self.response.lock().clone())
    }

    async fn call_procedure(&self, name: &str, args: Value) -> QueryResult<Value> {
        self.requests
            .lock()
            .push((name.to_string(), Operation::FindMany, args));
        Ok(Value::from(serde_json::json!([])))
    }
}
