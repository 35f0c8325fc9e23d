//! Input validation entry points.
//!
//! [`InputValidator`] is what operation handlers call before anything reaches
//! the executor: it checks the slicing policy, normalizes the arguments,
//! runs the cached shape for `(model, operation)` and turns issues into a
//! [`QueryError`].

use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::operation::Operation;
use crate::validator::{ShapeKey, ValidatorFactory};
use crate::value::Value;

/// Arguments that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedArgs {
    operation: Operation,
    model: SmolStr,
    args: Value,
}

impl ValidatedArgs {
    /// The operation the arguments were validated for.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// The model.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// The normalized arguments.
    pub fn args(&self) -> &Value {
        &self.args
    }

    /// Mutable access for handlers applying defaults after validation.
    pub(crate) fn args_mut(&mut self) -> &mut Value {
        &mut self.args
    }

    /// Take the normalized arguments.
    pub fn into_value(self) -> Value {
        self.args
    }
}

/// Validates operation arguments against one factory.
#[derive(Debug, Clone)]
pub struct InputValidator {
    factory: Arc<ValidatorFactory>,
}

impl InputValidator {
    /// Create a validator over a factory.
    pub fn new(factory: Arc<ValidatorFactory>) -> Self {
        Self { factory }
    }

    /// The factory.
    pub fn factory(&self) -> &Arc<ValidatorFactory> {
        &self.factory
    }

    /// Validate arguments for an operation.
    ///
    /// Hidden models and operations are rejected before any shape is built.
    /// A missing argument object counts as `{}` for operations whose
    /// arguments are all optional.
    pub fn validate(&self, model: &str, operation: Operation, args: impl Into<Value>) -> QueryResult<ValidatedArgs> {
        if !self.factory.policy().is_operation_allowed(model, operation) {
            debug!(model, operation = %operation, "operation rejected by slicing");
            return Err(QueryError::operation_not_allowed(operation, model));
        }

        let mut args = args.into().normalize();
        if args.is_undefined() && operation.args_optional() {
            args = Value::object();
        }

        let issues = self.factory.check(&ShapeKey::args(model, operation), &args)?;
        if !issues.is_empty() {
            debug!(model, operation = %operation, issues = issues.len(), "input rejected");
            return Err(QueryError::invalid_input(operation, model, issues));
        }

        Ok(ValidatedArgs {
            operation,
            model: model.into(),
            args,
        })
    }
}

macro_rules! per_operation {
    ($($name:ident => $op:ident),* $(,)?) => {
        impl InputValidator {
            $(
                #[doc = concat!("Validate `", stringify!($op), "` arguments.")]
                pub fn $name(&self, model: &str, args: impl Into<Value>) -> QueryResult<ValidatedArgs> {
                    self.validate(model, Operation::$op, args)
                }
            )*
        }
    };
}

per_operation! {
    validate_find_unique => FindUnique,
    validate_find_unique_or_throw => FindUniqueOrThrow,
    validate_find_first => FindFirst,
    validate_find_first_or_throw => FindFirstOrThrow,
    validate_find_many => FindMany,
    validate_exists => Exists,
    validate_create => Create,
    validate_create_many => CreateMany,
    validate_create_many_and_return => CreateManyAndReturn,
    validate_update => Update,
    validate_update_many => UpdateMany,
    validate_update_many_and_return => UpdateManyAndReturn,
    validate_upsert => Upsert,
    validate_delete => Delete,
    validate_delete_many => DeleteMany,
    validate_count => Count,
    validate_aggregate => Aggregate,
    validate_group_by => GroupBy,
}
