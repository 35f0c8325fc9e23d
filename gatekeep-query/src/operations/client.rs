//! The client: schema, options, plugins and executor bound together.

use std::fmt;
use std::sync::Arc;
use tracing::debug;

use gatekeep_schema::SchemaAccessor;

use super::model::ModelClient;
use super::SharedExecutor;
use crate::config::ClientOptions;
use crate::error::QueryResult;
use crate::input::InputValidator;
use crate::plugin::PluginRegistry;
use crate::validator::ValidatorFactory;
use crate::value::Value;

/// Entry point for model operations and procedure calls.
///
/// Cloning is cheap; clones share the validator cache. A client with
/// different options or plugins gets a fresh cache.
///
/// ```rust,ignore
/// let client = Client::new(schema, executor);
/// let users = client
///     .model("User")?
///     .find_many(json!({ "where": { "age": { "gte": 18 } }, "take": 10 }))
///     .await?;
/// ```
#[derive(Clone)]
pub struct Client {
    schema: SchemaAccessor,
    executor: SharedExecutor,
    validator: InputValidator,
}

impl Client {
    /// Create a client with default options.
    pub fn new(schema: SchemaAccessor, executor: SharedExecutor) -> Self {
        Self::with_config(schema, executor, ClientOptions::default())
    }

    /// Create a client with the given options.
    pub fn with_config(schema: SchemaAccessor, executor: SharedExecutor, options: ClientOptions) -> Self {
        Self::assemble(schema, executor, Arc::new(options), PluginRegistry::new())
    }

    fn assemble(
        schema: SchemaAccessor,
        executor: SharedExecutor,
        options: Arc<ClientOptions>,
        plugins: PluginRegistry,
    ) -> Self {
        let factory = ValidatorFactory::with_plugins(schema.clone(), options, plugins);
        Self {
            schema,
            executor,
            validator: InputValidator::new(Arc::new(factory)),
        }
    }

    /// A client sharing schema, executor and plugins but using other options.
    pub fn with_options(&self, options: ClientOptions) -> Self {
        Self::assemble(
            self.schema.clone(),
            self.executor.clone(),
            Arc::new(options),
            self.plugins().clone(),
        )
    }

    /// A client with the given plugins.
    pub fn with_plugins(&self, plugins: PluginRegistry) -> Self {
        Self::assemble(
            self.schema.clone(),
            self.executor.clone(),
            self.options().clone(),
            plugins,
        )
    }

    /// The schema.
    pub fn schema(&self) -> &SchemaAccessor {
        &self.schema
    }

    /// The options.
    pub fn options(&self) -> &Arc<ClientOptions> {
        self.validator.factory().options()
    }

    /// Registered plugins.
    pub fn plugins(&self) -> &PluginRegistry {
        self.validator.factory().plugins()
    }

    /// The input validator.
    pub fn validator(&self) -> &InputValidator {
        &self.validator
    }

    pub(crate) fn executor(&self) -> &SharedExecutor {
        &self.executor
    }

    /// Operations on one model. Fails when the model is not in the schema.
    pub fn model(&self, name: &str) -> QueryResult<ModelClient> {
        let model = self.schema.require_model(name)?;
        Ok(ModelClient::new(self.clone(), model.name.clone()))
    }

    /// Validate and run a procedure call.
    pub async fn procedure(&self, name: &str, input: impl Into<Value>) -> QueryResult<Value> {
        let args = self.validator.validate_procedure(name, input)?;
        debug!(procedure = name, "calling procedure");
        self.executor.call_procedure(name, args).await
    }

    /// Build every reachable shape up front. Returns the number built.
    pub fn warm_up(&self) -> QueryResult<usize> {
        Ok(self.validator.factory().warm_up()?)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("provider", &self.schema.provider())
            .field("factory", self.validator.factory())
            .finish_non_exhaustive()
    }
}
