//! Plugin contributions to operation arguments.
//!
//! A plugin may accept extra top-level argument keys (for example a cache
//! hint on reads). Contributions are keyed by bucket:
//!
//! | Bucket | Applies to |
//! |--------|------------|
//! | operation name (`findMany`, `upsert`, ...) | that operation only |
//! | `$read`, `$create`, `$update`, `$delete` | every operation of the group |
//! | `$all` | every operation |
//!
//! Per key, a named operation overrides its group bucket, which overrides
//! `$all`. `upsert` takes its own bucket when present, otherwise it merges
//! `$create` and `$update`.
//!
//! ```rust
//! use gatekeep_query::plugin::{ExtendedArgs, PluginRegistry, QueryPlugin};
//! use gatekeep_query::validator::Shape;
//! use gatekeep_query::Operation;
//!
//! struct CacheHints;
//!
//! impl QueryPlugin for CacheHints {
//!     fn name(&self) -> &str {
//!         "cache-hints"
//!     }
//!
//!     fn extended_args(&self) -> ExtendedArgs {
//!         ExtendedArgs::new().for_group("$read", "cache", Shape::Boolean)
//!     }
//! }
//!
//! let registry = PluginRegistry::new().with(CacheHints);
//! assert!(registry.merged_args(Operation::FindMany).contains_key("cache"));
//! assert!(!registry.merged_args(Operation::Create).contains_key("cache"));
//! ```

use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

use crate::config::ALL_KEY;
use crate::operation::{Operation, OperationGroup};
use crate::validator::Shape;

/// Extra argument keys, by bucket.
#[derive(Debug, Clone, Default)]
pub struct ExtendedArgs {
    buckets: IndexMap<SmolStr, IndexMap<SmolStr, Shape>>,
}

impl ExtendedArgs {
    /// Empty contribution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key for one operation.
    pub fn for_operation(self, operation: Operation, key: impl Into<SmolStr>, shape: Shape) -> Self {
        self.add(operation.as_str(), key, shape)
    }

    /// Add a key for a group bucket (`$read`, `$create`, `$update`, `$delete`).
    pub fn for_group(self, bucket: &str, key: impl Into<SmolStr>, shape: Shape) -> Self {
        self.add(bucket, key, shape)
    }

    /// Add a key for every operation.
    pub fn for_all(self, key: impl Into<SmolStr>, shape: Shape) -> Self {
        self.add(ALL_KEY, key, shape)
    }

    fn add(mut self, bucket: &str, key: impl Into<SmolStr>, shape: Shape) -> Self {
        self.buckets
            .entry(SmolStr::new(bucket))
            .or_default()
            .insert(key.into(), shape);
        self
    }

    fn bucket(&self, name: &str) -> Option<&IndexMap<SmolStr, Shape>> {
        self.buckets.get(name)
    }

    /// Keys that apply to an operation, after precedence.
    pub fn resolve(&self, operation: Operation) -> IndexMap<SmolStr, Shape> {
        let mut out = IndexMap::new();
        let mut overlay = |bucket: Option<&IndexMap<SmolStr, Shape>>| {
            if let Some(bucket) = bucket {
                for (key, shape) in bucket {
                    out.insert(key.clone(), shape.clone());
                }
            }
        };

        overlay(self.bucket(ALL_KEY));
        match (operation, self.bucket(operation.as_str())) {
            (Operation::Upsert, None) => {
                overlay(self.bucket(OperationGroup::Create.bucket()));
                overlay(self.bucket(OperationGroup::Update.bucket()));
            }
            (Operation::Upsert, named) => overlay(named),
            (_, named) => {
                overlay(self.bucket(operation.group().bucket()));
                overlay(named);
            }
        }
        out
    }

    /// Whether nothing was contributed.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// A plugin contributing argument keys.
pub trait QueryPlugin: Send + Sync {
    /// Plugin name, for logging.
    fn name(&self) -> &str;

    /// Argument keys the plugin accepts.
    fn extended_args(&self) -> ExtendedArgs;
}

/// A plugin shared across clients.
pub type SharedPlugin = Arc<dyn QueryPlugin>;

/// Registered plugins, in registration order.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<SharedPlugin>,
}

impl PluginRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin (builder pattern).
    pub fn with<P: QueryPlugin + 'static>(mut self, plugin: P) -> Self {
        self.register(Arc::new(plugin));
        self
    }

    /// Register a shared plugin.
    pub fn register(&mut self, plugin: SharedPlugin) {
        tracing::debug!(plugin = plugin.name(), "registered query plugin");
        self.plugins.push(plugin);
    }

    /// Number of plugins.
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Keys every plugin contributes to an operation. Later plugins win on
    /// conflicting keys.
    pub fn merged_args(&self, operation: Operation) -> IndexMap<SmolStr, Shape> {
        let mut out = IndexMap::new();
        for plugin in &self.plugins {
            out.extend(plugin.extended_args().resolve(operation));
        }
        out
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name()))
            .finish()
    }
}
