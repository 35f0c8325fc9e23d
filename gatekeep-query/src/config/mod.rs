//! Client configuration.
//!
//! Options are usually built in code, but can also be loaded from TOML:
//!
//! ```toml
//! validate_input = true
//! allow_query_time_omit_override = false
//!
//! [slicing]
//! excludedModels = ["${HIDDEN_MODEL}"]
//!
//! [slicing.models."$all".fields."$all"]
//! excludedFilterKinds = ["Json"]
//! ```
//!
//! `${VAR}` references are expanded from the environment before parsing.

mod slicing;

pub use slicing::{
    ALL_KEY, FieldSlicing, FilterKind, FilterKinds, ModelSlicing, SlicingOptions,
};

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::error::{QueryError, QueryResult};

/// Options fixed for the lifetime of a client and its validator factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientOptions {
    /// Capability slicing.
    #[serde(default)]
    pub slicing: SlicingOptions,
    /// Run custom `@@validate` rules and field attribute checks.
    #[serde(default = "default_true")]
    pub validate_input: bool,
    /// Allow `omit: { field: false }` to re-include a field omitted by the schema.
    #[serde(default = "default_true")]
    pub allow_query_time_omit_override: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            slicing: SlicingOptions::default(),
            validate_input: true,
            allow_query_time_omit_override: true,
        }
    }
}

impl ClientOptions {
    /// Default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set slicing options.
    pub fn with_slicing(mut self, slicing: SlicingOptions) -> Self {
        self.slicing = slicing;
        self
    }

    /// Toggle custom rule and attribute validation.
    pub fn with_validate_input(mut self, enabled: bool) -> Self {
        self.validate_input = enabled;
        self
    }

    /// Toggle query-time omit overrides.
    pub fn with_omit_override(mut self, enabled: bool) -> Self {
        self.allow_query_time_omit_override = enabled;
        self
    }

    /// Load options from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> QueryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            QueryError::configuration(format!("failed to read {}", path.display())).with_source(e)
        })?;
        Self::from_str(&content)
    }

    /// Parse options from TOML, expanding `${VAR}` references first.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> QueryResult<Self> {
        let expanded = expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| {
            QueryError::configuration("invalid client options")
                .with_source(e)
                .with_help("Check the option names: slicing, validate_input, allow_query_time_omit_override")
        })
    }

    /// Deterministic hash of the whole configuration.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        // Serializing options cannot fail: every map key is a string.
        serde_json::to_string(self)
            .unwrap_or_default()
            .hash(&mut hasher);
        hasher.finish()
    }
}

fn expand_env_vars(content: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return content.to_string();
    };
    re.replace_all(content, |caps: &regex_lite::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
