//! Slicing decisions.
//!
//! [`SlicingPolicy`] answers the capability questions asked while shapes are
//! built: is a model visible, is an operation allowed, which filter kinds may
//! a field use, is a procedure callable.
//!
//! Filter kinds resolve through four levels and the first level that
//! configures either list wins outright:
//!
//! 1. `models.<Model>.fields.<field>`
//! 2. `models.<Model>.fields.$all`
//! 3. `models.$all.fields.<field>`
//! 4. `models.$all.fields.$all`
//!
//! No configured level means the field is unrestricted.

use crate::config::{ALL_KEY, FieldSlicing, FilterKinds, ModelSlicing, SlicingOptions};
use crate::operation::Operation;

/// Filter-kind resolution outcome for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindResolution {
    /// No level configured anything for this field.
    Unrestricted,
    /// A level matched and produced this set.
    Restricted(FilterKinds),
}

impl KindResolution {
    /// The kinds the field may use.
    pub fn allowed(&self) -> FilterKinds {
        match self {
            Self::Unrestricted => FilterKinds::ALL,
            Self::Restricted(kinds) => *kinds,
        }
    }
}

/// Read-only view answering slicing questions.
#[derive(Debug, Clone, Copy)]
pub struct SlicingPolicy<'a> {
    options: &'a SlicingOptions,
}

impl<'a> SlicingPolicy<'a> {
    /// Wrap slicing options.
    pub fn new(options: &'a SlicingOptions) -> Self {
        Self { options }
    }

    /// Whether a model is exposed. Inclusion is applied first; exclusion wins.
    pub fn is_model_accessible(&self, model: &str) -> bool {
        let included = self
            .options
            .included_models
            .as_ref()
            .is_none_or(|list| list.iter().any(|m| m == model));
        let excluded = self
            .options
            .excluded_models
            .as_ref()
            .is_some_and(|list| list.iter().any(|m| m == model));
        included && !excluded
    }

    /// Whether an operation is allowed on a model.
    ///
    /// The model's own entry decides when it configures either operation list,
    /// otherwise the `$all` entry does. An empty inclusion list allows nothing.
    pub fn is_operation_allowed(&self, model: &str, operation: Operation) -> bool {
        if !self.is_model_accessible(model) {
            return false;
        }
        let entry = self
            .options
            .models
            .get(model)
            .filter(|m| m.configures_operations())
            .or_else(|| {
                self.options
                    .models
                    .get(ALL_KEY)
                    .filter(|m| m.configures_operations())
            });
        match entry {
            Some(entry) => operation_in(entry, operation),
            None => true,
        }
    }

    /// Operations allowed on a model, in declaration order.
    pub fn allowed_operations(&self, model: &str) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.is_operation_allowed(model, *op))
            .collect()
    }

    /// Resolve the filter kinds a field may use.
    pub fn filter_kinds(&self, model: &str, field: &str) -> KindResolution {
        let model_entry = self.options.models.get(model);
        let all_entry = self.options.models.get(ALL_KEY);

        let levels: [Option<&FieldSlicing>; 4] = [
            model_entry.and_then(|m| m.fields.get(field)),
            model_entry.and_then(|m| m.fields.get(ALL_KEY)),
            all_entry.and_then(|m| m.fields.get(field)),
            all_entry.and_then(|m| m.fields.get(ALL_KEY)),
        ];

        let resolved = levels
            .into_iter()
            .enumerate()
            .find_map(|(level, entry)| entry.filter(|e| e.is_configured()).map(|e| (level, e)));

        match resolved {
            Some((level, entry)) => {
                let kinds = entry.effective_kinds();
                crate::gatekeep_debug!(model, field, level = level + 1, kinds = ?kinds, "filter kinds resolved");
                KindResolution::Restricted(kinds)
            }
            None => KindResolution::Unrestricted,
        }
    }

    /// Whether a procedure is callable.
    pub fn is_procedure_allowed(&self, procedure: &str) -> bool {
        let included = self
            .options
            .included_procedures
            .as_ref()
            .is_none_or(|list| list.iter().any(|p| p == procedure));
        let excluded = self
            .options
            .excluded_procedures
            .as_ref()
            .is_some_and(|list| list.iter().any(|p| p == procedure));
        included && !excluded
    }
}

fn operation_in(entry: &ModelSlicing, operation: Operation) -> bool {
    let included = entry
        .included_operations
        .as_ref()
        .is_none_or(|ops| ops.contains(&operation));
    let excluded = entry
        .excluded_operations
        .as_ref()
        .is_some_and(|ops| ops.contains(&operation));
    included && !excluded
}
