//! Slicing options: which models, operations, procedures and filter kinds a
//! client configuration exposes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

use crate::operation::Operation;

/// Key matching every model, or every field of a model.
pub const ALL_KEY: &str = "$all";

/// A category of filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterKind {
    /// `equals`, `not`, `in`, `notIn` and bare values.
    Equality,
    /// `lt`, `lte`, `gt`, `gte`, `between`.
    Range,
    /// `contains`, `startsWith`, `endsWith`, `mode`.
    Like,
    /// `is`, `isNot`, `some`, `every`, `none`.
    Relation,
    /// `path` and the `string_*` / `array_*` JSON predicates.
    Json,
    /// `has`, `hasEvery`, `hasSome`, `isEmpty`.
    List,
}

impl FilterKind {
    /// Every kind.
    pub const ALL: [FilterKind; 6] = [
        Self::Equality,
        Self::Range,
        Self::Like,
        Self::Relation,
        Self::Json,
        Self::List,
    ];

    /// The kind a filter operator belongs to.
    pub fn of_operator(operator: &str) -> Option<Self> {
        Some(match operator {
            "equals" | "not" | "in" | "notIn" => Self::Equality,
            "lt" | "lte" | "gt" | "gte" | "between" => Self::Range,
            "contains" | "startsWith" | "endsWith" | "mode" => Self::Like,
            "is" | "isNot" | "some" | "every" | "none" => Self::Relation,
            "path" | "string_contains" | "string_starts_with" | "string_ends_with"
            | "array_contains" | "array_starts_with" | "array_ends_with" => Self::Json,
            "has" | "hasEvery" | "hasSome" | "isEmpty" => Self::List,
            _ => return None,
        })
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A set of filter kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FilterKinds(u8);

impl FilterKinds {
    /// No kinds.
    pub const NONE: Self = Self(0);
    /// All kinds.
    pub const ALL: Self = Self(0b11_1111);

    /// Check membership.
    pub fn contains(&self, kind: FilterKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Add a kind.
    pub fn insert(&mut self, kind: FilterKind) {
        self.0 |= kind.bit();
    }

    /// Remove a kind.
    pub fn remove(&mut self, kind: FilterKind) {
        self.0 &= !kind.bit();
    }

    /// Check for the empty set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = FilterKind> + '_ {
        FilterKind::ALL.into_iter().filter(|k| self.contains(*k))
    }

    /// Whether the operator's kind is in the set. Unknown operators are never allowed.
    pub fn allows_operator(&self, operator: &str) -> bool {
        FilterKind::of_operator(operator).is_some_and(|k| self.contains(k))
    }
}

impl FromIterator<FilterKind> for FilterKinds {
    fn from_iter<I: IntoIterator<Item = FilterKind>>(iter: I) -> Self {
        let mut set = Self::NONE;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Debug for FilterKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Filter-kind restrictions for one field (or `$all` fields).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldSlicing {
    /// Kinds to allow. `None` starts from every kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_filter_kinds: Option<Vec<FilterKind>>,
    /// Kinds to remove.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_filter_kinds: Option<Vec<FilterKind>>,
}

impl FieldSlicing {
    /// Whether either list is configured.
    pub fn is_configured(&self) -> bool {
        self.included_filter_kinds.is_some() || self.excluded_filter_kinds.is_some()
    }

    /// Inclusion list (or every kind) minus the exclusion list.
    pub fn effective_kinds(&self) -> FilterKinds {
        let mut kinds = match &self.included_filter_kinds {
            Some(included) => included.iter().copied().collect(),
            None => FilterKinds::ALL,
        };
        for kind in self.excluded_filter_kinds.iter().flatten() {
            kinds.remove(*kind);
        }
        kinds
    }
}

/// Restrictions for one model (or `$all` models).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ModelSlicing {
    /// Operations to allow. An empty list allows nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_operations: Option<Vec<Operation>>,
    /// Operations to remove.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_operations: Option<Vec<Operation>>,
    /// Per-field filter restrictions, keyed by field name or `$all`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<SmolStr, FieldSlicing>,
}

impl ModelSlicing {
    /// Whether either operation list is configured.
    pub fn configures_operations(&self) -> bool {
        self.included_operations.is_some() || self.excluded_operations.is_some()
    }
}

/// Top-level slicing configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SlicingOptions {
    /// Models to expose. `None` exposes every model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_models: Option<Vec<SmolStr>>,
    /// Models to hide. Always wins over inclusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_models: Option<Vec<SmolStr>>,
    /// Per-model restrictions, keyed by model name or `$all`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub models: IndexMap<SmolStr, ModelSlicing>,
    /// Procedures to expose. `None` exposes every procedure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included_procedures: Option<Vec<SmolStr>>,
    /// Procedures to hide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_procedures: Option<Vec<SmolStr>>,
}

impl SlicingOptions {
    /// Whether nothing is restricted.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Builder: only expose the given models.
    pub fn include_models<S: Into<SmolStr>>(mut self, models: impl IntoIterator<Item = S>) -> Self {
        self.included_models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: hide the given models.
    pub fn exclude_models<S: Into<SmolStr>>(mut self, models: impl IntoIterator<Item = S>) -> Self {
        self.excluded_models = Some(models.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: set the entry for a model (or `$all`).
    pub fn model(mut self, name: impl Into<SmolStr>, slicing: ModelSlicing) -> Self {
        self.models.insert(name.into(), slicing);
        self
    }

    /// Builder: only expose the given procedures.
    pub fn include_procedures<S: Into<SmolStr>>(
        mut self,
        procedures: impl IntoIterator<Item = S>,
    ) -> Self {
        self.included_procedures = Some(procedures.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: hide the given procedures.
    pub fn exclude_procedures<S: Into<SmolStr>>(
        mut self,
        procedures: impl IntoIterator<Item = S>,
    ) -> Self {
        self.excluded_procedures = Some(procedures.into_iter().map(Into::into).collect());
        self
    }
}

impl ModelSlicing {
    /// Builder: only allow the given operations.
    pub fn include_operations(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        self.included_operations = Some(ops.into_iter().collect());
        self
    }

    /// Builder: remove the given operations.
    pub fn exclude_operations(mut self, ops: impl IntoIterator<Item = Operation>) -> Self {
        self.excluded_operations = Some(ops.into_iter().collect());
        self
    }

    /// Builder: set the entry for a field (or `$all`).
    pub fn field(mut self, name: impl Into<SmolStr>, slicing: FieldSlicing) -> Self {
        self.fields.insert(name.into(), slicing);
        self
    }
}

impl FieldSlicing {
    /// Builder: allow only the given kinds.
    pub fn include(mut self, kinds: impl IntoIterator<Item = FilterKind>) -> Self {
        self.included_filter_kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Builder: remove the given kinds.
    pub fn exclude(mut self, kinds: impl IntoIterator<Item = FilterKind>) -> Self {
        self.excluded_filter_kinds = Some(kinds.into_iter().collect());
        self
    }
}
