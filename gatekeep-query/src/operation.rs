//! Client operation names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An operation exposed on a model client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    FindUnique,
    FindUniqueOrThrow,
    FindFirst,
    FindFirstOrThrow,
    FindMany,
    Exists,
    Create,
    CreateMany,
    CreateManyAndReturn,
    Update,
    UpdateMany,
    UpdateManyAndReturn,
    Upsert,
    Delete,
    DeleteMany,
    Count,
    Aggregate,
    GroupBy,
}

/// Coarse grouping of operations used by plugin contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationGroup {
    Read,
    Create,
    Update,
    Delete,
}

impl OperationGroup {
    /// Bucket key (`$read`, `$create`, `$update`, `$delete`).
    pub fn bucket(&self) -> &'static str {
        match self {
            Self::Read => "$read",
            Self::Create => "$create",
            Self::Update => "$update",
            Self::Delete => "$delete",
        }
    }
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Operation; 18] = [
        Self::FindUnique,
        Self::FindUniqueOrThrow,
        Self::FindFirst,
        Self::FindFirstOrThrow,
        Self::FindMany,
        Self::Exists,
        Self::Create,
        Self::CreateMany,
        Self::CreateManyAndReturn,
        Self::Update,
        Self::UpdateMany,
        Self::UpdateManyAndReturn,
        Self::Upsert,
        Self::Delete,
        Self::DeleteMany,
        Self::Count,
        Self::Aggregate,
        Self::GroupBy,
    ];

    /// The client-facing operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FindUnique => "findUnique",
            Self::FindUniqueOrThrow => "findUniqueOrThrow",
            Self::FindFirst => "findFirst",
            Self::FindFirstOrThrow => "findFirstOrThrow",
            Self::FindMany => "findMany",
            Self::Exists => "exists",
            Self::Create => "create",
            Self::CreateMany => "createMany",
            Self::CreateManyAndReturn => "createManyAndReturn",
            Self::Update => "update",
            Self::UpdateMany => "updateMany",
            Self::UpdateManyAndReturn => "updateManyAndReturn",
            Self::Upsert => "upsert",
            Self::Delete => "delete",
            Self::DeleteMany => "deleteMany",
            Self::Count => "count",
            Self::Aggregate => "aggregate",
            Self::GroupBy => "groupBy",
        }
    }

    /// The plugin bucket this operation falls into.
    ///
    /// `upsert` reports [`OperationGroup::Create`]; plugin merging treats it
    /// as both create-like and update-like.
    pub fn group(&self) -> OperationGroup {
        match self {
            Self::FindUnique
            | Self::FindUniqueOrThrow
            | Self::FindFirst
            | Self::FindFirstOrThrow
            | Self::FindMany
            | Self::Exists
            | Self::Count
            | Self::Aggregate
            | Self::GroupBy => OperationGroup::Read,
            Self::Create | Self::CreateMany | Self::CreateManyAndReturn | Self::Upsert => {
                OperationGroup::Create
            }
            Self::Update | Self::UpdateMany | Self::UpdateManyAndReturn => OperationGroup::Update,
            Self::Delete | Self::DeleteMany => OperationGroup::Delete,
        }
    }

    /// Whether the operation reads without writing.
    pub fn is_read(&self) -> bool {
        self.group() == OperationGroup::Read
    }

    /// Whether the operation targets one record through a unique filter.
    pub fn requires_unique_where(&self) -> bool {
        matches!(
            self,
            Self::FindUnique | Self::FindUniqueOrThrow | Self::Update | Self::Upsert | Self::Delete
        )
    }

    /// Whether a missing argument object may be treated as `{}`.
    pub fn args_optional(&self) -> bool {
        matches!(
            self,
            Self::FindFirst
                | Self::FindFirstOrThrow
                | Self::FindMany
                | Self::Exists
                | Self::DeleteMany
                | Self::Count
                | Self::Aggregate
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| format!("unknown operation `{s}`"))
    }
}
