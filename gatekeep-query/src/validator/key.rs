//! Structural cache keys for shapes.

use smol_str::SmolStr;
use std::fmt;

use gatekeep_schema::ScalarType;

use crate::config::FilterKinds;
use crate::operation::Operation;

/// Value type a primitive filter applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterTarget {
    /// A scalar type.
    Scalar(ScalarType),
    /// An enum, by name.
    Enum(SmolStr),
}

impl fmt::Display for FilterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(ty) => write!(f, "{ty}"),
            Self::Enum(name) => f.write_str(name),
        }
    }
}

/// Identifies one buildable shape.
///
/// Keys are compared by value, so two requests for the same structure share
/// one cache entry regardless of where they come from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeKey {
    /// Top-level arguments of an operation.
    Args { model: SmolStr, operation: Operation },
    /// `where` input. `unique` builds the single-record lookup variant.
    Where { model: SmolStr, unique: bool },
    /// Filter object for a primitive field.
    ScalarFilter {
        target: FilterTarget,
        nullable: bool,
        kinds: FilterKinds,
    },
    /// Filter object for a scalar list field.
    ListFilter { target: FilterTarget, kinds: FilterKinds },
    /// Filter object for an opaque JSON field.
    JsonFilter { nullable: bool, kinds: FilterKinds },
    /// Field-by-field filter over an embedded type.
    TypeDefWhere { type_def: SmolStr },
    /// `having` input of `groupBy`.
    Having { model: SmolStr },
    /// `select` input.
    Select { model: SmolStr },
    /// `include` input.
    Include { model: SmolStr },
    /// `omit` input.
    Omit { model: SmolStr },
    /// One `orderBy` object.
    OrderBy { model: SmolStr },
    /// `_count` selection of to-many relations.
    CountSelect { model: SmolStr },
    /// Arguments nested under a relation in `select`/`include`.
    RelationReadArgs { model: SmolStr, field: SmolStr },
    /// `create` data, optionally without the back-relation to the parent.
    CreateData { model: SmolStr, without: Option<SmolStr> },
    /// One `createMany` record.
    CreateManyData { model: SmolStr, without: Option<SmolStr> },
    /// `update` data.
    UpdateData { model: SmolStr, without: Option<SmolStr> },
    /// `updateMany` data.
    UpdateManyData { model: SmolStr, without: Option<SmolStr> },
    /// Nested relation operators available while creating.
    RelationCreate { model: SmolStr, field: SmolStr },
    /// Nested relation operators available while updating.
    RelationUpdate { model: SmolStr, field: SmolStr },
    /// Value of an embedded-type field in a mutation.
    TypeDefData { type_def: SmolStr },
}

impl ShapeKey {
    /// Arguments key.
    pub fn args(model: impl Into<SmolStr>, operation: Operation) -> Self {
        Self::Args {
            model: model.into(),
            operation,
        }
    }

    /// Where key.
    pub fn where_input(model: impl Into<SmolStr>, unique: bool) -> Self {
        Self::Where {
            model: model.into(),
            unique,
        }
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = |w: &Option<SmolStr>| match w {
            Some(field) => format!("Without{}", capitalize(field)),
            None => String::new(),
        };
        match self {
            Self::Args { model, operation } => write!(f, "{model}{}Args", capitalize(operation.as_str())),
            Self::Where { model, unique: false } => write!(f, "{model}WhereInput"),
            Self::Where { model, unique: true } => write!(f, "{model}WhereUniqueInput"),
            Self::ScalarFilter { target, nullable, .. } => {
                write!(f, "{target}{}Filter", if *nullable { "Nullable" } else { "" })
            }
            Self::ListFilter { target, .. } => write!(f, "{target}ListFilter"),
            Self::JsonFilter { nullable, .. } => {
                write!(f, "Json{}Filter", if *nullable { "Nullable" } else { "" })
            }
            Self::TypeDefWhere { type_def } => write!(f, "{type_def}WhereInput"),
            Self::Having { model } => write!(f, "{model}ScalarWhereWithAggregatesInput"),
            Self::Select { model } => write!(f, "{model}Select"),
            Self::Include { model } => write!(f, "{model}Include"),
            Self::Omit { model } => write!(f, "{model}Omit"),
            Self::OrderBy { model } => write!(f, "{model}OrderByInput"),
            Self::CountSelect { model } => write!(f, "{model}CountOutputTypeSelect"),
            Self::RelationReadArgs { model, field } => write!(f, "{model}{}Args", capitalize(field)),
            Self::CreateData { model, without } => write!(f, "{model}Create{}Input", suffix(without)),
            Self::CreateManyData { model, without } => {
                write!(f, "{model}CreateMany{}Input", suffix(without))
            }
            Self::UpdateData { model, without } => write!(f, "{model}Update{}Input", suffix(without)),
            Self::UpdateManyData { model, without } => {
                write!(f, "{model}UpdateMany{}Input", suffix(without))
            }
            Self::RelationCreate { model, field } => {
                write!(f, "{model}{}CreateNestedInput", capitalize(field))
            }
            Self::RelationUpdate { model, field } => {
                write!(f, "{model}{}UpdateNestedInput", capitalize(field))
            }
            Self::TypeDefData { type_def } => write!(f, "{type_def}Input"),
        }
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
