//! Type definitions for the schema description.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Storage providers known to the schema compiler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvider {
    /// PostgreSQL.
    #[default]
    #[serde(alias = "postgres")]
    PostgreSql,
    /// MySQL / MariaDB.
    MySql,
    /// SQLite.
    #[serde(alias = "sqlite3")]
    Sqlite,
}

impl DatabaseProvider {
    /// Get the provider name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Whether string filters may request case-insensitive matching.
    pub fn supports_insensitive_mode(&self) -> bool {
        matches!(self, Self::PostgreSql)
    }
}

/// Scalar types understood by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Integer type.
    Int,
    /// Big integer type.
    BigInt,
    /// Floating point type.
    Float,
    /// Decimal type for precise calculations.
    Decimal,
    /// String type.
    String,
    /// Boolean type.
    Boolean,
    /// Date and time type.
    DateTime,
    /// JSON type.
    Json,
    /// Binary/Bytes type.
    Bytes,
}

impl ScalarType {
    /// Parse a scalar type from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Int" => Some(Self::Int),
            "BigInt" => Some(Self::BigInt),
            "Float" => Some(Self::Float),
            "Decimal" => Some(Self::Decimal),
            "String" => Some(Self::String),
            "Boolean" | "Bool" => Some(Self::Boolean),
            "DateTime" => Some(Self::DateTime),
            "Json" => Some(Self::Json),
            "Bytes" => Some(Self::Bytes),
            _ => None,
        }
    }

    /// Get the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::BigInt => "BigInt",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::Boolean => "Boolean",
            Self::DateTime => "DateTime",
            Self::Json => "Json",
            Self::Bytes => "Bytes",
        }
    }

    /// Numeric types accept arithmetic update operators and `_avg`/`_sum`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::BigInt | Self::Float | Self::Decimal)
    }

    /// Types that support range comparisons (`lt`, `gte`, ...).
    pub fn is_ordered(&self) -> bool {
        self.is_numeric() || matches!(self, Self::String | Self::DateTime)
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A field type after resolution against the schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// A scalar type (Int, String, etc.).
    Scalar(ScalarType),
    /// A reference to an enum defined in the schema.
    Enum(SmolStr),
    /// A reference to an embedded structured type.
    TypeDef(SmolStr),
    /// A reference to a model (relation).
    Model(SmolStr),
}

impl FieldType {
    /// Check if this is a scalar type.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Check if this is a relation to another model.
    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// Check if this is an enum type.
    pub fn is_enum(&self) -> bool {
        matches!(self, Self::Enum(_))
    }

    /// Check if this is an embedded structured type.
    pub fn is_type_def(&self) -> bool {
        matches!(self, Self::TypeDef(_))
    }

    /// Get the type name as a string.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Scalar(s) => s.as_str(),
            Self::Enum(name) | Self::TypeDef(name) | Self::Model(name) => name.as_str(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_type_from_str() {
        assert_eq!(ScalarType::from_str("Int"), Some(ScalarType::Int));
        assert_eq!(ScalarType::from_str("Bool"), Some(ScalarType::Boolean));
        assert_eq!(ScalarType::from_str("Json"), Some(ScalarType::Json));
        assert_eq!(ScalarType::from_str("Address"), None);
    }

    #[test]
    fn test_scalar_type_round_trips_name() {
        for ty in [
            ScalarType::Int,
            ScalarType::BigInt,
            ScalarType::Float,
            ScalarType::Decimal,
            ScalarType::String,
            ScalarType::Boolean,
            ScalarType::DateTime,
            ScalarType::Json,
            ScalarType::Bytes,
        ] {
            assert_eq!(ScalarType::from_str(ty.as_str()), Some(ty));
        }
    }

    #[test]
    fn test_scalar_type_categories() {
        assert!(ScalarType::Decimal.is_numeric());
        assert!(!ScalarType::String.is_numeric());
        assert!(ScalarType::DateTime.is_ordered());
        assert!(!ScalarType::Boolean.is_ordered());
        assert!(!ScalarType::Json.is_ordered());
    }

    #[test]
    fn test_field_type_predicates() {
        assert!(FieldType::Model("Post".into()).is_relation());
        assert!(FieldType::TypeDef("Address".into()).is_type_def());
        assert_eq!(FieldType::Enum("Role".into()).type_name(), "Role");
        assert_eq!(FieldType::Scalar(ScalarType::Int).to_string(), "Int");
    }

    #[test]
    fn test_provider_insensitive_mode() {
        assert!(DatabaseProvider::PostgreSql.supports_insensitive_mode());
        assert!(!DatabaseProvider::Sqlite.supports_insensitive_mode());
        assert_eq!(DatabaseProvider::MySql.as_str(), "mysql");
    }
}
