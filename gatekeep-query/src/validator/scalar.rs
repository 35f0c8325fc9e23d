//! Scalar type acceptance and field attribute checks.

use regex_lite::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

use gatekeep_schema::{Attribute, FieldDef, ScalarType, SchemaError, SchemaResult};

use crate::value::Value;

/// Whether a string looks like an email address.
pub fn is_email(s: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").ok()
        })
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

/// Whether a string is an absolute URL.
pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

/// Whether a string is an ISO-8601 date or date-time.
pub fn is_datetime(s: &str) -> bool {
    chrono::DateTime::parse_from_rfc3339(s).is_ok()
        || chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Whether a value is acceptable for a scalar type.
pub fn accepts(ty: ScalarType, value: &Value) -> bool {
    match ty {
        ScalarType::String => matches!(value, Value::String(_)),
        ScalarType::Boolean => matches!(value, Value::Bool(_)),
        ScalarType::Int => value
            .as_i64()
            .is_some_and(|i| i32::try_from(i).is_ok()),
        ScalarType::BigInt => match value {
            Value::String(s) => s.parse::<i64>().is_ok(),
            other => other.as_i64().is_some(),
        },
        ScalarType::Float => matches!(value, Value::Int(_) | Value::Float(_)),
        ScalarType::Decimal => match value {
            Value::String(s) => Decimal::from_str(s).is_ok(),
            other => other.is_number(),
        },
        ScalarType::DateTime => value.as_str().is_some_and(is_datetime),
        ScalarType::Bytes => match value {
            Value::Bytes(_) => true,
            Value::Array(items) => items
                .iter()
                .all(|b| b.as_i64().is_some_and(|n| (0..=255).contains(&n))),
            _ => false,
        },
        ScalarType::Json => !value.is_undefined() && !value.is_sentinel(),
    }
}

/// A value check derived from a field attribute.
#[derive(Debug, Clone)]
pub struct ScalarCheck {
    /// The rule.
    pub rule: CheckRule,
    /// Message overriding the default one.
    pub message: Option<String>,
}

/// Value rules supported by field attributes.
#[derive(Debug, Clone)]
pub enum CheckRule {
    /// String or list length bounds.
    Length { min: Option<usize>, max: Option<usize> },
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Regex(Regex),
    Email,
    Url,
    DateTime,
    Gt(f64),
    Gte(f64),
    Lt(f64),
    Lte(f64),
}

impl ScalarCheck {
    /// Check without a custom message.
    pub fn new(rule: CheckRule) -> Self {
        Self { rule, message: None }
    }

    /// Run the check. Returns the failure message, if any.
    ///
    /// Values the rule does not apply to (a number for a string rule) pass;
    /// the type check already rejected those.
    pub fn run(&self, value: &Value) -> Option<String> {
        let failed = match (&self.rule, value) {
            (CheckRule::Length { min, max }, value) => {
                let len = match value {
                    Value::String(s) => s.chars().count(),
                    Value::Array(items) => items.len(),
                    _ => return None,
                };
                min.is_some_and(|m| len < m) || max.is_some_and(|m| len > m)
            }
            (CheckRule::StartsWith(p), Value::String(s)) => !s.starts_with(p.as_str()),
            (CheckRule::EndsWith(p), Value::String(s)) => !s.ends_with(p.as_str()),
            (CheckRule::Contains(p), Value::String(s)) => !s.contains(p.as_str()),
            (CheckRule::Regex(re), Value::String(s)) => !re.is_match(s),
            (CheckRule::Email, Value::String(s)) => !is_email(s),
            (CheckRule::Url, Value::String(s)) => !is_url(s),
            (CheckRule::DateTime, Value::String(s)) => !is_datetime(s),
            (CheckRule::Gt(n), v) => v.as_f64().is_some_and(|x| x <= *n),
            (CheckRule::Gte(n), v) => v.as_f64().is_some_and(|x| x < *n),
            (CheckRule::Lt(n), v) => v.as_f64().is_some_and(|x| x >= *n),
            (CheckRule::Lte(n), v) => v.as_f64().is_some_and(|x| x > *n),
            _ => false,
        };
        failed.then(|| self.message.clone().unwrap_or_else(|| self.default_message()))
    }

    fn default_message(&self) -> String {
        match &self.rule {
            CheckRule::Length { min: Some(min), max: Some(max) } => {
                format!("length must be between {min} and {max}")
            }
            CheckRule::Length { min: Some(min), .. } => format!("length must be at least {min}"),
            CheckRule::Length { max: Some(max), .. } => format!("length must be at most {max}"),
            CheckRule::Length { .. } => "invalid length".to_string(),
            CheckRule::StartsWith(p) => format!("must start with \"{p}\""),
            CheckRule::EndsWith(p) => format!("must end with \"{p}\""),
            CheckRule::Contains(p) => format!("must contain \"{p}\""),
            CheckRule::Regex(re) => format!("must match pattern {}", re.as_str()),
            CheckRule::Email => "must be a valid email".to_string(),
            CheckRule::Url => "must be a valid URL".to_string(),
            CheckRule::DateTime => "must be a valid ISO date-time".to_string(),
            CheckRule::Gt(n) => format!("must be greater than {n}"),
            CheckRule::Gte(n) => format!("must be greater than or equal to {n}"),
            CheckRule::Lt(n) => format!("must be less than {n}"),
            CheckRule::Lte(n) => format!("must be less than or equal to {n}"),
        }
    }
}

/// Translate a field's attributes into value checks.
///
/// Attributes without a validation meaning (`@id`, `@default`, ...) are ignored.
pub fn checks_for_field(field: &FieldDef) -> SchemaResult<Vec<ScalarCheck>> {
    field
        .attributes
        .iter()
        .filter_map(|attr| check_for_attribute(attr).transpose())
        .collect()
}

fn check_for_attribute(attr: &Attribute) -> SchemaResult<Option<ScalarCheck>> {
    let string_arg = |name: &str| {
        attr.string_arg(0, name).map(str::to_string).ok_or_else(|| {
            SchemaError::invalid_attribute(attr.name(), format!("expects a string `{name}` argument"))
        })
    };
    let number_arg = |name: &str| {
        attr.number_arg(0, name).ok_or_else(|| {
            SchemaError::invalid_attribute(attr.name(), format!("expects a numeric `{name}` argument"))
        })
    };

    let rule = match attr.name() {
        "@length" => {
            let bound = |position: usize, name: &str| -> SchemaResult<Option<usize>> {
                match attr.arg(position, name) {
                    None => Ok(None),
                    Some(expr) => expr
                        .as_number()
                        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
                        .map(|n| Some(n as usize))
                        .ok_or_else(|| {
                            SchemaError::invalid_attribute(
                                "@length",
                                format!("`{name}` must be a non-negative integer"),
                            )
                        }),
                }
            };
            CheckRule::Length {
                min: bound(0, "min")?,
                max: bound(1, "max")?,
            }
        }
        "@startsWith" => CheckRule::StartsWith(string_arg("text")?),
        "@endsWith" => CheckRule::EndsWith(string_arg("text")?),
        "@contains" => CheckRule::Contains(string_arg("text")?),
        "@regex" => {
            let pattern = string_arg("regex")?;
            CheckRule::Regex(Regex::new(&pattern).map_err(|e| {
                SchemaError::invalid_attribute("@regex", format!("invalid pattern: {e}"))
            })?)
        }
        "@email" => CheckRule::Email,
        "@url" => CheckRule::Url,
        "@datetime" => CheckRule::DateTime,
        "@gt" => CheckRule::Gt(number_arg("value")?),
        "@gte" => CheckRule::Gte(number_arg("value")?),
        "@lt" => CheckRule::Lt(number_arg("value")?),
        "@lte" => CheckRule::Lte(number_arg("value")?),
        _ => return Ok(None),
    };

    Ok(Some(ScalarCheck {
        rule,
        message: attr.string_arg(usize::MAX, "message").map(str::to_string),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatekeep_schema::Expression;

    // ==================== Type Acceptance Tests ====================

    #[test]
    fn test_numeric_acceptance() {
        assert!(accepts(ScalarType::Int, &Value::Int(5)));
        assert!(accepts(ScalarType::Int, &Value::Float(5.0)));
        assert!(!accepts(ScalarType::Int, &Value::Float(5.5)));
        assert!(!accepts(ScalarType::Int, &Value::Int(i64::MAX)));
        assert!(accepts(ScalarType::BigInt, &Value::Int(i64::MAX)));
        assert!(accepts(ScalarType::BigInt, &Value::String("9007199254740993".into())));
        assert!(accepts(ScalarType::Float, &Value::Int(1)));
        assert!(accepts(ScalarType::Decimal, &Value::String("12.50".into())));
        assert!(!accepts(ScalarType::Decimal, &Value::String("twelve".into())));
    }

    #[test]
    fn test_other_acceptance() {
        assert!(accepts(ScalarType::DateTime, &Value::String("2024-01-02T03:04:05Z".into())));
        assert!(accepts(ScalarType::DateTime, &Value::String("2024-01-02".into())));
        assert!(!accepts(ScalarType::DateTime, &Value::String("yesterday".into())));
        assert!(accepts(ScalarType::Bytes, &Value::Bytes(vec![1, 2])));
        assert!(!accepts(ScalarType::Bytes, &Value::Array(vec![Value::Int(300)])));
        assert!(accepts(ScalarType::Json, &Value::Null));
        assert!(!accepts(ScalarType::Json, &Value::DbNull));
        assert!(!accepts(ScalarType::String, &Value::Int(1)));
    }

    // ==================== Format Tests ====================

    #[test]
    fn test_formats() {
        assert!(is_email("u@x.com"));
        assert!(!is_email("not-an-email"));
        assert!(is_url("https://example.com/a?b=c"));
        assert!(!is_url("example"));
        assert!(is_datetime("2024-02-29T12:00:00.000+02:00"));
    }

    // ==================== Attribute Tests ====================

    #[test]
    fn test_length_attribute() {
        let field = FieldDef::new("name", "String").attribute(
            Attribute::new("@length")
                .with_arg(Expression::literal(2))
                .with_arg(Expression::literal(4)),
        );
        let checks = checks_for_field(&field).unwrap();
        assert_eq!(checks.len(), 1);
        assert!(checks[0].run(&Value::from("abc")).is_none());
        assert_eq!(
            checks[0].run(&Value::from("a")).as_deref(),
            Some("length must be between 2 and 4")
        );
    }

    #[test]
    fn test_custom_message() {
        let field = FieldDef::new("age", "Int").attribute(
            Attribute::new("@gte")
                .with_arg(Expression::literal(18))
                .with_named_arg("message", Expression::literal("too young")),
        );
        let checks = checks_for_field(&field).unwrap();
        assert_eq!(checks[0].run(&Value::Int(17)).as_deref(), Some("too young"));
        assert!(checks[0].run(&Value::Int(18)).is_none());
    }

    #[test]
    fn test_regex_and_email() {
        let field = FieldDef::new("code", "String")
            .attribute(Attribute::new("@regex").with_arg(Expression::literal("^[A-Z]{3}$")))
            .attribute(Attribute::new("@email"))
            .attribute(Attribute::new("@id"));
        let checks = checks_for_field(&field).unwrap();
        assert_eq!(checks.len(), 2);
        assert!(checks[0].run(&Value::from("ABC")).is_none());
        assert!(checks[0].run(&Value::from("abc")).is_some());
    }

    #[test]
    fn test_malformed_attribute_is_schema_error() {
        let field = FieldDef::new("code", "String")
            .attribute(Attribute::new("@regex").with_arg(Expression::literal("(")));
        let err = checks_for_field(&field).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidAttribute { .. }));

        let missing = FieldDef::new("age", "Int").attribute(Attribute::new("@gt"));
        assert!(checks_for_field(&missing).is_err());
    }
}
