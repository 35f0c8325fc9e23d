//! Evaluation of model and type-def validation rules.
//!
//! Rules are boolean [`Expression`]s evaluated against the candidate record.
//! Comparisons never coerce: operands of different types are unequal and
//! unordered. `null` and absent values are falsy in logical operators.

use regex_lite::Regex;
use std::cmp::Ordering;

use gatekeep_schema::{BinaryOp, Expression, Literal, SchemaError, SchemaResult, UnaryOp};

use crate::validator::scalar::{is_datetime, is_email, is_url};
use crate::value::Value;

static NULL: Value = Value::Null;

/// Result of running one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The rule held.
    Passed,
    /// The rule evaluated to `false`.
    Failed,
}

/// Evaluate a rule against a record.
///
/// Absent fields read as `null`. Only a `false` result fails; `null` and
/// other values pass.
pub fn evaluate_rule(expression: &Expression, record: &Value) -> SchemaResult<RuleOutcome> {
    match Evaluator::new(record).evaluate(expression)? {
        Value::Bool(false) => Ok(RuleOutcome::Failed),
        _ => Ok(RuleOutcome::Passed),
    }
}

/// Reject rules that could never evaluate: unknown functions, wrong arities,
/// collection bindings, and invalid regex literals.
pub fn check_rule(expression: &Expression) -> SchemaResult<()> {
    match expression {
        Expression::Literal { .. } | Expression::Field { .. } | Expression::This | Expression::Null => {
            Ok(())
        }
        Expression::Array { items } => items.iter().try_for_each(check_rule),
        Expression::Member { receiver, .. } => check_rule(receiver),
        Expression::Unary { operand, .. } => check_rule(operand),
        Expression::Binary { left, right, .. } => {
            check_rule(left)?;
            check_rule(right)
        }
        Expression::Binding { name } => Err(SchemaError::invalid_expression(format!(
            "binding `{name}` cannot be used in a validation rule"
        ))),
        Expression::Call { function, args } => {
            let (min, max) = arity(function).ok_or_else(|| {
                SchemaError::invalid_expression(format!("unknown function `{function}`"))
            })?;
            if args.len() < min || args.len() > max {
                return Err(SchemaError::invalid_expression(format!(
                    "function `{function}` takes {min} to {max} arguments, got {}",
                    args.len()
                )));
            }
            if function == "regex" {
                if let Some(pattern) = args.get(1).and_then(Expression::as_string) {
                    Regex::new(pattern).map_err(|e| {
                        SchemaError::invalid_expression(format!("invalid regex `{pattern}`: {e}"))
                    })?;
                }
            }
            args.iter().try_for_each(check_rule)
        }
    }
}

fn arity(function: &str) -> Option<(usize, usize)> {
    let range = match function {
        "length" => (1, 3),
        "startsWith" | "endsWith" | "regex" => (2, 2),
        "contains" => (2, 3),
        "isEmail" | "isUrl" | "isDateTime" | "isEmpty" => (1, 1),
        "has" | "hasEvery" | "hasSome" => (2, 2),
        _ => return None,
    };
    Some(range)
}

/// Tree-walking evaluator over a record.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    this: &'a Value,
}

impl<'a> Evaluator<'a> {
    /// Evaluate against `this`.
    pub fn new(this: &'a Value) -> Self {
        Self { this }
    }

    /// Evaluate an expression to a value.
    pub fn evaluate(&self, expression: &Expression) -> SchemaResult<Value> {
        match expression {
            Expression::Literal { value } => Ok(match value {
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Float(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expression::Array { items } => Ok(Value::Array(
                items
                    .iter()
                    .map(|item| self.evaluate(item))
                    .collect::<SchemaResult<_>>()?,
            )),
            Expression::Field { field } => Ok(match self.this.get(field) {
                Value::Undefined => Value::Null,
                value => value.clone(),
            }),
            Expression::Member { receiver, members } => {
                let mut current = self.evaluate(receiver)?;
                for member in members {
                    current = current.get(member).clone();
                }
                Ok(current)
            }
            Expression::This => Ok(self.this.clone()),
            Expression::Null => Ok(Value::Null),
            Expression::Unary { op: UnaryOp::Not, operand } => {
                let value = self.evaluate(operand)?;
                Ok(Value::Bool(!truthy(&value, "!")?))
            }
            Expression::Binary { op, left, right } => self.binary(*op, left, right),
            Expression::Call { function, args } => self.call(function, args),
            Expression::Binding { name } => Err(SchemaError::invalid_expression(format!(
                "binding `{name}` cannot be used in a validation rule"
            ))),
        }
    }

    fn binary(&self, op: BinaryOp, left: &Expression, right: &Expression) -> SchemaResult<Value> {
        match op {
            BinaryOp::And => {
                if !truthy(&self.evaluate(left)?, "&&")? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(truthy(&self.evaluate(right)?, "&&")?))
            }
            BinaryOp::Or => {
                if truthy(&self.evaluate(left)?, "||")? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(truthy(&self.evaluate(right)?, "||")?))
            }
            _ => {
                let l = self.evaluate(left)?;
                let r = self.evaluate(right)?;
                let result = match op {
                    BinaryOp::Eq => equals(&l, &r),
                    BinaryOp::Ne => !equals(&l, &r),
                    BinaryOp::Lt => compare(&l, &r) == Some(Ordering::Less),
                    BinaryOp::Lte => matches!(compare(&l, &r), Some(Ordering::Less | Ordering::Equal)),
                    BinaryOp::Gt => compare(&l, &r) == Some(Ordering::Greater),
                    BinaryOp::Gte => {
                        matches!(compare(&l, &r), Some(Ordering::Greater | Ordering::Equal))
                    }
                    BinaryOp::Any | BinaryOp::All | BinaryOp::None => match list(&l, op.as_str())? {
                        None => false,
                        Some(items) => match op {
                            BinaryOp::Any => items.iter().any(|item| equals(item, &r)),
                            BinaryOp::All => items.iter().all(|item| equals(item, &r)),
                            _ => !items.iter().any(|item| equals(item, &r)),
                        },
                    },
                    BinaryOp::In => match list(&r, "in")? {
                        None => false,
                        Some(items) => items.iter().any(|item| equals(item, &l)),
                    },
                    BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
                };
                Ok(Value::Bool(result))
            }
        }
    }

    fn call(&self, function: &str, args: &[Expression]) -> SchemaResult<Value> {
        let values = args
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<SchemaResult<Vec<_>>>()?;
        let first = values.first().unwrap_or(&NULL);
        let absent = first.is_null() || first.is_undefined();

        let result = match function {
            "length" => {
                let len = match first {
                    Value::String(s) => Some(s.chars().count()),
                    Value::Array(items) => Some(items.len()),
                    Value::Null | Value::Undefined => None,
                    other => return Err(type_error(function, "a string or list", other)),
                };
                let Some(len) = len else {
                    return Ok(Value::Bool(false));
                };
                if values.len() == 1 {
                    return Ok(Value::Int(len as i64));
                }
                let min = number_arg(function, &values, 1)?;
                let max = match values.get(2) {
                    Some(_) => number_arg(function, &values, 2)?,
                    None => f64::INFINITY,
                };
                (len as f64) >= min && (len as f64) <= max
            }
            "startsWith" | "endsWith" | "contains" | "regex" => {
                if absent {
                    return Ok(Value::Bool(false));
                }
                let subject = string_arg(function, &values, 0)?;
                let needle = string_arg(function, &values, 1)?;
                match function {
                    "startsWith" => subject.starts_with(needle),
                    "endsWith" => subject.ends_with(needle),
                    "contains" => {
                        let insensitive = values.get(2).and_then(Value::as_bool).unwrap_or(false);
                        if insensitive {
                            subject.to_lowercase().contains(&needle.to_lowercase())
                        } else {
                            subject.contains(needle)
                        }
                    }
                    _ => Regex::new(needle)
                        .map_err(|e| SchemaError::invalid_expression(format!("invalid regex: {e}")))?
                        .is_match(subject),
                }
            }
            "isEmail" | "isUrl" | "isDateTime" => {
                if absent {
                    return Ok(Value::Bool(false));
                }
                let subject = string_arg(function, &values, 0)?;
                match function {
                    "isEmail" => is_email(subject),
                    "isUrl" => is_url(subject),
                    _ => is_datetime(subject),
                }
            }
            "has" | "hasEvery" | "hasSome" | "isEmpty" => {
                let Some(items) = list(first, function)? else {
                    return Ok(Value::Bool(false));
                };
                match function {
                    "isEmpty" => items.is_empty(),
                    "has" => {
                        let needle = values.get(1).unwrap_or(&NULL);
                        items.iter().any(|item| equals(item, needle))
                    }
                    _ => {
                        let Some(wanted) = list(values.get(1).unwrap_or(&NULL), function)? else {
                            return Ok(Value::Bool(false));
                        };
                        if function == "hasEvery" {
                            wanted.iter().all(|w| items.iter().any(|item| equals(item, w)))
                        } else {
                            wanted.iter().any(|w| items.iter().any(|item| equals(item, w)))
                        }
                    }
                }
            }
            other => {
                return Err(SchemaError::invalid_expression(format!(
                    "unknown function `{other}`"
                )));
            }
        };
        Ok(Value::Bool(result))
    }
}

fn truthy(value: &Value, op: &str) -> SchemaResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null | Value::Undefined => Ok(false),
        other => Err(SchemaError::invalid_expression(format!(
            "operator `{op}` expects a boolean, got {}",
            other.type_name()
        ))),
    }
}

fn list<'v>(value: &'v Value, op: &str) -> SchemaResult<Option<&'v [Value]>> {
    match value {
        Value::Array(items) => Ok(Some(items)),
        Value::Null | Value::Undefined => Ok(None),
        other => Err(SchemaError::invalid_expression(format!(
            "`{op}` expects a list, got {}",
            other.type_name()
        ))),
    }
}

fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
        (l, r) if l.is_number() && r.is_number() => l.as_f64() == r.as_f64(),
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(a, b)| equals(a, b))
        }
        (l, r) => l == r,
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (l, r) if l.is_number() && r.is_number() => l.as_f64()?.partial_cmp(&r.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn string_arg<'v>(function: &str, values: &'v [Value], index: usize) -> SchemaResult<&'v str> {
    let value = values.get(index).unwrap_or(&NULL);
    value
        .as_str()
        .ok_or_else(|| type_error(function, "a string", value))
}

fn number_arg(function: &str, values: &[Value], index: usize) -> SchemaResult<f64> {
    let value = values.get(index).unwrap_or(&NULL);
    value
        .as_f64()
        .ok_or_else(|| type_error(function, "a number", value))
}

fn type_error(function: &str, expected: &str, got: &Value) -> SchemaError {
    SchemaError::invalid_expression(format!(
        "function `{function}` expects {expected}, got {}",
        got.type_name()
    ))
}
