//! Shape trees and the checking algorithm.
//!
//! A [`Shape`] describes the legal form of an argument value. Shapes refer to
//! each other through [`Shape::Lazy`] keys, resolved through a
//! [`ShapeResolver`] only when a value actually reaches them. This keeps
//! construction finite for self-referential schemas.

use indexmap::IndexMap;
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::trace;

use gatekeep_schema::{Expression, ScalarType, SchemaResult};

use super::issue::{Issue, IssueKind, Path, PathSegment};
use super::key::ShapeKey;
use super::scalar::{self, ScalarCheck};
use crate::expression::{self, RuleOutcome};
use crate::value::Value;

/// Source of shapes for lazy references.
pub trait ShapeResolver {
    /// Resolve a key to its (cached) shape.
    fn resolve(&self, key: &ShapeKey) -> SchemaResult<Arc<Shape>>;
}

/// Null sentinels accepted by a [`Shape::Sentinel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    DbNull,
    JsonNull,
    AnyNull,
}

impl Sentinel {
    fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::DbNull, Value::DbNull)
                | (Self::JsonNull, Value::JsonNull)
                | (Self::AnyNull, Value::AnyNull)
        )
    }
}

/// A scalar of a given type with optional value checks.
#[derive(Debug, Clone)]
pub struct ScalarShape {
    /// Accepted type.
    pub ty: ScalarType,
    /// Checks run after the type matched.
    pub checks: Vec<ScalarCheck>,
}

/// One key of an object shape.
#[derive(Debug, Clone)]
pub struct FieldSlot {
    /// Shape of the value.
    pub shape: Shape,
    /// Whether the key must be present.
    pub required: bool,
}

/// A cross-field rule attached to an object.
#[derive(Debug, Clone)]
pub struct CustomRule {
    /// Boolean expression evaluated against the object.
    pub expression: Expression,
    /// Message reported on failure.
    pub message: Option<String>,
    /// Path (relative to the object) the failure is reported at.
    pub path: Vec<SmolStr>,
}

/// A whole-object check run after every key matched structurally.
#[derive(Debug, Clone)]
pub enum Refinement {
    /// The two keys may not both be present.
    MutuallyExclusive(SmolStr, SmolStr),
    /// At least one of the keys must be present.
    AtLeastOne { keys: Vec<SmolStr>, message: String },
    /// Exactly one of the keys must be present. Reported as a structural issue.
    ExactlyOne(Vec<SmolStr>),
    /// `groupBy` consistency between `by`, `orderBy`, `having`, `skip` and `take`.
    GroupBy,
    /// A custom rule.
    Rule(CustomRule),
}

/// An object with a fixed key set.
#[derive(Debug, Clone, Default)]
pub struct ObjectShape {
    /// Name used in diagnostics.
    pub name: SmolStr,
    /// Known keys.
    pub fields: IndexMap<SmolStr, FieldSlot>,
    /// Reject unknown keys.
    pub strict: bool,
    /// Whole-object checks.
    pub refinements: Vec<Refinement>,
}

impl ObjectShape {
    /// Create a strict object shape.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            strict: true,
            refinements: Vec::new(),
        }
    }

    /// Add a required key.
    pub fn required(mut self, key: impl Into<SmolStr>, shape: Shape) -> Self {
        self.fields.insert(key.into(), FieldSlot { shape, required: true });
        self
    }

    /// Add an optional key.
    pub fn optional(mut self, key: impl Into<SmolStr>, shape: Shape) -> Self {
        self.fields.insert(key.into(), FieldSlot { shape, required: false });
        self
    }

    /// Add a key in place.
    pub fn insert(&mut self, key: impl Into<SmolStr>, shape: Shape, required: bool) {
        self.fields.insert(key.into(), FieldSlot { shape, required });
    }

    /// Attach a refinement.
    pub fn refine(mut self, refinement: Refinement) -> Self {
        self.refinements.push(refinement);
        self
    }

    /// Whether the object declares no keys.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Legal form of a value.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Anything, including absence.
    Any,
    /// A boolean.
    Boolean,
    /// Exactly this value.
    Literal(Value),
    /// A scalar type.
    Scalar(ScalarShape),
    /// One of the given strings.
    Enum { name: SmolStr, values: Vec<SmolStr> },
    /// Any JSON value.
    Json,
    /// One of the given null sentinels.
    Sentinel(Vec<Sentinel>),
    /// `null` or the inner shape.
    Nullable(Box<Shape>),
    /// A list of items.
    Array {
        item: Box<Shape>,
        min_items: Option<usize>,
        max_items: Option<usize>,
    },
    /// An object.
    Object(ObjectShape),
    /// The first alternative that matches.
    Union(Vec<Shape>),
    /// A shape resolved by key on first use.
    Lazy(ShapeKey),
}

impl Shape {
    /// Scalar shape without checks.
    pub fn scalar(ty: ScalarType) -> Self {
        Self::Scalar(ScalarShape { ty, checks: Vec::new() })
    }

    /// Scalar shape with checks.
    pub fn scalar_checked(ty: ScalarType, checks: Vec<ScalarCheck>) -> Self {
        Self::Scalar(ScalarShape { ty, checks })
    }

    /// String enumeration.
    pub fn one_of<S: Into<SmolStr>>(name: impl Into<SmolStr>, values: impl IntoIterator<Item = S>) -> Self {
        Self::Enum {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// List of `item`.
    pub fn array(item: Shape) -> Self {
        Self::Array {
            item: Box::new(item),
            min_items: None,
            max_items: None,
        }
    }

    /// Non-empty list of `item`.
    pub fn non_empty_array(item: Shape) -> Self {
        Self::Array {
            item: Box::new(item),
            min_items: Some(1),
            max_items: None,
        }
    }

    /// `null` or `self`.
    pub fn nullable(self) -> Self {
        match self {
            Self::Nullable(_) | Self::Any => self,
            other => Self::Nullable(Box::new(other)),
        }
    }

    /// `self` or a list of `self`.
    pub fn or_array(self) -> Self {
        let list = Self::array(self.clone());
        Self::Union(vec![self, list])
    }

    /// Lazy reference.
    pub fn lazy(key: ShapeKey) -> Self {
        Self::Lazy(key)
    }

    /// Lazy keys reachable from this shape without resolving any of them.
    pub fn lazy_keys(&self) -> Vec<&ShapeKey> {
        let mut out = Vec::new();
        self.collect_lazy(&mut out);
        out
    }

    fn collect_lazy<'s>(&'s self, out: &mut Vec<&'s ShapeKey>) {
        match self {
            Self::Lazy(key) => out.push(key),
            Self::Nullable(inner) => inner.collect_lazy(out),
            Self::Array { item, .. } => item.collect_lazy(out),
            Self::Object(obj) => obj.fields.values().for_each(|slot| slot.shape.collect_lazy(out)),
            Self::Union(alternatives) => alternatives.iter().for_each(|a| a.collect_lazy(out)),
            Self::Any
            | Self::Boolean
            | Self::Literal(_)
            | Self::Scalar(_)
            | Self::Enum { .. }
            | Self::Json
            | Self::Sentinel(_) => {}
        }
    }

    /// Short description of what the shape expects.
    pub fn describe(&self) -> String {
        match self {
            Self::Any => "any".to_string(),
            Self::Boolean => "boolean".to_string(),
            Self::Literal(v) => v.to_string(),
            Self::Scalar(s) => s.ty.as_str().to_string(),
            Self::Enum { name, .. } => name.to_string(),
            Self::Json => "Json".to_string(),
            Self::Sentinel(list) => list
                .iter()
                .map(|s| format!("{s:?}"))
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Nullable(inner) => format!("{} | null", inner.describe()),
            Self::Array { item, .. } => format!("{}[]", item.describe()),
            Self::Object(obj) => obj.name.to_string(),
            Self::Union(alts) => alts
                .iter()
                .map(Shape::describe)
                .collect::<Vec<_>>()
                .join(" | "),
            Self::Lazy(key) => key.to_string(),
        }
    }

    /// Check a value, recording issues in the context.
    ///
    /// Returns an error only for configuration defects met while checking
    /// (an unresolvable lazy key, a malformed rule).
    pub fn check(&self, value: &Value, cx: &mut CheckContext<'_>) -> SchemaResult<()> {
        match self {
            Self::Any => {}
            Self::Boolean => {
                if !matches!(value, Value::Bool(_)) {
                    cx.mismatch("boolean", value);
                }
            }
            Self::Literal(expected) => {
                if value != expected {
                    cx.push(format!("expected {expected}, received {value}"), IssueKind::TypeMismatch);
                }
            }
            Self::Scalar(s) => {
                if !scalar::accepts(s.ty, value) {
                    cx.mismatch(s.ty.as_str(), value);
                } else {
                    for check in &s.checks {
                        if let Some(message) = check.run(value) {
                            cx.push(message, IssueKind::Refinement);
                        }
                    }
                }
            }
            Self::Enum { name, values } => match value.as_str() {
                Some(s) if values.iter().any(|v| v == s) => {}
                _ => cx.push(
                    format!(
                        "expected {name} (one of {}), received {value}",
                        values.iter().map(|v| format!("\"{v}\"")).collect::<Vec<_>>().join(", ")
                    ),
                    IssueKind::TypeMismatch,
                ),
            },
            Self::Json => {
                if value.is_undefined() || value.is_sentinel() {
                    cx.mismatch("Json", value);
                }
            }
            Self::Sentinel(allowed) => {
                if !allowed.iter().any(|s| s.matches(value)) {
                    cx.mismatch(&self.describe(), value);
                }
            }
            Self::Nullable(inner) => {
                if !value.is_null() {
                    inner.check(value, cx)?;
                }
            }
            Self::Array { item, min_items, max_items } => match value.as_array() {
                None => cx.mismatch("array", value),
                Some(items) => {
                    if let Some(min) = min_items.filter(|m| items.len() < *m) {
                        cx.push(format!("must contain at least {min} item(s)"), IssueKind::Structural);
                    }
                    if let Some(max) = max_items.filter(|m| items.len() > *m) {
                        cx.push(format!("must contain at most {max} item(s)"), IssueKind::Structural);
                    }
                    for (i, element) in items.iter().enumerate() {
                        cx.enter(PathSegment::Index(i));
                        let result = item.check(element, cx);
                        cx.leave();
                        result?;
                    }
                }
            },
            Self::Object(obj) => check_object(obj, value, cx)?,
            Self::Union(alternatives) => check_union(self, alternatives, value, cx)?,
            Self::Lazy(key) => {
                let shape = cx.resolver.resolve(key)?;
                shape.check(value, cx)?;
            }
        }
        Ok(())
    }
}

fn check_object(obj: &ObjectShape, value: &Value, cx: &mut CheckContext<'_>) -> SchemaResult<()> {
    let Some(map) = value.as_object() else {
        cx.mismatch(&obj.name, value);
        return Ok(());
    };
    let mark = cx.issues.len();

    if obj.strict {
        for (key, v) in map {
            if !v.is_undefined() && !obj.fields.contains_key(key.as_str()) {
                cx.push(format!("unrecognized key `{key}` in {}", obj.name), IssueKind::Structural);
            }
        }
    }

    for (key, slot) in &obj.fields {
        let field_value = value.get(key);
        cx.enter(PathSegment::Key(key.clone()));
        let result = if field_value.is_undefined() {
            if slot.required {
                cx.push("Required", IssueKind::Structural);
            }
            Ok(())
        } else {
            slot.shape.check(field_value, cx)
        };
        cx.leave();
        result?;
    }

    let structurally_valid = cx.issues[mark..]
        .iter()
        .all(|i| i.kind == IssueKind::Refinement);
    if structurally_valid {
        for refinement in &obj.refinements {
            run_refinement(refinement, value, cx)?;
        }
    }
    Ok(())
}

fn check_union(
    union: &Shape,
    alternatives: &[Shape],
    value: &Value,
    cx: &mut CheckContext<'_>,
) -> SchemaResult<()> {
    let mut failures: Vec<Vec<Issue>> = Vec::with_capacity(alternatives.len());
    for alternative in alternatives {
        let mut branch = cx.fork();
        alternative.check(value, &mut branch)?;
        if branch.issues.is_empty() {
            return Ok(());
        }
        failures.push(branch.issues);
    }

    // A branch that matched structurally and only failed refinements wins.
    if let Some(issues) = failures
        .iter()
        .find(|issues| issues.iter().all(|i| i.kind == IssueKind::Refinement))
    {
        cx.issues.extend(issues.iter().cloned());
        return Ok(());
    }

    // Otherwise prefer the branch whose type matched here, fewest issues first.
    let depth = cx.path.len();
    let matched_here = failures
        .iter()
        .filter(|issues| {
            !issues
                .iter()
                .any(|i| i.kind == IssueKind::TypeMismatch && i.path.len() == depth)
        })
        .min_by_key(|issues| issues.len());
    if let Some(issues) = matched_here {
        cx.issues.extend(issues.iter().cloned());
        return Ok(());
    }

    cx.mismatch(&union.describe(), value);
    Ok(())
}

fn run_refinement(refinement: &Refinement, value: &Value, cx: &mut CheckContext<'_>) -> SchemaResult<()> {
    match refinement {
        Refinement::MutuallyExclusive(a, b) => {
            if value.has(a) && value.has(b) {
                cx.push(
                    format!("\"{a}\" and \"{b}\" cannot be used together"),
                    IssueKind::Refinement,
                );
            }
        }
        Refinement::AtLeastOne { keys, message } => {
            if !keys.iter().any(|k| value.has(k)) {
                cx.push(message.clone(), IssueKind::Refinement);
            }
        }
        Refinement::ExactlyOne(keys) => {
            let present = keys.iter().filter(|k| value.has(k)).count();
            if present != 1 {
                cx.push(
                    format!(
                        "exactly one of {} must be provided",
                        keys.iter().map(|k| format!("\"{k}\"")).collect::<Vec<_>>().join(", ")
                    ),
                    IssueKind::Structural,
                );
            }
        }
        Refinement::GroupBy => check_group_by(value, cx),
        Refinement::Rule(rule) => {
            match expression::evaluate_rule(&rule.expression, value)? {
                RuleOutcome::Passed => {}
                RuleOutcome::Failed => {
                    trace!(path = ?rule.path, "custom rule failed");
                    let message = rule
                        .message
                        .clone()
                        .unwrap_or_else(|| "Validation rule failed".to_string());
                    let relative: Vec<PathSegment> =
                        rule.path.iter().cloned().map(PathSegment::Key).collect();
                    cx.push_at(&relative, message, IssueKind::Refinement);
                }
            }
        }
    }
    Ok(())
}

fn check_group_by(value: &Value, cx: &mut CheckContext<'_>) {
    let by: Vec<&str> = match value.get("by") {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let in_by = |key: &str| key.starts_with('_') || by.contains(&key);

    let order_by = value.get("orderBy");
    let order_keys: Vec<&String> = match order_by {
        Value::Object(map) => map.keys().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|m| m.keys())
            .collect(),
        _ => Vec::new(),
    };
    for key in order_keys.into_iter().filter(|k| !in_by(k)) {
        cx.push_at(
            &[PathSegment::key("orderBy")],
            format!("field \"{key}\" used in orderBy must be included in `by`"),
            IssueKind::Refinement,
        );
    }

    if let Value::Object(having) = value.get("having") {
        for key in having
            .keys()
            .filter(|k| !matches!(k.as_str(), "AND" | "OR" | "NOT") && !in_by(k))
        {
            cx.push_at(
                &[PathSegment::key("having")],
                format!("field \"{key}\" used in having must be included in `by`"),
                IssueKind::Refinement,
            );
        }
    }

    if (value.has("skip") || value.has("take")) && order_by.is_undefined() {
        cx.push(
            "`orderBy` is required when `skip` or `take` is used with groupBy",
            IssueKind::Refinement,
        );
    }
}

/// Mutable state threaded through a check.
pub struct CheckContext<'r> {
    resolver: &'r dyn ShapeResolver,
    path: Path,
    issues: Vec<Issue>,
}

impl<'r> CheckContext<'r> {
    /// Start a check at the root path.
    pub fn new(resolver: &'r dyn ShapeResolver) -> Self {
        Self {
            resolver,
            path: Path::new(),
            issues: Vec::new(),
        }
    }

    /// Start a check below a path prefix.
    pub fn with_prefix(resolver: &'r dyn ShapeResolver, prefix: Path) -> Self {
        Self {
            resolver,
            path: prefix,
            issues: Vec::new(),
        }
    }

    /// Issues found so far.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Consume the context.
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    fn fork(&self) -> CheckContext<'r> {
        CheckContext {
            resolver: self.resolver,
            path: self.path.clone(),
            issues: Vec::new(),
        }
    }

    fn enter(&mut self, segment: PathSegment) {
        self.path.push(segment);
    }

    fn leave(&mut self) {
        self.path.pop();
    }

    fn push(&mut self, message: impl Into<String>, kind: IssueKind) {
        self.issues.push(Issue::new(self.path.clone(), message, kind));
    }

    fn push_at(&mut self, relative: &[PathSegment], message: impl Into<String>, kind: IssueKind) {
        let mut path = self.path.clone();
        path.extend(relative.iter().cloned());
        self.issues.push(Issue::new(path, message, kind));
    }

    fn mismatch(&mut self, expected: &str, received: &Value) {
        let message = if received.is_undefined() {
            "Required".to_string()
        } else {
            format!("expected {expected}, received {}", received.type_name())
        };
        self.push(message, IssueKind::TypeMismatch);
    }
}
