//! Rule expressions attached to models and fields.
//!
//! The schema compiler emits these as a `kind`-tagged tree:
//!
//! ```json
//! { "kind": "binary", "op": ">=",
//!   "left": { "kind": "field", "field": "age" },
//!   "right": { "kind": "literal", "value": 18 } }
//! ```

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A literal value inside an expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal.
    Number(f64),
    /// String literal.
    String(String),
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical negation.
    #[serde(rename = "!")]
    Not,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    /// Some element of the left array equals the right operand.
    #[serde(rename = "?")]
    Any,
    /// Every element of the left array equals the right operand.
    #[serde(rename = "!")]
    All,
    /// No element of the left array equals the right operand.
    #[serde(rename = "^")]
    None,
    /// The left operand is contained in the right array.
    #[serde(rename = "in")]
    In,
}

impl BinaryOp {
    /// The operator's source spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Any => "?",
            Self::All => "!",
            Self::None => "^",
            Self::In => "in",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rule expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Expression {
    /// A literal value.
    Literal { value: Literal },
    /// An array of expressions.
    Array { items: Vec<Expression> },
    /// Reads a field off the candidate record.
    Field { field: SmolStr },
    /// Chained property reads on a receiver.
    Member {
        receiver: Box<Expression>,
        members: Vec<SmolStr>,
    },
    /// A unary operation.
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    /// A binary operation.
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// A function call.
    Call {
        function: SmolStr,
        #[serde(default)]
        args: Vec<Expression>,
    },
    /// The whole candidate record.
    This,
    /// The `null` literal.
    Null,
    /// A collection-predicate binding. Not valid in validation rules.
    Binding { name: SmolStr },
}

impl Expression {
    /// Create a literal expression.
    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    /// Create a field reference.
    pub fn field(name: impl Into<SmolStr>) -> Self {
        Self::Field { field: name.into() }
    }

    /// Create an array expression.
    pub fn array(items: impl IntoIterator<Item = Expression>) -> Self {
        Self::Array {
            items: items.into_iter().collect(),
        }
    }

    /// Create a member access expression.
    pub fn member<S: Into<SmolStr>>(
        receiver: Expression,
        members: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::Member {
            receiver: Box::new(receiver),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a logical negation.
    pub fn not(operand: Expression) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    /// Create a binary expression.
    pub fn binary(left: Expression, op: BinaryOp, right: Expression) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a function call.
    pub fn call(function: impl Into<SmolStr>, args: impl IntoIterator<Item = Expression>) -> Self {
        Self::Call {
            function: function.into(),
            args: args.into_iter().collect(),
        }
    }

    /// The string value when this is a string literal.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::Literal {
                value: Literal::String(s),
            } => Some(s),
            _ => None,
        }
    }

    /// The number value when this is a numeric literal.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Literal {
                value: Literal::Number(n),
            } => Some(*n),
            _ => None,
        }
    }

    /// The boolean value when this is a boolean literal.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Literal {
                value: Literal::Bool(b),
            } => Some(*b),
            _ => None,
        }
    }

    /// The referenced field name when this is a field reference.
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Self::Field { field } => Some(field),
            _ => None,
        }
    }

    /// Distinct top-level field names read by this expression, in first-seen order.
    pub fn referenced_fields(&self) -> Vec<&SmolStr> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a SmolStr>) {
        match self {
            Self::Field { field } => {
                if !out.contains(&field) {
                    out.push(field);
                }
            }
            Self::Array { items } => items.iter().for_each(|e| e.collect_fields(out)),
            Self::Member { receiver, .. } => receiver.collect_fields(out),
            Self::Unary { operand, .. } => operand.collect_fields(out),
            Self::Binary { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Self::Call { args, .. } => args.iter().for_each(|e| e.collect_fields(out)),
            Self::Literal { .. } | Self::This | Self::Null | Self::Binding { .. } => {}
        }
    }
}
