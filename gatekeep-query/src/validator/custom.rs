//! `@@validate` rules attached to model and type-def shapes.

use smol_str::SmolStr;

use gatekeep_schema::{Attribute, Expression, SchemaError, SchemaResult};

use super::factory::ValidatorFactory;
use super::shape::{CustomRule, Refinement};
use crate::expression::check_rule;

impl ValidatorFactory {
    /// Refinements for the given `@@validate` attributes.
    ///
    /// Empty when input validation is disabled. Rules are checked statically
    /// here, so a malformed rule fails the build of the shape carrying it.
    pub(crate) fn rule_refinements<'a>(
        &self,
        rules: impl IntoIterator<Item = &'a Attribute>,
    ) -> SchemaResult<Vec<Refinement>> {
        if !self.options().validate_input {
            return Ok(Vec::new());
        }
        rules
            .into_iter()
            .map(|attr| parse_rule(attr).map(Refinement::Rule))
            .collect()
    }
}

/// Read `@@validate(condition, message?, path?)`.
///
/// Without an explicit path, a rule reading a single field reports at that
/// field; any other rule reports at the object itself.
pub fn parse_rule(attr: &Attribute) -> SchemaResult<CustomRule> {
    let expression = attr
        .arg(0, "condition")
        .cloned()
        .ok_or_else(|| SchemaError::invalid_attribute(attr.name(), "missing rule condition"))?;
    check_rule(&expression)?;

    let message = match attr.arg(1, "message") {
        None => None,
        Some(expr) => Some(
            expr.as_string()
                .ok_or_else(|| SchemaError::invalid_attribute(attr.name(), "`message` must be a string"))?
                .to_string(),
        ),
    };

    let path = match attr.arg(2, "path") {
        None => match expression.referenced_fields().as_slice() {
            [only] => vec![(*only).clone()],
            _ => Vec::new(),
        },
        Some(Expression::Array { items }) => items
            .iter()
            .map(|item| {
                item.as_string().map(SmolStr::new).ok_or_else(|| {
                    SchemaError::invalid_attribute(attr.name(), "`path` must be a list of strings")
                })
            })
            .collect::<SchemaResult<_>>()?,
        Some(_) => {
            return Err(SchemaError::invalid_attribute(
                attr.name(),
                "`path` must be a list of strings",
            ));
        }
    };

    Ok(CustomRule {
        expression,
        message,
        path,
    })
}
