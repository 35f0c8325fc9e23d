//! Procedure argument validation.
//!
//! Procedure calls take an envelope `{ args: { <param>: <value> } }`. Each
//! declared parameter is checked on its own against the shape of its type;
//! no composite shape is cached. Issue paths start with the procedure name.

use tracing::debug;

use gatekeep_schema::ProcedureDef;

use crate::error::{QueryError, QueryResult};
use crate::input::InputValidator;
use crate::validator::{Issue, IssueKind, Path, PathSegment};
use crate::value::Value;

const ENVELOPE_KEY: &str = "args";

impl InputValidator {
    /// Validate a procedure call envelope and return its normalized `args`
    /// object (empty when none was given).
    pub fn validate_procedure(&self, name: &str, input: impl Into<Value>) -> QueryResult<Value> {
        let factory = self.factory();
        if !factory.policy().is_procedure_allowed(name) {
            debug!(procedure = name, "procedure rejected by slicing");
            return Err(QueryError::procedure_not_allowed(name));
        }
        let procedure = factory.schema().require_procedure(name)?;

        let input = input.into().normalize();
        let root: Path = [PathSegment::key(name)].into_iter().collect();
        let mut issues = Vec::new();

        let args = match &input {
            Value::Undefined | Value::Null => Value::Undefined,
            Value::Object(envelope) => {
                for key in envelope.keys().filter(|k| k.as_str() != ENVELOPE_KEY) {
                    issues.push(Issue::new(
                        root.clone(),
                        format!("unrecognized key `{key}` in procedure envelope"),
                        IssueKind::Structural,
                    ));
                }
                input.get(ENVELOPE_KEY).clone()
            }
            other => {
                issues.push(Issue::new(
                    root.clone(),
                    format!("expected object, received {}", other.type_name()),
                    IssueKind::TypeMismatch,
                ));
                Value::Undefined
            }
        };

        issues.extend(self.check_params(procedure, &args, &root)?);
        if !issues.is_empty() {
            debug!(procedure = name, issues = issues.len(), "procedure input rejected");
            return Err(QueryError::invalid_procedure_input(name, issues));
        }
        Ok(match args {
            Value::Undefined => Value::object(),
            other => other,
        })
    }

    fn check_params(&self, procedure: &ProcedureDef, args: &Value, root: &Path) -> QueryResult<Vec<Issue>> {
        let mut issues = Vec::new();
        let at = |key: &str| {
            let mut path = root.clone();
            path.push(PathSegment::key(key));
            path
        };

        let map = match args {
            Value::Undefined => {
                for param in procedure.params.iter().filter(|p| !p.optional) {
                    issues.push(Issue::new(at(&param.name), "Required", IssueKind::Structural));
                }
                return Ok(issues);
            }
            Value::Object(map) => map,
            other => {
                issues.push(Issue::new(
                    at(ENVELOPE_KEY),
                    format!("expected object, received {}", other.type_name()),
                    IssueKind::TypeMismatch,
                ));
                return Ok(issues);
            }
        };

        for key in map.keys() {
            if !procedure.params.iter().any(|p| p.name == key.as_str()) {
                issues.push(Issue::new(
                    root.clone(),
                    format!("unrecognized parameter `{key}` for procedure {}", procedure.name),
                    IssueKind::Structural,
                ));
            }
        }

        for param in &procedure.params {
            let value = args.get(&param.name);
            if value.is_undefined() {
                if !param.optional {
                    issues.push(Issue::new(at(&param.name), "Required", IssueKind::Structural));
                }
                continue;
            }
            let mut shape = self
                .factory()
                .param_shape(&procedure.name, &param.type_name, param.array)?;
            if param.optional {
                shape = shape.nullable();
            }
            issues.extend(self.factory().check_shape(&shape, value, at(&param.name))?);
        }
        Ok(issues)
    }
}
