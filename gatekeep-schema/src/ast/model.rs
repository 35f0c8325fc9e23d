//! Model, enum, type def and procedure definitions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{Attribute, Expression, FieldDef};

/// A unique constraint declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UniqueDef {
    /// Compound uniqueness over several fields.
    Group { fields: Vec<SmolStr> },
    /// Uniqueness of a single field.
    Field { field: SmolStr },
}

/// A model definition (maps to a stored entity).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDef {
    /// Model name.
    #[serde(default)]
    pub name: SmolStr,
    /// Model fields in declaration order.
    pub fields: IndexMap<SmolStr, FieldDef>,
    /// Unique declarations keyed by field name (single) or group name (compound).
    #[serde(default)]
    pub unique_fields: IndexMap<SmolStr, UniqueDef>,
    /// Primary key fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub id_fields: Vec<SmolStr>,
    /// Model-level attributes (prefixed with `@@`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    /// Delegate base model this model inherits from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_model: Option<SmolStr>,
    /// Whether this model is a delegate (polymorphic) base.
    #[serde(default)]
    pub is_delegate: bool,
}

impl ModelDef {
    /// Create a new model.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            unique_fields: IndexMap::new(),
            id_fields: vec![],
            attributes: vec![],
            base_model: None,
            is_delegate: false,
        }
    }

    /// Add a field. `@id` and `@unique` fields register a single-field unique declaration.
    pub fn field(mut self, field: FieldDef) -> Self {
        if field.id {
            self.id_fields.push(field.name.clone());
        }
        if field.id || field.unique {
            self.unique_fields.insert(
                field.name.clone(),
                UniqueDef::Field {
                    field: field.name.clone(),
                },
            );
        }
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Declare a compound unique group.
    pub fn unique_group<S: Into<SmolStr>>(
        mut self,
        name: impl Into<SmolStr>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        self.unique_fields.insert(
            name.into(),
            UniqueDef::Group {
                fields: fields.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Append a model-level attribute.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Attach a `@@validate` rule.
    pub fn validate_rule(
        self,
        rule: Expression,
        message: Option<&str>,
        path: Option<&[&str]>,
    ) -> Self {
        let mut attr = Attribute::new("@@validate").with_arg(rule);
        if let Some(message) = message {
            attr = attr.with_named_arg("message", Expression::literal(message));
        }
        if let Some(path) = path {
            attr = attr.with_named_arg(
                "path",
                Expression::array(path.iter().map(|p| Expression::literal(*p))),
            );
        }
        self.attribute(attr)
    }

    /// Mark this model as a delegate base discriminated by the given field.
    pub fn delegate(mut self, discriminator: impl Into<SmolStr>) -> Self {
        self.is_delegate = true;
        self.attribute(Attribute::new("@@delegate").with_arg(Expression::field(discriminator)))
    }

    /// Declare the delegate base model.
    pub fn extends(mut self, base: impl Into<SmolStr>) -> Self {
        self.base_model = Some(base.into());
        self
    }

    /// Get the model name as a string.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// Get all relation fields.
    pub fn relation_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values().filter(|f| f.is_relation())
    }

    /// Get all scalar (non-relation) fields.
    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values().filter(|f| !f.is_relation())
    }

    /// Get a model-level attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.is(name))
    }

    /// All `@@validate` rules.
    pub fn validation_rules(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.is("@@validate"))
    }
}

/// An enum definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    /// Enum name.
    #[serde(default)]
    pub name: SmolStr,
    /// Enum values in declaration order.
    pub values: Vec<SmolStr>,
}

impl EnumDef {
    /// Create a new enum.
    pub fn new<S: Into<SmolStr>>(name: impl Into<SmolStr>, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Check if a value is a member of the enum.
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// An embedded structured type stored inside a JSON field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Type name.
    #[serde(default)]
    pub name: SmolStr,
    /// Type fields.
    pub fields: IndexMap<SmolStr, FieldDef>,
    /// Type-level attributes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl TypeDef {
    /// Create a new type def.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
            attributes: vec![],
        }
    }

    /// Add a field.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Append a type-level attribute.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Get the type name as a string.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All `@@validate` rules.
    pub fn validation_rules(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.is("@@validate"))
    }
}

/// A procedure parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcedureParam {
    /// Parameter name.
    pub name: SmolStr,
    /// Unresolved type name.
    #[serde(rename = "type")]
    pub type_name: SmolStr,
    /// Whether the parameter may be omitted.
    #[serde(default)]
    pub optional: bool,
    /// Whether the parameter is a list.
    #[serde(default)]
    pub array: bool,
}

impl ProcedureParam {
    /// Create a required parameter.
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            optional: false,
            array: false,
        }
    }

    /// Mark the parameter optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the parameter as a list.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }
}

/// A custom procedure exposed through the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureDef {
    /// Procedure name.
    #[serde(default)]
    pub name: SmolStr,
    /// Parameters in declaration order.
    #[serde(default)]
    pub params: Vec<ProcedureParam>,
    /// Return type name.
    pub returns: SmolStr,
    /// Whether the procedure returns a list.
    #[serde(default)]
    pub returns_array: bool,
    /// Whether the procedure mutates data.
    #[serde(default)]
    pub mutation: bool,
}

impl ProcedureDef {
    /// Create a new procedure.
    pub fn new(name: impl Into<SmolStr>, returns: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            params: vec![],
            returns: returns.into(),
            returns_array: false,
            mutation: false,
        }
    }

    /// Append a parameter.
    pub fn param(mut self, param: ProcedureParam) -> Self {
        self.params.push(param);
        self
    }

    /// Mark the procedure as a mutation.
    pub fn mutation(mut self) -> Self {
        self.mutation = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;

    // ==================== Model Tests ====================

    #[test]
    fn test_model_new() {
        let model = ModelDef::new("User");

        assert_eq!(model.name(), "User");
        assert!(model.fields.is_empty());
        assert!(model.unique_fields.is_empty());
        assert!(!model.is_delegate);
    }

    #[test]
    fn test_model_registers_unique_fields() {
        let model = ModelDef::new("User")
            .field(FieldDef::new("id", "String").id())
            .field(FieldDef::new("email", "String").unique())
            .field(FieldDef::new("age", "Int"));

        assert_eq!(model.id_fields, vec![SmolStr::new("id")]);
        assert_eq!(model.unique_fields.len(), 2);
        assert!(model.unique_fields.contains_key("email"));
        assert!(!model.unique_fields.contains_key("age"));
    }

    #[test]
    fn test_model_unique_group() {
        let model = ModelDef::new("Membership")
            .field(FieldDef::new("orgId", "Int"))
            .field(FieldDef::new("userId", "Int"))
            .unique_group("orgId_userId", ["orgId", "userId"]);

        assert_eq!(
            model.unique_fields.get("orgId_userId"),
            Some(&UniqueDef::Group {
                fields: vec!["orgId".into(), "userId".into()]
            })
        );
    }

    #[test]
    fn test_model_validate_rule() {
        let model = ModelDef::new("User").validate_rule(
            Expression::binary(Expression::field("age"), BinaryOp::Gte, Expression::literal(18)),
            Some("Must be adult"),
            Some(&["age"]),
        );

        let rule = model.validation_rules().next().unwrap();
        assert_eq!(rule.string_arg(1, "message"), Some("Must be adult"));
        assert!(rule.arg(2, "path").is_some());
    }

    #[test]
    fn test_model_delegate() {
        let model = ModelDef::new("Asset").delegate("assetType");
        assert!(model.is_delegate);
        let attr = model.get_attribute("@@delegate").unwrap();
        assert_eq!(attr.arg(0, "discriminator").and_then(|e| e.as_field()), Some("assetType"));
    }

    #[test]
    fn test_relation_and_scalar_fields() {
        use crate::ast::RelationInfo;

        let model = ModelDef::new("Post")
            .field(FieldDef::new("id", "Int").id())
            .field(FieldDef::new("author", "User").relation(RelationInfo::new("posts")));

        assert_eq!(model.relation_fields().count(), 1);
        assert_eq!(model.scalar_fields().count(), 1);
    }

    #[test]
    fn test_unique_def_deserialize() {
        let single: UniqueDef = serde_json::from_str(r#"{ "field": "id" }"#).unwrap();
        let group: UniqueDef = serde_json::from_str(r#"{ "fields": ["a", "b"] }"#).unwrap();
        assert!(matches!(single, UniqueDef::Field { .. }));
        assert!(matches!(group, UniqueDef::Group { .. }));
    }

    // ==================== Enum / TypeDef / Procedure Tests ====================

    #[test]
    fn test_enum_contains() {
        let role = EnumDef::new("Role", ["ADMIN", "USER"]);
        assert!(role.contains("ADMIN"));
        assert!(!role.contains("admin"));
    }

    #[test]
    fn test_type_def_fields() {
        let address = TypeDef::new("Address")
            .field(FieldDef::new("city", "String"))
            .field(FieldDef::new("zip", "String").optional());
        assert_eq!(address.fields.len(), 2);
        assert_eq!(address.name(), "Address");
    }

    #[test]
    fn test_procedure_params() {
        let proc = ProcedureDef::new("search", "Post")
            .param(ProcedureParam::new("term", "String"))
            .param(ProcedureParam::new("limit", "Int").optional());
        assert_eq!(proc.params.len(), 2);
        assert!(proc.params[1].optional);
        assert!(!proc.mutation);
    }
}
