//! Read-only lookups over a compiled schema.
//!
//! [`SchemaAccessor`] is the only way downstream crates read the schema. The
//! `get_*` methods return `Option`; the `require_*` methods turn a missing
//! entity into a [`SchemaError::NotFound`], which signals a configuration
//! defect rather than bad client input.

use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

use crate::ast::{
    DatabaseProvider, EnumDef, FieldDef, FieldType, ModelDef, ProcedureDef, ScalarType, Schema,
    TypeDef, UniqueDef,
};
use crate::error::{SchemaError, SchemaResult};

/// A unique declaration resolved to its field definitions.
#[derive(Debug, Clone, PartialEq)]
pub enum UniqueField<'a> {
    /// A single unique field.
    Single {
        /// Declaration key (the field name).
        name: &'a SmolStr,
        /// The field definition.
        field: &'a FieldDef,
    },
    /// A compound unique group.
    Group {
        /// Group name used as the lookup key.
        name: &'a SmolStr,
        /// Field definitions of the group, in declaration order.
        fields: Vec<&'a FieldDef>,
    },
}

impl<'a> UniqueField<'a> {
    /// The lookup key of this declaration.
    pub fn name(&self) -> &'a SmolStr {
        match self {
            Self::Single { name, .. } | Self::Group { name, .. } => name,
        }
    }

    /// All fields covered by this declaration.
    pub fn fields(&self) -> Vec<&'a FieldDef> {
        match self {
            Self::Single { field, .. } => vec![*field],
            Self::Group { fields, .. } => fields.clone(),
        }
    }
}

/// Fields of a model or a type def.
#[derive(Debug, Clone, Copy)]
pub enum FieldOwner<'a> {
    /// A model.
    Model(&'a ModelDef),
    /// An embedded type def.
    TypeDef(&'a TypeDef),
}

impl<'a> FieldOwner<'a> {
    /// Owner name.
    pub fn name(&self) -> &'a str {
        match self {
            Self::Model(m) => &m.name,
            Self::TypeDef(t) => &t.name,
        }
    }

    /// Owner fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &'a FieldDef> {
        match self {
            Self::Model(m) => m.fields.values(),
            Self::TypeDef(t) => t.fields.values(),
        }
    }
}

/// Cheaply clonable read-only view over a [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaAccessor {
    schema: Arc<Schema>,
}

impl SchemaAccessor {
    /// Wrap a schema.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        let schema = schema.into();
        debug!(
            provider = schema.provider.as_str(),
            models = schema.models.len(),
            enums = schema.enums.len(),
            type_defs = schema.type_defs.len(),
            procedures = schema.procedures.len(),
            "SchemaAccessor created"
        );
        Self { schema }
    }

    /// The underlying schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The storage provider.
    pub fn provider(&self) -> DatabaseProvider {
        self.schema.provider
    }

    /// Get a model by name.
    pub fn get_model(&self, name: &str) -> Option<&ModelDef> {
        self.schema.models.get(name)
    }

    /// Get a model by name or fail.
    pub fn require_model(&self, name: &str) -> SchemaResult<&ModelDef> {
        self.get_model(name)
            .ok_or_else(|| SchemaError::not_found("model", name))
    }

    /// Get a field of a model or type def.
    pub fn get_field(&self, owner: &str, field: &str) -> Option<&FieldDef> {
        self.get_owner(owner).and_then(|o| match o {
            FieldOwner::Model(m) => m.fields.get(field),
            FieldOwner::TypeDef(t) => t.fields.get(field),
        })
    }

    /// Get a field of a model or type def or fail.
    pub fn require_field(&self, owner: &str, field: &str) -> SchemaResult<&FieldDef> {
        let resolved = self
            .get_owner(owner)
            .ok_or_else(|| SchemaError::not_found("model", owner))?;
        let found = match resolved {
            FieldOwner::Model(m) => m.fields.get(field),
            FieldOwner::TypeDef(t) => t.fields.get(field),
        };
        found.ok_or_else(|| SchemaError::not_found("field", format!("{owner}.{field}")))
    }

    /// Get an enum by name.
    pub fn get_enum(&self, name: &str) -> Option<&EnumDef> {
        self.schema.enums.get(name)
    }

    /// Get an enum by name or fail.
    pub fn require_enum(&self, name: &str) -> SchemaResult<&EnumDef> {
        self.get_enum(name)
            .ok_or_else(|| SchemaError::not_found("enum", name))
    }

    /// Get a type def by name.
    pub fn get_type_def(&self, name: &str) -> Option<&TypeDef> {
        self.schema.type_defs.get(name)
    }

    /// Get a type def by name or fail.
    pub fn require_type_def(&self, name: &str) -> SchemaResult<&TypeDef> {
        self.get_type_def(name)
            .ok_or_else(|| SchemaError::not_found("type def", name))
    }

    /// Get a procedure by name.
    pub fn get_procedure(&self, name: &str) -> Option<&ProcedureDef> {
        self.schema.procedures.get(name)
    }

    /// Get a procedure by name or fail.
    pub fn require_procedure(&self, name: &str) -> SchemaResult<&ProcedureDef> {
        self.get_procedure(name)
            .ok_or_else(|| SchemaError::not_found("procedure", name))
    }

    /// Look up a model first, then a type def.
    pub fn get_owner(&self, name: &str) -> Option<FieldOwner<'_>> {
        self.get_model(name)
            .map(FieldOwner::Model)
            .or_else(|| self.get_type_def(name).map(FieldOwner::TypeDef))
    }

    /// Unique declarations of a model, resolved to field definitions.
    ///
    /// Fails when the model declares no unique field at all, or when a
    /// declaration names a field the model does not have.
    pub fn get_unique_fields(&self, model: &str) -> SchemaResult<Vec<UniqueField<'_>>> {
        let model_def = self.require_model(model)?;
        if model_def.unique_fields.is_empty() {
            return Err(SchemaError::MissingUniqueFields {
                model: model.to_string(),
            });
        }

        let mut out = Vec::with_capacity(model_def.unique_fields.len());
        for (name, def) in &model_def.unique_fields {
            match def {
                UniqueDef::Field { field } => {
                    out.push(UniqueField::Single {
                        name,
                        field: self.require_field(model, field)?,
                    });
                }
                UniqueDef::Group { fields } => {
                    if fields.is_empty() {
                        return Err(SchemaError::invalid_model(
                            model,
                            format!("unique group `{name}` has no fields"),
                        ));
                    }
                    let resolved = fields
                        .iter()
                        .map(|f| self.require_field(model, f))
                        .collect::<SchemaResult<Vec<_>>>()?;
                    out.push(UniqueField::Group {
                        name,
                        fields: resolved,
                    });
                }
            }
        }
        Ok(out)
    }

    /// The discriminator field of a delegate model, if the model is one.
    pub fn get_delegate_discriminator(&self, model: &str) -> SchemaResult<Option<&FieldDef>> {
        let model_def = self.require_model(model)?;
        let Some(attr) = model_def.get_attribute("@@delegate") else {
            return Ok(None);
        };
        let field = attr
            .arg(0, "discriminator")
            .and_then(|e| e.as_field())
            .ok_or_else(|| {
                SchemaError::invalid_attribute(
                    "@@delegate",
                    format!("model `{model}` must name its discriminator field"),
                )
            })?;
        self.require_field(model, field).map(Some)
    }

    /// Discriminator fields of every delegate base in the model's inheritance chain.
    ///
    /// Fails with [`SchemaError::InvalidModel`] when the chain loops back on itself.
    pub fn delegate_discriminators(&self, model: &str) -> SchemaResult<Vec<&FieldDef>> {
        let mut out = Vec::new();
        let mut visited: Vec<&str> = Vec::new();
        let mut current = Some(self.require_model(model)?);
        while let Some(model_def) = current {
            if visited.contains(&model_def.name.as_str()) {
                return Err(SchemaError::invalid_model(
                    model,
                    format!("inheritance chain revisits `{}`", model_def.name),
                ));
            }
            visited.push(model_def.name.as_str());
            if let Some(field) = self.get_delegate_discriminator(&model_def.name)? {
                out.push(field);
            }
            current = match &model_def.base_model {
                Some(base) => Some(self.require_model(base)?),
                None => None,
            };
        }
        Ok(out)
    }

    /// Resolve a field's type name against scalars, enums, type defs and models.
    pub fn resolve_field_type(&self, owner: &str, field: &FieldDef) -> SchemaResult<FieldType> {
        let name = field.type_name.as_str();
        if let Some(scalar) = ScalarType::from_str(name) {
            return Ok(FieldType::Scalar(scalar));
        }
        if self.schema.enums.contains_key(name) {
            return Ok(FieldType::Enum(field.type_name.clone()));
        }
        if self.schema.type_defs.contains_key(name) {
            return Ok(FieldType::TypeDef(field.type_name.clone()));
        }
        if self.schema.models.contains_key(name) {
            return Ok(FieldType::Model(field.type_name.clone()));
        }
        Err(SchemaError::unknown_type(owner, field.name.as_str(), name))
    }

    /// Resolve a bare type name (used for procedure parameters).
    pub fn resolve_type_name(&self, context: &str, name: &str) -> SchemaResult<FieldType> {
        self.resolve_field_type(context, &FieldDef::new(context, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ProcedureParam, RelationInfo};
    use pretty_assertions::assert_eq;

    fn sample() -> SchemaAccessor {
        let schema = Schema::new(DatabaseProvider::PostgreSql)
            .with_model(
                ModelDef::new("User")
                    .field(FieldDef::new("id", "String").id())
                    .field(FieldDef::new("email", "String").unique())
                    .field(FieldDef::new("role", "Role"))
                    .field(FieldDef::new("address", "Address").optional())
                    .field(
                        FieldDef::new("posts", "Post")
                            .array()
                            .relation(RelationInfo::new("author")),
                    ),
            )
            .with_model(
                ModelDef::new("Post")
                    .field(FieldDef::new("id", "Int").id())
                    .field(FieldDef::new("authorId", "String").foreign_key_for(["author"]))
                    .field(
                        FieldDef::new("author", "User")
                            .relation(RelationInfo::new("posts").owning(["authorId"], ["id"])),
                    ),
            )
            .with_model(
                ModelDef::new("Membership")
                    .field(FieldDef::new("orgId", "Int"))
                    .field(FieldDef::new("userId", "Int"))
                    .unique_group("orgId_userId", ["orgId", "userId"]),
            )
            .with_model(ModelDef::new("Log").field(FieldDef::new("line", "String")))
            .with_model(
                ModelDef::new("Asset")
                    .field(FieldDef::new("id", "Int").id())
                    .field(FieldDef::new("assetType", "String"))
                    .delegate("assetType"),
            )
            .with_model(
                ModelDef::new("Video")
                    .field(FieldDef::new("id", "Int").id())
                    .field(FieldDef::new("assetType", "String"))
                    .extends("Asset"),
            )
            .with_enum(EnumDef::new("Role", ["ADMIN", "USER"]))
            .with_type_def(TypeDef::new("Address").field(FieldDef::new("city", "String")))
            .with_procedure(
                ProcedureDef::new("search", "Post").param(ProcedureParam::new("term", "String")),
            );
        SchemaAccessor::new(schema)
    }

    // ==================== Lookup Tests ====================

    #[test]
    fn test_require_known_entities() {
        let accessor = sample();
        assert!(accessor.require_model("User").is_ok());
        assert!(accessor.require_field("User", "email").is_ok());
        assert!(accessor.require_field("Address", "city").is_ok());
        assert!(accessor.require_enum("Role").is_ok());
        assert!(accessor.require_type_def("Address").is_ok());
        assert!(accessor.require_procedure("search").is_ok());
    }

    #[test]
    fn test_require_unknown_entities_name_kind() {
        let accessor = sample();

        let cases = [
            (accessor.require_model("Ghost").unwrap_err(), "model", "Ghost"),
            (accessor.require_field("User", "nope").unwrap_err(), "field", "nope"),
            (accessor.require_enum("Color").unwrap_err(), "enum", "Color"),
            (accessor.require_type_def("Geo").unwrap_err(), "type def", "Geo"),
            (accessor.require_procedure("noop").unwrap_err(), "procedure", "noop"),
        ];

        for (err, kind, name) in cases {
            assert!(matches!(err, SchemaError::NotFound { .. }));
            let message = err.to_string();
            assert!(message.contains(kind), "{message}");
            assert!(message.contains(name), "{message}");
        }
    }

    #[test]
    fn test_get_variants_return_none() {
        let accessor = sample();
        assert!(accessor.get_model("Ghost").is_none());
        assert!(accessor.get_field("User", "nope").is_none());
        assert!(accessor.get_field("Ghost", "id").is_none());
    }

    // ==================== Unique Field Tests ====================

    #[test]
    fn test_unique_fields_single() {
        let accessor = sample();
        let uniques = accessor.get_unique_fields("User").unwrap();
        let names: Vec<&str> = uniques.iter().map(|u| u.name().as_str()).collect();
        assert_eq!(names, vec!["id", "email"]);
        assert!(matches!(uniques[0], UniqueField::Single { .. }));
    }

    #[test]
    fn test_unique_fields_group() {
        let accessor = sample();
        let uniques = accessor.get_unique_fields("Membership").unwrap();
        assert_eq!(uniques.len(), 1);
        match &uniques[0] {
            UniqueField::Group { name, fields } => {
                assert_eq!(name.as_str(), "orgId_userId");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("Expected group, got {other:?}"),
        }
    }

    #[test]
    fn test_unique_fields_missing() {
        let accessor = sample();
        let err = accessor.get_unique_fields("Log").unwrap_err();
        assert!(matches!(err, SchemaError::MissingUniqueFields { .. }));
    }

    // ==================== Delegate Tests ====================

    #[test]
    fn test_delegate_discriminator() {
        let accessor = sample();
        let field = accessor.get_delegate_discriminator("Asset").unwrap();
        assert_eq!(field.map(|f| f.name.as_str()), Some("assetType"));
        assert!(accessor.get_delegate_discriminator("User").unwrap().is_none());
    }

    #[test]
    fn test_inherited_discriminators() {
        let accessor = sample();
        let fields = accessor.delegate_discriminators("Video").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "assetType");
    }

    #[test]
    fn test_cyclic_inheritance_is_rejected() {
        let schema = Schema::new(DatabaseProvider::PostgreSql)
            .with_model(ModelDef::new("A").field(FieldDef::new("id", "Int").id()).extends("B"))
            .with_model(ModelDef::new("B").field(FieldDef::new("id", "Int").id()).extends("A"));
        let accessor = SchemaAccessor::new(schema);

        let err = accessor.delegate_discriminators("A").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidModel { ref name, .. } if name == "A"));
    }

    // ==================== Type Resolution Tests ====================

    #[test]
    fn test_resolve_field_types() {
        let accessor = sample();
        let user = accessor.require_model("User").unwrap();

        let resolve = |name: &str| accessor.resolve_field_type("User", &user.fields[name]).unwrap();
        assert_eq!(resolve("id"), FieldType::Scalar(ScalarType::String));
        assert_eq!(resolve("role"), FieldType::Enum("Role".into()));
        assert_eq!(resolve("address"), FieldType::TypeDef("Address".into()));
        assert_eq!(resolve("posts"), FieldType::Model("Post".into()));
    }

    #[test]
    fn test_resolve_unknown_type() {
        let accessor = sample();
        let err = accessor
            .resolve_field_type("User", &FieldDef::new("color", "Colour"))
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { .. }));
    }
}
