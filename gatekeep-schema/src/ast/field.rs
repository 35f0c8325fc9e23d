//! Field definitions for models and type defs.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::Attribute;

/// Relation metadata for a field that points at another model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationInfo {
    /// Name of the back-relation field on the opposite model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opposite: Option<SmolStr>,
    /// Foreign key fields on this side (non-empty for the owning side).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<SmolStr>,
    /// Referenced fields on the opposite model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<SmolStr>,
}

impl RelationInfo {
    /// Create relation metadata with the given back-relation field.
    pub fn new(opposite: impl Into<SmolStr>) -> Self {
        Self {
            opposite: Some(opposite.into()),
            ..Default::default()
        }
    }

    /// Mark this side as the owner holding the given foreign keys.
    pub fn owning<S: Into<SmolStr>>(
        mut self,
        fields: impl IntoIterator<Item = S>,
        references: impl IntoIterator<Item = S>,
    ) -> Self {
        self.fields = fields.into_iter().map(Into::into).collect();
        self.references = references.into_iter().map(Into::into).collect();
        self
    }
}

/// A field in a model or type def.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Field name.
    #[serde(default)]
    pub name: SmolStr,
    /// Unresolved type name (scalar, enum, type def or model).
    #[serde(rename = "type")]
    pub type_name: SmolStr,
    /// Whether the field may be null.
    #[serde(default)]
    pub optional: bool,
    /// Whether the field is a list.
    #[serde(default)]
    pub array: bool,
    /// Part of the primary key.
    #[serde(default)]
    pub id: bool,
    /// Single-field unique constraint.
    #[serde(default)]
    pub unique: bool,
    /// Relation metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationInfo>,
    /// Computed at read time, never written.
    #[serde(default)]
    pub computed: bool,
    /// Relation fields this scalar is a foreign key for.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub foreign_key_for: Vec<SmolStr>,
    /// Maintained by the storage layer on every update.
    #[serde(default)]
    pub updated_at: bool,
    /// Has a default value.
    #[serde(default)]
    pub has_default: bool,
    /// Omitted from read results unless explicitly requested.
    #[serde(default)]
    pub omit: bool,
    /// Model that declared this field when it was inherited from a delegate base.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_model: Option<SmolStr>,
    /// Field-level attributes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

impl FieldDef {
    /// Create a new required, single-valued field.
    pub fn new(name: impl Into<SmolStr>, type_name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            optional: false,
            array: false,
            id: false,
            unique: false,
            relation: None,
            computed: false,
            foreign_key_for: vec![],
            updated_at: false,
            has_default: false,
            omit: false,
            origin_model: None,
            attributes: vec![],
        }
    }

    /// Mark the field optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the field as a list.
    pub fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Mark the field as (part of) the primary key.
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Mark the field unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Attach relation metadata.
    pub fn relation(mut self, relation: RelationInfo) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Mark the field computed.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    /// Mark the field as a foreign key for the given relations.
    pub fn foreign_key_for<S: Into<SmolStr>>(mut self, relations: impl IntoIterator<Item = S>) -> Self {
        self.foreign_key_for = relations.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the field as an `updatedAt` timestamp.
    pub fn updated_at(mut self) -> Self {
        self.updated_at = true;
        self
    }

    /// Mark the field as having a default value.
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Omit the field from read results by default.
    pub fn omitted(mut self) -> Self {
        self.omit = true;
        self
    }

    /// Append a field-level attribute.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Get the field name as a string.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if this is a relation field.
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Relation field holding the foreign keys on this side.
    pub fn owns_relation(&self) -> bool {
        self.relation.as_ref().is_some_and(|r| !r.fields.is_empty())
    }

    /// Scalar field serving as a foreign key.
    pub fn is_foreign_key(&self) -> bool {
        !self.foreign_key_for.is_empty()
    }

    /// Whether a create payload may leave this field out.
    pub fn optional_on_create(&self) -> bool {
        self.optional || self.has_default || self.updated_at || (self.array && !self.is_relation())
    }

    /// Get an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.is(name))
    }

    /// Check if this field has a specific attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.is(name))
    }
}

impl std::fmt::Display for FieldDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.type_name)?;
        if self.array {
            write!(f, "[]")?;
        }
        if self.optional {
            write!(f, "?")?;
        }
        for attr in &self.attributes {
            write!(f, " {}", attr.name)?;
            if !attr.args.is_empty() {
                write!(f, "(...)")?;
            }
        }
        Ok(())
    }
}
