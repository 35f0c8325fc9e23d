//! Top-level schema definition.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::path::Path;

use super::{DatabaseProvider, EnumDef, ModelDef, ProcedureDef, TypeDef, UniqueDef};
use crate::error::{SchemaError, SchemaResult};

/// A compiled schema description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// Storage provider.
    #[serde(default)]
    pub provider: DatabaseProvider,
    /// All models in the schema.
    #[serde(default)]
    pub models: IndexMap<SmolStr, ModelDef>,
    /// All enums in the schema.
    #[serde(default)]
    pub enums: IndexMap<SmolStr, EnumDef>,
    /// All embedded structured types in the schema.
    #[serde(default)]
    pub type_defs: IndexMap<SmolStr, TypeDef>,
    /// All procedures in the schema.
    #[serde(default)]
    pub procedures: IndexMap<SmolStr, ProcedureDef>,
}

impl Schema {
    /// Create a new empty schema for the given provider.
    pub fn new(provider: DatabaseProvider) -> Self {
        Self {
            provider,
            ..Default::default()
        }
    }

    /// Decode a schema document emitted by the schema compiler.
    pub fn from_json(source: &str) -> SchemaResult<Self> {
        let mut schema: Schema =
            serde_json::from_str(source).map_err(|e| SchemaError::JsonError { source: e })?;
        schema.link_names();
        Ok(schema)
    }

    /// Load a schema document from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    /// Add a model to the schema.
    pub fn with_model(mut self, model: ModelDef) -> Self {
        self.models.insert(model.name.clone(), model);
        self
    }

    /// Add an enum to the schema.
    pub fn with_enum(mut self, e: EnumDef) -> Self {
        self.enums.insert(e.name.clone(), e);
        self
    }

    /// Add a type def to the schema.
    pub fn with_type_def(mut self, t: TypeDef) -> Self {
        self.type_defs.insert(t.name.clone(), t);
        self
    }

    /// Add a procedure to the schema.
    pub fn with_procedure(mut self, p: ProcedureDef) -> Self {
        self.procedures.insert(p.name.clone(), p);
        self
    }

    /// Get all model names.
    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(|s| s.as_str())
    }

    /// Fill in names from map keys and derive unique declarations from field flags
    /// where the document left them out.
    fn link_names(&mut self) {
        for (name, model) in self.models.iter_mut() {
            if model.name.is_empty() {
                model.name = name.clone();
            }
            for (field_name, field) in model.fields.iter_mut() {
                if field.name.is_empty() {
                    field.name = field_name.clone();
                }
            }
            if model.id_fields.is_empty() {
                model.id_fields = model
                    .fields
                    .values()
                    .filter(|f| f.id)
                    .map(|f| f.name.clone())
                    .collect();
            }
            if model.unique_fields.is_empty() {
                if model.id_fields.len() > 1 {
                    model.unique_fields.insert(
                        model.id_fields.join("_").into(),
                        UniqueDef::Group {
                            fields: model.id_fields.clone(),
                        },
                    );
                }
                let single_id = model.id_fields.len() == 1;
                for field in model
                    .fields
                    .values()
                    .filter(|f| (f.id && single_id) || f.unique)
                {
                    model.unique_fields.insert(
                        field.name.clone(),
                        UniqueDef::Field {
                            field: field.name.clone(),
                        },
                    );
                }
            }
        }
        for (name, type_def) in self.type_defs.iter_mut() {
            if type_def.name.is_empty() {
                type_def.name = name.clone();
            }
            for (field_name, field) in type_def.fields.iter_mut() {
                if field.name.is_empty() {
                    field.name = field_name.clone();
                }
            }
        }
        for (name, e) in self.enums.iter_mut() {
            if e.name.is_empty() {
                e.name = name.clone();
            }
        }
        for (name, p) in self.procedures.iter_mut() {
            if p.name.is_empty() {
                p.name = name.clone();
            }
        }
    }
}
