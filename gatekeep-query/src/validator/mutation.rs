//! Mutation payload shapes: `data` objects, nested relation operators and
//! embedded type values.
//!
//! A create payload comes in two forms when the model owns a relation:
//!
//! - *checked*: related records are linked through the relation field
//!   (`author: { connect: { id } }`), foreign keys are not accepted;
//! - *unchecked*: foreign keys are written directly (`authorId`), owning
//!   relation fields are not accepted.
//!
//! Update payloads follow the same split. Computed fields and delegate
//! discriminators never appear in either form.

use smol_str::SmolStr;
use std::collections::HashSet;

use gatekeep_schema::{FieldDef, FieldType, ScalarType, SchemaError, SchemaResult};

use super::factory::ValidatorFactory;
use super::key::{ShapeKey, capitalize};
use super::shape::{ObjectShape, Refinement, Sentinel, Shape};

/// Fields a mutation payload may carry.
struct Writable<'s> {
    fields: Vec<&'s FieldDef>,
    /// Foreign keys of visible owning relations.
    foreign_keys: HashSet<&'s str>,
}

impl Writable<'_> {
    fn has_owning_relation(&self) -> bool {
        self.fields.iter().any(|f| f.owns_relation())
    }

    fn scalars(&self) -> impl Iterator<Item = &FieldDef> + '_ {
        self.fields.iter().copied().filter(|f| !f.is_relation())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Variant {
    Checked,
    Unchecked,
}

impl ValidatorFactory {
    pub(crate) fn build_create_data(&self, model: &str, without: Option<&str>) -> SchemaResult<Shape> {
        let writable = self.writable_fields(model, without)?;
        let rules = self.rule_refinements(self.schema().require_model(model)?.validation_rules())?;
        let name = ShapeKey::CreateData {
            model: model.into(),
            without: without.map(SmolStr::new),
        }
        .to_string();

        // Without an owning relation both forms accept the same keys.
        let checked = self.create_object(model, &name, &writable, Variant::Checked, &rules)?;
        if !writable.has_owning_relation() {
            return Ok(Shape::Object(checked));
        }
        let unchecked = self.create_object(model, &name, &writable, Variant::Unchecked, &rules)?;
        Ok(Shape::Union(vec![Shape::Object(checked), Shape::Object(unchecked)]))
    }

    pub(crate) fn build_create_many_data(&self, model: &str, without: Option<&str>) -> SchemaResult<Shape> {
        let writable = self.writable_fields(model, without)?;
        let mut obj = ObjectShape::new(
            ShapeKey::CreateManyData {
                model: model.into(),
                without: without.map(SmolStr::new),
            }
            .to_string(),
        );
        for field in writable.scalars() {
            obj.insert(field.name.clone(), self.data_value(model, field)?, !field.optional_on_create());
        }
        obj.refinements = self.rule_refinements(self.schema().require_model(model)?.validation_rules())?;
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_update_data(&self, model: &str, without: Option<&str>) -> SchemaResult<Shape> {
        let writable = self.writable_fields(model, without)?;
        let name = ShapeKey::UpdateData {
            model: model.into(),
            without: without.map(SmolStr::new),
        }
        .to_string();

        let checked = self.update_object(model, &name, &writable, Variant::Checked)?;
        if !writable.has_owning_relation() {
            return Ok(Shape::Object(checked));
        }
        let unchecked = self.update_object(model, &name, &writable, Variant::Unchecked)?;
        Ok(Shape::Union(vec![Shape::Object(checked), Shape::Object(unchecked)]))
    }

    pub(crate) fn build_update_many_data(&self, model: &str, without: Option<&str>) -> SchemaResult<Shape> {
        let writable = self.writable_fields(model, without)?;
        let mut obj = ObjectShape::new(
            ShapeKey::UpdateManyData {
                model: model.into(),
                without: without.map(SmolStr::new),
            }
            .to_string(),
        );
        for field in writable.scalars() {
            obj.insert(field.name.clone(), self.update_value(model, field)?, false);
        }
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_relation_create(&self, model: &str, field: &str) -> SchemaResult<Shape> {
        let (relation, back) = self.relation_parts(model, field)?;
        let mut obj = ObjectShape::new(
            ShapeKey::RelationCreate {
                model: model.into(),
                field: field.into(),
            }
            .to_string(),
        );
        add_create_operators(&mut obj, relation, back.as_ref());
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_relation_update(&self, model: &str, field: &str) -> SchemaResult<Shape> {
        let (relation, back) = self.relation_parts(model, field)?;
        let target = &relation.type_name;
        let mut obj = ObjectShape::new(
            ShapeKey::RelationUpdate {
                model: model.into(),
                field: field.into(),
            }
            .to_string(),
        );
        add_create_operators(&mut obj, relation, back.as_ref());

        let unique = Shape::lazy(ShapeKey::where_input(target.clone(), true));
        let filter = Shape::lazy(ShapeKey::where_input(target.clone(), false));
        let create = Shape::lazy(ShapeKey::CreateData {
            model: target.clone(),
            without: back.clone(),
        });
        let update = Shape::lazy(ShapeKey::UpdateData {
            model: target.clone(),
            without: back.clone(),
        });

        if relation.array {
            for key in ["set", "disconnect", "delete"] {
                obj.insert(key, unique.clone().or_array(), false);
            }
            let by_unique = ObjectShape::new(format!("{target}UpdateWithWhereUniqueInput"))
                .required("where", unique.clone())
                .required("data", update.clone());
            obj.insert("update", Shape::Object(by_unique).or_array(), false);

            let upsert = ObjectShape::new(format!("{target}UpsertWithWhereUniqueInput"))
                .required("where", unique)
                .required("create", create)
                .required("update", update);
            obj.insert("upsert", Shape::Object(upsert).or_array(), false);

            let update_many = ObjectShape::new(format!("{target}UpdateManyWithWhereInput"))
                .required("where", filter.clone())
                .required(
                    "data",
                    Shape::lazy(ShapeKey::UpdateManyData {
                        model: target.clone(),
                        without: back,
                    }),
                );
            obj.insert("updateMany", Shape::Object(update_many).or_array(), false);
            obj.insert("deleteMany", filter.or_array(), false);
        } else {
            let with_where = ObjectShape::new(format!("{target}UpdateToOneWithWhereInput"))
                .optional("where", filter.clone())
                .required("data", update.clone());
            obj.insert(
                "update",
                Shape::Union(vec![Shape::Object(with_where), update.clone()]),
                false,
            );

            let upsert = ObjectShape::new(format!("{target}UpsertInput"))
                .optional("where", filter.clone())
                .required("create", create)
                .required("update", update);
            obj.insert("upsert", Shape::Object(upsert), false);

            if relation.optional {
                let detach = Shape::Union(vec![Shape::Boolean, filter]);
                obj.insert("disconnect", detach.clone(), false);
                obj.insert("delete", detach, false);
            }
        }
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_type_def_data(&self, type_def: &str) -> SchemaResult<Shape> {
        let def = self.schema().require_type_def(type_def)?;
        let mut obj = ObjectShape::new(
            ShapeKey::TypeDefData {
                type_def: type_def.into(),
            }
            .to_string(),
        );
        for field in def.fields.values() {
            obj.insert(
                field.name.clone(),
                self.data_value(type_def, field)?,
                !field.optional_on_create(),
            );
        }
        obj.refinements = self.rule_refinements(def.validation_rules())?;
        Ok(Shape::Object(obj))
    }

    // ==================== Payload Objects ====================

    fn create_object(
        &self,
        model: &str,
        name: &str,
        writable: &Writable<'_>,
        variant: Variant,
        rules: &[Refinement],
    ) -> SchemaResult<ObjectShape> {
        let mut obj = ObjectShape::new(variant_name(model, name, variant));
        for field in &writable.fields {
            if field.is_relation() {
                if field.owns_relation() && variant == Variant::Unchecked {
                    continue;
                }
                let required = field.owns_relation() && !field.optional && !field.array;
                obj.insert(
                    field.name.clone(),
                    Shape::lazy(ShapeKey::RelationCreate {
                        model: model.into(),
                        field: field.name.clone(),
                    }),
                    required,
                );
            } else {
                if variant == Variant::Checked && writable.foreign_keys.contains(field.name.as_str()) {
                    continue;
                }
                obj.insert(field.name.clone(), self.data_value(model, field)?, !field.optional_on_create());
            }
        }
        obj.refinements = rules.to_vec();
        Ok(obj)
    }

    fn update_object(
        &self,
        model: &str,
        name: &str,
        writable: &Writable<'_>,
        variant: Variant,
    ) -> SchemaResult<ObjectShape> {
        let mut obj = ObjectShape::new(variant_name(model, name, variant));
        for field in &writable.fields {
            if field.is_relation() {
                if field.owns_relation() && variant == Variant::Unchecked {
                    continue;
                }
                obj.insert(
                    field.name.clone(),
                    Shape::lazy(ShapeKey::RelationUpdate {
                        model: model.into(),
                        field: field.name.clone(),
                    }),
                    false,
                );
            } else {
                if variant == Variant::Checked && writable.foreign_keys.contains(field.name.as_str()) {
                    continue;
                }
                obj.insert(field.name.clone(), self.update_value(model, field)?, false);
            }
        }
        Ok(obj)
    }

    fn writable_fields(&self, model: &str, without: Option<&str>) -> SchemaResult<Writable<'_>> {
        let model_def = self.schema().require_model(model)?;
        let mut hidden: HashSet<&str> = self
            .schema()
            .delegate_discriminators(model)?
            .into_iter()
            .map(|f| f.name.as_str())
            .collect();
        if let Some(back) = without {
            let back_field = self.schema().require_field(model, back)?;
            hidden.insert(back_field.name.as_str());
            if let Some(info) = &back_field.relation {
                hidden.extend(info.fields.iter().map(SmolStr::as_str));
            }
        }

        let mut fields = Vec::new();
        let mut foreign_keys = HashSet::new();
        for field in model_def.fields.values() {
            if field.computed || hidden.contains(field.name.as_str()) {
                continue;
            }
            if let Some(info) = &field.relation {
                if !self.is_visible_relation(field) {
                    continue;
                }
                foreign_keys.extend(info.fields.iter().map(SmolStr::as_str));
            }
            fields.push(field);
        }
        Ok(Writable { fields, foreign_keys })
    }

    fn relation_parts(&self, model: &str, field: &str) -> SchemaResult<(&FieldDef, Option<SmolStr>)> {
        let relation = self.schema().require_field(model, field)?;
        let info = relation.relation.as_ref().ok_or_else(|| {
            SchemaError::invalid_field(model, field, "expected a relation field")
        })?;
        Ok((relation, info.opposite.clone()))
    }

    // ==================== Field Values ====================

    /// Value accepted when writing a field outright.
    fn data_value(&self, owner: &str, field: &FieldDef) -> SchemaResult<Shape> {
        let value = self.value_shape(owner, field, true)?;
        if matches!(value, Shape::Json) {
            let sentinels = if field.optional {
                vec![Sentinel::DbNull, Sentinel::JsonNull]
            } else {
                vec![Sentinel::JsonNull]
            };
            return Ok(Shape::Union(vec![Shape::Json, Shape::Sentinel(sentinels)]));
        }
        Ok(if field.optional { value.nullable() } else { value })
    }

    /// Value accepted when updating a field: the plain value or one of the
    /// update operators for its type.
    fn update_value(&self, owner: &str, field: &FieldDef) -> SchemaResult<Shape> {
        let value = self.data_value(owner, field)?;
        let ty = self.schema().resolve_field_type(owner, field)?;

        let operators = if field.array {
            let element = match self.value_shape(owner, field, true)? {
                Shape::Array { item, .. } => *item,
                other => other,
            };
            ObjectShape::new(format!("{}ListUpdateInput", field.type_name))
                .optional("set", value.clone())
                .optional("push", element.or_array())
        } else {
            match ty {
                FieldType::Scalar(ScalarType::Json) | FieldType::TypeDef(_) => return Ok(value),
                FieldType::Scalar(scalar) if scalar.is_numeric() => {
                    let mut ops = ObjectShape::new(format!("{scalar}FieldUpdateOperationsInput"))
                        .optional("set", value.clone());
                    for op in ["increment", "decrement", "multiply", "divide"] {
                        ops.insert(op, Shape::scalar(scalar), false);
                    }
                    ops
                }
                _ => ObjectShape::new(format!("{}FieldUpdateOperationsInput", field.type_name))
                    .optional("set", value.clone()),
            }
        };
        let keys = operators.fields.keys().cloned().collect();
        Ok(Shape::Union(vec![
            value,
            Shape::Object(operators.refine(Refinement::ExactlyOne(keys))),
        ]))
    }
}

fn variant_name(model: &str, name: &str, variant: Variant) -> String {
    match (variant, name.strip_prefix(model)) {
        (Variant::Unchecked, Some(rest)) => format!("{model}Unchecked{rest}"),
        _ => name.to_string(),
    }
}

/// `create`, `connect`, `connectOrCreate` and, for lists, `createMany`.
fn add_create_operators(obj: &mut ObjectShape, relation: &FieldDef, back: Option<&SmolStr>) {
    let target = &relation.type_name;
    let list = relation.array;
    let many = |shape: Shape| if list { shape.or_array() } else { shape };

    let unique = Shape::lazy(ShapeKey::where_input(target.clone(), true));
    let create = Shape::lazy(ShapeKey::CreateData {
        model: target.clone(),
        without: back.cloned(),
    });

    obj.insert("create", many(create.clone()), false);
    obj.insert("connect", many(unique.clone()), false);
    let connect_or_create = ObjectShape::new(format!(
        "{target}CreateOrConnectWithout{}Input",
        back.map(|b| capitalize(b)).unwrap_or_default()
    ))
    .required("where", unique)
    .required("create", create);
    obj.insert("connectOrCreate", many(Shape::Object(connect_or_create)), false);

    if list {
        let envelope = ObjectShape::new(format!("{target}CreateManyEnvelopeInput"))
            .required(
                "data",
                Shape::lazy(ShapeKey::CreateManyData {
                    model: target.clone(),
                    without: back.cloned(),
                })
                .or_array(),
            )
            .optional("skipDuplicates", Shape::Boolean);
        obj.insert("createMany", Shape::Object(envelope), false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientOptions;
    use crate::validator::testing::{factory_with, issues};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn create_key(model: &str) -> ShapeKey {
        ShapeKey::CreateData {
            model: model.into(),
            without: None,
        }
    }

    fn update_key(model: &str) -> ShapeKey {
        ShapeKey::UpdateData {
            model: model.into(),
            without: None,
        }
    }

    // ==================== Create Tests ====================

    #[test]
    fn test_create_requires_fields_without_defaults() {
        let factory = factory_with(ClientOptions::default());
        let found = issues(&factory, &create_key("User"), json!({ "id": "u1" }));
        let paths: Vec<String> = found.iter().map(|i| i.path_string()).collect();
        assert!(paths.contains(&"email".to_string()));
        assert!(paths.contains(&"age".to_string()));
        assert!(!paths.contains(&"createdAt".to_string()));
    }

    #[test]
    fn test_checked_and_unchecked_create() {
        let factory = factory_with(ClientOptions::default());
        let key = create_key("Post");

        let checked = json!({ "id": 1, "title": "t", "views": 0, "author": { "connect": { "id": "u1" } } });
        assert!(issues(&factory, &key, checked).is_empty());

        let unchecked = json!({ "id": 1, "title": "t", "views": 0, "authorId": "u1" });
        assert!(issues(&factory, &key, unchecked).is_empty());

        let mixed = json!({ "id": 1, "title": "t", "views": 0, "authorId": "u1", "author": { "connect": { "id": "u1" } } });
        assert!(!issues(&factory, &key, mixed).is_empty());
    }

    #[test]
    fn test_create_rejects_computed_fields() {
        let factory = factory_with(ClientOptions::default());
        let value = json!({ "id": 1, "title": "t", "views": 0, "authorId": "u1", "wordCount": 3 });
        let found = issues(&factory, &create_key("Post"), value);
        assert_eq!(found[0].message, "unrecognized key `wordCount` in PostUncheckedCreateInput");
    }

    #[test]
    fn test_nested_create_drops_back_relation() {
        let factory = factory_with(ClientOptions::default());
        let value = json!({
            "id": "u1", "email": "u@x.com", "age": 30, "role": "USER",
            "posts": { "create": [{ "id": 1, "title": "t", "views": 0 }] }
        });
        assert!(issues(&factory, &create_key("User"), value).is_empty());

        let with_fk = json!({
            "id": "u1", "email": "u@x.com", "age": 30, "role": "USER",
            "posts": { "create": { "id": 1, "title": "t", "views": 0, "authorId": "u1" } }
        });
        assert!(!issues(&factory, &create_key("User"), with_fk).is_empty());
    }

    #[test]
    fn test_create_rejects_delegate_discriminator() {
        let factory = factory_with(ClientOptions::default());
        let key = create_key("Video");
        assert!(issues(&factory, &key, json!({ "id": 1, "duration": 10 })).is_empty());

        let found = issues(&factory, &key, json!({ "id": 1, "duration": 10, "kind": "video" }));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "unrecognized key `kind` in VideoCreateInput");
    }

    #[test]
    fn test_json_sentinels_in_mutations() {
        let factory = factory_with(ClientOptions::default());
        let key = update_key("User");

        let mut value = crate::value::Value::object();
        value.insert("meta", crate::value::Value::DbNull);
        assert!(factory.check(&key, &value).unwrap().is_empty());

        let mut value = crate::value::Value::object();
        value.insert("meta", crate::value::Value::AnyNull);
        assert!(!factory.check(&key, &value).unwrap().is_empty());
    }

    // ==================== Custom Rule Tests ====================

    #[test]
    fn test_custom_rule_reports_at_path() {
        let factory = factory_with(ClientOptions::default());
        let minor = json!({ "id": "u1", "email": "u@x.com", "age": 16, "role": "USER" });
        let found = issues(&factory, &create_key("User"), minor);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].message, "Must be adult");
        assert_eq!(found[0].path_string(), "age");

        let adult = json!({ "id": "u1", "email": "u@x.com", "age": 18, "role": "USER" });
        assert!(issues(&factory, &create_key("User"), adult).is_empty());
    }

    #[test]
    fn test_custom_rules_disabled() {
        let factory = factory_with(ClientOptions::default().with_validate_input(false));
        let minor = json!({ "id": "u1", "email": "u@x.com", "age": 16, "role": "USER" });
        assert!(issues(&factory, &create_key("User"), minor).is_empty());
    }

    #[test]
    fn test_type_def_data_is_checked() {
        let factory = factory_with(ClientOptions::default());
        let base = json!({ "id": "u1", "email": "u@x.com", "age": 20, "role": "USER" });

        let mut good = base.clone();
        good["address"] = json!({ "city": "Oslo" });
        assert!(issues(&factory, &create_key("User"), good).is_empty());

        let mut bad = base;
        bad["address"] = json!({ "town": "Oslo" });
        let paths: Vec<String> = issues(&factory, &create_key("User"), bad)
            .iter()
            .map(|i| i.path_string())
            .collect();
        assert!(paths.contains(&"address.city".to_string()));
    }

    // ==================== Update Tests ====================

    #[test]
    fn test_update_operators() {
        let factory = factory_with(ClientOptions::default());
        let key = update_key("User");

        assert!(issues(&factory, &key, json!({ "age": { "increment": 1 } })).is_empty());
        assert!(issues(&factory, &key, json!({ "age": 40, "name": null })).is_empty());
        assert!(issues(&factory, &key, json!({ "tags": { "push": "x" } })).is_empty());
        assert!(issues(&factory, &key, json!({ "tags": { "push": ["x", "y"] } })).is_empty());

        let found = issues(&factory, &key, json!({ "age": { "increment": 1, "decrement": 2 } }));
        assert_eq!(found.len(), 1);
        assert!(found[0].message.starts_with("exactly one of"));
        assert!(!issues(&factory, &key, json!({ "email": { "increment": 1 } })).is_empty());
    }

    #[test]
    fn test_nested_relation_updates() {
        let factory = factory_with(ClientOptions::default());
        let key = update_key("User");

        let value = json!({
            "posts": {
                "updateMany": { "where": { "views": { "lt": 1 } }, "data": { "views": 1 } },
                "deleteMany": [{ "title": "x" }],
                "disconnect": { "id": 3 }
            },
            "profile": { "disconnect": true }
        });
        assert!(issues(&factory, &key, value).is_empty());

        let post = update_key("Post");
        assert!(!issues(&factory, &post, json!({ "author": { "disconnect": true } })).is_empty());
        assert!(!issues(&factory, &post, json!({ "author": { "createMany": { "data": [] } } })).is_empty());
    }

    #[test]
    fn test_update_many_accepts_scalars_only() {
        let factory = factory_with(ClientOptions::default());
        let key = ShapeKey::UpdateManyData {
            model: "User".into(),
            without: None,
        };
        assert!(issues(&factory, &key, json!({ "age": { "set": 3 } })).is_empty());
        assert!(!issues(&factory, &key, json!({ "posts": {} })).is_empty());
    }

    #[test]
    fn test_variant_names() {
        assert_eq!(
            variant_name("Creator", "CreatorCreateInput", Variant::Unchecked),
            "CreatorUncheckedCreateInput"
        );
        assert_eq!(
            variant_name("Post", "PostUpdateWithoutAuthorInput", Variant::Checked),
            "PostUpdateWithoutAuthorInput"
        );
    }
}
