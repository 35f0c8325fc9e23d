//! `where` and `having` shapes.

use std::collections::HashSet;

use gatekeep_schema::{FieldDef, FieldType, ScalarType, SchemaResult, UniqueField};

use super::factory::ValidatorFactory;
use super::key::{FilterTarget, ShapeKey, capitalize};
use super::shape::{ObjectShape, Refinement, Sentinel, Shape};
use crate::config::{FilterKind, FilterKinds};

const AT_LEAST_ONE_UNIQUE: &str = "At least one unique field or field group must be provided";

impl ValidatorFactory {
    pub(crate) fn build_where(&self, model: &str, unique: bool) -> SchemaResult<Shape> {
        let model_def = self.schema().require_model(model)?;
        let policy = self.policy();
        let mut obj = ObjectShape::new(ShapeKey::where_input(model, unique).to_string());
        logical_keys(&mut obj, ShapeKey::where_input(model, false));

        let uniques = if unique {
            self.schema().get_unique_fields(model)?
        } else {
            Vec::new()
        };
        let unique_singles: HashSet<&str> = uniques
            .iter()
            .filter_map(|u| match u {
                UniqueField::Single { field, .. } => Some(field.name.as_str()),
                UniqueField::Group { .. } => None,
            })
            .collect();

        for field in model_def.fields.values() {
            if field.is_relation() && !self.is_visible_relation(field) {
                continue;
            }
            // Identity lookups stay usable however filtering is sliced.
            let kinds = if unique_singles.contains(field.name.as_str()) {
                FilterKinds::ALL
            } else {
                policy.filter_kinds(model, &field.name).allowed()
            };
            if kinds.is_empty() {
                continue;
            }
            if let Some(shape) = self.field_filter(model, field, kinds)? {
                obj.insert(field.name.clone(), shape, false);
            }
        }

        if unique {
            let mut keys = Vec::with_capacity(uniques.len());
            for entry in &uniques {
                match entry {
                    UniqueField::Single { field, .. } => keys.push(field.name.clone()),
                    UniqueField::Group { name, fields } => {
                        let mut group =
                            ObjectShape::new(format!("{model}{}CompoundUniqueInput", capitalize(name)));
                        for field in fields {
                            group.insert(field.name.clone(), self.value_shape(model, field, false)?, true);
                        }
                        obj.insert((*name).clone(), Shape::Object(group), false);
                        keys.push((*name).clone());
                    }
                }
            }
            if let [only] = keys.as_slice() {
                if let Some(slot) = obj.fields.get_mut(only) {
                    slot.required = true;
                }
            } else {
                obj = obj.refine(Refinement::AtLeastOne {
                    keys,
                    message: AT_LEAST_ONE_UNIQUE.to_string(),
                });
            }
        }

        Ok(Shape::Object(obj))
    }

    /// Filter accepted for one field, or `None` when the allowed kinds leave
    /// it no operator.
    pub(crate) fn field_filter(
        &self,
        owner: &str,
        field: &FieldDef,
        kinds: FilterKinds,
    ) -> SchemaResult<Option<Shape>> {
        let shape = match self.schema().resolve_field_type(owner, field)? {
            FieldType::Model(target) => {
                if !kinds.contains(FilterKind::Relation) {
                    return Ok(None);
                }
                let nested = Shape::lazy(ShapeKey::where_input(target.clone(), false));
                if field.array {
                    let mut obj = ObjectShape::new(format!("{target}ListRelationFilter"));
                    for key in ["some", "every", "none"] {
                        obj.insert(key, nested.clone(), false);
                    }
                    Shape::Object(obj)
                } else {
                    let operand = if field.optional {
                        nested.clone().nullable()
                    } else {
                        nested.clone()
                    };
                    let relation = ObjectShape::new(format!("{target}RelationFilter"))
                        .optional("is", operand.clone())
                        .optional("isNot", operand);
                    let either = Shape::Union(vec![Shape::Object(relation), nested]);
                    if field.optional { either.nullable() } else { either }
                }
            }
            FieldType::Scalar(ScalarType::Json) => {
                if !kinds.contains(FilterKind::Equality) && !kinds.contains(FilterKind::Json) {
                    return Ok(None);
                }
                json_filter_key(field.optional, kinds)
            }
            FieldType::TypeDef(type_def) => self.typed_json_filter(&type_def, field, kinds),
            FieldType::Scalar(ty) => match self.primitive_filter(FilterTarget::Scalar(ty), field, kinds)? {
                Some(shape) => shape,
                None => return Ok(None),
            },
            FieldType::Enum(name) => match self.primitive_filter(FilterTarget::Enum(name), field, kinds)? {
                Some(shape) => shape,
                None => return Ok(None),
            },
        };
        Ok(Some(shape))
    }

    fn primitive_filter(
        &self,
        target: FilterTarget,
        field: &FieldDef,
        kinds: FilterKinds,
    ) -> SchemaResult<Option<Shape>> {
        if field.array {
            if !kinds.contains(FilterKind::Equality) && !kinds.contains(FilterKind::List) {
                return Ok(None);
            }
            return Ok(Some(Shape::lazy(ShapeKey::ListFilter { target, kinds })));
        }

        let ordered = matches!(&target, FilterTarget::Scalar(ty) if ty.is_ordered());
        let textual = matches!(&target, FilterTarget::Scalar(ScalarType::String));
        let has_operator = kinds.contains(FilterKind::Equality)
            || (ordered && kinds.contains(FilterKind::Range))
            || (textual && kinds.contains(FilterKind::Like));
        if !has_operator {
            return Ok(None);
        }

        let value = self.target_shape(&target)?;
        let filter = Shape::lazy(ShapeKey::ScalarFilter {
            target,
            nullable: field.optional,
            kinds,
        });
        if kinds.contains(FilterKind::Equality) {
            let bare = if field.optional { value.nullable() } else { value };
            Ok(Some(Shape::Union(vec![bare, filter])))
        } else {
            Ok(Some(filter))
        }
    }

    fn typed_json_filter(&self, type_def: &str, field: &FieldDef, kinds: FilterKinds) -> Shape {
        let nested = Shape::lazy(ShapeKey::TypeDefWhere {
            type_def: type_def.into(),
        });
        let structural = if field.array {
            let mut obj = ObjectShape::new(format!("{type_def}ListFilter"));
            for key in ["some", "every", "none"] {
                obj.insert(key, nested.clone(), false);
            }
            Shape::Object(obj)
        } else if kinds.contains(FilterKind::Relation) {
            let operand = if field.optional {
                nested.clone().nullable()
            } else {
                nested.clone()
            };
            Shape::Union(vec![
                nested,
                Shape::Object(
                    ObjectShape::new(format!("{type_def}CompositeFilter"))
                        .optional("is", operand.clone())
                        .optional("isNot", operand),
                ),
            ])
        } else {
            nested
        };

        if kinds.contains(FilterKind::Equality) || kinds.contains(FilterKind::Json) {
            Shape::Union(vec![structural, json_filter_key(field.optional, kinds)])
        } else {
            structural
        }
    }

    fn target_shape(&self, target: &FilterTarget) -> SchemaResult<Shape> {
        match target {
            FilterTarget::Scalar(ty) => Ok(Shape::scalar(*ty)),
            FilterTarget::Enum(name) => self.enum_shape(name),
        }
    }

    pub(crate) fn build_scalar_filter(
        &self,
        target: &FilterTarget,
        nullable: bool,
        kinds: FilterKinds,
    ) -> SchemaResult<Shape> {
        let value = self.target_shape(target)?;
        let key = ShapeKey::ScalarFilter {
            target: target.clone(),
            nullable,
            kinds,
        };
        let mut obj = ObjectShape::new(key.to_string());

        if kinds.contains(FilterKind::Equality) {
            let maybe_null = if nullable { value.clone().nullable() } else { value.clone() };
            obj.insert("equals", maybe_null.clone(), false);
            obj.insert("in", Shape::array(value.clone()), false);
            obj.insert("notIn", Shape::array(value.clone()), false);
            obj.insert("not", Shape::Union(vec![maybe_null, Shape::lazy(key.clone())]), false);
        }

        let ty = match target {
            FilterTarget::Scalar(ty) => Some(*ty),
            FilterTarget::Enum(_) => None,
        };
        if kinds.contains(FilterKind::Range) && ty.is_some_and(|t| t.is_ordered()) {
            for op in ["lt", "lte", "gt", "gte"] {
                obj.insert(op, value.clone(), false);
            }
            obj.insert(
                "between",
                Shape::Array {
                    item: Box::new(value.clone()),
                    min_items: Some(2),
                    max_items: Some(2),
                },
                false,
            );
        }
        if kinds.contains(FilterKind::Like) && ty == Some(ScalarType::String) {
            for op in ["contains", "startsWith", "endsWith"] {
                obj.insert(op, value.clone(), false);
            }
            if self.schema().provider().supports_insensitive_mode() {
                obj.insert("mode", Shape::one_of("QueryMode", ["default", "insensitive"]), false);
            }
        }
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_list_filter(&self, target: &FilterTarget, kinds: FilterKinds) -> SchemaResult<Shape> {
        let value = self.target_shape(target)?;
        let mut obj = ObjectShape::new(
            ShapeKey::ListFilter {
                target: target.clone(),
                kinds,
            }
            .to_string(),
        );
        if kinds.contains(FilterKind::Equality) {
            obj.insert("equals", Shape::array(value.clone()).nullable(), false);
        }
        if kinds.contains(FilterKind::List) {
            obj.insert("has", value.clone(), false);
            obj.insert("hasEvery", Shape::array(value.clone()), false);
            obj.insert("hasSome", Shape::array(value), false);
            obj.insert("isEmpty", Shape::Boolean, false);
        }
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_json_filter(&self, nullable: bool, kinds: FilterKinds) -> Shape {
        let mut obj = ObjectShape::new(ShapeKey::JsonFilter { nullable, kinds }.to_string());
        if kinds.contains(FilterKind::Equality) {
            let sentinels = if nullable {
                vec![Sentinel::DbNull, Sentinel::JsonNull, Sentinel::AnyNull]
            } else {
                vec![Sentinel::JsonNull]
            };
            let operand = Shape::Union(vec![Shape::Json, Shape::Sentinel(sentinels)]);
            obj.insert("equals", operand.clone(), false);
            obj.insert("not", operand, false);
        }
        if kinds.contains(FilterKind::Json) {
            obj.insert("path", Shape::array(Shape::scalar(ScalarType::String)), false);
            for op in ["string_contains", "string_starts_with", "string_ends_with"] {
                obj.insert(op, Shape::scalar(ScalarType::String), false);
            }
            for op in ["array_contains", "array_starts_with", "array_ends_with"] {
                obj.insert(op, Shape::Json.nullable(), false);
            }
        }
        Shape::Object(obj)
    }

    pub(crate) fn build_type_def_where(&self, type_def: &str) -> SchemaResult<Shape> {
        let def = self.schema().require_type_def(type_def)?;
        let key = ShapeKey::TypeDefWhere {
            type_def: def.name.clone(),
        };
        let mut obj = ObjectShape::new(key.to_string());
        logical_keys(&mut obj, key);
        for field in def.fields.values() {
            if let Some(shape) = self.field_filter(type_def, field, FilterKinds::ALL)? {
                obj.insert(field.name.clone(), shape, false);
            }
        }
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_having(&self, model: &str) -> SchemaResult<Shape> {
        let model_def = self.schema().require_model(model)?;
        let policy = self.policy();
        let key = ShapeKey::Having { model: model.into() };
        let mut obj = ObjectShape::new(key.to_string());
        logical_keys(&mut obj, key);

        for field in model_def.scalar_fields().filter(|f| !f.array) {
            let ty = match self.schema().resolve_field_type(model, field)? {
                FieldType::Scalar(ScalarType::Json) | FieldType::TypeDef(_) | FieldType::Model(_) => continue,
                FieldType::Scalar(ty) => Some(ty),
                FieldType::Enum(_) => None,
            };
            let kinds = policy.filter_kinds(model, &field.name).allowed();
            if kinds.is_empty() {
                continue;
            }
            let Some(plain) = self.field_filter(model, field, kinds)? else {
                continue;
            };

            let aggregate = |target: ScalarType| {
                Shape::lazy(ShapeKey::ScalarFilter {
                    target: FilterTarget::Scalar(target),
                    nullable: true,
                    kinds,
                })
            };
            let mut aggregates = ObjectShape::new(format!("{model}{}AggregateFilter", capitalize(&field.name)))
                .optional(
                    "_count",
                    Shape::lazy(ShapeKey::ScalarFilter {
                        target: FilterTarget::Scalar(ScalarType::Int),
                        nullable: false,
                        kinds,
                    }),
                );
            if let Some(ty) = ty {
                aggregates.insert("_min", aggregate(ty), false);
                aggregates.insert("_max", aggregate(ty), false);
                if ty.is_numeric() {
                    aggregates.insert("_avg", aggregate(ScalarType::Float), false);
                    aggregates.insert("_sum", aggregate(ty), false);
                }
            }
            obj.insert(
                field.name.clone(),
                Shape::Union(vec![plain, Shape::Object(aggregates)]),
                false,
            );
        }
        Ok(Shape::Object(obj))
    }
}

fn logical_keys(obj: &mut ObjectShape, nested: ShapeKey) {
    obj.insert("AND", Shape::lazy(nested.clone()).or_array(), false);
    obj.insert("OR", Shape::array(Shape::lazy(nested.clone())), false);
    obj.insert("NOT", Shape::lazy(nested).or_array(), false);
}

fn json_filter_key(nullable: bool, kinds: FilterKinds) -> Shape {
    Shape::lazy(ShapeKey::JsonFilter { nullable, kinds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientOptions, FieldSlicing, ModelSlicing, SlicingOptions};
    use crate::validator::testing::{blog, factory_with, issues};
    use gatekeep_schema::{DatabaseProvider, FieldDef, ModelDef, Schema, SchemaAccessor};
    use serde_json::json;

    fn where_key(model: &str) -> ShapeKey {
        ShapeKey::where_input(model, false)
    }

    // ==================== Scalar Filter Tests ====================

    #[test]
    fn test_scalar_filters() {
        let factory = factory_with(ClientOptions::default());
        let key = where_key("User");

        assert!(issues(&factory, &key, json!({ "email": "a@b.co" })).is_empty());
        assert!(issues(&factory, &key, json!({ "age": { "gte": 18, "lt": 65 } })).is_empty());
        assert!(issues(&factory, &key, json!({ "age": { "between": [1, 9] } })).is_empty());
        assert!(issues(&factory, &key, json!({ "name": { "contains": "an", "mode": "insensitive" } })).is_empty());
        assert!(issues(&factory, &key, json!({ "name": null })).is_empty());
        assert!(issues(&factory, &key, json!({ "age": { "not": { "in": [1, 2] } } })).is_empty());

        assert_eq!(issues(&factory, &key, json!({ "age": { "between": [1] } })).len(), 1);
        assert!(!issues(&factory, &key, json!({ "age": { "contains": "1" } })).is_empty());
        assert!(!issues(&factory, &key, json!({ "email": null })).is_empty());
    }

    #[test]
    fn test_enum_and_list_filters() {
        let factory = factory_with(ClientOptions::default());
        let key = where_key("User");

        assert!(issues(&factory, &key, json!({ "role": { "in": ["USER", "ADMIN"] } })).is_empty());
        assert!(!issues(&factory, &key, json!({ "role": "ROOT" })).is_empty());
        assert!(issues(&factory, &key, json!({ "tags": { "has": "x", "isEmpty": false } })).is_empty());
        assert!(!issues(&factory, &key, json!({ "tags": { "has": 1 } })).is_empty());
    }

    #[test]
    fn test_logical_combinators() {
        let factory = factory_with(ClientOptions::default());
        let value = json!({
            "OR": [{ "email": "a@b.co" }, { "AND": { "age": { "gt": 3 } } }],
            "NOT": [{ "name": { "startsWith": "x" } }]
        });
        assert!(issues(&factory, &where_key("User"), value).is_empty());
    }

    #[test]
    fn test_mode_requires_postgres() {
        let schema = SchemaAccessor::new(
            Schema::new(DatabaseProvider::Sqlite).with_model(
                ModelDef::new("Tag")
                    .field(FieldDef::new("id", "Int").id())
                    .field(FieldDef::new("label", "String")),
            ),
        );
        let factory = ValidatorFactory::new(schema, ClientOptions::default());
        let found = factory
            .check(&where_key("Tag"), &json!({ "label": { "contains": "a", "mode": "insensitive" } }).into())
            .unwrap();
        assert!(!found.is_empty());
    }

    // ==================== Relation Filter Tests ====================

    #[test]
    fn test_relation_filters() {
        let factory = factory_with(ClientOptions::default());
        assert!(issues(&factory, &where_key("User"), json!({ "posts": { "some": { "title": "x" } } })).is_empty());
        assert!(issues(&factory, &where_key("Post"), json!({ "author": { "is": { "email": "a@b.co" } } })).is_empty());
        assert!(issues(&factory, &where_key("Post"), json!({ "author": { "email": "a@b.co" } })).is_empty());
        assert!(!issues(&factory, &where_key("Post"), json!({ "author": { "some": {} } })).is_empty());
    }

    #[test]
    fn test_excluded_model_relation_is_not_filterable() {
        let options = ClientOptions::default().with_slicing(SlicingOptions::default().exclude_models(["Post"]));
        let factory = factory_with(options);
        let found = issues(&factory, &where_key("User"), json!({ "posts": { "some": {} } }));
        assert_eq!(found[0].message, "unrecognized key `posts` in UserWhereInput");
    }

    // ==================== Json Filter Tests ====================

    #[test]
    fn test_json_filters_and_sentinels() {
        let factory = factory_with(ClientOptions::default());
        let key = where_key("User");

        assert!(issues(&factory, &key, json!({ "meta": { "path": ["a"], "string_contains": "x" } })).is_empty());
        let mut value = crate::value::Value::object();
        let mut filter = crate::value::Value::object();
        filter.insert("equals", crate::value::Value::AnyNull);
        value.insert("meta", filter);
        assert!(factory.check(&key, &value).unwrap().is_empty());
    }

    #[test]
    fn test_typed_json_filter_alternatives() {
        let factory = factory_with(ClientOptions::default());
        let key = where_key("User");

        assert!(issues(&factory, &key, json!({ "address": { "city": { "equals": "Oslo" } } })).is_empty());
        assert!(issues(&factory, &key, json!({ "address": { "is": { "city": "Oslo" } } })).is_empty());
        assert!(issues(&factory, &key, json!({ "address": { "path": ["city"], "string_starts_with": "O" } })).is_empty());
        assert!(!issues(&factory, &key, json!({ "address": { "city": "Oslo", "path": ["city"] } })).is_empty());
    }

    #[test]
    fn test_typed_json_composite_filter_needs_relation_kind() {
        let options = ClientOptions::default().with_slicing(SlicingOptions::default().model(
            "User",
            ModelSlicing::default().field("address", FieldSlicing::default().include([FilterKind::Equality])),
        ));
        let factory = factory_with(options);
        let key = where_key("User");

        assert!(issues(&factory, &key, json!({ "address": { "city": { "equals": "Oslo" } } })).is_empty());
        assert!(!issues(&factory, &key, json!({ "address": { "is": { "city": "Oslo" } } })).is_empty());
        assert!(!issues(&factory, &key, json!({ "address": { "isNot": { "city": "Oslo" } } })).is_empty());
    }

    // ==================== Slicing Tests ====================

    #[test]
    fn test_filter_kinds_restrict_operators() {
        let options = ClientOptions::default().with_slicing(SlicingOptions::default().model(
            "User",
            ModelSlicing::default()
                .field("age", FieldSlicing::default().include([FilterKind::Range]))
                .field("name", FieldSlicing::default().include(Vec::new())),
        ));
        let factory = factory_with(options);
        let key = where_key("User");

        assert!(issues(&factory, &key, json!({ "age": { "gt": 1 } })).is_empty());
        assert!(!issues(&factory, &key, json!({ "age": 3 })).is_empty());
        assert!(!issues(&factory, &key, json!({ "age": { "equals": 3 } })).is_empty());

        let found = issues(&factory, &key, json!({ "name": "x" }));
        assert_eq!(found[0].message, "unrecognized key `name` in UserWhereInput");
    }

    // ==================== Unique Filter Tests ====================

    #[test]
    fn test_unique_lookup_requires_a_unique_key() {
        let factory = factory_with(ClientOptions::default());
        let key = ShapeKey::where_input("User", true);

        assert!(issues(&factory, &key, json!({ "id": "u1" })).is_empty());
        assert!(issues(&factory, &key, json!({ "email": "u@x.com" })).is_empty());
        assert_eq!(issues(&factory, &key, json!({}))[0].message, AT_LEAST_ONE_UNIQUE);
        assert_eq!(issues(&factory, &key, json!({ "age": 1 }))[0].message, AT_LEAST_ONE_UNIQUE);
    }

    #[test]
    fn test_unique_fields_bypass_slicing() {
        let options = ClientOptions::default().with_slicing(SlicingOptions::default().model(
            "User",
            ModelSlicing::default().field("$all", FieldSlicing::default().include(Vec::new())),
        ));
        let factory = factory_with(options);

        assert!(issues(&factory, &ShapeKey::where_input("User", true), json!({ "id": "u1" })).is_empty());
        assert!(!issues(&factory, &where_key("User"), json!({ "id": "u1" })).is_empty());
    }

    #[test]
    fn test_single_unique_is_required_and_groups_are_strict() {
        let factory = factory_with(ClientOptions::default());
        let key = ShapeKey::where_input("Membership", true);

        assert!(issues(&factory, &key, json!({ "userId_teamId": { "userId": "u", "teamId": 1 } })).is_empty());
        assert_eq!(issues(&factory, &key, json!({}))[0].path_string(), "userId_teamId");
        assert_eq!(
            issues(&factory, &key, json!({ "userId_teamId": { "userId": "u" } }))[0].path_string(),
            "userId_teamId.teamId"
        );
    }

    // ==================== Having Tests ====================

    #[test]
    fn test_having_accepts_aggregate_filters() {
        let factory = factory_with(ClientOptions::default());
        let key = ShapeKey::Having { model: "Post".into() };
        assert!(issues(&factory, &key, json!({ "views": { "_avg": { "gt": 10 } } })).is_empty());
        assert!(issues(&factory, &key, json!({ "title": { "_count": { "gte": 1 } } })).is_empty());
        assert!(!issues(&factory, &key, json!({ "title": { "_avg": { "gt": 1 } } })).is_empty());
    }

    #[test]
    fn test_blog_fixture_builds() {
        assert!(blog().require_model("Membership").is_ok());
    }
}
