//! Projection and ordering shapes: `select`, `include`, `omit`, `orderBy`,
//! `distinct` and the aggregate selectors.

use gatekeep_schema::{FieldDef, FieldType, ModelDef, ScalarType, SchemaError, SchemaResult};

use super::factory::ValidatorFactory;
use super::key::ShapeKey;
use super::shape::{ObjectShape, Refinement, Shape};
use crate::value::Value;

impl ValidatorFactory {
    pub(crate) fn build_select(&self, model: &str) -> SchemaResult<Shape> {
        let model_def = self.schema().require_model(model)?;
        let mut obj = ObjectShape::new(ShapeKey::Select { model: model.into() }.to_string());
        for field in model_def.fields.values() {
            if field.is_relation() {
                if let Some(shape) = self.relation_projection(model, field) {
                    obj.insert(field.name.clone(), shape, false);
                }
            } else {
                obj.insert(field.name.clone(), Shape::Boolean, false);
            }
        }
        self.add_relation_count(model, model_def, &mut obj);
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_include(&self, model: &str) -> SchemaResult<Shape> {
        let model_def = self.schema().require_model(model)?;
        let mut obj = ObjectShape::new(ShapeKey::Include { model: model.into() }.to_string());
        for field in model_def.relation_fields() {
            if let Some(shape) = self.relation_projection(model, field) {
                obj.insert(field.name.clone(), shape, false);
            }
        }
        self.add_relation_count(model, model_def, &mut obj);
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_omit(&self, model: &str) -> SchemaResult<Shape> {
        let model_def = self.schema().require_model(model)?;
        let override_allowed = self.options().allow_query_time_omit_override;
        let mut obj = ObjectShape::new(ShapeKey::Omit { model: model.into() }.to_string());
        for field in model_def.scalar_fields() {
            let shape = if field.omit && !override_allowed {
                Shape::Literal(Value::Bool(true))
            } else {
                Shape::Boolean
            };
            obj.insert(field.name.clone(), shape, false);
        }
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_relation_read_args(&self, model: &str, field: &str) -> SchemaResult<Shape> {
        let relation = self.schema().require_field(model, field)?;
        let target = relation_target(model, relation)?;
        let mut obj = ObjectShape::new(
            ShapeKey::RelationReadArgs {
                model: model.into(),
                field: field.into(),
            }
            .to_string(),
        );
        if relation.array {
            self.add_list_read_keys(target, &mut obj)?;
        }
        obj = self.add_projection_keys(target, obj);
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_order_by(&self, model: &str) -> SchemaResult<Shape> {
        let model_def = self.schema().require_model(model)?;
        let mut obj = ObjectShape::new(ShapeKey::OrderBy { model: model.into() }.to_string());
        for field in model_def.fields.values() {
            if field.is_relation() {
                if !self.is_visible_relation(field) {
                    continue;
                }
                let shape = if field.array {
                    Shape::Object(
                        ObjectShape::new(format!("{}OrderByRelationAggregateInput", field.type_name))
                            .required("_count", sort_order()),
                    )
                } else {
                    Shape::lazy(ShapeKey::OrderBy {
                        model: field.type_name.clone(),
                    })
                };
                obj.insert(field.name.clone(), shape, false);
                continue;
            }
            if field.array || !self.is_sortable(model, field)? {
                continue;
            }
            let mut sort = ObjectShape::new("SortOrderInput").required("sort", sort_order());
            if field.optional {
                sort.insert("nulls", Shape::one_of("NullsOrder", ["first", "last"]), false);
            }
            obj.insert(
                field.name.clone(),
                Shape::Union(vec![sort_order(), Shape::Object(sort)]),
                false,
            );
        }
        Ok(Shape::Object(obj))
    }

    pub(crate) fn build_count_select(&self, model: &str) -> SchemaResult<Shape> {
        let model_def = self.schema().require_model(model)?;
        let mut obj = ObjectShape::new(ShapeKey::CountSelect { model: model.into() }.to_string());
        for field in model_def.relation_fields().filter(|f| f.array) {
            if !self.is_visible_relation(field) {
                continue;
            }
            let filtered = ObjectShape::new(format!("{model}Count{}Args", field.name)).optional(
                "where",
                Shape::lazy(ShapeKey::where_input(field.type_name.clone(), false)),
            );
            obj.insert(
                field.name.clone(),
                Shape::Union(vec![Shape::Boolean, Shape::Object(filtered)]),
                false,
            );
        }
        Ok(Shape::Object(obj))
    }

    /// `where`, `orderBy`, `cursor`, `skip`, `take` and `distinct` for list reads.
    pub(crate) fn add_list_read_keys(&self, model: &str, obj: &mut ObjectShape) -> SchemaResult<()> {
        obj.insert("where", Shape::lazy(ShapeKey::where_input(model, false)), false);
        obj.insert("orderBy", order_by(model), false);
        obj.insert("cursor", Shape::lazy(ShapeKey::where_input(model, true)), false);
        obj.insert("skip", non_negative_int(), false);
        obj.insert("take", Shape::scalar(ScalarType::Int), false);
        obj.insert("distinct", self.scalar_field_enum(model)?.or_array(), false);
        Ok(())
    }

    /// `select`, `include` and `omit` with their exclusivity refinements.
    pub(crate) fn add_projection_keys(&self, model: &str, obj: ObjectShape) -> ObjectShape {
        obj.optional("select", Shape::lazy(ShapeKey::Select { model: model.into() }))
            .optional("include", Shape::lazy(ShapeKey::Include { model: model.into() }))
            .optional("omit", Shape::lazy(ShapeKey::Omit { model: model.into() }))
            .refine(Refinement::MutuallyExclusive("select".into(), "include".into()))
            .refine(Refinement::MutuallyExclusive("select".into(), "omit".into()))
    }

    /// Scalar field names as an enumeration.
    pub(crate) fn scalar_field_enum(&self, model: &str) -> SchemaResult<Shape> {
        let model_def = self.schema().require_model(model)?;
        Ok(Shape::one_of(
            format!("{model}ScalarFieldEnum"),
            model_def.scalar_fields().map(|f| f.name.clone()),
        ))
    }

    /// `_count`, `_min`, `_max`, `_sum` and `_avg` selectors. `_sum` and
    /// `_avg` are left out for models without numeric fields.
    pub(crate) fn aggregate_selectors(&self, model: &str) -> SchemaResult<Vec<(&'static str, Shape)>> {
        let model_def = self.schema().require_model(model)?;
        let mut min_max = ObjectShape::new(format!("{model}MinMaxAggregateInput"));
        let mut numeric = ObjectShape::new(format!("{model}NumericAggregateInput"));

        for field in model_def.scalar_fields() {
            if field.array {
                continue;
            }
            if let FieldType::Scalar(ty) = self.schema().resolve_field_type(model, field)? {
                if ty == ScalarType::Json || ty == ScalarType::Bytes {
                    continue;
                }
                if ty.is_numeric() {
                    numeric.insert(field.name.clone(), Shape::Boolean, false);
                }
            }
            min_max.insert(field.name.clone(), Shape::Boolean, false);
        }

        let mut out = vec![
            ("_count", Shape::Union(vec![Shape::Boolean, self.count_aggregate(model)?])),
            ("_min", Shape::Object(min_max.clone())),
            ("_max", Shape::Object(min_max)),
        ];
        if !numeric.is_empty() {
            out.push(("_sum", Shape::Object(numeric.clone())));
            out.push(("_avg", Shape::Object(numeric)));
        }
        Ok(out)
    }

    /// Per-field `_count` selection: `{ _all?, <scalar>? }`.
    pub(crate) fn count_aggregate(&self, model: &str) -> SchemaResult<Shape> {
        let model_def = self.schema().require_model(model)?;
        let mut counted = ObjectShape::new(format!("{model}CountAggregateInput")).optional("_all", Shape::Boolean);
        for field in model_def.scalar_fields() {
            counted.insert(field.name.clone(), Shape::Boolean, false);
        }
        Ok(Shape::Object(counted))
    }

    fn relation_projection(&self, model: &str, field: &FieldDef) -> Option<Shape> {
        self.is_visible_relation(field).then(|| {
            Shape::Union(vec![
                Shape::Boolean,
                Shape::lazy(ShapeKey::RelationReadArgs {
                    model: model.into(),
                    field: field.name.clone(),
                }),
            ])
        })
    }

    fn add_relation_count(&self, model: &str, model_def: &ModelDef, obj: &mut ObjectShape) {
        let has_visible_list = model_def
            .relation_fields()
            .any(|f| f.array && self.is_visible_relation(f));
        if has_visible_list {
            let select = ObjectShape::new(format!("{model}CountOutputTypeArgs"))
                .optional("select", Shape::lazy(ShapeKey::CountSelect { model: model.into() }));
            obj.insert(
                "_count",
                Shape::Union(vec![Shape::Boolean, Shape::Object(select)]),
                false,
            );
        }
    }

    fn is_sortable(&self, model: &str, field: &FieldDef) -> SchemaResult<bool> {
        Ok(match self.schema().resolve_field_type(model, field)? {
            FieldType::Scalar(ty) => ty != ScalarType::Json,
            FieldType::Enum(_) => true,
            FieldType::TypeDef(_) | FieldType::Model(_) => false,
        })
    }
}

fn relation_target<'f>(model: &str, field: &'f FieldDef) -> SchemaResult<&'f str> {
    if field.is_relation() {
        Ok(&field.type_name)
    } else {
        Err(SchemaError::invalid_field(
            model,
            field.name.as_str(),
            "expected a relation field",
        ))
    }
}

pub(crate) fn sort_order() -> Shape {
    Shape::one_of("SortOrder", ["asc", "desc"])
}

pub(crate) fn order_by(model: &str) -> Shape {
    Shape::lazy(ShapeKey::OrderBy { model: model.into() }).or_array()
}

pub(crate) fn non_negative_int() -> Shape {
    use super::scalar::{CheckRule, ScalarCheck};
    Shape::scalar_checked(ScalarType::Int, vec![ScalarCheck::new(CheckRule::Gte(0.0))])
}
