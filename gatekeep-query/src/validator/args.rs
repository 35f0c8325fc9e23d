//! Top-level argument shapes, one per operation.

use gatekeep_schema::{ScalarType, SchemaResult};

use super::factory::ValidatorFactory;
use super::key::ShapeKey;
use super::select::{non_negative_int, order_by};
use super::shape::{ObjectShape, Refinement, Shape};
use crate::operation::Operation;

impl ValidatorFactory {
    pub(crate) fn build_args(&self, model: &str, operation: Operation) -> SchemaResult<Shape> {
        self.schema().require_model(model)?;
        let mut obj = ObjectShape::new(ShapeKey::args(model, operation).to_string());
        let unique = Shape::lazy(ShapeKey::where_input(model, true));
        let filter = Shape::lazy(ShapeKey::where_input(model, false));
        let create = Shape::lazy(ShapeKey::CreateData {
            model: model.into(),
            without: None,
        });
        let update = Shape::lazy(ShapeKey::UpdateData {
            model: model.into(),
            without: None,
        });

        match operation {
            Operation::FindMany | Operation::FindFirst | Operation::FindFirstOrThrow => {
                self.add_list_read_keys(model, &mut obj)?;
                obj = self.add_projection_keys(model, obj);
            }
            Operation::FindUnique | Operation::FindUniqueOrThrow => {
                obj.insert("where", unique, true);
                obj = self.add_projection_keys(model, obj);
            }
            Operation::Exists => {
                obj.insert("where", filter, false);
            }
            Operation::Create => {
                obj.insert("data", create, true);
                obj = self.add_projection_keys(model, obj);
            }
            Operation::CreateMany | Operation::CreateManyAndReturn => {
                let record = Shape::lazy(ShapeKey::CreateManyData {
                    model: model.into(),
                    without: None,
                });
                obj.insert("data", record.or_array(), true);
                obj.insert("skipDuplicates", Shape::Boolean, false);
                if operation == Operation::CreateManyAndReturn {
                    obj = returning_keys(model, obj);
                }
            }
            Operation::Update => {
                obj.insert("where", unique, true);
                obj.insert("data", update, true);
                obj = self.add_projection_keys(model, obj);
            }
            Operation::UpdateMany | Operation::UpdateManyAndReturn => {
                let data = Shape::lazy(ShapeKey::UpdateManyData {
                    model: model.into(),
                    without: None,
                });
                obj.insert("where", filter, false);
                obj.insert("data", data, true);
                obj.insert("limit", non_negative_int(), false);
                if operation == Operation::UpdateManyAndReturn {
                    obj = returning_keys(model, obj);
                }
            }
            Operation::Upsert => {
                obj.insert("where", unique, true);
                obj.insert("create", create, true);
                obj.insert("update", update, true);
                obj = self.add_projection_keys(model, obj);
            }
            Operation::Delete => {
                obj.insert("where", unique, true);
                obj = self.add_projection_keys(model, obj);
            }
            Operation::DeleteMany => {
                obj.insert("where", filter, false);
                obj.insert("limit", non_negative_int(), false);
            }
            Operation::Count => {
                self.add_windowing_keys(model, &mut obj, filter);
                obj.insert(
                    "select",
                    Shape::Union(vec![Shape::Literal(true.into()), self.count_aggregate(model)?]),
                    false,
                );
            }
            Operation::Aggregate => {
                self.add_windowing_keys(model, &mut obj, filter);
                for (key, shape) in self.aggregate_selectors(model)? {
                    obj.insert(key, shape, false);
                }
            }
            Operation::GroupBy => {
                let fields = self.scalar_field_enum(model)?;
                obj.insert(
                    "by",
                    Shape::Union(vec![fields.clone(), Shape::non_empty_array(fields)]),
                    true,
                );
                obj.insert("where", filter, false);
                obj.insert("having", Shape::lazy(ShapeKey::Having { model: model.into() }), false);
                obj.insert("orderBy", order_by(model), false);
                obj.insert("skip", non_negative_int(), false);
                obj.insert("take", Shape::scalar(ScalarType::Int), false);
                for (key, shape) in self.aggregate_selectors(model)? {
                    obj.insert(key, shape, false);
                }
                obj = obj.refine(Refinement::GroupBy);
            }
        }

        for (key, shape) in self.plugins().merged_args(operation) {
            if !obj.fields.contains_key(&key) {
                obj.insert(key, shape, false);
            }
        }
        Ok(Shape::Object(obj))
    }

    /// `where`, `orderBy`, `cursor`, `skip` and `take` of `count` and `aggregate`.
    fn add_windowing_keys(&self, model: &str, obj: &mut ObjectShape, filter: Shape) {
        obj.insert("where", filter, false);
        obj.insert("orderBy", order_by(model), false);
        obj.insert("cursor", Shape::lazy(ShapeKey::where_input(model, true)), false);
        obj.insert("skip", non_negative_int(), false);
        obj.insert("take", Shape::scalar(ScalarType::Int), false);
    }
}

/// `select` and `omit` of the `...AndReturn` bulk operations.
fn returning_keys(model: &str, obj: ObjectShape) -> ObjectShape {
    obj.optional("select", Shape::lazy(ShapeKey::Select { model: model.into() }))
        .optional("omit", Shape::lazy(ShapeKey::Omit { model: model.into() }))
        .refine(Refinement::MutuallyExclusive("select".into(), "omit".into()))
}
