//! Benchmarks for validator construction and cached lookups.

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;

use gatekeep::query::{ClientOptions, InputValidator, Operation, ShapeKey, ValidatorFactory, Value};
use gatekeep::schema::{DatabaseProvider, FieldDef, ModelDef, RelationInfo, Schema, SchemaAccessor};
use serde_json::json;

/// A schema with a chain of related models, `M0 -> M1 -> ... -> Mn`.
fn chain_schema(models: usize) -> SchemaAccessor {
    let mut schema = Schema::new(DatabaseProvider::PostgreSql);
    for i in 0..models {
        let mut model = ModelDef::new(format!("M{i}"))
            .field(FieldDef::new("id", "Int").id())
            .field(FieldDef::new("name", "String"))
            .field(FieldDef::new("score", "Float").optional());
        if i + 1 < models {
            model = model.field(
                FieldDef::new("children", format!("M{}", i + 1))
                    .array()
                    .relation(RelationInfo::new("parent")),
            );
        }
        if i > 0 {
            model = model
                .field(FieldDef::new("parentId", "Int").foreign_key_for(["parent"]))
                .field(
                    FieldDef::new("parent", format!("M{}", i - 1))
                        .relation(RelationInfo::new("children").owning(["parentId"], ["id"])),
                );
        }
        schema = schema.with_model(model);
    }
    SchemaAccessor::new(schema)
}

fn find_many_args() -> Value {
    Value::from(json!({
        "where": {
            "name": { "startsWith": "a" },
            "children": { "some": { "score": { "gt": 1.5 } } }
        },
        "orderBy": [{ "name": "asc" }],
        "include": { "children": { "take": 5 } },
        "take": 20
    }))
}

/// Cold: a fresh factory builds every shape the argument reaches.
fn bench_cold_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cold_validation");

    for models in [2, 8, 32] {
        let schema = chain_schema(models);
        group.bench_with_input(BenchmarkId::new("find_many", models), &schema, |b, schema| {
            b.iter_batched(
                || ValidatorFactory::new(schema.clone(), ClientOptions::default()),
                |factory| {
                    black_box(factory.check(&ShapeKey::args("M0", Operation::FindMany), &find_many_args()))
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

/// Cached: the same factory validates repeatedly.
fn bench_cached_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_validation");
    let validator = InputValidator::new(Arc::new(ValidatorFactory::new(
        chain_schema(8),
        ClientOptions::default(),
    )));
    let args = find_many_args();

    group.bench_function("find_many", |b| {
        b.iter(|| black_box(validator.validate("M0", Operation::FindMany, args.clone())))
    });

    let create = Value::from(json!({
        "data": { "id": 1, "name": "root", "children": { "create": [{ "id": 2, "name": "leaf" }] } }
    }));
    group.bench_function("create_nested", |b| {
        b.iter(|| black_box(validator.validate("M0", Operation::Create, create.clone())))
    });

    group.finish();
}

/// Warm-up across the whole schema.
fn bench_warm_up(c: &mut Criterion) {
    let schema = chain_schema(16);
    c.bench_function("warm_up_16_models", |b| {
        b.iter_batched(
            || ValidatorFactory::new(schema.clone(), ClientOptions::default()),
            |factory| black_box(factory.warm_up()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_cold_validation, bench_cached_validation, bench_warm_up);
criterion_main!(benches);
