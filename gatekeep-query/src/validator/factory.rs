//! The validator factory and its memo table.
//!
//! A factory is bound to one schema and one [`ClientOptions`]. Shapes are
//! built on first request and cached by [`ShapeKey`]; a differently
//! configured client gets its own factory, so keys never need to carry the
//! configuration.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

use gatekeep_schema::{FieldDef, FieldType, ScalarType, SchemaAccessor, SchemaError, SchemaResult};

use super::issue::{Issue, Path};
use super::key::ShapeKey;
use super::scalar::checks_for_field;
use super::shape::{CheckContext, Shape, ShapeResolver};
use crate::config::ClientOptions;
use crate::plugin::PluginRegistry;
use crate::slicing::SlicingPolicy;
use crate::value::Value;

/// Statistics for the shape cache.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that built a shape.
    pub misses: u64,
    /// Shapes currently cached.
    pub cached_count: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Builds and caches argument shapes for one configuration.
pub struct ValidatorFactory {
    schema: SchemaAccessor,
    options: Arc<ClientOptions>,
    plugins: PluginRegistry,
    fingerprint: u64,
    cache: RwLock<HashMap<ShapeKey, Arc<Shape>>>,
    stats: RwLock<CacheStats>,
}

impl ValidatorFactory {
    /// Create a factory without plugins.
    pub fn new(schema: SchemaAccessor, options: impl Into<Arc<ClientOptions>>) -> Self {
        Self::with_plugins(schema, options, PluginRegistry::new())
    }

    /// Create a factory with plugin contributions.
    pub fn with_plugins(
        schema: SchemaAccessor,
        options: impl Into<Arc<ClientOptions>>,
        plugins: PluginRegistry,
    ) -> Self {
        let options = options.into();
        let fingerprint = options.fingerprint();
        info!(
            provider = schema.provider().as_str(),
            fingerprint,
            plugins = plugins.len(),
            "validator factory created"
        );
        Self {
            schema,
            options,
            plugins,
            fingerprint,
            cache: RwLock::new(HashMap::new()),
            stats: RwLock::default(),
        }
    }

    /// The schema.
    pub fn schema(&self) -> &SchemaAccessor {
        &self.schema
    }

    /// The options this factory was built for.
    pub fn options(&self) -> &Arc<ClientOptions> {
        &self.options
    }

    /// Registered plugins.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// Fingerprint of the options.
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }

    /// Slicing decisions for this configuration.
    pub fn policy(&self) -> SlicingPolicy<'_> {
        SlicingPolicy::new(&self.options.slicing)
    }

    /// Cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = *self.stats.read();
        stats.cached_count = self.cache.read().len();
        stats
    }

    /// Drop every cached shape and reset statistics.
    pub fn clear(&self) {
        self.cache.write().clear();
        *self.stats.write() = CacheStats::default();
    }

    /// Check a value against the shape for `key`.
    pub fn check(&self, key: &ShapeKey, value: &Value) -> SchemaResult<Vec<Issue>> {
        let shape = self.resolve(key)?;
        self.check_shape(&shape, value, Path::new())
    }

    /// Check a value against an uncached shape, reporting paths below `prefix`.
    pub fn check_shape(&self, shape: &Shape, value: &Value, prefix: Path) -> SchemaResult<Vec<Issue>> {
        let mut cx = CheckContext::with_prefix(self, prefix);
        shape.check(value, &mut cx)?;
        Ok(cx.into_issues())
    }

    /// Build every shape reachable from the accessible operations, and the
    /// parameter shapes of every callable procedure.
    ///
    /// Configuration errors (unknown types, malformed rules, models without
    /// unique fields) surface here instead of on the first request. Returns
    /// the number of shapes visited.
    pub fn warm_up(&self) -> SchemaResult<usize> {
        let policy = self.policy();
        let mut queue: VecDeque<ShapeKey> = self
            .schema
            .schema()
            .models
            .keys()
            .flat_map(|model| {
                policy
                    .allowed_operations(model)
                    .into_iter()
                    .map(move |op| ShapeKey::args(model.clone(), op))
            })
            .collect();

        let mut seen = HashSet::new();
        while let Some(key) = queue.pop_front() {
            if seen.contains(&key) {
                continue;
            }
            let shape = self.resolve(&key)?;
            queue.extend(shape.lazy_keys().into_iter().cloned());
            seen.insert(key);
        }

        for procedure in self.schema.schema().procedures.values() {
            if policy.is_procedure_allowed(&procedure.name) {
                for param in &procedure.params {
                    self.param_shape(&procedure.name, &param.type_name, param.array)?;
                }
            }
        }

        info!(shapes = seen.len(), "validator factory warmed up");
        Ok(seen.len())
    }

    fn build(&self, key: &ShapeKey) -> SchemaResult<Shape> {
        debug!(key = %key, "building shape");
        match key {
            ShapeKey::Args { model, operation } => self.build_args(model, *operation),
            ShapeKey::Where { model, unique } => self.build_where(model, *unique),
            ShapeKey::ScalarFilter {
                target,
                nullable,
                kinds,
            } => self.build_scalar_filter(target, *nullable, *kinds),
            ShapeKey::ListFilter { target, kinds } => self.build_list_filter(target, *kinds),
            ShapeKey::JsonFilter { nullable, kinds } => Ok(self.build_json_filter(*nullable, *kinds)),
            ShapeKey::TypeDefWhere { type_def } => self.build_type_def_where(type_def),
            ShapeKey::Having { model } => self.build_having(model),
            ShapeKey::Select { model } => self.build_select(model),
            ShapeKey::Include { model } => self.build_include(model),
            ShapeKey::Omit { model } => self.build_omit(model),
            ShapeKey::OrderBy { model } => self.build_order_by(model),
            ShapeKey::CountSelect { model } => self.build_count_select(model),
            ShapeKey::RelationReadArgs { model, field } => self.build_relation_read_args(model, field),
            ShapeKey::CreateData { model, without } => self.build_create_data(model, without.as_deref()),
            ShapeKey::CreateManyData { model, without } => {
                self.build_create_many_data(model, without.as_deref())
            }
            ShapeKey::UpdateData { model, without } => self.build_update_data(model, without.as_deref()),
            ShapeKey::UpdateManyData { model, without } => {
                self.build_update_many_data(model, without.as_deref())
            }
            ShapeKey::RelationCreate { model, field } => self.build_relation_create(model, field),
            ShapeKey::RelationUpdate { model, field } => self.build_relation_update(model, field),
            ShapeKey::TypeDefData { type_def } => self.build_type_def_data(type_def),
        }
    }

    // ==================== Shared Helpers ====================

    /// Element shape of a non-relation field: its scalar, enum or embedded
    /// type, with attribute checks when `checked` and input validation is on.
    pub(crate) fn value_shape(&self, owner: &str, field: &FieldDef, checked: bool) -> SchemaResult<Shape> {
        let element = match self.schema.resolve_field_type(owner, field)? {
            FieldType::Scalar(ScalarType::Json) => Shape::Json,
            FieldType::Scalar(ty) => {
                if checked && self.options.validate_input {
                    Shape::scalar_checked(ty, checks_for_field(field)?)
                } else {
                    Shape::scalar(ty)
                }
            }
            FieldType::Enum(name) => self.enum_shape(&name)?,
            FieldType::TypeDef(name) => Shape::lazy(ShapeKey::TypeDefData { type_def: name }),
            FieldType::Model(_) => {
                return Err(SchemaError::invalid_field(
                    owner,
                    field.name.as_str(),
                    "relation fields have no value shape",
                ));
            }
        };
        Ok(if field.array { Shape::array(element) } else { element })
    }

    /// Shape of a procedure parameter or return-like type name.
    pub(crate) fn param_shape(&self, context: &str, type_name: &str, array: bool) -> SchemaResult<Shape> {
        let element = match self.schema.resolve_type_name(context, type_name)? {
            FieldType::Scalar(ScalarType::Json) => Shape::Json,
            FieldType::Scalar(ty) => Shape::scalar(ty),
            FieldType::Enum(name) => self.enum_shape(&name)?,
            FieldType::TypeDef(name) => Shape::lazy(ShapeKey::TypeDefData { type_def: name }),
            FieldType::Model(name) => Shape::lazy(ShapeKey::CreateData {
                model: name,
                without: None,
            }),
        };
        Ok(if array { Shape::array(element) } else { element })
    }

    pub(crate) fn enum_shape(&self, name: &str) -> SchemaResult<Shape> {
        let def = self.schema.require_enum(name)?;
        Ok(Shape::one_of(def.name.clone(), def.values.iter().cloned()))
    }

    /// Whether a relation field points at a model this configuration exposes.
    pub(crate) fn is_visible_relation(&self, field: &FieldDef) -> bool {
        field.is_relation() && self.policy().is_model_accessible(&field.type_name)
    }
}

impl ShapeResolver for ValidatorFactory {
    fn resolve(&self, key: &ShapeKey) -> SchemaResult<Arc<Shape>> {
        if let Some(shape) = self.cache.read().get(key).cloned() {
            self.stats.write().hits += 1;
            crate::gatekeep_trace!(key = %key, "shape cache hit");
            return Ok(shape);
        }

        self.stats.write().misses += 1;
        let built = Arc::new(self.build(key)?);
        let mut cache = self.cache.write();
        Ok(cache.entry(key.clone()).or_insert(built).clone())
    }
}

impl std::fmt::Debug for ValidatorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatorFactory")
            .field("fingerprint", &self.fingerprint)
            .field("plugins", &self.plugins)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelSlicing, SlicingOptions};
    use crate::operation::Operation;
    use gatekeep_schema::{
        Attribute, DatabaseProvider, EnumDef, Expression, ModelDef, ProcedureDef, ProcedureParam,
        RelationInfo, Schema,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn blog() -> SchemaAccessor {
        SchemaAccessor::new(
            Schema::new(DatabaseProvider::PostgreSql)
                .with_enum(EnumDef::new("Role", ["USER", "ADMIN"]))
                .with_model(
                    ModelDef::new("User")
                        .field(FieldDef::new("id", "String").id())
                        .field(FieldDef::new("email", "String").unique())
                        .field(FieldDef::new("role", "Role").with_default())
                        .field(
                            FieldDef::new("name", "String")
                                .attribute(Attribute::new("@length").with_arg(Expression::literal(2))),
                        )
                        .field(
                            FieldDef::new("posts", "Post")
                                .array()
                                .relation(RelationInfo::new("author")),
                        ),
                )
                .with_model(
                    ModelDef::new("Post")
                        .field(FieldDef::new("id", "Int").id())
                        .field(FieldDef::new("title", "String"))
                        .field(FieldDef::new("authorId", "String").foreign_key_for(["author"]))
                        .field(
                            FieldDef::new("author", "User")
                                .relation(RelationInfo::new("posts").owning(["authorId"], ["id"])),
                        ),
                )
                .with_procedure(
                    ProcedureDef::new("search", "Post").param(ProcedureParam::new("role", "Role")),
                ),
        )
    }

    // ==================== Cache Tests ====================

    #[test]
    fn test_cache_hits_after_first_build() {
        let factory = ValidatorFactory::new(blog(), ClientOptions::default());
        let key = ShapeKey::args("User", Operation::FindMany);

        let first = factory.resolve(&key).unwrap();
        let second = factory.resolve(&key).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = factory.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.cached_count, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_clear_resets_cache() {
        let factory = ValidatorFactory::new(blog(), ClientOptions::default());
        factory.resolve(&ShapeKey::args("User", Operation::Create)).unwrap();
        factory.clear();
        assert_eq!(factory.stats(), CacheStats::default());
    }

    #[test]
    fn test_factories_do_not_share_caches() {
        let schema = blog();
        let a = ValidatorFactory::new(schema.clone(), ClientOptions::default());
        let b = ValidatorFactory::new(
            schema,
            ClientOptions::default()
                .with_slicing(SlicingOptions::default().model("User", ModelSlicing::default())),
        );
        a.resolve(&ShapeKey::args("User", Operation::FindMany)).unwrap();
        assert_eq!(b.stats().cached_count, 0);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_unknown_model_is_configuration_error() {
        let factory = ValidatorFactory::new(blog(), ClientOptions::default());
        let err = factory
            .resolve(&ShapeKey::args("Ghost", Operation::FindMany))
            .unwrap_err();
        assert!(matches!(err, SchemaError::NotFound { .. }));
    }

    // ==================== Warm Up Tests ====================

    #[test]
    fn test_warm_up_builds_reachable_shapes() {
        let factory = ValidatorFactory::new(blog(), ClientOptions::default());
        let visited = factory.warm_up().unwrap();
        assert!(visited > 2 * Operation::ALL.len());
        assert_eq!(factory.stats().cached_count, visited);
    }

    #[test]
    fn test_warm_up_reports_unknown_types() {
        let schema = SchemaAccessor::new(
            Schema::new(DatabaseProvider::Sqlite).with_model(
                ModelDef::new("Thing")
                    .field(FieldDef::new("id", "Int").id())
                    .field(FieldDef::new("kind", "Mystery")),
            ),
        );
        let factory = ValidatorFactory::new(schema, ClientOptions::default());
        assert!(matches!(factory.warm_up(), Err(SchemaError::UnknownType { .. })));
    }

    // ==================== Value Shape Tests ====================

    #[test]
    fn test_value_shape_applies_attribute_checks() {
        let schema = blog();
        let name = schema.require_field("User", "name").unwrap().clone();

        let factory = ValidatorFactory::new(schema.clone(), ClientOptions::default());
        let shape = factory.value_shape("User", &name, true).unwrap();
        assert_eq!(factory.check_shape(&shape, &Value::from("a"), Path::new()).unwrap().len(), 1);

        let lenient = ValidatorFactory::new(schema, ClientOptions::default().with_validate_input(false));
        let shape = lenient.value_shape("User", &name, true).unwrap();
        assert!(lenient.check_shape(&shape, &Value::from("a"), Path::new()).unwrap().is_empty());
    }

    #[test]
    fn test_enum_value_shape() {
        let factory = ValidatorFactory::new(blog(), ClientOptions::default());
        let shape = factory.param_shape("search", "Role", true).unwrap();
        assert!(factory
            .check_shape(&shape, &Value::from(json!(["USER", "ADMIN"])), Path::new())
            .unwrap()
            .is_empty());
        assert_eq!(
            factory
                .check_shape(&shape, &Value::from(json!(["ROOT"])), Path::new())
                .unwrap()
                .len(),
            1
        );
    }
}
