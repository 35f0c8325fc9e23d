//! Definition types for compiled schemas.
//!
//! These types mirror the document emitted by the schema compiler: models,
//! fields, enums, embedded type defs, procedures, attributes and the rule
//! expressions attached to them.

mod attribute;
mod expression;
mod field;
mod model;
mod schema;
mod types;

pub use attribute::*;
pub use expression::*;
pub use field::*;
pub use model::*;
pub use schema::*;
pub use types::*;
