//! Argument validation.
//!
//! Every operation argument is checked against a [`Shape`] tree derived from
//! the schema and the client options. Shapes are built lazily by the
//! [`ValidatorFactory`] and cached by [`ShapeKey`], so recursive structures
//! (a `where` nesting relation filters, nested creates) are built once and
//! shared.
//!
//! ```rust,ignore
//! let factory = ValidatorFactory::new(schema, ClientOptions::default());
//! let issues = factory.check(&ShapeKey::args("User", Operation::FindMany), &args)?;
//! for issue in &issues {
//!     println!("{issue}");
//! }
//! ```

mod args;
mod custom;
mod factory;
mod filter;
mod issue;
mod key;
mod mutation;
pub mod scalar;
mod select;
mod shape;

pub use custom::parse_rule;
pub use factory::{CacheStats, ValidatorFactory};
pub use issue::{Issue, IssueKind, Path, PathSegment, format_path};
pub use key::{FilterTarget, ShapeKey};
pub use scalar::{CheckRule, ScalarCheck};
pub use shape::{
    CheckContext, CustomRule, FieldSlot, ObjectShape, Refinement, ScalarShape, Sentinel, Shape,
    ShapeResolver,
};
