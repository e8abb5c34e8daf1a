//! Compile untyped shaping requests into typed query pipeline operations.
//!
//! Callers describe row ordering with human-readable strings like
//! `"Address.City asc, Age desc"` and result shapes with plain record types;
//! rowshape resolves the member chains against a schema, builds typed
//! accessors, and hands the pipeline ready-to-apply sort keys and projection
//! plans. A small set of conditional predicate gates rounds out the surface.
//!
//! ```ignore
//! use rowshape::prelude::*;
//!
//! let page = users
//!     .where_if_not_empty(city.as_deref(), |u: &User| u.active)
//!     .order_by_text("Address.City asc, Age desc")?
//!     .select_into::<UserSummary>();
//! ```

pub mod ast;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod projection;
pub mod resolver;
pub mod schema;

pub use parser::parse_ordering;

pub mod prelude {
    pub use crate::ast::{MemberChain, OrderingSpec, SortOrder, Value};
    pub use crate::error::{ShapeError, ShapeResult};
    pub use crate::parser::parse_ordering;
    pub use crate::pipeline::{Pipeline, PipelineExt, RowPredicate};
    pub use crate::projection::{Coercion, FieldCopy, ProjectionPlan};
    pub use crate::resolver::{ResolvedAccessor, resolve};
    pub use crate::schema::{FieldDef, FieldType, Record, Schema};
}
