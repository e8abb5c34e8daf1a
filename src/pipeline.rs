//! The query pipeline contract and the caller-facing shaping surface.
//!
//! Rowshape never executes a query. [`Pipeline`] is the contract the external
//! execution layer implements; [`PipelineExt`] is the surface callers use,
//! compiled down to the pipeline's primitives.

use crate::ast::SortOrder;
use crate::error::ShapeResult;
use crate::parser::parse_ordering;
use crate::projection::ProjectionPlan;
use crate::resolver::{ResolvedAccessor, resolve};
use crate::schema::Record;

/// A boxed single-row predicate.
pub type RowPredicate<R> = Box<dyn Fn(&R) -> bool>;

/// The external query pipeline this crate compiles descriptors for.
///
/// The pipeline owns execution: filtering, multi-key stable sorting, and
/// per-row projection all happen on its side. This crate only hands it typed
/// descriptors.
pub trait Pipeline: Sized {
    /// Row type flowing through the pipeline.
    type Row: Record + 'static;

    /// Pipeline type produced by projecting into rows of `T`.
    type Mapped<T: Record + Default + 'static>: Pipeline<Row = T>;

    /// Keep only rows matching the predicate.
    fn apply_filter(self, predicate: RowPredicate<Self::Row>) -> Self;

    /// Replace any existing ordering with this key.
    fn apply_primary_sort(self, key: ResolvedAccessor, direction: SortOrder) -> Self;

    /// Append a tie-breaking key to the existing ordering.
    fn apply_secondary_sort(self, key: ResolvedAccessor, direction: SortOrder) -> Self;

    /// Map every row through the plan into a target-shaped pipeline.
    fn apply_projection<T: Record + Default + 'static>(self, plan: ProjectionPlan)
    -> Self::Mapped<T>;
}

/// Caller-facing shaping operations, available on every [`Pipeline`].
pub trait PipelineExt: Pipeline {
    /// Apply `predicate` only when `condition` holds; otherwise the pipeline
    /// is returned unchanged and the predicate is never evaluated.
    fn where_if<F>(self, condition: bool, predicate: F) -> Self
    where
        F: Fn(&Self::Row) -> bool + 'static,
    {
        if condition {
            self.apply_filter(Box::new(predicate))
        } else {
            self
        }
    }

    /// Apply `predicate` only when `value` is present.
    fn where_if_not_null<V: ?Sized, F>(self, value: Option<&V>, predicate: F) -> Self
    where
        F: Fn(&Self::Row) -> bool + 'static,
    {
        self.where_if(value.is_some(), predicate)
    }

    /// Apply `predicate` only when `value` is present and non-empty.
    fn where_if_not_empty<F>(self, value: Option<&str>, predicate: F) -> Self
    where
        F: Fn(&Self::Row) -> bool + 'static,
    {
        self.where_if(value.is_some_and(|v| !v.is_empty()), predicate)
    }

    /// Bind the free second parameter of a two-argument predicate.
    ///
    /// When `value` is present the predicate collapses to a single-argument
    /// predicate closing over the value, and is applied. When absent, the
    /// pipeline is returned unchanged and the predicate is never touched.
    fn where_if_bound<V, F>(self, value: Option<V>, predicate: F) -> Self
    where
        V: 'static,
        F: Fn(&Self::Row, &V) -> bool + 'static,
    {
        match value {
            Some(bound) => self.apply_filter(Box::new(move |row| predicate(row, &bound))),
            None => self,
        }
    }

    /// [`Self::where_if_bound`] for text, treating an empty string as absent.
    fn where_if_bound_text<F>(self, value: Option<&str>, predicate: F) -> Self
    where
        F: Fn(&Self::Row, &str) -> bool + 'static,
    {
        match value {
            Some(text) if !text.is_empty() => {
                let bound = text.to_string();
                self.apply_filter(Box::new(move |row| predicate(row, &bound)))
            }
            _ => self,
        }
    }

    /// Parse ordering text and attach its keys to the pipeline.
    ///
    /// The first segment becomes the primary sort key; every later segment is
    /// a tie-breaker, in input order. Every chain is resolved against the row
    /// schema before any key is applied.
    fn order_by_text(self, text: &str) -> ShapeResult<Self> {
        let keys = resolve_keys::<Self::Row>(text)?;
        let mut pipeline = self;
        for (position, (key, direction)) in keys.into_iter().enumerate() {
            pipeline = if position == 0 {
                pipeline.apply_primary_sort(key, direction)
            } else {
                pipeline.apply_secondary_sort(key, direction)
            };
        }
        Ok(pipeline)
    }

    /// Parse ordering text and append every key as a tie-breaker to an
    /// already-ordered pipeline.
    fn then_by_text(self, text: &str) -> ShapeResult<Self> {
        let keys = resolve_keys::<Self::Row>(text)?;
        let mut pipeline = self;
        for (key, direction) in keys {
            pipeline = pipeline.apply_secondary_sort(key, direction);
        }
        Ok(pipeline)
    }

    /// Project into rows of `T` by exact field-name matching.
    fn select_into<T: Record + Default + 'static>(self) -> Self::Mapped<T> {
        self.apply_projection::<T>(ProjectionPlan::for_types::<Self::Row, T>())
    }
}

impl<P: Pipeline> PipelineExt for P {}

/// Parse and resolve ordering text for a row type.
fn resolve_keys<R: Record>(text: &str) -> ShapeResult<Vec<(ResolvedAccessor, SortOrder)>> {
    let specs = parse_ordering(text)?;
    let mut keys = Vec::with_capacity(specs.len());
    for spec in &specs {
        keys.push((resolve(R::schema(), &spec.chain)?, spec.direction));
    }
    Ok(keys)
}
