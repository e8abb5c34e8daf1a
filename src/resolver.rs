//! Member-chain resolution against schemas.

use strsim::levenshtein;
use tracing::trace;

use crate::ast::{MemberChain, Value};
use crate::error::{ShapeError, ShapeResult};
use crate::schema::{FieldType, Record, Schema};

/// A member chain resolved against a root schema.
///
/// Holds the chain with canonicalized segment casing plus the final value
/// type, and reads the chained value off any instance of the root type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAccessor {
    chain: MemberChain,
    value_type: FieldType,
}

impl ResolvedAccessor {
    /// The canonicalized chain this accessor walks.
    pub fn chain(&self) -> &MemberChain {
        &self.chain
    }

    /// Declared type of the value at the end of the chain.
    pub fn value_type(&self) -> FieldType {
        self.value_type
    }

    /// Read the chained value from a root instance.
    ///
    /// A Null anywhere along the chain propagates as Null rather than
    /// faulting, so accessors stay usable as sort keys (nulls sort per the
    /// pipeline convention).
    pub fn read<R: Record>(&self, row: &R) -> Value {
        let mut segments = self.chain.segments().iter();
        let mut value = match segments.next() {
            Some(first) => row.get(first),
            None => return Value::Null,
        };
        for segment in segments {
            value = match value {
                Value::Struct(fields) => fields
                    .into_iter()
                    .find(|(name, _)| name == segment)
                    .map(|(_, value)| value)
                    .unwrap_or(Value::Null),
                _ => return Value::Null,
            };
        }
        value
    }
}

/// Resolve a member chain against a root schema.
///
/// Each step tries an exact-case match first, then a case-insensitive match
/// (first in declaration order wins). A miss fails with `UnknownMember`
/// naming the type at the failing position.
pub fn resolve(root: &'static Schema, chain: &MemberChain) -> ShapeResult<ResolvedAccessor> {
    if chain.is_empty() {
        return Err(ShapeError::EmptyMemberChain);
    }
    trace!(root = root.name, chain = %chain, "resolving member chain");

    let mut canonical = Vec::with_capacity(chain.len());
    let mut current = Some(root);
    let mut last_type: Option<FieldType> = None;

    for segment in chain.segments() {
        let schema = match current {
            Some(schema) => schema,
            None => {
                // Walked past a scalar field: nothing further to look up.
                let owner = match last_type {
                    Some(typ) => typ.to_string(),
                    None => root.name.to_string(),
                };
                return Err(ShapeError::unknown_member(owner, segment, None));
            }
        };

        let field = match schema.lookup(segment).or_else(|| schema.lookup_ci(segment)) {
            Some(field) => field,
            None => {
                return Err(ShapeError::unknown_member(
                    schema.name,
                    segment,
                    did_you_mean(segment, schema),
                ));
            }
        };

        canonical.push(field.name.to_string());
        last_type = Some(field.typ);
        current = match field.typ {
            FieldType::Struct(nested) => Some(nested),
            _ => None,
        };
    }

    let value_type = match last_type {
        Some(typ) => typ,
        None => return Err(ShapeError::EmptyMemberChain),
    };

    Ok(ResolvedAccessor {
        chain: MemberChain(canonical),
        value_type,
    })
}

/// Find the closest field name within a length-scaled Levenshtein threshold.
fn did_you_mean(input: &str, schema: &Schema) -> Option<String> {
    let mut best_match = None;
    let mut min_dist = usize::MAX;

    for field in &schema.fields {
        let dist = levenshtein(input, field.name);

        let threshold = match input.len() {
            0..=2 => 0,
            3..=5 => 2,
            _ => 3,
        };

        if dist <= threshold && dist < min_dist {
            min_dist = dist;
            best_match = Some(field.name.to_string());
        }
    }

    best_match
}
