//! Error types for rowshape.

use thiserror::Error;

use crate::schema::FieldType;

#[derive(Debug, Error)]
pub enum ShapeError {
    /// Ordering text was empty or all whitespace.
    #[error("Ordering text is missing. Expected: 'Member[.Member] [asc|desc]' segments")]
    MissingOrderingText,

    /// A comma-separated ordering segment had more than two whitespace tokens.
    #[error("Malformed ordering segment: '{0}'. Expected a member chain with an optional asc/desc")]
    MalformedSegment(String),

    /// Direction token was neither "asc" nor "desc".
    #[error("Invalid sort direction: '{0}'. Expected: asc or desc")]
    InvalidDirection(String),

    /// A member chain contained no identifiers after splitting on '.'.
    #[error("Member chain is empty")]
    EmptyMemberChain,

    /// A chain segment matched nothing on the type being walked.
    #[error("Unknown member '{}' on type '{}'{}", .segment, .owner, suggestion_suffix(.suggestion))]
    UnknownMember {
        owner: String,
        segment: String,
        suggestion: Option<String>,
    },

    /// A recorded type-cast could not be performed for an actual value.
    #[error("Cannot coerce field '{}' from {} to {}", .field, .from, .to)]
    CoercionFailure {
        field: String,
        from: FieldType,
        to: FieldType,
    },
}

impl ShapeError {
    /// Create an unknown-member error for a segment on the given owner type.
    pub fn unknown_member(
        owner: impl Into<String>,
        segment: impl Into<String>,
        suggestion: Option<String>,
    ) -> Self {
        Self::UnknownMember {
            owner: owner.into(),
            segment: segment.into(),
            suggestion,
        }
    }
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(". Did you mean '{}'?", name),
        None => String::new(),
    }
}

/// Result type alias for rowshape operations.
pub type ShapeResult<T> = Result<T, ShapeError>;
