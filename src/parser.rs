//! Ordering text parser.
//!
//! Grammar: comma-separated segments; each segment is a dotted member chain
//! optionally followed by one whitespace-separated direction token
//! (`asc`/`desc`, case-insensitive). Empty segments are tolerated, so
//! leading, trailing, and doubled commas are not errors.

use nom::{IResult, bytes::complete::take_while1, character::complete::multispace0, multi::many0,
    sequence::preceded};

use crate::ast::{MemberChain, OrderingSpec, SortOrder};
use crate::error::{ShapeError, ShapeResult};

/// Parse ordering text into an ordered list of specs.
///
/// Chains are NOT resolved here; resolution against a schema happens in
/// [`crate::resolver::resolve`] once a root type is known.
pub fn parse_ordering(text: &str) -> ShapeResult<Vec<OrderingSpec>> {
    if text.trim().is_empty() {
        return Err(ShapeError::MissingOrderingText);
    }

    let mut specs = Vec::new();
    for segment in text.split(',') {
        if segment.trim().is_empty() {
            continue;
        }
        specs.push(parse_segment(segment)?);
    }
    Ok(specs)
}

/// Parse one comma-free segment: `chain [direction]`.
fn parse_segment(segment: &str) -> ShapeResult<OrderingSpec> {
    let tokens = tokens(segment);
    let (chain_text, direction) = match tokens.as_slice() {
        [chain] => (*chain, SortOrder::Asc),
        [chain, direction] => match SortOrder::parse(direction) {
            Some(dir) => (*chain, dir),
            None => return Err(ShapeError::InvalidDirection((*direction).to_string())),
        },
        _ => return Err(ShapeError::MalformedSegment(segment.trim().to_string())),
    };

    Ok(OrderingSpec {
        chain: MemberChain::parse(chain_text),
        direction,
    })
}

/// Split a segment into whitespace-separated tokens.
fn tokens(input: &str) -> Vec<&str> {
    match many0(token)(input) {
        Ok((_, tokens)) => tokens,
        Err(_) => Vec::new(),
    }
}

fn token(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, take_while1(|c: char| !c.is_whitespace()))(input)
}
