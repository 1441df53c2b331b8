//! Parser for XAPI predicates.
//!
//! Grammar:
//!
//! predicate = group+
//! group     = "[" left "=" right "]"
//! left      = "@uid" | "@changeset" | "bbox" | key ("|" key)*
//! right     = INT | left,bottom,right,top | value ("|" value)*
//! value     = STRING | "*"

use super::ast::{Clause, FilterExpression, TagMatch, TagValue};
use super::bbox::BBox;
use super::lexer::{split_assignment, split_groups};
use crate::error::QueryError;

/// Parse a predicate string such as `[highway=primary|secondary][bbox=…]`.
pub fn parse_predicate(input: &str) -> Result<FilterExpression, QueryError> {
    let groups = split_groups(input.trim()).map_err(QueryError::Parse)?;
    if groups.is_empty() {
        return Err(QueryError::parse("Empty predicate."));
    }

    let clauses = groups
        .into_iter()
        .map(parse_clause)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FilterExpression { clauses })
}

fn parse_clause(group: &str) -> Result<Clause, QueryError> {
    let (left, right) = split_assignment(group)
        .ok_or_else(|| QueryError::parse(format!("Missing '=' in [{group}].")))?;

    match left {
        "@uid" => parse_integer(left, right).map(Clause::OwnerEquals),
        "@changeset" => parse_integer(left, right).map(Clause::ChangesetEquals),
        "bbox" => Ok(Clause::BBoxIntersects(BBox::parse(right)?)),
        _ => parse_tag_match(left, right).map(Clause::TagMatch),
    }
}

fn parse_integer(left: &str, right: &str) -> Result<i64, QueryError> {
    right
        .trim()
        .parse::<i64>()
        .map_err(|_| QueryError::parse(format!("Invalid {left} value '{right}'.")))
}

fn parse_tag_match(left: &str, right: &str) -> Result<TagMatch, QueryError> {
    let keys: Vec<String> = left.split('|').map(str::to_string).collect();
    if keys.iter().any(|key| key.is_empty()) {
        return Err(QueryError::parse(format!("Empty tag key in [{left}={right}].")));
    }

    let values = right
        .split('|')
        .map(|value| match value {
            "*" => TagValue::Any,
            other => TagValue::Exact(other.to_string()),
        })
        .collect();

    Ok(TagMatch { keys, values })
}

/// Parse a comma separated id list as used by the id lookup operations.
pub fn parse_id_list(input: &str) -> Result<Vec<i64>, QueryError> {
    input
        .split(',')
        .map(|id| {
            id.trim()
                .parse::<i64>()
                .map_err(|_| QueryError::parse(format!("Invalid id '{id}'.")))
        })
        .collect()
}
