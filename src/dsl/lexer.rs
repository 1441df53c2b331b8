//! Splits a predicate into its bracket groups.

use winnow::combinator::{delimited, separated_pair};
use winnow::prelude::*;
use winnow::token::{rest, take_till};

// Error type shared by the group parsers.
type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Lex one `[...]` group, returning its inner text.
fn lex_group<'i>(input: &mut &'i str) -> PResult<&'i str> {
    delimited('[', take_till(0.., ']'), ']').parse_next(input)
}

/// Split group text on the first `=`.
fn lex_assignment<'i>(input: &mut &'i str) -> PResult<(&'i str, &'i str)> {
    separated_pair(take_till(0.., '='), '=', rest).parse_next(input)
}

/// Tokenize the entire predicate into bracket groups.
pub fn split_groups(input: &str) -> Result<Vec<&str>, String> {
    let mut remaining = input;
    let mut groups = Vec::new();

    while !remaining.is_empty() {
        let before = remaining;
        match lex_group(&mut remaining) {
            Ok(group) => groups.push(group),
            Err(_) => return Err(format!("Malformed predicate at '{}'.", before)),
        }
    }

    Ok(groups)
}

/// `(left, right)` of a group, or `None` when it has no `=`.
pub fn split_assignment(group: &str) -> Option<(&str, &str)> {
    let mut input = group;
    lex_assignment(&mut input).ok()
}
