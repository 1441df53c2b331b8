//! AST types for the XAPI predicate language.

use std::fmt;

use super::bbox::BBox;

/// A value to match against a tag.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// Exact string match
    Exact(String),
    /// Wildcard (key present with any value)
    Any,
}

/// `[k1|k2=v1|v2]`: matches when any key/value pair of the cross product matches.
#[derive(Debug, Clone, PartialEq)]
pub struct TagMatch {
    pub keys: Vec<String>,
    pub values: Vec<TagValue>,
}

impl TagMatch {
    /// Every (key, value) pair in key-major order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &TagValue)> {
        self.keys
            .iter()
            .flat_map(move |key| self.values.iter().map(move |value| (key.as_str(), value)))
    }
}

/// One bracket group of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    OwnerEquals(i64),
    ChangesetEquals(i64),
    BBoxIntersects(BBox),
    TagMatch(TagMatch),
}

/// Clauses in source order, AND-combined.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    pub clauses: Vec<Clause>,
}

impl FilterExpression {
    pub fn bbox(bbox: BBox) -> Self {
        Self {
            clauses: vec![Clause::BBoxIntersects(bbox)],
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clause::OwnerEquals(uid) => write!(f, "[@uid={uid}]"),
            Clause::ChangesetEquals(id) => write!(f, "[@changeset={id}]"),
            Clause::BBoxIntersects(bbox) => write!(f, "[bbox={bbox}]"),
            Clause::TagMatch(tag_match) => {
                let values: Vec<&str> = tag_match
                    .values
                    .iter()
                    .map(|value| match value {
                        TagValue::Exact(v) => v.as_str(),
                        TagValue::Any => "*",
                    })
                    .collect();
                write!(f, "[{}={}]", tag_match.keys.join("|"), values.join("|"))
            }
        }
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for clause in &self.clauses {
            write!(f, "{clause}")?;
        }
        Ok(())
    }
}
