//! Backend-agnostic predicates with positional parameters.

use anyhow::{Result, anyhow};

use crate::dsl::{Clause, FilterExpression, TagValue};
use crate::elements::ElementKind;
use crate::error::QueryError;

/// Zero-based position in [`CompiledPredicate::params`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Int(i64),
    Float(f64),
    Text(String),
    IdList(Vec<i64>),
}

/// Which geometry a bbox clause is tested against.
///
/// Nodes are compared by their coordinate, ways by the envelope of their path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryColumn {
    NodeGeom,
    WayPath,
}

impl GeometryColumn {
    pub fn for_kind(kind: ElementKind) -> Option<Self> {
        match kind {
            ElementKind::Node => Some(GeometryColumn::NodeGeom),
            ElementKind::Way => Some(GeometryColumn::WayPath),
            ElementKind::Relation => None,
        }
    }

    pub fn column_name(self) -> &'static str {
        match self {
            GeometryColumn::NodeGeom => "geom",
            GeometryColumn::WayPath => "linestring",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    False,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    IdIn(Placeholder),
    OwnerEquals(Placeholder),
    ChangesetEquals(Placeholder),
    /// Envelope placeholders are left, bottom, right, top.
    Intersects {
        column: GeometryColumn,
        envelope: [Placeholder; 4],
    },
    HasKey(Placeholder),
    HasTag {
        key: Placeholder,
        value: Placeholder,
    },
}

/// A predicate tree together with the values its placeholders refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub predicate: Predicate,
    pub params: Vec<Param>,
}

/// Hands out placeholders in emission order.
#[derive(Default)]
struct Binder {
    params: Vec<Param>,
}

impl Binder {
    fn bind(&mut self, param: Param) -> Placeholder {
        self.params.push(param);
        Placeholder(self.params.len() - 1)
    }

    fn finish(self, predicate: Predicate) -> CompiledPredicate {
        CompiledPredicate {
            predicate,
            params: self.params,
        }
    }
}

impl CompiledPredicate {
    pub fn nothing() -> Self {
        Self {
            predicate: Predicate::False,
            params: Vec::new(),
        }
    }

    pub fn ids(ids: &[i64]) -> Self {
        let mut binder = Binder::default();
        let placeholder = binder.bind(Param::IdList(ids.to_vec()));
        binder.finish(Predicate::IdIn(placeholder))
    }

    /// Compile a filter for one element kind.
    ///
    /// Nodes and ways produce the same tree except for the geometry column of
    /// bbox clauses. Relations carry no geometry, so a bbox clause is rejected.
    pub fn compile(expr: &FilterExpression, kind: ElementKind) -> Result<Self, QueryError> {
        let mut binder = Binder::default();
        let mut terms = Vec::with_capacity(expr.clauses.len());

        for clause in &expr.clauses {
            let term = match clause {
                Clause::OwnerEquals(uid) => Predicate::OwnerEquals(binder.bind(Param::Int(*uid))),
                Clause::ChangesetEquals(id) => {
                    Predicate::ChangesetEquals(binder.bind(Param::Int(*id)))
                }
                Clause::BBoxIntersects(bbox) => {
                    let column = GeometryColumn::for_kind(kind).ok_or_else(|| {
                        QueryError::parse(format!(
                            "bbox is not supported for {}s.",
                            kind.name()
                        ))
                    })?;
                    let envelope = [bbox.left, bbox.bottom, bbox.right, bbox.top]
                        .map(|value| binder.bind(Param::Float(value)));
                    Predicate::Intersects { column, envelope }
                }
                Clause::TagMatch(tag_match) => {
                    let alternatives = tag_match
                        .pairs()
                        .map(|(key, value)| {
                            let key = binder.bind(Param::Text(key.to_string()));
                            match value {
                                TagValue::Any => Predicate::HasKey(key),
                                TagValue::Exact(value) => Predicate::HasTag {
                                    key,
                                    value: binder.bind(Param::Text(value.clone())),
                                },
                            }
                        })
                        .collect();
                    Predicate::Or(alternatives)
                }
            };
            terms.push(term);
        }

        Ok(binder.finish(Predicate::And(terms)))
    }

    fn param(&self, placeholder: Placeholder) -> Result<&Param> {
        self.params
            .get(placeholder.0)
            .ok_or_else(|| anyhow!("Planner: placeholder ${} is unbound", placeholder.0 + 1))
    }

    pub fn int(&self, placeholder: Placeholder) -> Result<i64> {
        match self.param(placeholder)? {
            Param::Int(value) => Ok(*value),
            other => Err(anyhow!("Planner: ${} is not an integer: {other:?}", placeholder.0 + 1)),
        }
    }

    pub fn float(&self, placeholder: Placeholder) -> Result<f64> {
        match self.param(placeholder)? {
            Param::Float(value) => Ok(*value),
            other => Err(anyhow!("Planner: ${} is not a float: {other:?}", placeholder.0 + 1)),
        }
    }

    pub fn text(&self, placeholder: Placeholder) -> Result<&str> {
        match self.param(placeholder)? {
            Param::Text(value) => Ok(value),
            other => Err(anyhow!("Planner: ${} is not text: {other:?}", placeholder.0 + 1)),
        }
    }

    pub fn id_list(&self, placeholder: Placeholder) -> Result<&[i64]> {
        match self.param(placeholder)? {
            Param::IdList(ids) => Ok(ids),
            other => Err(anyhow!("Planner: ${} is not an id list: {other:?}", placeholder.0 + 1)),
        }
    }
}
