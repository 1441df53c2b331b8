use clap::ValueEnum;

use super::predicate::CompiledPredicate;
use crate::closure::ClosureStep;
use crate::dsl::{BBox, FilterExpression};
use crate::elements::ElementKind;
use crate::error::QueryError;

/// Element kinds a predicate search can target.
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum SearchTarget {
    #[value(name = "node")]
    Node,
    #[value(name = "way")]
    Way,
    #[value(name = "relation")]
    Relation,
    /// Nodes and ways (`*`)
    #[value(name = "*", alias = "any")]
    Any,
}

/// The read operations of the API.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Lookup { kind: ElementKind, ids: Vec<i64> },
    Search {
        target: SearchTarget,
        filter: FilterExpression,
    },
    Map { bbox: BBox },
}

/// What one element kind's initial match set is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Nothing,
    Matching(CompiledPredicate),
}

impl Selection {
    fn of(expr: &FilterExpression, kind: ElementKind) -> Result<Self, QueryError> {
        Ok(Selection::Matching(CompiledPredicate::compile(expr, kind)?))
    }

    pub fn predicate(&self) -> CompiledPredicate {
        match self {
            Selection::Nothing => CompiledPredicate::nothing(),
            Selection::Matching(predicate) => predicate.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub nodes: Selection,
    pub ways: Selection,
    pub relations: Selection,
    pub steps: &'static [ClosureStep],
    /// Set for id lookups, which fail when nothing was found before closure.
    pub require_seed: Option<(ElementKind, String)>,
}

impl QueryPlan {
    pub fn for_operation(operation: &Operation) -> Result<Self, QueryError> {
        let mut plan = QueryPlan {
            nodes: Selection::Nothing,
            ways: Selection::Nothing,
            relations: Selection::Nothing,
            steps: &[],
            require_seed: None,
        };

        match operation {
            Operation::Lookup { kind, ids } => {
                let selection = Selection::Matching(CompiledPredicate::ids(ids));
                match kind {
                    ElementKind::Node => plan.nodes = selection,
                    ElementKind::Way => {
                        plan.ways = selection;
                        plan.steps = &[ClosureStep::BackfillWayNodes];
                    }
                    ElementKind::Relation => plan.relations = selection,
                }
                let ids = ids
                    .iter()
                    .map(i64::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                plan.require_seed = Some((*kind, ids));
            }
            Operation::Search { target, filter } => match target {
                SearchTarget::Node => plan.nodes = Selection::of(filter, ElementKind::Node)?,
                SearchTarget::Way => {
                    plan.ways = Selection::of(filter, ElementKind::Way)?;
                    plan.steps = &[ClosureStep::BackfillWayNodes];
                }
                SearchTarget::Relation => {
                    plan.relations = Selection::of(filter, ElementKind::Relation)?
                }
                SearchTarget::Any => {
                    plan.nodes = Selection::of(filter, ElementKind::Node)?;
                    plan.ways = Selection::of(filter, ElementKind::Way)?;
                    plan.steps = &[ClosureStep::BackfillWayNodes];
                }
            },
            Operation::Map { bbox } => {
                let filter = FilterExpression::bbox(*bbox);
                plan.nodes = Selection::of(&filter, ElementKind::Node)?;
                plan.ways = Selection::of(&filter, ElementKind::Way)?;
                // Backfill runs last so way-only nodes never pull in relations.
                plan.steps = &[
                    ClosureStep::SeedRelations,
                    ClosureStep::CloseRelations,
                    ClosureStep::BackfillWayNodes,
                ];
            }
        }

        Ok(plan)
    }

    pub fn selection(&self, kind: ElementKind) -> &Selection {
        match kind {
            ElementKind::Node => &self.nodes,
            ElementKind::Way => &self.ways,
            ElementKind::Relation => &self.relations,
        }
    }

    /// SQL equivalent of each initial selection, in document order.
    pub fn explain(&self) -> Vec<String> {
        [ElementKind::Node, ElementKind::Way, ElementKind::Relation]
            .into_iter()
            .map(|kind| self.selection(kind).predicate().to_sql(kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse_predicate;

    #[test]
    fn node_lookup_skips_closure() {
        let plan = QueryPlan::for_operation(&Operation::Lookup {
            kind: ElementKind::Node,
            ids: vec![7, 8],
        })
        .unwrap();
        assert!(plan.steps.is_empty());
        assert_eq!(plan.ways, Selection::Nothing);
        assert_eq!(plan.require_seed, Some((ElementKind::Node, "7,8".into())));
    }

    #[test]
    fn way_lookup_backfills_nodes() {
        let plan = QueryPlan::for_operation(&Operation::Lookup {
            kind: ElementKind::Way,
            ids: vec![1],
        })
        .unwrap();
        assert_eq!(plan.steps, &[ClosureStep::BackfillWayNodes]);
    }

    #[test]
    fn any_search_queries_nodes_and_ways_only() {
        let plan = QueryPlan::for_operation(&Operation::Search {
            target: SearchTarget::Any,
            filter: parse_predicate("[highway=*]").unwrap(),
        })
        .unwrap();
        assert!(matches!(plan.nodes, Selection::Matching(_)));
        assert!(matches!(plan.ways, Selection::Matching(_)));
        assert_eq!(plan.relations, Selection::Nothing);
        assert_eq!(plan.require_seed, None);
    }

    #[test]
    fn map_runs_full_chain_with_backfill_last() {
        let plan = QueryPlan::for_operation(&Operation::Map {
            bbox: BBox::parse("0,0,1,1").unwrap(),
        })
        .unwrap();
        assert_eq!(
            plan.steps,
            &[
                ClosureStep::SeedRelations,
                ClosureStep::CloseRelations,
                ClosureStep::BackfillWayNodes,
            ]
        );
        let sql = plan.explain();
        assert!(sql[0].contains("ST_Intersects(geom"));
        assert!(sql[1].contains("ST_Intersects(linestring"));
        assert!(sql[2].ends_with("WHERE FALSE ORDER BY id"));
    }

    #[test]
    fn relation_search_with_bbox_is_rejected() {
        let err = QueryPlan::for_operation(&Operation::Search {
            target: SearchTarget::Relation,
            filter: parse_predicate("[bbox=0,0,1,1]").unwrap(),
        })
        .unwrap_err();
        assert_eq!(err.status(), 400);
    }
}
