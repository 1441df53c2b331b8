//! Extends initial match sets until the result is referentially complete.
//!
//! Every step works from the current match sets plus reference lookups in the
//! store; the request predicate is never evaluated again.

mod match_set;

pub use match_set::{MatchSet, MatchSets};

use anyhow::Result;

use crate::elements::ElementKind;
use crate::storage::StoreSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureStep {
    /// Add the nodes referenced by matched ways.
    BackfillWayNodes,
    /// Add relations with a node or way member that is already matched.
    SeedRelations,
    /// Add relations with a matched relation member, until a fixpoint.
    CloseRelations,
}

/// Run `steps` in order, returning the number of ids added across all of them.
pub fn run_steps(
    session: &dyn StoreSession,
    sets: &mut MatchSets,
    steps: &[ClosureStep],
) -> Result<usize> {
    let mut added = 0;
    for step in steps {
        let count = match step {
            ClosureStep::BackfillWayNodes => backfill_way_nodes(session, sets)?,
            ClosureStep::SeedRelations => seed_relations(session, sets)?,
            ClosureStep::CloseRelations => close_relations(session, sets)?,
        };
        tracing::debug!(
            "Closure: {:?} added {} (nodes: {}, ways: {}, relations: {})",
            step,
            count,
            sets.nodes.len(),
            sets.ways.len(),
            sets.relations.len()
        );
        added += count;
    }
    Ok(added)
}

pub fn backfill_way_nodes(session: &dyn StoreSession, sets: &mut MatchSets) -> Result<usize> {
    let mut missing = Vec::new();
    for way_id in sets.ways.iter() {
        missing.extend(
            session
                .way_refs(way_id)?
                .into_iter()
                .filter(|id| !sets.nodes.contains(*id)),
        );
    }
    missing.sort_unstable();
    missing.dedup();

    let existing = session.existing_ids(ElementKind::Node, &missing)?;
    if existing.len() < missing.len() {
        tracing::warn!(
            "Closure: {} way node reference(s) point at nodes missing from the store",
            missing.len() - existing.len()
        );
    }
    Ok(sets.nodes.insert_all(existing))
}

pub fn seed_relations(session: &dyn StoreSession, sets: &mut MatchSets) -> Result<usize> {
    let nodes: Vec<i64> = sets.nodes.iter().collect();
    let ways: Vec<i64> = sets.ways.iter().collect();

    let mut parents = session.parent_relations(ElementKind::Node, &nodes)?;
    parents.extend(session.parent_relations(ElementKind::Way, &ways)?);
    Ok(sets.relations.insert_all(parents))
}

pub fn close_relations(session: &dyn StoreSession, sets: &mut MatchSets) -> Result<usize> {
    // Parents of ids already scanned were found in an earlier pass, so each
    // pass only needs to look at what the previous one inserted.
    let mut frontier: Vec<i64> = sets.relations.iter().collect();
    let mut total = 0;
    let mut passes = 0;

    while !frontier.is_empty() {
        passes += 1;
        let parents = session.parent_relations(ElementKind::Relation, &frontier)?;
        frontier = parents
            .into_iter()
            .filter(|id| sets.relations.insert(*id))
            .collect();
        total += frontier.len();
    }

    tracing::debug!("Closure: relation fixpoint after {} pass(es)", passes);
    Ok(total)
}
