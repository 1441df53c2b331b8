use super::plan::QueryPlan;
use crate::closure::{self, ClosureStep, MatchSet, MatchSets};
use crate::config::DocumentConfig;
use crate::document::DocumentStream;
use crate::elements::ElementKind;
use crate::error::QueryError;
use crate::storage::StoreSession;

/// Everything one request holds on to: the store session and its match sets.
///
/// The session is released when the context (or the stream it turns into) is
/// dropped, whichever exit path the request takes.
pub struct QueryContext<'s> {
    session: Box<dyn StoreSession + 's>,
    sets: MatchSets,
}

impl<'s> QueryContext<'s> {
    /// Evaluate the plan's initial selections.
    pub fn materialize(
        session: Box<dyn StoreSession + 's>,
        plan: &QueryPlan,
    ) -> Result<Self, QueryError> {
        let select = |kind: ElementKind| -> Result<MatchSet, QueryError> {
            let predicate = plan.selection(kind).predicate();
            tracing::debug!("Query: {}", predicate.to_sql(kind));
            let ids = session.select(kind, &predicate)?;
            let set = MatchSet::from_ids(kind, ids);
            tracing::debug!("Query: {} seeded with {} id(s)", set.name(), set.len());
            Ok(set)
        };

        let sets = MatchSets {
            nodes: select(ElementKind::Node)?,
            ways: select(ElementKind::Way)?,
            relations: select(ElementKind::Relation)?,
        };

        Ok(Self { session, sets })
    }

    pub fn sets(&self) -> &MatchSets {
        &self.sets
    }

    /// Run the closure steps, returning how many ids they added.
    pub fn close(&mut self, steps: &[ClosureStep]) -> Result<usize, QueryError> {
        let added = closure::run_steps(self.session.as_ref(), &mut self.sets, steps)?;
        tracing::debug!(
            "Query: closure added {} id(s) over {} step(s)",
            added,
            steps.len()
        );
        Ok(added)
    }

    pub fn into_stream(self, document: &DocumentConfig) -> DocumentStream<'s> {
        DocumentStream::new(self.session, self.sets, document)
    }
}
