//! Query planning and execution.
//!
//! parse → plan → materialize → close → stream, strictly in that order. Every
//! error other than a storage failure happens before the first document
//! fragment is produced.

mod context;
mod plan;
mod predicate;
mod sql;

pub use plan::{Operation, QueryPlan, SearchTarget};
pub use predicate::{CompiledPredicate, GeometryColumn, Predicate};

use context::QueryContext;
use crate::config::DocumentConfig;
use crate::document::DocumentStream;
use crate::error::QueryError;
use crate::storage::FeatureStore;

/// Run a plan up to the point where the document can be streamed.
pub fn execute<'s>(
    store: &'s dyn FeatureStore,
    plan: &QueryPlan,
    document: &DocumentConfig,
) -> Result<DocumentStream<'s>, QueryError> {
    let session = store.open_session()?;
    let mut context = QueryContext::materialize(session, plan)?;

    if let Some((kind, ids)) = &plan.require_seed
        && context.sets().get(*kind).is_empty()
    {
        return Err(QueryError::NotFound {
            kind: *kind,
            ids: ids.clone(),
        });
    }

    context.close(plan.steps)?;

    let sets = context.sets();
    tracing::info!(
        "Query: {} node(s), {} way(s), {} relation(s)",
        sets.nodes.len(),
        sets.ways.len(),
        sets.relations.len()
    );

    Ok(context.into_stream(document))
}
