//! Read-only backing store for the query engine.
//!
//! A [`FeatureStore`] hands out request-scoped [`StoreSession`]s. The in-memory
//! implementation is built with a [`StoreWriter`] and frozen into a
//! [`MemoryStore`] by [`StoreWriter::finalize`], after which it is immutable and
//! safe to share between concurrent requests.

mod eval;
#[cfg(test)]
pub(crate) mod testing;

use anyhow::Result;
use geo::BoundingRect;
use geo_types::{LineString, Rect};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::elements::{ElementKind, Node, Relation, Way};
use crate::query::{CompiledPredicate, Predicate};
use eval::{Candidate, Geometry, evaluate};

/// Read access scoped to one request. Dropping the session releases it.
///
/// Sessions are `Send` so a finished request can hand its document stream to
/// another thread.
pub trait StoreSession: Send {
    /// Ids of `kind` matching `predicate`, ascending.
    fn select(&self, kind: ElementKind, predicate: &CompiledPredicate) -> Result<Vec<i64>>;

    fn node(&self, id: i64) -> Result<Option<Node>>;
    fn way(&self, id: i64) -> Result<Option<Way>>;
    fn relation(&self, id: i64) -> Result<Option<Relation>>;

    /// Node references of a way, in path order.
    fn way_refs(&self, way_id: i64) -> Result<Vec<i64>>;

    /// The subset of `ids` present in the store.
    fn existing_ids(&self, kind: ElementKind, ids: &[i64]) -> Result<Vec<i64>>;

    /// Relations with at least one member of `kind` whose id is in `ids`.
    fn parent_relations(&self, kind: ElementKind, ids: &[i64]) -> Result<Vec<i64>>;
}

pub trait FeatureStore: Send + Sync {
    fn open_session(&self) -> Result<Box<dyn StoreSession + '_>>;
}

#[derive(Default)]
pub struct StoreWriter {
    nodes: BTreeMap<i64, Node>,
    ways: BTreeMap<i64, Way>,
    relations: BTreeMap<i64, Relation>,
}

impl StoreWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_node(&mut self, node: Node) {
        if let Some(previous) = self.nodes.insert(node.id, node) {
            tracing::debug!("Store: node {} loaded twice; keeping the last copy", previous.id);
        }
    }

    pub fn put_way(&mut self, way: Way) {
        if let Some(previous) = self.ways.insert(way.id, way) {
            tracing::debug!("Store: way {} loaded twice; keeping the last copy", previous.id);
        }
    }

    pub fn put_relation(&mut self, relation: Relation) {
        if let Some(previous) = self.relations.insert(relation.id, relation) {
            tracing::debug!(
                "Store: relation {} loaded twice; keeping the last copy",
                previous.id
            );
        }
    }

    /// Build the way envelopes and the member index and freeze the store.
    pub fn finalize(self) -> MemoryStore {
        let mut way_envelopes = HashMap::with_capacity(self.ways.len());
        let mut dangling = 0usize;
        for way in self.ways.values() {
            let coords: Vec<_> = way
                .refs
                .iter()
                .filter_map(|id| self.nodes.get(id).map(Node::coord))
                .collect();
            dangling += way.refs.len() - coords.len();
            if let Some(envelope) = LineString::from(coords).bounding_rect() {
                way_envelopes.insert(way.id, envelope);
            }
        }
        if dangling > 0 {
            tracing::warn!(
                "Store: {} way node reference(s) could not be resolved",
                dangling
            );
        }

        let mut parents: HashMap<(ElementKind, i64), Vec<i64>> = HashMap::new();
        for relation in self.relations.values() {
            for member in &relation.members {
                let entry = parents.entry((member.kind, member.id)).or_default();
                // Relations are visited in id order, so repeats are adjacent.
                if entry.last() != Some(&relation.id) {
                    entry.push(relation.id);
                }
            }
        }

        MemoryStore {
            nodes: self.nodes,
            ways: self.ways,
            relations: self.relations,
            way_envelopes,
            parents,
            open_sessions: AtomicUsize::new(0),
        }
    }
}

#[derive(Debug)]
pub struct MemoryStore {
    nodes: BTreeMap<i64, Node>,
    ways: BTreeMap<i64, Way>,
    relations: BTreeMap<i64, Relation>,
    way_envelopes: HashMap<i64, Rect<f64>>,
    parents: HashMap<(ElementKind, i64), Vec<i64>>,
    open_sessions: AtomicUsize,
}

impl MemoryStore {
    /// Element counts as (nodes, ways, relations).
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.nodes.len(), self.ways.len(), self.relations.len())
    }

    /// Sessions handed out and not yet released.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    fn contains(&self, kind: ElementKind, id: i64) -> bool {
        match kind {
            ElementKind::Node => self.nodes.contains_key(&id),
            ElementKind::Way => self.ways.contains_key(&id),
            ElementKind::Relation => self.relations.contains_key(&id),
        }
    }

    fn candidate(&self, kind: ElementKind, id: i64) -> Option<Candidate<'_>> {
        match kind {
            ElementKind::Node => self.nodes.get(&id).map(|node| Candidate {
                id,
                meta: &node.meta,
                tags: &node.tags,
                geometry: Geometry::Point(node.coord()),
            }),
            ElementKind::Way => self.ways.get(&id).map(|way| Candidate {
                id,
                meta: &way.meta,
                tags: &way.tags,
                geometry: Geometry::Envelope(self.way_envelopes.get(&id)),
            }),
            ElementKind::Relation => self.relations.get(&id).map(|relation| Candidate {
                id,
                meta: &relation.meta,
                tags: &relation.tags,
                geometry: Geometry::Absent,
            }),
        }
    }

    fn ids(&self, kind: ElementKind) -> Box<dyn Iterator<Item = i64> + '_> {
        match kind {
            ElementKind::Node => Box::new(self.nodes.keys().copied()),
            ElementKind::Way => Box::new(self.ways.keys().copied()),
            ElementKind::Relation => Box::new(self.relations.keys().copied()),
        }
    }
}

impl FeatureStore for MemoryStore {
    fn open_session(&self) -> Result<Box<dyn StoreSession + '_>> {
        let open = self.open_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Store: session opened ({} open)", open);
        Ok(Box::new(MemorySession { store: self }))
    }
}

struct MemorySession<'a> {
    store: &'a MemoryStore,
}

impl Drop for MemorySession<'_> {
    fn drop(&mut self) {
        let open = self.store.open_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::debug!("Store: session released ({} open)", open);
    }
}

impl StoreSession for MemorySession<'_> {
    fn select(&self, kind: ElementKind, predicate: &CompiledPredicate) -> Result<Vec<i64>> {
        match &predicate.predicate {
            Predicate::False => Ok(Vec::new()),
            // Primary key lookup instead of a scan.
            Predicate::IdIn(placeholder) => {
                let mut ids = predicate.id_list(*placeholder)?.to_vec();
                ids.sort_unstable();
                ids.dedup();
                ids.retain(|id| self.store.contains(kind, *id));
                Ok(ids)
            }
            _ => {
                let mut matched = Vec::new();
                for id in self.store.ids(kind) {
                    if let Some(candidate) = self.store.candidate(kind, id)
                        && evaluate(predicate, &candidate)?
                    {
                        matched.push(id);
                    }
                }
                Ok(matched)
            }
        }
    }

    fn node(&self, id: i64) -> Result<Option<Node>> {
        Ok(self.store.nodes.get(&id).cloned())
    }

    fn way(&self, id: i64) -> Result<Option<Way>> {
        Ok(self.store.ways.get(&id).cloned())
    }

    fn relation(&self, id: i64) -> Result<Option<Relation>> {
        Ok(self.store.relations.get(&id).cloned())
    }

    fn way_refs(&self, way_id: i64) -> Result<Vec<i64>> {
        Ok(self
            .store
            .ways
            .get(&way_id)
            .map(|way| way.refs.clone())
            .unwrap_or_default())
    }

    fn existing_ids(&self, kind: ElementKind, ids: &[i64]) -> Result<Vec<i64>> {
        Ok(ids
            .iter()
            .copied()
            .filter(|id| self.store.contains(kind, *id))
            .collect())
    }

    fn parent_relations(&self, kind: ElementKind, ids: &[i64]) -> Result<Vec<i64>> {
        let mut parents: Vec<i64> = ids
            .iter()
            .filter_map(|id| self.store.parents.get(&(kind, *id)))
            .flatten()
            .copied()
            .collect();
        parents.sort_unstable();
        parents.dedup();
        Ok(parents)
    }
}
