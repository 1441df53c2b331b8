use std::collections::BTreeSet;
use std::collections::btree_set;

use crate::elements::ElementKind;

/// Request-scoped ids of one element kind. Ids are only ever added, each at
/// most once, and iterate in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSet {
    kind: ElementKind,
    ids: BTreeSet<i64>,
}

impl MatchSet {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            ids: BTreeSet::new(),
        }
    }

    pub fn from_ids(kind: ElementKind, ids: impl IntoIterator<Item = i64>) -> Self {
        let mut set = Self::new(kind);
        set.insert_all(ids);
        set
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            ElementKind::Node => "bbox_nodes",
            ElementKind::Way => "bbox_ways",
            ElementKind::Relation => "bbox_relations",
        }
    }

    /// Returns true when `id` was not present yet.
    pub fn insert(&mut self, id: i64) -> bool {
        self.ids.insert(id)
    }

    /// Union `ids` into the set, returning how many were new.
    pub fn insert_all(&mut self, ids: impl IntoIterator<Item = i64>) -> usize {
        ids.into_iter().filter(|id| self.ids.insert(*id)).count()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }
}

impl IntoIterator for MatchSet {
    type Item = i64;
    type IntoIter = btree_set::IntoIter<i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.into_iter()
    }
}

/// The three match sets of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSets {
    pub nodes: MatchSet,
    pub ways: MatchSet,
    pub relations: MatchSet,
}

impl MatchSets {
    pub fn get(&self, kind: ElementKind) -> &MatchSet {
        match kind {
            ElementKind::Node => &self.nodes,
            ElementKind::Way => &self.ways,
            ElementKind::Relation => &self.relations,
        }
    }
}
