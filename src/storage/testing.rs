//! Small hand-built graph shared by unit tests.
//!
//! Nodes 1, 2, 4 lie inside `0,0,1,1`; 3, 5, 6 lie outside.
//! Way 10 runs 1 → 2 → 3 and so leaves the box. Way 11 runs 3 → 5, way 12
//! references node 5 and the unknown node 999.
//! Relations: 20 ∋ way 10, 21 ∋ node 4, 22 ∋ rel 20, 23 ∋ rel 22,
//! 30 ∋ rel 31, 31 ∋ rel 30 + node 1 (a cycle), 40 ∋ node 3.

use super::{MemoryStore, StoreWriter};
use crate::elements::{ElementKind, Member, Node, Relation, Tags, Way};
use crate::metadata::Meta;

pub fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn meta(uid: i64, changeset: i64) -> Meta {
    Meta {
        version: 1,
        changeset,
        uid,
        user: None,
        timestamp: 1_262_304_000_000,
        visible: true,
    }
}

pub fn node(id: i64, lon: f64, lat: f64, pairs: &[(&str, &str)]) -> Node {
    Node::new(id, meta(1, 100), lon, lat, tags(pairs))
}

pub fn way(id: i64, refs: &[i64], pairs: &[(&str, &str)]) -> Way {
    Way {
        id,
        meta: meta(1, 100),
        tags: tags(pairs),
        refs: refs.to_vec(),
    }
}

pub fn relation(id: i64, members: &[(ElementKind, i64, &str)]) -> Relation {
    Relation {
        id,
        meta: meta(1, 100),
        tags: tags(&[("type", "collection")]),
        members: members
            .iter()
            .map(|(kind, id, role)| Member {
                kind: *kind,
                id: *id,
                role: role.to_string(),
            })
            .collect(),
    }
}

pub fn sample_store() -> MemoryStore {
    use ElementKind::{Node as N, Relation as R, Way as W};

    let mut writer = StoreWriter::new();
    writer.put_node(node(1, 0.5, 0.5, &[("amenity", "cafe"), ("name", "Corner")]));
    writer.put_node(node(2, 0.6, 0.6, &[]));
    writer.put_node(node(3, 5.0, 5.0, &[]));
    let mut bakery = node(4, 0.2, 0.2, &[("shop", "bakery")]);
    bakery.meta.uid = 9;
    writer.put_node(bakery);
    writer.put_node(node(5, 10.0, 10.0, &[]));
    writer.put_node(node(6, 20.0, 20.0, &[("amenity", "pub"), ("name", "Crown")]));

    writer.put_way(way(10, &[1, 2, 3], &[("highway", "residential")]));
    let mut primary = way(11, &[3, 5], &[("highway", "primary")]);
    primary.meta.changeset = 77;
    writer.put_way(primary);
    writer.put_way(way(12, &[5, 999], &[]));

    writer.put_relation(relation(20, &[(W, 10, "outer")]));
    writer.put_relation(relation(21, &[(N, 4, "")]));
    writer.put_relation(relation(22, &[(R, 20, "subarea")]));
    writer.put_relation(relation(23, &[(R, 22, "")]));
    writer.put_relation(relation(30, &[(R, 31, "")]));
    writer.put_relation(relation(31, &[(R, 30, ""), (N, 1, "label")]));
    writer.put_relation(relation(40, &[(N, 3, "")]));

    writer.finalize()
}
