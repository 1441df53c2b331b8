//! Loading a [`MemoryStore`] from an OSM extract.
//!
//! `.pbf` inputs are decoded in parallel; anything else is read as OSM XML.
//! Both readers only produce the three canonical member kinds: a member of
//! unknown type rejects the whole input.

mod pbf;
mod xml;

use anyhow::Result;
use std::path::Path;
use std::time::Instant;

use crate::elements::{Node, Relation, Tags, Way};
use crate::storage::{MemoryStore, StoreWriter};

const PROGRESS_INTERVAL: u64 = 1_000_000;

pub enum Primitive {
    Node(Node),
    Way(Way),
    Relation(Relation),
}

impl Primitive {
    fn store(self, writer: &mut StoreWriter) {
        match self {
            Primitive::Node(node) => writer.put_node(node),
            Primitive::Way(way) => writer.put_way(way),
            Primitive::Relation(relation) => writer.put_relation(relation),
        }
    }
}

pub fn load_store(path: &Path) -> Result<MemoryStore> {
    let start = Instant::now();
    let writer = if is_pbf(path) {
        tracing::info!("Ingest: Reading {:?} (pbf, parallel)", path);
        pbf::read_pbf(path)?
    } else {
        tracing::info!("Ingest: Reading {:?} (xml)", path);
        xml::read_xml(path)?
    };

    let store = writer.finalize();
    let (nodes, ways, relations) = store.counts();
    tracing::info!(
        "Ingest: {} nodes, {} ways, {} relations ready in {:.2?}",
        nodes,
        ways,
        relations,
        start.elapsed()
    );
    Ok(store)
}

fn is_pbf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pbf"))
}

/// Add a tag, replacing the value of an existing key in place.
fn push_tag(tags: &mut Tags, key: &str, value: &str) {
    match tags.iter_mut().find(|(existing, _)| existing == key) {
        Some((_, existing)) => *existing = value.to_string(),
        None => tags.push((key.to_string(), value.to_string())),
    }
}

fn collect_tags<'a, I>(pairs: I) -> Tags
where
    I: Iterator<Item = (&'a str, &'a str)>,
{
    let mut tags = Tags::new();
    for (key, value) in pairs {
        push_tag(&mut tags, key, value);
    }
    tags
}

/// Element counts logged at a fixed interval while loading.
#[derive(Default)]
struct Progress {
    nodes: u64,
    ways: u64,
    relations: u64,
}

impl Progress {
    fn record(&mut self, primitive: &Primitive) {
        match primitive {
            Primitive::Node(_) => self.nodes += 1,
            Primitive::Way(_) => self.ways += 1,
            Primitive::Relation(_) => self.relations += 1,
        }
        if self.total() % PROGRESS_INTERVAL == 0 {
            self.log();
        }
    }

    fn total(&self) -> u64 {
        self.nodes + self.ways + self.relations
    }

    fn log(&self) {
        tracing::info!(
            "Ingest: {} nodes, {} ways, {} relations read",
            self.nodes,
            self.ways,
            self.relations
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn later_duplicate_keys_replace_earlier_values() {
        let tags = collect_tags(
            [("name", "A"), ("shop", "bakery"), ("name", "B")].into_iter(),
        );
        assert_eq!(
            tags,
            vec![
                ("name".to_string(), "B".to_string()),
                ("shop".to_string(), "bakery".to_string())
            ]
        );
    }

    #[test]
    fn picks_reader_by_extension() {
        assert!(is_pbf(Path::new("extract.osm.pbf")));
        assert!(is_pbf(Path::new("EXTRACT.PBF")));
        assert!(!is_pbf(Path::new("extract.osm")));
        assert!(!is_pbf(Path::new("extract")));
    }

    #[test]
    fn loads_xml_file_into_store() {
        let mut file = tempfile::NamedTempFile::with_suffix(".osm").unwrap();
        write!(
            file,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="1" lat="1.0" lon="2.0"/>
  <node id="2" lat="1.5" lon="2.5"/>
  <way id="3"><nd ref="1"/><nd ref="2"/></way>
  <relation id="4"><member type="way" ref="3" role=""/></relation>
</osm>"#
        )
        .unwrap();

        let store = load_store(file.path()).unwrap();
        assert_eq!(store.counts(), (2, 1, 1));
    }

    #[test]
    fn missing_input_is_an_error() {
        assert!(load_store(Path::new("/nonexistent/extract.osm")).is_err());
        assert!(load_store(Path::new("/nonexistent/extract.osm.pbf")).is_err());
    }
}
