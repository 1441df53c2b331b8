//! Streams the match sets of a request as one OSM XML document.

mod xml;

use anyhow::{Context, Result, anyhow};
use std::collections::btree_set;
use std::io::Write;

use crate::closure::MatchSets;
use crate::config::DocumentConfig;
use crate::error::QueryError;
use crate::storage::StoreSession;

pub const CONTENT_TYPE: &str = "text/xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Header,
    Nodes,
    Ways,
    Relations,
    Footer,
    Done,
}

/// Forward-only sequence of document fragments: the header, one fragment per
/// element (nodes, then ways, then relations, each by ascending id), and the
/// footer.
///
/// Elements are fetched from the session one at a time as the stream is
/// pulled. The session is released as soon as the stream ends, fails, or is
/// dropped.
pub struct DocumentStream<'s> {
    session: Option<Box<dyn StoreSession + 's>>,
    header: String,
    nodes: btree_set::IntoIter<i64>,
    ways: btree_set::IntoIter<i64>,
    relations: btree_set::IntoIter<i64>,
    phase: Phase,
}

impl<'s> DocumentStream<'s> {
    pub fn new(
        session: Box<dyn StoreSession + 's>,
        sets: MatchSets,
        config: &DocumentConfig,
    ) -> Self {
        Self {
            session: Some(session),
            header: xml::header(config),
            nodes: sets.nodes.into_iter(),
            ways: sets.ways.into_iter(),
            relations: sets.relations.into_iter(),
            phase: Phase::Header,
        }
    }

    fn release(&mut self) {
        self.phase = Phase::Done;
        self.session.take();
    }

    fn render_next(&mut self) -> Option<Result<String>> {
        loop {
            let session = self.session.as_deref()?;
            match self.phase {
                Phase::Header => {
                    self.phase = Phase::Nodes;
                    return Some(Ok(std::mem::take(&mut self.header)));
                }
                Phase::Nodes => match self.nodes.next() {
                    Some(id) => {
                        return Some(session.node(id).and_then(|node| {
                            node.map(|node| xml::render_node(&node))
                                .ok_or_else(|| anyhow!("node {id} disappeared from the store"))
                        }));
                    }
                    None => self.phase = Phase::Ways,
                },
                Phase::Ways => match self.ways.next() {
                    Some(id) => {
                        return Some(session.way(id).and_then(|way| {
                            way.map(|way| xml::render_way(&way))
                                .ok_or_else(|| anyhow!("way {id} disappeared from the store"))
                        }));
                    }
                    None => self.phase = Phase::Relations,
                },
                Phase::Relations => match self.relations.next() {
                    Some(id) => {
                        return Some(session.relation(id).and_then(|relation| {
                            relation
                                .map(|relation| xml::render_relation(&relation))
                                .ok_or_else(|| anyhow!("relation {id} disappeared from the store"))
                        }));
                    }
                    None => self.phase = Phase::Footer,
                },
                Phase::Footer => {
                    self.release();
                    return Some(Ok(xml::FOOTER.to_string()));
                }
                Phase::Done => return None,
            }
        }
    }
}

impl Iterator for DocumentStream<'_> {
    type Item = Result<String, QueryError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.render_next()? {
            Ok(fragment) => Some(Ok(fragment)),
            Err(err) => {
                self.release();
                Some(Err(QueryError::Storage(err)))
            }
        }
    }
}

/// Drain `stream` into `writer`, returning the number of fragments written.
///
/// A storage failure part way through leaves a truncated document behind;
/// bytes already written cannot be taken back.
pub fn write_document<W: Write>(stream: DocumentStream<'_>, writer: &mut W) -> Result<usize> {
    let mut fragments = 0usize;
    for fragment in stream {
        let fragment = fragment?;
        writer
            .write_all(fragment.as_bytes())
            .context("Document: Failed to write fragment")?;
        fragments += 1;
    }
    writer.flush().context("Document: Failed to flush output")?;
    Ok(fragments)
}
