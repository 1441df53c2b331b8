use anyhow::{Context, Result, anyhow};
use crossbeam_channel::bounded;
use osmpbf::{BlobDecode, BlobReader, Element, RelMember, RelMemberType};
use rayon::prelude::*;
use std::path::Path;

use super::{Primitive, Progress, collect_tags};
use crate::elements::{ElementKind, Member, Node, Relation, Way};
use crate::metadata::{meta_from_dense_info, meta_from_info};
use crate::storage::StoreWriter;

/// Decode blobs on the rayon pool and fan the primitives in to a single
/// writer thread that owns the store.
pub fn read_pbf(path: &Path) -> Result<StoreWriter> {
    let reader = BlobReader::from_path(path)
        .with_context(|| format!("Ingest: Failed to open {:?}", path))?;
    let (tx, rx) = bounded::<Vec<Primitive>>(64);

    let writer = std::thread::spawn(move || -> StoreWriter {
        let mut store = StoreWriter::new();
        let mut progress = Progress::default();
        for batch in rx {
            for primitive in batch {
                progress.record(&primitive);
                primitive.store(&mut store);
            }
        }
        progress.log();
        store
    });

    let decode_result = reader
        .par_bridge()
        .try_for_each(|blob_result| -> Result<()> {
            let blob = blob_result?;
            match blob.decode() {
                Ok(BlobDecode::OsmHeader(_)) => Ok(()),
                Ok(BlobDecode::OsmData(block)) => {
                    let batch = block
                        .elements()
                        .map(primitive)
                        .collect::<Result<Vec<_>>>()?;
                    if !batch.is_empty() {
                        tx.send(batch).map_err(|err| {
                            anyhow!("Ingest: Failed to send element batch: {}", err)
                        })?;
                    }
                    Ok(())
                }
                Ok(BlobDecode::Unknown(unknown)) => {
                    tracing::info!("Unknown blob: {}", unknown);
                    Ok(())
                }
                Err(error) => Err(error.into()),
            }
        });

    drop(tx);

    let store = match writer.join() {
        Ok(store) => store,
        Err(panic_payload) => {
            let panic_msg = panic_payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            return Err(anyhow!("Ingest: Store writer thread panicked: {}", panic_msg));
        }
    };

    decode_result.with_context(|| format!("Ingest: Failed to decode {:?}", path))?;
    Ok(store)
}

fn primitive(element: Element<'_>) -> Result<Primitive> {
    let primitive = match element {
        Element::Node(node) => Primitive::Node(Node::new(
            node.id(),
            meta_from_info(&node.info()),
            node.lon(),
            node.lat(),
            collect_tags(node.tags()),
        )),
        Element::DenseNode(node) => Primitive::Node(Node::new(
            node.id(),
            node.info().map(meta_from_dense_info).unwrap_or_default(),
            node.lon(),
            node.lat(),
            collect_tags(node.tags()),
        )),
        Element::Way(way) => Primitive::Way(Way {
            id: way.id(),
            meta: meta_from_info(&way.info()),
            tags: collect_tags(way.tags()),
            refs: way.refs().collect(),
        }),
        Element::Relation(relation) => {
            let members = relation
                .members()
                .map(member)
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("Ingest: relation {}", relation.id()))?;
            Primitive::Relation(Relation {
                id: relation.id(),
                meta: meta_from_info(&relation.info()),
                tags: collect_tags(relation.tags()),
                members,
            })
        }
    };
    Ok(primitive)
}

fn member(member: RelMember<'_>) -> Result<Member> {
    let kind = match member.member_type {
        RelMemberType::Node => ElementKind::Node,
        RelMemberType::Way => ElementKind::Way,
        RelMemberType::Relation => ElementKind::Relation,
    };
    let role = member
        .role()
        .with_context(|| format!("Failed to decode role of member {}", member.member_id))?;
    Ok(Member {
        kind,
        id: member.member_id,
        role: role.to_string(),
    })
}
