//! Evaluation of compiled predicates against stored elements.

use anyhow::{Result, bail};
use geo::Intersects;
use geo_types::{Coord, Rect, coord};

use crate::elements::Tags;
use crate::metadata::Meta;
use crate::query::{CompiledPredicate, GeometryColumn, Predicate};

pub(crate) enum Geometry<'a> {
    Point(Coord<f64>),
    /// `None` when none of the way's nodes could be resolved.
    Envelope(Option<&'a Rect<f64>>),
    Absent,
}

/// The columns of one stored element a predicate can test.
pub(crate) struct Candidate<'a> {
    pub id: i64,
    pub meta: &'a Meta,
    pub tags: &'a Tags,
    pub geometry: Geometry<'a>,
}

pub(crate) fn evaluate(compiled: &CompiledPredicate, candidate: &Candidate) -> Result<bool> {
    eval(&compiled.predicate, compiled, candidate)
}

fn eval(predicate: &Predicate, bound: &CompiledPredicate, candidate: &Candidate) -> Result<bool> {
    Ok(match predicate {
        Predicate::False => false,

        Predicate::And(terms) => {
            for term in terms {
                if !eval(term, bound, candidate)? {
                    return Ok(false);
                }
            }
            true
        }

        Predicate::Or(terms) => {
            for term in terms {
                if eval(term, bound, candidate)? {
                    return Ok(true);
                }
            }
            false
        }

        Predicate::IdIn(ids) => bound.id_list(*ids)?.contains(&candidate.id),

        Predicate::OwnerEquals(uid) => candidate.meta.uid == bound.int(*uid)?,

        Predicate::ChangesetEquals(id) => candidate.meta.changeset == bound.int(*id)?,

        Predicate::Intersects { column, envelope } => {
            let [left, bottom, right, top] = envelope.map(|p| bound.float(p));
            let area = Rect::new(
                coord! { x: left?, y: bottom? },
                coord! { x: right?, y: top? },
            );
            match (column, &candidate.geometry) {
                (GeometryColumn::NodeGeom, Geometry::Point(point)) => area.intersects(point),
                (GeometryColumn::WayPath, Geometry::Envelope(Some(path))) => {
                    area.intersects(*path)
                }
                (GeometryColumn::WayPath, Geometry::Envelope(None)) => false,
                (column, _) => bail!(
                    "Store: column {} does not exist for element {}",
                    column.column_name(),
                    candidate.id
                ),
            }
        }

        Predicate::HasKey(key) => {
            let key = bound.text(*key)?;
            candidate.tags.iter().any(|(k, _)| k == key)
        }

        Predicate::HasTag { key, value } => {
            let key = bound.text(*key)?;
            let value = bound.text(*value)?;
            candidate.tags.iter().any(|(k, v)| k == key && v == value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse_predicate;
    use crate::elements::ElementKind;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn node_candidate<'a>(meta: &'a Meta, tags: &'a Tags, x: f64, y: f64) -> Candidate<'a> {
        Candidate {
            id: 1,
            meta,
            tags,
            geometry: Geometry::Point(coord! { x: x, y: y }),
        }
    }

    fn matches(predicate: &str, candidate: &Candidate, kind: ElementKind) -> bool {
        let compiled = CompiledPredicate::compile(&parse_predicate(predicate).unwrap(), kind).unwrap();
        evaluate(&compiled, candidate).unwrap()
    }

    #[test]
    fn key_a_or_b_and_other_present() {
        let meta = Meta::default();
        let both = tags(&[("key", "b"), ("other", "anything")]);
        let missing_other = tags(&[("key", "a")]);
        let wrong_value = tags(&[("key", "c"), ("other", "x")]);

        let predicate = "[key=a|b][other=*]";
        assert!(matches(predicate, &node_candidate(&meta, &both, 0.0, 0.0), ElementKind::Node));
        assert!(!matches(predicate, &node_candidate(&meta, &missing_other, 0.0, 0.0), ElementKind::Node));
        assert!(!matches(predicate, &node_candidate(&meta, &wrong_value, 0.0, 0.0), ElementKind::Node));
    }

    #[test]
    fn bbox_includes_its_boundary() {
        let meta = Meta::default();
        let empty = Tags::new();
        assert!(matches("[bbox=0,0,1,1]", &node_candidate(&meta, &empty, 1.0, 0.5), ElementKind::Node));
        assert!(!matches("[bbox=0,0,1,1]", &node_candidate(&meta, &empty, 1.1, 0.5), ElementKind::Node));
    }

    #[test]
    fn way_without_resolved_nodes_never_intersects() {
        let meta = Meta::default();
        let empty = Tags::new();
        let candidate = Candidate {
            id: 9,
            meta: &meta,
            tags: &empty,
            geometry: Geometry::Envelope(None),
        };
        assert!(!matches("[bbox=-180,-90,180,90]", &candidate, ElementKind::Way));
    }

    #[test]
    fn geometry_column_mismatch_is_an_error() {
        let meta = Meta::default();
        let empty = Tags::new();
        let candidate = node_candidate(&meta, &empty, 0.0, 0.0);
        let compiled = CompiledPredicate::compile(
            &parse_predicate("[bbox=0,0,1,1]").unwrap(),
            ElementKind::Way,
        )
        .unwrap();
        assert!(evaluate(&compiled, &candidate).is_err());
    }
}
