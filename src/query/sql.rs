//! Rendering of compiled predicates as PostGIS/hstore parameterized SQL.
//!
//! Values never appear in the text; every value is a `$n` placeholder whose
//! position matches [`CompiledPredicate::params`].

use super::predicate::{CompiledPredicate, Placeholder, Predicate};
use crate::elements::ElementKind;

fn table_name(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Node => "nodes",
        ElementKind::Way => "ways",
        ElementKind::Relation => "relations",
    }
}

impl CompiledPredicate {
    pub fn to_sql(&self, kind: ElementKind) -> String {
        format!(
            "SELECT * FROM {} WHERE {} ORDER BY id",
            table_name(kind),
            render(&self.predicate)
        )
    }
}

fn slot(placeholder: Placeholder) -> String {
    format!("${}", placeholder.0 + 1)
}

fn render(predicate: &Predicate) -> String {
    match predicate {
        Predicate::False => "FALSE".to_string(),
        Predicate::And(terms) if terms.is_empty() => "TRUE".to_string(),
        Predicate::And(terms) => terms.iter().map(render).collect::<Vec<_>>().join(" AND "),
        Predicate::Or(terms) if terms.is_empty() => "FALSE".to_string(),
        Predicate::Or(terms) => format!(
            "({})",
            terms.iter().map(render).collect::<Vec<_>>().join(" OR ")
        ),
        Predicate::IdIn(ids) => format!("id = ANY({})", slot(*ids)),
        Predicate::OwnerEquals(uid) => format!("user_id = {}", slot(*uid)),
        Predicate::ChangesetEquals(id) => format!("changeset_id = {}", slot(*id)),
        Predicate::Intersects { column, envelope } => format!(
            "ST_Intersects({}, ST_MakeEnvelope({}, {}, {}, {}, 4326))",
            column.column_name(),
            slot(envelope[0]),
            slot(envelope[1]),
            slot(envelope[2]),
            slot(envelope[3])
        ),
        Predicate::HasKey(key) => format!("(tags ? {})", slot(*key)),
        Predicate::HasTag { key, value } => {
            format!("(tags @> hstore({}, {}))", slot(*key), slot(*value))
        }
    }
}
