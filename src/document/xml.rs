//! OSM API 0.6 XML fragments.

use quick_xml::escape::escape;
use std::fmt::Write;

use crate::config::DocumentConfig;
use crate::elements::{Node, Relation, Tags, Way, format_fixed};
use crate::metadata::{Meta, format_timestamp_millis};

pub const FOOTER: &str = "</osm>\n";

pub fn header(config: &DocumentConfig) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <osm version=\"0.6\" generator=\"{}\" copyright=\"{}\" attribution=\"{}\" license=\"{}\">\n",
        escape(config.generator.as_str()),
        escape(config.copyright.as_str()),
        escape(config.attribution.as_str()),
        escape(config.license.as_str()),
    )
}

pub fn render_node(node: &Node) -> String {
    let mut out = format!(
        "  <node id=\"{}\" version=\"{}\" changeset=\"{}\" lat=\"{}\" lon=\"{}\"",
        node.id,
        node.meta.version,
        node.meta.changeset,
        format_fixed(node.lat),
        format_fixed(node.lon)
    );
    push_meta(&mut out, &node.meta);

    if node.tags.is_empty() {
        out.push_str("/>\n");
        return out;
    }
    out.push_str(">\n");
    push_tags(&mut out, &node.tags);
    out.push_str("  </node>\n");
    out
}

pub fn render_way(way: &Way) -> String {
    let mut out = format!(
        "  <way id=\"{}\" version=\"{}\" changeset=\"{}\"",
        way.id, way.meta.version, way.meta.changeset
    );
    push_meta(&mut out, &way.meta);

    if way.tags.is_empty() && way.refs.is_empty() {
        out.push_str("/>\n");
        return out;
    }
    out.push_str(">\n");
    push_tags(&mut out, &way.tags);
    for node_ref in &way.refs {
        let _ = writeln!(out, "    <nd ref=\"{node_ref}\"/>");
    }
    out.push_str("  </way>\n");
    out
}

pub fn render_relation(relation: &Relation) -> String {
    let mut out = format!(
        "  <relation id=\"{}\" version=\"{}\" changeset=\"{}\"",
        relation.id, relation.meta.version, relation.meta.changeset
    );
    push_meta(&mut out, &relation.meta);

    if relation.tags.is_empty() && relation.members.is_empty() {
        out.push_str("/>\n");
        return out;
    }
    out.push_str(">\n");
    push_tags(&mut out, &relation.tags);
    for member in &relation.members {
        let _ = writeln!(
            out,
            "    <member type=\"{}\" ref=\"{}\" role=\"{}\"/>",
            member.kind.name(),
            member.id,
            escape(member.role.as_str())
        );
    }
    out.push_str("  </relation>\n");
    out
}

fn push_meta(out: &mut String, meta: &Meta) {
    let _ = write!(out, " uid=\"{}\"", meta.uid);
    if let Some(user) = &meta.user {
        let _ = write!(out, " user=\"{}\"", escape(user.as_str()));
    }
    let _ = write!(out, " visible=\"{}\"", meta.visible);
    if let Some(timestamp) = format_timestamp_millis(meta.timestamp) {
        let _ = write!(out, " timestamp=\"{timestamp}\"");
    }
}

fn push_tags(out: &mut String, tags: &Tags) {
    for (key, value) in tags {
        let _ = writeln!(
            out,
            "    <tag k=\"{}\" v=\"{}\"/>",
            escape(key.as_str()),
            escape(value.as_str())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{node, relation, way};
    use crate::elements::ElementKind;

    #[test]
    fn node_with_tags_nests_them_in_order() {
        let rendered = render_node(&node(1, -0.1277583, 51.5073509, &[("name", "Q"), ("amenity", "cafe")]));
        assert_eq!(
            rendered,
            "  <node id=\"1\" version=\"1\" changeset=\"100\" lat=\"51.5073509\" lon=\"-0.1277583\" \
             uid=\"1\" visible=\"true\" timestamp=\"2010-01-01T00:00:00Z\">\n\
             \x20   <tag k=\"name\" v=\"Q\"/>\n\
             \x20   <tag k=\"amenity\" v=\"cafe\"/>\n\
             \x20 </node>\n"
        );
    }

    #[test]
    fn bare_elements_self_close() {
        assert!(render_node(&node(2, 0.0, 0.0, &[])).ends_with("timestamp=\"2010-01-01T00:00:00Z\"/>\n"));
        assert!(render_way(&way(3, &[], &[])).ends_with("/>\n"));
        assert!(render_relation(&relation(4, &[])).contains("<tag k=\"type\""));
    }

    #[test]
    fn relation_without_tags_or_members_self_closes() {
        let mut bare = relation(4, &[]);
        bare.tags.clear();

        let rendered = render_relation(&bare);
        assert!(rendered.starts_with("  <relation id=\"4\" version=\"1\""));
        assert!(rendered.ends_with("timestamp=\"2010-01-01T00:00:00Z\"/>\n"));
        assert!(!rendered.contains("</relation>"));
    }

    #[test]
    fn way_lists_refs_after_tags() {
        let rendered = render_way(&way(10, &[1, 2, 1], &[("highway", "service")]));
        let tag = rendered.find("<tag").unwrap();
        let refs: Vec<_> = rendered.match_indices("<nd ref=").map(|(at, _)| at).collect();
        assert_eq!(refs.len(), 3);
        assert!(refs.iter().all(|at| *at > tag));
        assert!(rendered.contains("<nd ref=\"2\"/>"));
    }

    #[test]
    fn members_use_canonical_type_names() {
        let rendered = render_relation(&relation(
            5,
            &[
                (ElementKind::Node, 1, "stop"),
                (ElementKind::Way, 2, ""),
                (ElementKind::Relation, 3, "sub"),
            ],
        ));
        assert!(rendered.contains("<member type=\"node\" ref=\"1\" role=\"stop\"/>"));
        assert!(rendered.contains("<member type=\"way\" ref=\"2\" role=\"\"/>"));
        assert!(rendered.contains("<member type=\"relation\" ref=\"3\" role=\"sub\"/>"));
    }

    #[test]
    fn escapes_attribute_values() {
        let rendered = render_node(&node(1, 0.0, 0.0, &[("name", "Fish & \"Chips\" <Ltd>")]));
        assert!(rendered.contains("v=\"Fish &amp; &quot;Chips&quot; &lt;Ltd&gt;\""));
    }

    #[test]
    fn header_carries_attribution() {
        let header = header(&DocumentConfig::default());
        assert!(header.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<osm version=\"0.6\""));
        assert!(header.contains("generator=\"xapi\""));
        assert!(header.contains("license=\"http://opendatacommons.org/licenses/odbl/1-0/\""));
    }
}
