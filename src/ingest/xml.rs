use anyhow::{Context, Result, anyhow, bail};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;
use std::str::FromStr;

use super::{Primitive, Progress, push_tag};
use crate::elements::{ElementKind, Member, Node, Relation, Tags, Way};
use crate::metadata::{Meta, parse_timestamp_millis};
use crate::storage::StoreWriter;

pub fn read_xml(path: &Path) -> Result<StoreWriter> {
    let reader = Reader::from_file(path)
        .with_context(|| format!("Ingest: Failed to open {:?}", path))?;
    let mut writer = StoreWriter::new();
    parse(reader, &mut writer).with_context(|| format!("Ingest: Failed to read {:?}", path))?;
    Ok(writer)
}

/// Stream `<node>`, `<way>` and `<relation>` elements into `writer`.
fn parse<R: BufRead>(mut reader: Reader<R>, writer: &mut StoreWriter) -> Result<()> {
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut current: Option<Primitive> = None;
    let mut progress = Progress::default();

    loop {
        match reader
            .read_event_into(&mut buf)
            .with_context(|| format!("XML error at byte {}", reader.buffer_position()))?
        {
            Event::Start(start) => open(&start, &mut current)?,
            Event::Empty(start) => {
                open(&start, &mut current)?;
                close(start.name().as_ref(), &mut current, writer, &mut progress);
            }
            Event::End(end) => close(end.name().as_ref(), &mut current, writer, &mut progress),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(primitive) = current {
        bail!("Unterminated <{}> at end of input", primitive_name(&primitive));
    }
    progress.log();
    Ok(())
}

fn open(start: &BytesStart<'_>, current: &mut Option<Primitive>) -> Result<()> {
    match start.name().as_ref() {
        b"node" => {
            let attrs = attributes(start)?;
            let id = required(&attrs, "id", "node")?;
            let lat: f64 = required(&attrs, "lat", "node")?;
            let lon: f64 = required(&attrs, "lon", "node")?;
            *current = Some(Primitive::Node(Node::new(
                id,
                meta(&attrs)?,
                lon,
                lat,
                Tags::new(),
            )));
        }
        b"way" => {
            let attrs = attributes(start)?;
            *current = Some(Primitive::Way(Way {
                id: required(&attrs, "id", "way")?,
                meta: meta(&attrs)?,
                tags: Tags::new(),
                refs: Vec::new(),
            }));
        }
        b"relation" => {
            let attrs = attributes(start)?;
            *current = Some(Primitive::Relation(Relation {
                id: required(&attrs, "id", "relation")?,
                meta: meta(&attrs)?,
                tags: Tags::new(),
                members: Vec::new(),
            }));
        }
        b"tag" => {
            let attrs = attributes(start)?;
            let key = attrs.get("k").map(String::as_str).unwrap_or_default();
            let value = attrs.get("v").map(String::as_str).unwrap_or_default();
            match current {
                Some(Primitive::Node(node)) => push_tag(&mut node.tags, key, value),
                Some(Primitive::Way(way)) => push_tag(&mut way.tags, key, value),
                Some(Primitive::Relation(relation)) => push_tag(&mut relation.tags, key, value),
                None => {}
            }
        }
        b"nd" => {
            if let Some(Primitive::Way(way)) = current {
                let attrs = attributes(start)?;
                way.refs.push(required(&attrs, "ref", "nd")?);
            }
        }
        b"member" => {
            if let Some(Primitive::Relation(relation)) = current {
                let attrs = attributes(start)?;
                let member_type = attrs.get("type").map(String::as_str).unwrap_or_default();
                let kind = member_kind(member_type).ok_or_else(|| {
                    anyhow!(
                        "relation {} has a member of unknown type '{}'",
                        relation.id,
                        member_type
                    )
                })?;
                relation.members.push(Member {
                    kind,
                    id: required(&attrs, "ref", "member")?,
                    role: attrs.get("role").cloned().unwrap_or_default(),
                });
            }
        }
        _ => {}
    }
    Ok(())
}

fn close(
    name: &[u8],
    current: &mut Option<Primitive>,
    writer: &mut StoreWriter,
    progress: &mut Progress,
) {
    if matches!(name, b"node" | b"way" | b"relation")
        && let Some(primitive) = current.take()
    {
        progress.record(&primitive);
        primitive.store(writer);
    }
}

fn primitive_name(primitive: &Primitive) -> &'static str {
    match primitive {
        Primitive::Node(_) => "node",
        Primitive::Way(_) => "way",
        Primitive::Relation(_) => "relation",
    }
}

/// Member types are written out in full, but single-letter codes are accepted.
fn member_kind(value: &str) -> Option<ElementKind> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(code), None) => ElementKind::from_code(code),
        _ => ElementKind::from_name(value),
    }
}

fn attributes(start: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        attrs.insert(key, attr.unescape_value()?.into_owned());
    }
    Ok(attrs)
}

fn optional<T: FromStr>(attrs: &HashMap<String, String>, name: &str) -> Result<Option<T>> {
    attrs
        .get(name)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| anyhow!("invalid {} '{}'", name, value))
        })
        .transpose()
}

fn required<T: FromStr>(attrs: &HashMap<String, String>, name: &str, element: &str) -> Result<T> {
    optional(attrs, name)?.ok_or_else(|| anyhow!("<{}> without {}", element, name))
}

fn meta(attrs: &HashMap<String, String>) -> Result<Meta> {
    let timestamp = match attrs.get("timestamp") {
        Some(value) => parse_timestamp_millis(value)
            .ok_or_else(|| anyhow!("invalid timestamp '{}'", value))?,
        None => 0,
    };
    Ok(Meta {
        version: optional(attrs, "version")?.unwrap_or(0),
        changeset: optional(attrs, "changeset")?.unwrap_or(0),
        uid: optional(attrs, "uid")?.unwrap_or(0),
        user: attrs.get("user").filter(|user| !user.is_empty()).cloned(),
        timestamp,
        visible: attrs.get("visible").is_none_or(|value| value != "false"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FeatureStore, MemoryStore};

    fn load(xml: &str) -> Result<MemoryStore> {
        let mut writer = StoreWriter::new();
        parse(Reader::from_str(xml), &mut writer)?;
        Ok(writer.finalize())
    }

    #[test]
    fn reads_elements_with_metadata() {
        let store = load(
            r#"<osm version="0.6">
  <bounds minlat="0" minlon="0" maxlat="1" maxlon="1"/>
  <node id="1" version="3" changeset="42" uid="7" user="ada &amp; co" visible="true"
        timestamp="2012-03-04T05:06:07Z" lat="51.5" lon="-0.125">
    <tag k="amenity" v="cafe"/>
  </node>
  <node id="2" lat="51.6" lon="-0.1"/>
  <way id="10" version="1">
    <nd ref="1"/>
    <nd ref="2"/>
    <tag k="highway" v="service"/>
  </way>
  <relation id="20">
    <member type="way" ref="10" role="outer"/>
    <member type="N" ref="1" role=""/>
  </relation>
</osm>"#,
        )
        .unwrap();
        assert_eq!(store.counts(), (2, 1, 1));

        let session = store.open_session().unwrap();
        let node = session.node(1).unwrap().unwrap();
        assert_eq!(node.meta.version, 3);
        assert_eq!(node.meta.changeset, 42);
        assert_eq!(node.meta.uid, 7);
        assert_eq!(node.meta.user.as_deref(), Some("ada & co"));
        assert_eq!(node.meta.timestamp, 1_330_837_567_000);
        assert_eq!((node.lat, node.lon), (515_000_000, -1_250_000));
        assert_eq!(node.tags, vec![("amenity".to_string(), "cafe".to_string())]);

        let way = session.way(10).unwrap().unwrap();
        assert_eq!(way.refs, vec![1, 2]);
        assert_eq!(way.tags.len(), 1);

        let relation = session.relation(20).unwrap().unwrap();
        assert_eq!(relation.members.len(), 2);
        assert_eq!(relation.members[1].kind, ElementKind::Node);
        assert_eq!(relation.members[0].role, "outer");
    }

    #[test]
    fn unknown_member_type_rejects_input() {
        let err = load(
            r#"<osm><relation id="5"><member type="area" ref="1" role=""/></relation></osm>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown type 'area'"), "{err:#}");
    }

    #[test]
    fn node_without_coordinates_is_an_error() {
        let err = load(r#"<osm><node id="5" lat="1"/></osm>"#).unwrap_err();
        assert!(err.to_string().contains("<node> without lon"), "{err:#}");
    }

    #[test]
    fn invisible_elements_keep_their_flag() {
        let store = load(r#"<osm><way id="8" visible="false"/></osm>"#).unwrap();
        let way = store.open_session().unwrap().way(8).unwrap().unwrap();
        assert!(!way.meta.visible);
        assert!(way.refs.is_empty());
    }
}
