//! The three OSM primitives served by the query API.

use geo_types::Coord;
use std::fmt;

use crate::metadata::Meta;

// Coordinates are kept as fixed precision integers (deg * 10^7), the precision
// OSM itself stores.
pub const SCALE_FACTOR: f64 = 10_000_000.0;

pub type Tags = Vec<(String, String)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    /// Element name in the OSM XML document.
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::Node => "node",
            ElementKind::Way => "way",
            ElementKind::Relation => "relation",
        }
    }

    /// Single-letter member type code used in relation member tables.
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_uppercase() {
            'N' => Some(ElementKind::Node),
            'W' => Some(ElementKind::Way),
            'R' => Some(ElementKind::Relation),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "node" => Some(ElementKind::Node),
            "way" => Some(ElementKind::Way),
            "relation" => Some(ElementKind::Relation),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ElementKind::Node => "Node",
            ElementKind::Way => "Way",
            ElementKind::Relation => "Relation",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub meta: Meta,
    pub lon: i32,
    pub lat: i32,
    pub tags: Tags,
}

impl Node {
    pub fn new(id: i64, meta: Meta, lon: f64, lat: f64, tags: Tags) -> Self {
        Self {
            id,
            meta,
            lon: to_fixed(lon),
            lat: to_fixed(lat),
            tags,
        }
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: self.lon as f64 / SCALE_FACTOR,
            y: self.lat as f64 / SCALE_FACTOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: i64,
    pub meta: Meta,
    pub tags: Tags,
    pub refs: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub kind: ElementKind,
    pub id: i64,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: i64,
    pub meta: Meta,
    pub tags: Tags,
    pub members: Vec<Member>,
}

pub fn to_fixed(degrees: f64) -> i32 {
    (degrees * SCALE_FACTOR).round() as i32
}

/// Render a fixed precision coordinate without trailing zeros (`-0.1277583`, `51.5`).
pub fn format_fixed(value: i32) -> String {
    let sign = if value < 0 { "-" } else { "" };
    let abs = i64::from(value).abs();
    let whole = abs / 10_000_000;
    let frac = abs % 10_000_000;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let digits = format!("{frac:07}");
    format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
}
