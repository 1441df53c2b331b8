use osmpbf::{DenseNodeInfo, Info};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Versioning attributes shared by nodes, ways and relations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub version: i64,
    pub changeset: i64,
    pub uid: i64,
    pub user: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub visible: bool,
}

pub fn meta_from_info(info: &Info) -> Meta {
    Meta {
        version: info.version().map(i64::from).unwrap_or(0),
        changeset: info.changeset().unwrap_or(0),
        uid: info.uid().map(i64::from).unwrap_or(0),
        user: info
            .user()
            .and_then(|user| user.ok())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
        timestamp: info.milli_timestamp().unwrap_or(0),
        visible: info.visible(),
    }
}

pub fn meta_from_dense_info(info: &DenseNodeInfo) -> Meta {
    Meta {
        version: i64::from(info.version()),
        changeset: info.changeset(),
        uid: i64::from(info.uid()),
        user: info
            .user()
            .ok()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
        timestamp: info.milli_timestamp(),
        visible: info.visible(),
    }
}

pub fn format_timestamp_millis(millis: i64) -> Option<String> {
    let nanos = i128::from(millis) * 1_000_000;
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
    dt.format(&Rfc3339).ok()
}

pub fn parse_timestamp_millis(value: &str) -> Option<i64> {
    let dt = OffsetDateTime::parse(value, &Rfc3339).ok()?;
    i64::try_from(dt.unix_timestamp_nanos() / 1_000_000).ok()
}
