use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub document: DocumentConfig,
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Attributes of the `<osm>` root element.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct DocumentConfig {
    pub generator: String,
    pub copyright: String,
    pub attribution: String,
    pub license: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            generator: "xapi".to_string(),
            copyright: "OpenStreetMap and contributors".to_string(),
            attribution: "http://www.openstreetmap.org/copyright".to_string(),
            license: "http://opendatacommons.org/licenses/odbl/1-0/".to_string(),
        }
    }
}
