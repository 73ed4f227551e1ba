use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_PACKAGE_API_URL: &str =
    "https://ckan0.cf.opendata.inter.prod-toronto.ca/api/3/action/package_show";
pub const DEFAULT_PACKAGE_ID: &str = "ttc-routes-and-schedules";
pub const DEFAULT_OUTPUT_FILE: &str = "stops.csv";

/// Where to look up the current schedule archive.
///
/// Stored as a JSON object on disk, every field optional:
/// ```json
/// {
///   "api_url": "https://ckan0.cf.opendata.inter.prod-toronto.ca/api/3/action/package_show",
///   "package_id": "ttc-routes-and-schedules"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub api_url: String,
    pub package_id: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_PACKAGE_API_URL.to_string(),
            package_id: DEFAULT_PACKAGE_ID.to_string(),
        }
    }
}

impl SourceConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading config '{path}'"))?;
        serde_json::from_str(&content).with_context(|| format!("parsing config '{path}'"))
    }

    /// Loads `path` if given, else the defaults, then applies explicit overrides.
    pub fn resolve(
        path: Option<&str>,
        api_url: Option<String>,
        package_id: Option<String>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(api_url) = api_url {
            config.api_url = api_url;
        }
        if let Some(package_id) = package_id {
            config.package_id = package_id;
        }
        Ok(config)
    }
}
