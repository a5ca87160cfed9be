use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{OutlineError, Result};

pub const DEFAULT_TYPE_ATTRIBUTE: &str = "type";
pub const DEFAULT_SEARCH_TYPE: &str = "search";
pub const DEFAULT_QUERY_ATTRIBUTE: &str = "query";

/// Attribute keys that mark a node as a search node and carry its query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub type_attribute: String,
    pub search_type: String,
    pub query_attribute: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            type_attribute: DEFAULT_TYPE_ATTRIBUTE.to_string(),
            search_type: DEFAULT_SEARCH_TYPE.to_string(),
            query_attribute: DEFAULT_QUERY_ATTRIBUTE.to_string(),
        }
    }
}

impl SearchConfig {
    pub fn from_json_str(data: &str) -> Result<Self> {
        serde_json::from_str(data)
            .map_err(|error| OutlineError::Config(format!("failed to parse search config: {error}")))
    }

    /// Loads a config file, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("search config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data).map_err(|error| match error {
            OutlineError::Config(message) => {
                OutlineError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }
}
