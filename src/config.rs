use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// Knobs for map loading. Every field has a default, so a partial JSON object is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Name of the tile layer treated as the midground (collision) layer.
    pub midground_layer: String,
    /// Suffix of the registry key synthesized for embedded tilesets.
    pub embedded_suffix: String,
    /// Reject documents whose tileset `firstgid`s do not strictly ascend. When off,
    /// such documents load with a warning and the reverse-scan attribution as-is.
    pub strict_tileset_order: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            midground_layer: "Midground".to_owned(),
            embedded_suffix: ".embedded".to_owned(),
            strict_tileset_order: false,
        }
    }
}

impl LoadOptions {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, MapError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let path = path.as_ref();
        let txt = std::fs::read_to_string(path).map_err(|source| MapError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&txt)
    }
}
