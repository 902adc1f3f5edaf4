//! Export options

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use xrobject_core::{Error, Result};

/// Object export options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectExportOptions {
    /// Embed motions of the object's motion collection
    pub export_motions: bool,
    /// Derive texture names from image paths instead of texture datablock names
    pub texname_from_path: bool,
    /// Game textures root, stripped from image paths
    pub textures_folder: String,
    /// Write motion references as one comma-joined string (SoC layout)
    pub soc_sgroups: bool,
}

impl Default for ObjectExportOptions {
    fn default() -> Self {
        Self {
            export_motions: true,
            texname_from_path: true,
            textures_folder: String::new(),
            soc_sgroups: false,
        }
    }
}

impl ObjectExportOptions {
    /// Load options from a JSON file; missing keys keep their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
