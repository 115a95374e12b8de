//! Scene files.

use common::error::FluidResult;
use fluid::{Blob, EngineOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine options plus the blobs to add, in paint order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scene {
    pub options: EngineOptions,
    pub blobs: Vec<Blob>,
}

impl Scene {
    pub fn from_json(json: &str) -> FluidResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a scene from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> FluidResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> FluidResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
