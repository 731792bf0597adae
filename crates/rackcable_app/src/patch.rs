// SPDX-License-Identifier: MIT OR Apache-2.0
//! Patch files: the modules of a rack and the cables between them.

use crate::layout::layout_ports;
use rackcable_core::engine::EngineError;
use rackcable_core::{CableSettings, Engine, LoadReport, ModuleId, PatchCable, Rack};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Patch loading errors
#[derive(Debug, Error)]
pub enum PatchError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The module list itself is invalid
    #[error("Invalid module list: {0}")]
    Engine(#[from] EngineError),
}

/// A module slot in a patch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchModule {
    /// Stable module ID
    pub id: ModuleId,
    /// Number of input ports
    #[serde(default)]
    pub inputs: usize,
    /// Number of output ports
    #[serde(default)]
    pub outputs: usize,
}

/// A saved patch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchFile {
    /// Modules, left to right
    #[serde(default)]
    pub modules: Vec<PatchModule>,
    /// Cables, bottom to top
    #[serde(default)]
    pub cables: Vec<PatchCable>,
}

impl PatchFile {
    /// Parse from JSON
    pub fn from_json(s: &str) -> Result<Self, PatchError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self, PatchError> {
        let contents = std::fs::read_to_string(path)?;
        let patch = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded patch {:?}: {} modules, {} cables",
            path,
            patch.modules.len(),
            patch.cables.len()
        );
        Ok(patch)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, PatchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build a rack from this patch. Cables that cannot be restored are
    /// reported, not fatal.
    pub fn build_rack(&self, settings: CableSettings) -> Result<(Rack<Engine>, LoadReport), PatchError> {
        let mut engine = Engine::new();
        for module in &self.modules {
            engine.add_module(module.id, module.inputs, module.outputs)?;
        }

        let mut rack = Rack::new(engine, settings);
        for (column, module) in self.modules.iter().enumerate() {
            for (endpoint, center) in layout_ports(column, module) {
                rack.set_port_position(endpoint, center);
            }
        }

        let report = rack.load_cables(&self.cables);
        Ok((rack, report))
    }

    /// The same modules with the rack's current cables
    pub fn with_cables_of(&self, rack: &Rack<Engine>) -> Self {
        Self {
            modules: self.modules.clone(),
            cables: rack.save_cables(),
        }
    }
}
