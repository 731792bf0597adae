// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cable settings, stored as RON.

use crate::color::{CableColor, CablePalette, DEFAULT_CABLE_COLORS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default undo history depth
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// User-facing cable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CableSettings {
    /// Cable tension, 0 (slack) to 1 (straight)
    pub tension: f32,
    /// Base cable opacity, 0 to 1
    pub opacity: f32,
    /// Colors handed out to new cables, in order
    pub colors: Vec<CableColor>,
    /// Optional labels for `colors`, shown in port menus
    pub labels: Vec<String>,
    /// Maximum number of undo entries kept
    pub history_depth: usize,
}

impl Default for CableSettings {
    fn default() -> Self {
        Self {
            tension: 0.5,
            opacity: 0.5,
            colors: DEFAULT_CABLE_COLORS
                .iter()
                .filter_map(|hex| CableColor::from_hex(hex).ok())
                .collect(),
            labels: Vec::new(),
            history_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

impl CableSettings {
    /// Parse from a RON string. Missing fields take their defaults.
    pub fn from_ron(s: &str) -> Result<Self, SettingsError> {
        let mut settings: Self = ron::from_str(s)?;
        settings.clamp();
        Ok(settings)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_ron(&contents)?;
        tracing::info!("Loaded cable settings from {:?}", path);
        Ok(settings)
    }

    /// Build the palette new cables draw their colors from
    pub fn palette(&self) -> CablePalette {
        CablePalette::new(self.colors.clone(), self.labels.clone())
    }

    fn clamp(&mut self) {
        self.tension = self.tension.clamp(0.0, 1.0);
        self.opacity = self.opacity.clamp(0.0, 1.0);
        self.history_depth = self.history_depth.max(1);
    }
}

/// Settings load error
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON write error
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),
}
