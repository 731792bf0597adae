// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cable colors and the rotating default palette.

use egui::Color32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default cable colors: red, yellow, green, blue, purple
pub const DEFAULT_CABLE_COLORS: [&str; 5] = ["#f3374b", "#ffb437", "#00b56e", "#3695ef", "#8b4ade"];

/// A cable color, unmultiplied RGBA.
///
/// Serialized as `#rrggbb`, or `#rrggbbaa` when translucent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CableColor(pub [u8; 4]);

impl CableColor {
    /// Opaque white
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Create from RGB
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b, u8::MAX])
    }

    /// Create from RGBA
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional)
    pub fn from_hex(s: &str) -> Result<Self, ColorError> {
        let digits = s.trim().trim_start_matches('#');
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(ColorError::InvalidHex(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| ColorError::InvalidHex(s.to_string()))
        };
        let (r, g, b) = (channel(0)?, channel(2)?, channel(4)?);
        let a = if digits.len() == 8 { channel(6)? } else { u8::MAX };
        Ok(Self::rgba(r, g, b, a))
    }

    /// Format as a hex string
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.0;
        if a == u8::MAX {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }

    /// Same color with full alpha, used for plugs
    pub fn opaque(&self) -> Self {
        let [r, g, b, _] = self.0;
        Self::rgb(r, g, b)
    }

    /// Scale RGB by `factor`, keeping alpha
    pub fn scaled(&self, factor: f32) -> Self {
        let [r, g, b, a] = self.0;
        let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
        Self::rgba(scale(r), scale(g), scale(b), a)
    }

    /// Convert for painting, with an extra alpha multiplier
    pub fn to_color32(&self, alpha: f32) -> Color32 {
        let [r, g, b, a] = self.0;
        let a = (a as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
        Color32::from_rgba_unmultiplied(r, g, b, a)
    }
}

impl Default for CableColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for CableColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for CableColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for CableColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CableColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Color parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    /// Not a `#rrggbb` / `#rrggbbaa` string
    #[error("Invalid hex color: {0:?}")]
    InvalidHex(String),
}

/// Rotating source of colors for new cables
#[derive(Debug, Clone)]
pub struct CablePalette {
    colors: Vec<CableColor>,
    labels: Vec<String>,
    next: usize,
}

impl CablePalette {
    /// Create a palette from colors and optional labels
    pub fn new(colors: Vec<CableColor>, labels: Vec<String>) -> Self {
        Self {
            colors,
            labels,
            next: 0,
        }
    }

    /// Colors in order
    pub fn colors(&self) -> &[CableColor] {
        &self.colors
    }

    /// Number of colors
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette is empty
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Menu label of a color: its configured label, else `#n`
    pub fn label(&self, index: usize) -> String {
        match self.labels.get(index) {
            Some(label) if !label.is_empty() => label.clone(),
            _ => format!("#{}", index + 1),
        }
    }

    /// Select which color the next new cable gets
    pub fn set_next(&mut self, index: usize) {
        if index < self.colors.len() {
            self.next = index;
        }
    }

    /// Take the next color and advance. An empty palette yields white.
    pub fn next_color(&mut self) -> CableColor {
        let Some(&color) = self.colors.get(self.next) else {
            self.next = 0;
            return self.colors.first().copied().unwrap_or(CableColor::WHITE);
        };
        self.next = (self.next + 1) % self.colors.len();
        color
    }
}

impl Default for CablePalette {
    fn default() -> Self {
        let colors = DEFAULT_CABLE_COLORS
            .iter()
            .filter_map(|hex| CableColor::from_hex(hex).ok())
            .collect();
        Self::new(colors, Vec::new())
    }
}
