//! Style configuration.
//!
//! Every stylistic constant of the fantasy renderer lives here so a style
//! can be tuned from a JSON file without touching the compositing code.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Tunable constants for one map style.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Exact biome color of the mountain biome
    pub mountain_grey: [u8; 3],

    // --- Ocean ---
    /// Green substituted for biome samples with no green (unset water)
    pub water_tint_green: u8,
    /// Blue substituted for biome samples with no green (unset water)
    pub water_tint_blue: u8,
    /// Weight of the elevation-bare blue channel against the biome blue
    pub ocean_blue_weight: f32,
    /// Brightness boost applied to the blended ocean blue
    pub ocean_brightness: f32,
    /// Gain on land-texture luminance for shallow water
    pub shallow_luminance_gain: f32,
    /// Box blur radius for the land-texture luminance (0 disables)
    pub luminance_blur_radius: usize,

    // --- Mountains ---
    /// Elevation red above which a mountain pixel counts as snow-capped
    pub snow_line: u8,
    /// Relief gain below the snow line
    pub mountain_gain: f32,
    /// Relief gain above the snow line
    pub snow_gain: f32,

    // --- Blending ---
    /// Weight of the biome color over the dirt texture on land
    pub land_biome_tint: f32,
    /// Weight of the tree texture over the biome color in the tree overlay
    pub tree_blend: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            mountain_grey: [128, 128, 128],

            water_tint_green: 128,
            water_tint_blue: 255,
            ocean_blue_weight: 3.0,
            ocean_brightness: 1.2,
            shallow_luminance_gain: 1.5,
            luminance_blur_radius: 1,

            snow_line: 200,
            mountain_gain: 1.6,
            snow_gain: 3.2,

            land_biome_tint: 0.1,
            tree_blend: 0.4,
        }
    }
}

impl StyleConfig {
    /// Load a JSON style file; keys that are absent keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        log::info!("Loaded style config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
