//! Ocean color synthesis.
//!
//! Water color is derived per pixel from the biome layer and the blue
//! channel of the elevation-bare layer. The biome green channel carries
//! three meanings, made explicit by `WaterSample`.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::Result;
use crate::mask::Mask;
use crate::raster::{Channels, RasterLayer};
use crate::style::StyleConfig;

/// How a biome sample over water should be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaterSample {
    /// Green is 0: the exporter left no usable biome color here.
    Unset { red: u8 },
    /// Green is 255: bright shallow water keyed off the land texture.
    // The exporter's intent for this case is not documented; the color rule
    // is kept as observed.
    Shallow,
    /// Any other green: water tint is the green/blue proportion of the biome.
    Proportional { green: u8, blue: u8 },
}

impl WaterSample {
    pub fn classify([red, green, blue]: [u8; 3]) -> Self {
        match green {
            0 => WaterSample::Unset { red },
            255 => WaterSample::Shallow,
            _ => WaterSample::Proportional { green, blue },
        }
    }
}

/// Round and clamp into a channel value.
pub(crate) fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Blue of the synthesized water: the biome blue blended with the weighted
/// elevation blue, then brightened.
fn water_blue(biome_blue: u8, elevation_blue: u8, style: &StyleConfig) -> u8 {
    let w = style.ocean_blue_weight;
    to_channel((biome_blue as f32 + elevation_blue as f32 * w) / w * style.ocean_brightness)
}

/// Green scaled by the biome's own green/blue ratio. A zero biome blue
/// yields no green.
fn proportional_green(green: u8, biome_blue: u8, blue: u8) -> Option<u8> {
    if biome_blue == 0 {
        return None;
    }
    Some(to_channel(green as f32 / biome_blue as f32 * blue as f32))
}

/// Synthesize the RGBA ocean layer.
///
/// Ocean pixels get the synthesized water color with alpha 0; land pixels
/// stay opaque black. The compositor stencils with the ocean mask, so the
/// alpha only matters to consumers that paste by transparency.
pub fn synthesize_ocean(
    biome: &RasterLayer,
    elevation_bare: &RasterLayer,
    ocean: &Mask,
    land_texture: &RasterLayer,
    style: &StyleConfig,
) -> Result<RasterLayer> {
    biome.require_color("ocean synthesis")?;
    elevation_bare.require_color("ocean synthesis")?;
    biome.require_same_size(elevation_bare)?;
    biome.require_same_size(land_texture)?;
    crate::raster::require_dimensions("ocean mask", biome.dimensions(), ocean.dimensions())?;

    let luminance = land_texture.luminance().box_blur(style.luminance_blur_radius)?;

    let substituted = AtomicUsize::new(0);
    let guarded = AtomicUsize::new(0);
    let (w, h) = biome.dimensions();
    let layer = RasterLayer::from_fn("ocean", w, h, Channels::Rgba, |x, y, px| {
        if !ocean.is_set(x, y) {
            px.copy_from_slice(&[0, 0, 0, 255]);
            return;
        }

        let raw = biome.rgb(x, y);
        let sample = match WaterSample::classify(raw) {
            WaterSample::Unset { red } => {
                substituted.fetch_add(1, Ordering::Relaxed);
                [red, style.water_tint_green, style.water_tint_blue]
            }
            _ => raw,
        };
        let blue = water_blue(sample[2], elevation_bare.pixel(x, y)[2], style);

        let color = match WaterSample::classify(sample) {
            WaterSample::Shallow => {
                let lum = luminance.pixel(x, y)[0] as f32;
                [to_channel(lum * style.shallow_luminance_gain), 255, 255]
            }
            WaterSample::Proportional { green, blue: biome_blue } => {
                let green = proportional_green(green, biome_blue, blue).unwrap_or_else(|| {
                    guarded.fetch_add(1, Ordering::Relaxed);
                    0
                });
                [0, green, blue]
            }
            // Only reachable when the configured tint itself has no green.
            WaterSample::Unset { .. } => [0, 0, blue],
        };
        px.copy_from_slice(&[color[0], color[1], color[2], 0]);
    });

    log::debug!(
        "ocean synthesis: {} unset biome samples substituted, {} zero-blue samples guarded",
        substituted.into_inner(),
        guarded.into_inner()
    );
    Ok(layer)
}
