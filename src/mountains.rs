//! Mountain relief shading.

use crate::error::Result;
use crate::mask::Mask;
use crate::ocean::to_channel;
use crate::raster::{require_dimensions, Channels, RasterLayer};
use crate::style::StyleConfig;

/// Gray level for one mountain pixel: elevation times texture grain, with a
/// stronger gain above the snow line so peaks read white.
pub fn relief(elevation_red: u8, texture_red: u8, style: &StyleConfig) -> u8 {
    let gain = if elevation_red > style.snow_line {
        style.snow_gain
    } else {
        style.mountain_gain
    };
    to_channel(elevation_red as f32 * texture_red as f32 * gain / 255.0)
}

/// Synthesize the grayscale mountain layer (RGB). Pixels outside the
/// mountain mask stay black.
pub fn synthesize_mountains(
    mountain_texture: &RasterLayer,
    elevation_bare: &RasterLayer,
    mountains: &Mask,
    style: &StyleConfig,
) -> Result<RasterLayer> {
    elevation_bare.require_same_size(mountain_texture)?;
    require_dimensions("mountain mask", elevation_bare.dimensions(), mountains.dimensions())?;

    let (w, h) = elevation_bare.dimensions();
    let layer = RasterLayer::from_fn("mountains", w, h, Channels::Rgb, |x, y, px| {
        if mountains.is_set(x, y) {
            let g = relief(elevation_bare.pixel(x, y)[0], mountain_texture.pixel(x, y)[0], style);
            px.copy_from_slice(&[g, g, g]);
        }
    });
    Ok(layer)
}
