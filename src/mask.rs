//! Binary classification masks.
//!
//! A mask is a predicate over canvas coordinates. It is stored as one bool
//! per pixel, so it can only ever be rendered as 0 or 255.

use rayon::prelude::*;

use crate::error::Result;
use crate::raster::{Channels, RasterLayer};

/// A binary stencil the size of the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    bits: Vec<bool>,
}

impl Mask {
    /// Evaluate `predicate(x, y)` for every coordinate.
    pub fn from_fn<F>(width: usize, height: usize, predicate: F) -> Self
    where
        F: Fn(usize, usize) -> bool + Sync,
    {
        let bits = (0..width * height)
            .into_par_iter()
            .map(|i| predicate(i % width, i / width))
            .collect();
        Self { width, height, bits }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Pixel-wise complement.
    pub fn invert(&self) -> Mask {
        Mask {
            width: self.width,
            height: self.height,
            bits: self.bits.iter().map(|b| !b).collect(),
        }
    }

    /// Render as a single-channel layer: 255 where set, 0 elsewhere.
    pub fn to_layer(&self, name: &str) -> RasterLayer {
        RasterLayer::from_fn(name, self.width, self.height, Channels::Gray, |x, y, px| {
            px[0] = if self.is_set(x, y) { 255 } else { 0 };
        })
    }
}

/// Ocean mask from the elevation-with-water layer: set where green is 0.
///
/// The exporter encodes land in the green channel, so any green at all
/// marks the pixel as land.
pub fn ocean_mask(elevation_water: &RasterLayer) -> Result<Mask> {
    elevation_water.require_color("ocean mask")?;
    let mask = Mask::from_fn(elevation_water.width, elevation_water.height, |x, y| {
        elevation_water.pixel(x, y)[1] == 0
    });
    log::debug!("ocean mask: {} of {} pixels", mask.count(), mask.bits.len());
    Ok(mask)
}

/// Mountain mask from the biome layer: set where the pixel equals
/// `mountain_grey` exactly.
pub fn mountain_mask(biome: &RasterLayer, mountain_grey: [u8; 3]) -> Result<Mask> {
    biome.require_color("mountain mask")?;
    let mask = Mask::from_fn(biome.width, biome.height, |x, y| {
        biome.pixel(x, y)[..3] == mountain_grey
    });
    log::debug!("mountain mask: {} of {} pixels", mask.count(), mask.bits.len());
    Ok(mask)
}
