//! In-memory raster layers.
//!
//! A `RasterLayer` is a row-major grid of 8-bit pixels with 1, 3 or 4
//! channels. Layers are created once (loaded or synthesized) and treated as
//! read-only afterwards, except for `put_alpha` which attaches a transparency
//! channel.

use std::path::Path;

use image::{ColorType, DynamicImage, GrayImage, RgbImage, RgbaImage};
use rayon::prelude::*;

use crate::error::{MapError, Result};
use crate::mask::Mask;

/// Channel layout of a raster pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channels {
    Gray,
    Rgb,
    Rgba,
}

impl Channels {
    /// Number of bytes per pixel.
    pub fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }
}

/// A rectangular grid of pixels with a fixed channel layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterLayer {
    /// Short name used in log lines and error messages ("bm", "elw", "dirt"...)
    pub name: String,
    pub width: usize,
    pub height: usize,
    channels: Channels,
    data: Vec<u8>,
}

impl RasterLayer {
    /// Create a layer filled with zeros (black, and transparent if RGBA).
    pub fn new(name: &str, width: usize, height: usize, channels: Channels) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
            channels,
            data: vec![0; width * height * channels.count()],
        }
    }

    /// Create a layer with every pixel set to `pixel`.
    pub fn new_with(name: &str, width: usize, height: usize, channels: Channels, pixel: &[u8]) -> Result<Self> {
        if pixel.len() != channels.count() {
            return Err(MapError::InvalidFormat {
                layer: name.to_string(),
                reason: format!("fill pixel has {} values for {} channels", pixel.len(), channels.count()),
            });
        }
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            channels,
            data: pixel.repeat(width * height),
        })
    }

    /// Wrap an existing row-major buffer.
    pub fn from_raw(name: &str, width: usize, height: usize, channels: Channels, data: Vec<u8>) -> Result<Self> {
        let expected = width * height * channels.count();
        if data.len() != expected {
            return Err(MapError::InvalidFormat {
                layer: name.to_string(),
                reason: format!("buffer holds {} bytes, {}x{} {:?} needs {}", data.len(), width, height, channels, expected),
            });
        }
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            channels,
            data,
        })
    }

    /// Build a layer by evaluating `f` for every pixel.
    ///
    /// Rows are filled in parallel; `f` receives `(x, y, pixel)` and writes
    /// the pixel in place.
    pub fn from_fn<F>(name: &str, width: usize, height: usize, channels: Channels, f: F) -> Self
    where
        F: Fn(usize, usize, &mut [u8]) + Sync,
    {
        let mut layer = Self::new(name, width, height, channels);
        let step = channels.count();
        layer.par_rows_mut().for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(step).enumerate() {
                f(x, y, px);
            }
        });
        layer
    }

    /// Convert a decoded image, keeping grayscale as one channel and
    /// preserving alpha when the source has it.
    pub fn from_image(name: &str, img: &DynamicImage) -> Self {
        let (width, height) = (img.width() as usize, img.height() as usize);
        let (channels, data) = match img.color() {
            ColorType::L8 | ColorType::L16 => (Channels::Gray, img.to_luma8().into_raw()),
            color if color.has_alpha() => (Channels::Rgba, img.to_rgba8().into_raw()),
            _ => (Channels::Rgb, img.to_rgb8().into_raw()),
        };
        Self {
            name: name.to_string(),
            width,
            height,
            channels,
            data,
        }
    }

    /// Decode a raster file from disk.
    pub fn open(name: &str, path: &Path) -> Result<Self> {
        let img = image::open(path)?;
        Ok(Self::from_image(name, &img))
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Bytes per row.
    fn stride(&self) -> usize {
        self.width * self.channels.count()
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "pixel ({}, {}) out of bounds", x, y);
        (y * self.width + x) * self.channels.count()
    }

    /// Channel values of the pixel at (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let i = self.index(x, y);
        &self.data[i..i + self.channels.count()]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: &[u8]) -> Result<()> {
        let n = self.channels.count();
        if value.len() != n {
            return Err(MapError::InvalidFormat {
                layer: self.name.clone(),
                reason: format!("pixel has {} values for {} channels", value.len(), n),
            });
        }
        if x >= self.width || y >= self.height {
            return Err(MapError::InvalidFormat {
                layer: self.name.clone(),
                reason: format!("pixel ({}, {}) outside {}x{}", x, y, self.width, self.height),
            });
        }
        let i = self.index(x, y);
        self.data[i..i + n].copy_from_slice(value);
        Ok(())
    }

    /// First three channels as RGB; grayscale is replicated.
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let px = self.pixel(x, y);
        match self.channels {
            Channels::Gray => [px[0]; 3],
            Channels::Rgb | Channels::Rgba => [px[0], px[1], px[2]],
        }
    }

    /// Raw row-major pixel bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Rows as `(y, bytes)` for parallel writes.
    pub fn par_rows_mut(&mut self) -> impl IndexedParallelIterator<Item = (usize, &mut [u8])> + '_ {
        // Zero-width layers have no rows to visit; a chunk size of 0 is invalid.
        let stride = self.stride().max(1);
        self.data.par_chunks_mut(stride).enumerate()
    }

    /// Iterate over all pixels with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &[u8])> {
        let width = self.width.max(1);
        self.data
            .chunks_exact(self.channels.count())
            .enumerate()
            .map(move |(idx, px)| (idx % width, idx / width, px))
    }

    /// Fail with `InvalidFormat` unless the layer has at least RGB channels.
    pub fn require_color(&self, operation: &str) -> Result<()> {
        if self.channels == Channels::Gray {
            return Err(MapError::InvalidFormat {
                layer: self.name.clone(),
                reason: format!("{} needs at least 3 channels, layer has 1", operation),
            });
        }
        Ok(())
    }

    /// Fail with `DimensionMismatch` unless `other` has the same size as `self`.
    pub fn require_same_size(&self, other: &RasterLayer) -> Result<()> {
        require_dimensions(&other.name, self.dimensions(), other.dimensions())
    }

    /// Single-channel luma (ITU-R 601, integer weights) of this layer.
    /// Grayscale layers are returned unchanged.
    pub fn luminance(&self) -> RasterLayer {
        let name = format!("{}-luma", self.name);
        if self.channels == Channels::Gray {
            return RasterLayer { name, ..self.clone() };
        }
        RasterLayer::from_fn(&name, self.width, self.height, Channels::Gray, |x, y, px| {
            let [r, g, b] = self.rgb(x, y);
            px[0] = ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114) / 1000) as u8;
        })
    }

    /// Mean filter over a `(2r+1)²` window, clamped at the edges.
    /// Only defined for grayscale layers.
    pub fn box_blur(&self, radius: usize) -> Result<RasterLayer> {
        if self.channels != Channels::Gray {
            return Err(MapError::InvalidFormat {
                layer: self.name.clone(),
                reason: "box blur expects a single-channel layer".to_string(),
            });
        }
        if radius == 0 {
            return Ok(self.clone());
        }

        let (w, h) = self.dimensions();
        Ok(RasterLayer::from_fn(&self.name, w, h, Channels::Gray, |x, y, px| {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(w - 1);
            let y0 = y.saturating_sub(radius);
            let y1 = (y + radius).min(h - 1);

            let mut sum = 0u32;
            for ny in y0..=y1 {
                let row = &self.data[ny * w..(ny + 1) * w];
                sum += row[x0..=x1].iter().map(|&v| v as u32).sum::<u32>();
            }
            let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as u32;
            px[0] = ((sum + count / 2) / count) as u8;
        }))
    }

    /// Attach `mask` as the alpha channel (255 where the mask is set).
    /// RGB layers become RGBA; grayscale is promoted to RGBA first.
    pub fn put_alpha(&mut self, mask: &Mask) -> Result<()> {
        require_dimensions(&self.name, mask.dimensions(), self.dimensions())?;
        let source = std::mem::replace(self, RasterLayer::new("", 0, 0, Channels::Rgba));
        *self = RasterLayer::from_fn(&source.name, source.width, source.height, Channels::Rgba, |x, y, px| {
            let [r, g, b] = source.rgb(x, y);
            let a = if mask.is_set(x, y) { 255 } else { 0 };
            px.copy_from_slice(&[r, g, b, a]);
        });
        Ok(())
    }

    /// Convert into an `image` buffer for encoding.
    pub fn to_image(&self) -> Result<DynamicImage> {
        let (w, h) = (self.width as u32, self.height as u32);
        let data = self.data.clone();
        let img = match self.channels {
            Channels::Gray => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            Channels::Rgb => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            Channels::Rgba => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        };
        img.ok_or_else(|| MapError::InvalidFormat {
            layer: self.name.clone(),
            reason: "pixel buffer does not match dimensions".to_string(),
        })
    }

    /// Encode to disk; the format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.to_image()?.save(path)?;
        Ok(())
    }
}

/// Shared size check used by layers and masks.
pub(crate) fn require_dimensions(layer: &str, expected: (usize, usize), found: (usize, usize)) -> Result<()> {
    if expected != found {
        return Err(MapError::DimensionMismatch {
            layer: layer.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
