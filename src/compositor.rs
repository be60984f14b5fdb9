//! Layer compositing for the fantasy map.
//!
//! The canvas starts opaque black and is painted in a fixed z-order:
//! ocean, land, mountains, trees. Each step can overwrite what earlier
//! steps wrote, so the order is part of the output contract.

use rayon::prelude::*;

use crate::error::{MapError, Result};
use crate::mask::Mask;
use crate::raster::{require_dimensions, Channels, RasterLayer};
use crate::style::StyleConfig;

/// Linear blend `a * (1 - alpha) + b * alpha` over RGB, as a new RGB layer.
pub fn blend(name: &str, a: &RasterLayer, b: &RasterLayer, alpha: f32) -> Result<RasterLayer> {
    a.require_same_size(b)?;
    let alpha = alpha.clamp(0.0, 1.0);
    let (w, h) = a.dimensions();
    Ok(RasterLayer::from_fn(name, w, h, Channels::Rgb, |x, y, px| {
        let ca = a.rgb(x, y);
        let cb = b.rgb(x, y);
        for c in 0..3 {
            px[c] = (ca[c] as f32 * (1.0 - alpha) + cb[c] as f32 * alpha).round() as u8;
        }
    }))
}

/// Owns the output canvas while layers are painted onto it.
pub struct Compositor {
    canvas: RasterLayer,
}

impl Compositor {
    /// Black RGB canvas of the given size.
    pub fn new(name: &str, width: usize, height: usize) -> Self {
        Self {
            canvas: RasterLayer::new(name, width, height, Channels::Rgb),
        }
    }

    pub fn canvas(&self) -> &RasterLayer {
        &self.canvas
    }

    /// Copy `layer` onto the canvas wherever `mask` is set.
    pub fn paste_masked(&mut self, layer: &RasterLayer, mask: &Mask) -> Result<()> {
        self.canvas.require_same_size(layer)?;
        require_dimensions("stencil", self.canvas.dimensions(), mask.dimensions())?;

        self.canvas.par_rows_mut().for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                if mask.is_set(x, y) {
                    px.copy_from_slice(&layer.rgb(x, y));
                }
            }
        });
        Ok(())
    }

    /// Mix `layer` into the canvas with a per-pixel opacity taken from the
    /// single-channel `weights` layer (0 keeps the canvas, 255 replaces it).
    pub fn paste_graduated(&mut self, layer: &RasterLayer, weights: &RasterLayer) -> Result<()> {
        if weights.channels() != Channels::Gray {
            return Err(MapError::InvalidFormat {
                layer: weights.name.clone(),
                reason: "graduated stencil must be single-channel".to_string(),
            });
        }
        self.canvas.require_same_size(layer)?;
        self.canvas.require_same_size(weights)?;

        self.canvas.par_rows_mut().for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                let w = weights.pixel(x, y)[0] as u32;
                let over = layer.rgb(x, y);
                for c in 0..3 {
                    px[c] = ((over[c] as u32 * w + px[c] as u32 * (255 - w) + 127) / 255) as u8;
                }
            }
        });
        Ok(())
    }

    pub fn finish(self) -> RasterLayer {
        self.canvas
    }
}

/// Everything the compositor paints, already tiled and synthesized to
/// canvas size.
pub struct CompositeInputs<'a> {
    pub biome: &'a RasterLayer,
    pub vegetation: &'a RasterLayer,
    pub land_texture: &'a RasterLayer,
    pub tree_texture: &'a RasterLayer,
    pub ocean_color: &'a RasterLayer,
    pub mountain_color: &'a RasterLayer,
    pub ocean_mask: &'a Mask,
    pub mountain_mask: &'a Mask,
}

/// Paint the map in z-order and return the finished RGB canvas.
pub fn compose(name: &str, inputs: &CompositeInputs, style: &StyleConfig) -> Result<RasterLayer> {
    let (w, h) = inputs.biome.dimensions();
    let mut compositor = Compositor::new(name, w, h);

    log::info!("Compositing ocean ({} pixels)...", inputs.ocean_mask.count());
    compositor.paste_masked(inputs.ocean_color, inputs.ocean_mask)?;

    let land_mask = inputs.ocean_mask.invert();
    log::info!("Compositing land ({} pixels)...", land_mask.count());
    let land = blend("land", inputs.land_texture, inputs.biome, style.land_biome_tint)?;
    compositor.paste_masked(&land, &land_mask)?;

    log::info!("Compositing mountains ({} pixels)...", inputs.mountain_mask.count());
    compositor.paste_masked(inputs.mountain_color, inputs.mountain_mask)?;

    log::info!("Compositing trees...");
    let trees = blend("trees", inputs.biome, inputs.tree_texture, style.tree_blend)?;
    compositor.paste_graduated(&trees, &inputs.vegetation.luminance())?;

    Ok(compositor.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_weights() {
        let a = RasterLayer::new_with("a", 1, 1, Channels::Rgb, &[200, 100, 0]).unwrap();
        let b = RasterLayer::new_with("b", 1, 1, Channels::Rgba, &[0, 100, 250, 0]).unwrap();
        let out = blend("ab", &a, &b, 0.1).unwrap();
        assert_eq!(out.channels(), Channels::Rgb);
        assert_eq!(out.pixel(0, 0), &[180, 100, 25]);
        assert_eq!(blend("ab", &a, &b, 0.0).unwrap().pixel(0, 0), &[200, 100, 0]);
        assert_eq!(blend("ab", &a, &b, 1.0).unwrap().pixel(0, 0), &[0, 100, 250]);
    }

    #[test]
    fn test_paste_masked_only_touches_set_pixels() {
        let mut compositor = Compositor::new("map", 2, 1);
        let layer = RasterLayer::new_with("l", 2, 1, Channels::Rgba, &[9, 9, 9, 0]).unwrap();
        let mask = Mask::from_fn(2, 1, |x, _| x == 1);
        compositor.paste_masked(&layer, &mask).unwrap();
        let canvas = compositor.finish();
        assert_eq!(canvas.pixel(0, 0), &[0, 0, 0]);
        assert_eq!(canvas.pixel(1, 0), &[9, 9, 9]);
    }

    #[test]
    fn test_paste_graduated_mixes_by_weight() {
        let mut compositor = Compositor::new("map", 3, 1);
        let base = RasterLayer::new_with("base", 3, 1, Channels::Rgb, &[100, 100, 100]).unwrap();
        compositor.paste_masked(&base, &Mask::from_fn(3, 1, |_, _| true)).unwrap();

        let over = RasterLayer::new_with("over", 3, 1, Channels::Rgb, &[200, 0, 100]).unwrap();
        let mut weights = RasterLayer::new("veg", 3, 1, Channels::Gray);
        weights.set_pixel(1, 0, &[51]).unwrap();
        weights.set_pixel(2, 0, &[255]).unwrap();
        compositor.paste_graduated(&over, &weights).unwrap();

        let canvas = compositor.canvas();
        assert_eq!(canvas.pixel(0, 0), &[100, 100, 100]);
        // 20% of the overlay: 100 + 0.2 * (200 - 100), 100 - 0.2 * 100
        assert_eq!(canvas.pixel(1, 0), &[120, 80, 100]);
        assert_eq!(canvas.pixel(2, 0), &[200, 0, 100]);
    }

    #[test]
    fn test_paste_graduated_needs_gray_weights() {
        let mut compositor = Compositor::new("map", 1, 1);
        let over = RasterLayer::new("over", 1, 1, Channels::Rgb);
        let weights = RasterLayer::new("veg", 1, 1, Channels::Rgb);
        assert!(compositor.paste_graduated(&over, &weights).is_err());
    }

    #[test]
    fn test_paste_rejects_mismatched_layer() {
        let mut compositor = Compositor::new("map", 2, 2);
        let layer = RasterLayer::new("l", 3, 2, Channels::Rgb);
        let mask = Mask::from_fn(2, 2, |_, _| true);
        assert!(matches!(
            compositor.paste_masked(&layer, &mask),
            Err(MapError::DimensionMismatch { .. })
        ));
    }

    /// 2x1 map: (0,0) ocean, (1,0) land that is also mountain.
    fn order_fixture(vegetation: u8) -> RasterLayer {
        let biome = RasterLayer::new_with("bm", 2, 1, Channels::Rgb, &[128, 128, 128]).unwrap();
        let vegetation = RasterLayer::new_with("veg", 2, 1, Channels::Rgb, &[vegetation; 3]).unwrap();
        let land_texture = RasterLayer::new_with("dirt", 2, 1, Channels::Rgb, &[50, 40, 30]).unwrap();
        let tree_texture = RasterLayer::new_with("trees", 2, 1, Channels::Rgb, &[0, 200, 0]).unwrap();
        let ocean_color = RasterLayer::new_with("ocean", 2, 1, Channels::Rgba, &[0, 60, 180, 0]).unwrap();
        let mountain_color = RasterLayer::new_with("mountains", 2, 1, Channels::Rgb, &[220, 220, 220]).unwrap();
        let ocean_mask = Mask::from_fn(2, 1, |x, _| x == 0);
        let mountain_mask = Mask::from_fn(2, 1, |x, _| x == 1);

        let inputs = CompositeInputs {
            biome: &biome,
            vegetation: &vegetation,
            land_texture: &land_texture,
            tree_texture: &tree_texture,
            ocean_color: &ocean_color,
            mountain_color: &mountain_color,
            ocean_mask: &ocean_mask,
            mountain_mask: &mountain_mask,
        };
        compose("fantasy", &inputs, &StyleConfig::default()).unwrap()
    }

    #[test]
    fn test_mountains_overwrite_land() {
        let map = order_fixture(0);
        assert_eq!(map.channels(), Channels::Rgb);
        assert_eq!(map.pixel(0, 0), &[0, 60, 180]);
        // Land fill would give (58, 49, 40); the mountain step paints over it.
        assert_eq!(map.pixel(1, 0), &[220, 220, 220]);
    }

    #[test]
    fn test_dense_vegetation_covers_everything() {
        let map = order_fixture(255);
        // Tree overlay: biome grey blended 40% toward the tree texture.
        let expected = [77, 157, 77];
        assert_eq!(map.pixel(0, 0), &expected);
        assert_eq!(map.pixel(1, 0), &expected);
    }

    #[test]
    fn test_land_fill_without_mountains() {
        let biome = RasterLayer::new_with("bm", 1, 1, Channels::Rgb, &[0, 200, 0]).unwrap();
        let vegetation = RasterLayer::new("veg", 1, 1, Channels::Gray);
        let land_texture = RasterLayer::new_with("dirt", 1, 1, Channels::Rgb, &[100, 100, 100]).unwrap();
        let black = RasterLayer::new("black", 1, 1, Channels::Rgb);
        let ocean_mask = Mask::from_fn(1, 1, |_, _| false);
        let mountain_mask = Mask::from_fn(1, 1, |_, _| false);
        let inputs = CompositeInputs {
            biome: &biome,
            vegetation: &vegetation,
            land_texture: &land_texture,
            tree_texture: &black,
            ocean_color: &black,
            mountain_color: &black,
            ocean_mask: &ocean_mask,
            mountain_mask: &mountain_mask,
        };
        let map = compose("fantasy", &inputs, &StyleConfig::default()).unwrap();
        // 90% dirt, 10% biome
        assert_eq!(map.pixel(0, 0), &[90, 110, 90]);
    }
}
