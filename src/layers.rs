//! Loaded map inputs.
//!
//! Each stage gets its inputs as named fields instead of looking layers up
//! by code at run time.

use std::path::Path;

use crate::error::Result;
use crate::raster::RasterLayer;
use crate::region::{LayerCode, LayerFiles, TextureFiles, TextureKind};
use crate::tiling::tile_to_size;

/// The six semantic layers of one region, all the same size.
pub struct MapLayers {
    pub biome: RasterLayer,
    pub elevation_bare: RasterLayer,
    pub elevation_water: RasterLayer,
    pub temperature: RasterLayer,
    pub vegetation: RasterLayer,
    pub volcanism: RasterLayer,
}

impl MapLayers {
    /// Decode every layer and check that they share the biome layer's size.
    pub fn load(files: &LayerFiles) -> Result<Self> {
        let open = |code: LayerCode| RasterLayer::open(code.code(), files.get(code));
        let layers = Self {
            biome: open(LayerCode::Biome)?,
            elevation_bare: open(LayerCode::ElevationBare)?,
            elevation_water: open(LayerCode::ElevationWater)?,
            temperature: open(LayerCode::Temperature)?,
            vegetation: open(LayerCode::Vegetation)?,
            volcanism: open(LayerCode::Volcanism)?,
        };
        layers.validate()?;
        log::info!("Loaded {} layers at {}x{}", LayerCode::ALL.len(), layers.width(), layers.height());
        Ok(layers)
    }

    /// All layers must match the biome layer's dimensions.
    pub fn validate(&self) -> Result<()> {
        for code in LayerCode::ALL {
            self.biome.require_same_size(self.get(code))?;
        }
        Ok(())
    }

    pub fn get(&self, code: LayerCode) -> &RasterLayer {
        match code {
            LayerCode::Biome => &self.biome,
            LayerCode::ElevationBare => &self.elevation_bare,
            LayerCode::ElevationWater => &self.elevation_water,
            LayerCode::Temperature => &self.temperature,
            LayerCode::Vegetation => &self.vegetation,
            LayerCode::Volcanism => &self.volcanism,
        }
    }

    pub fn width(&self) -> usize {
        self.biome.width
    }

    pub fn height(&self) -> usize {
        self.biome.height
    }
}

/// Style textures tiled to canvas size.
pub struct StyleTextures {
    pub dirt: RasterLayer,
    pub mountains: RasterLayer,
    pub trees: RasterLayer,
}

impl StyleTextures {
    pub fn load(files: &TextureFiles, width: usize, height: usize) -> Result<Self> {
        let open = |kind: TextureKind, path: &Path| -> Result<RasterLayer> {
            let texture = RasterLayer::open(kind.suffix(), path)?;
            log::debug!(
                "Tiling {} texture {}x{} to {}x{}",
                kind.suffix(),
                texture.width,
                texture.height,
                width,
                height
            );
            Ok(tile_to_size(&texture, width, height))
        };
        Ok(Self {
            dirt: open(TextureKind::Dirt, &files.dirt)?,
            mountains: open(TextureKind::Mountains, &files.mountains)?,
            trees: open(TextureKind::Trees, &files.trees)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MapError;
    use crate::region::{resolve_layers, resolve_textures, RegionId};
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write(dir: &std::path::Path, name: &str, w: u32, h: u32) {
        RgbImage::from_pixel(w, h, Rgb([10, 20, 30])).save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_load_layers_and_textures() {
        let dir = TempDir::new().unwrap();
        let id = RegionId::new("region1", "00250-01-01");
        for code in LayerCode::ALL {
            write(dir.path(), &id.file_name(code.code()), 6, 5);
        }
        for kind in TextureKind::ALL {
            write(dir.path(), &kind.file_name("fantasy"), 4, 4);
        }

        let layers = MapLayers::load(&resolve_layers(dir.path(), &id).unwrap()).unwrap();
        assert_eq!((layers.width(), layers.height()), (6, 5));
        assert_eq!(layers.get(LayerCode::ElevationWater).name, "elw");

        let textures = StyleTextures::load(&resolve_textures(dir.path(), "fantasy").unwrap(), 6, 5).unwrap();
        assert_eq!(textures.dirt.dimensions(), (6, 5));
        assert_eq!(textures.trees.name, "trees");
    }

    #[test]
    fn test_mismatched_layer_is_rejected() {
        let dir = TempDir::new().unwrap();
        let id = RegionId::new("region1", "00250-01-01");
        for code in LayerCode::ALL {
            let w = if code == LayerCode::Temperature { 7 } else { 6 };
            write(dir.path(), &id.file_name(code.code()), w, 5);
        }
        match MapLayers::load(&resolve_layers(dir.path(), &id).unwrap()) {
            Err(MapError::DimensionMismatch { layer, .. }) => assert_eq!(layer, "tmp"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("mismatched layers were accepted"),
        }
    }
}
