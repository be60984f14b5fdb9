//! End-to-end map generation.
//!
//! One run resolves a region, loads its layers and the style textures,
//! builds the masks, synthesizes the ocean and mountain layers and
//! composites them into `<region>-<date>-<style>.png`. Every check happens
//! before the output is written. All outputs of a run are encoded first and
//! renamed into place together, so a failed run leaves no partial set.

use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::compositor::{compose, CompositeInputs};
use crate::error::Result;
use crate::layers::{MapLayers, StyleTextures};
use crate::mask::{mountain_mask, ocean_mask, Mask};
use crate::mountains::synthesize_mountains;
use crate::ocean::synthesize_ocean;
use crate::raster::RasterLayer;
use crate::region::{self, LayerCode, RegionId};
use crate::style::StyleConfig;

/// Layers that get an ocean-transparent copy with `export_land_layers`.
const LAND_LAYERS: [LayerCode; 4] = [
    LayerCode::ElevationBare,
    LayerCode::Temperature,
    LayerCode::Vegetation,
    LayerCode::Volcanism,
];

/// What to render and where.
#[derive(Clone, Debug)]
pub struct MapRequest {
    /// Directory holding the region exports; the output is written here
    pub dir: PathBuf,
    /// Directory holding the style textures
    pub texture_dir: PathBuf,
    /// Style name, used for texture lookup and the output suffix
    pub style: String,
    /// Explicit region identity; discovered from `dir` when absent
    pub region: Option<RegionId>,
    /// Also write ocean-transparent copies of the land layers
    pub export_land_layers: bool,
    pub config: StyleConfig,
}

impl MapRequest {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            texture_dir: dir.clone(),
            dir,
            style: "fantasy".to_string(),
            region: None,
            export_land_layers: false,
            config: StyleConfig::default(),
        }
    }
}

/// Summary of a finished run.
#[derive(Clone, Debug)]
pub struct MapReport {
    pub region: RegionId,
    pub output: PathBuf,
    pub width: usize,
    pub height: usize,
    pub ocean_pixels: usize,
    pub mountain_pixels: usize,
    pub land_layers: Vec<PathBuf>,
}

/// Inputs loaded and classified, ready for synthesis.
pub struct PreparedMap {
    pub region: RegionId,
    pub layers: MapLayers,
    pub textures: StyleTextures,
    pub ocean: Mask,
    pub mountains: Mask,
}

/// Synthesized color layers.
pub struct SynthesizedLayers {
    pub ocean: RasterLayer,
    pub mountains: RasterLayer,
}

/// Resolve, load, tile and classify everything a request needs.
///
/// Missing layers or textures fail here, before any file is converted or
/// written.
pub fn prepare(request: &MapRequest) -> Result<PreparedMap> {
    let id = match &request.region {
        Some(id) => id.clone(),
        None => region::discover(&request.dir)?,
    };

    let mut files = region::resolve_layers(&request.dir, &id)?;
    let texture_files = region::resolve_textures(&request.texture_dir, &request.style)?;
    files.compress_bitmaps()?;

    log::info!("Loading layers for {}...", id);
    let layers = MapLayers::load(&files)?;
    log::info!("Tiling {} textures...", request.style);
    let textures = StyleTextures::load(&texture_files, layers.width(), layers.height())?;

    log::info!("Building masks...");
    let ocean = ocean_mask(&layers.elevation_water)?;
    let mountains = mountain_mask(&layers.biome, request.config.mountain_grey)?;
    let total = layers.width() * layers.height();
    log::info!(
        "Ocean: {} pixels ({:.1}%), mountains: {} pixels ({:.1}%)",
        ocean.count(),
        percent(ocean.count(), total),
        mountains.count(),
        percent(mountains.count(), total)
    );

    Ok(PreparedMap {
        region: id,
        layers,
        textures,
        ocean,
        mountains,
    })
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}

impl PreparedMap {
    pub fn synthesize(&self, style: &StyleConfig) -> Result<SynthesizedLayers> {
        log::info!("Synthesizing ocean colors...");
        let ocean = synthesize_ocean(
            &self.layers.biome,
            &self.layers.elevation_bare,
            &self.ocean,
            &self.textures.dirt,
            style,
        )?;
        log::info!("Shading mountains...");
        let mountains = synthesize_mountains(
            &self.textures.mountains,
            &self.layers.elevation_bare,
            &self.mountains,
            style,
        )?;
        Ok(SynthesizedLayers { ocean, mountains })
    }

    /// Composite the final map.
    pub fn compose(&self, name: &str, synthesized: &SynthesizedLayers, style: &StyleConfig) -> Result<RasterLayer> {
        let inputs = CompositeInputs {
            biome: &self.layers.biome,
            vegetation: &self.layers.vegetation,
            land_texture: &self.textures.dirt,
            tree_texture: &self.textures.trees,
            ocean_color: &synthesized.ocean,
            mountain_color: &synthesized.mountains,
            ocean_mask: &self.ocean,
            mountain_mask: &self.mountains,
        };
        compose(name, &inputs, style)
    }

    /// Ocean-transparent copies of the land layers, paired with their
    /// output paths in `dir`. Nothing is written.
    pub fn land_layers(&self, dir: &Path) -> Result<Vec<(PathBuf, RasterLayer)>> {
        let land = self.ocean.invert();
        let mut layers = Vec::with_capacity(LAND_LAYERS.len());
        for code in LAND_LAYERS {
            let mut layer = self.layers.get(code).clone();
            layer.put_alpha(&land)?;
            let path = dir.join(self.region.file_name(&format!("{}-land", code.code())));
            layers.push((path, layer));
        }
        Ok(layers)
    }
}

fn part_path(path: &Path) -> PathBuf {
    path.with_extension("png.part")
}

/// Encode to a temporary sibling and rename into place, so a failed save
/// never leaves a truncated file at `path`.
pub fn save_png_atomic(layer: &RasterLayer, path: &Path) -> Result<()> {
    save_all_png_atomic(&[(path, layer)])
}

/// Save several layers as one unit.
///
/// Every layer is encoded to its `.png.part` sibling before anything is
/// renamed. If an encode or a rename fails, the temporaries and any outputs
/// already renamed are removed, so either all paths are written or none.
/// Outputs are renamed in order; put the file that marks a finished run last.
pub fn save_all_png_atomic(outputs: &[(&Path, &RasterLayer)]) -> Result<()> {
    let mut encoded = Vec::with_capacity(outputs.len());
    for (path, layer) in outputs {
        let tmp = part_path(path);
        let written = layer
            .to_image()
            .and_then(|img| Ok(img.save_with_format(&tmp, ImageFormat::Png)?));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            for done in &encoded {
                let _ = fs::remove_file(done);
            }
            return Err(e);
        }
        encoded.push(tmp);
    }

    for (i, (path, _)) in outputs.iter().enumerate() {
        if let Err(e) = fs::rename(&encoded[i], path) {
            log::error!("Could not move {} into place: {}", path.display(), e);
            for (done, _) in &outputs[..i] {
                let _ = fs::remove_file(done);
            }
            for tmp in &encoded[i..] {
                let _ = fs::remove_file(tmp);
            }
            return Err(e.into());
        }
    }
    Ok(())
}

/// Run the whole pipeline for one request.
pub fn make_map(request: &MapRequest) -> Result<MapReport> {
    let prepared = prepare(request)?;
    let synthesized = prepared.synthesize(&request.config)?;
    let map = prepared.compose(&request.style, &synthesized, &request.config)?;

    let output = request.dir.join(prepared.region.file_name(&request.style));
    let extra = if request.export_land_layers {
        prepared.land_layers(&request.dir)?
    } else {
        Vec::new()
    };

    // The map goes last so its presence means the whole set landed.
    let mut outputs: Vec<(&Path, &RasterLayer)> =
        extra.iter().map(|(path, layer)| (path.as_path(), layer)).collect();
    outputs.push((output.as_path(), &map));
    save_all_png_atomic(&outputs)?;
    for (path, _) in &outputs {
        log::info!("Wrote {}", path.display());
    }

    let land_layers = extra.into_iter().map(|(path, _)| path).collect();

    Ok(MapReport {
        region: prepared.region.clone(),
        output,
        width: map.width,
        height: map.height,
        ocean_pixels: prepared.ocean.count(),
        mountain_pixels: prepared.mountains.count(),
        land_layers,
    })
}
