//! Region exports on disk.
//!
//! World exports are named `<region>-<date>-<code>.<ext>`, for example
//! `region1-00250-01-01-bm.png`. This module finds the region identity in a
//! directory, resolves the six layer files and the style textures, and
//! compresses bitmap exports to PNG.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::{MapError, Result};

/// Length of the date stamp that follows the region id, e.g. `00250-01-01`.
const DATE_LEN: usize = 11;

/// The (region, date) pair that namespaces one export set.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionId {
    pub region: String,
    pub date: String,
}

impl RegionId {
    pub fn new(region: &str, date: &str) -> Self {
        Self {
            region: region.to_string(),
            date: date.to_string(),
        }
    }

    /// Parse the identity out of an export file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        if !name.starts_with("region") {
            return None;
        }
        let idx = name.find('-')?;
        let date = name.get(idx + 1..idx + 1 + DATE_LEN)?;
        Some(Self::new(&name[..idx], date))
    }

    /// `<region>-<date>-<suffix>.png`
    pub fn file_name(&self, suffix: &str) -> String {
        format!("{}-{}.png", self, suffix)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.region, self.date)
    }
}

/// The six semantic layers of a world export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerCode {
    Biome,
    ElevationBare,
    ElevationWater,
    Temperature,
    Vegetation,
    Volcanism,
}

impl LayerCode {
    pub const ALL: [LayerCode; 6] = [
        LayerCode::Biome,
        LayerCode::ElevationBare,
        LayerCode::ElevationWater,
        LayerCode::Temperature,
        LayerCode::Vegetation,
        LayerCode::Volcanism,
    ];

    /// Short code used in export file names.
    pub fn code(self) -> &'static str {
        match self {
            LayerCode::Biome => "bm",
            LayerCode::ElevationBare => "el",
            LayerCode::ElevationWater => "elw",
            LayerCode::Temperature => "tmp",
            LayerCode::Vegetation => "veg",
            LayerCode::Volcanism => "vol",
        }
    }
}

/// Style texture assets, tiled across the canvas before use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureKind {
    Dirt,
    Mountains,
    Trees,
}

impl TextureKind {
    pub const ALL: [TextureKind; 3] = [TextureKind::Dirt, TextureKind::Mountains, TextureKind::Trees];

    pub fn suffix(self) -> &'static str {
        match self {
            TextureKind::Dirt => "dirt",
            TextureKind::Mountains => "mountains",
            TextureKind::Trees => "trees",
        }
    }

    /// `<style>_<suffix>.png`
    pub fn file_name(self, style: &str) -> String {
        format!("{}_{}.png", style, self.suffix())
    }
}

/// Find a region identity among the exports in `dir`.
///
/// File names are sorted first so the choice is stable when a directory
/// holds more than one region.
pub fn discover(dir: &Path) -> Result<RegionId> {
    if !dir.is_dir() {
        return Err(MapError::NoInputFound { dir: dir.to_path_buf() });
    }
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_export_extension(Path::new(name)))
        .collect();
    names.sort();

    let found = names.iter().find_map(|name| RegionId::from_file_name(name));
    match found {
        Some(id) => {
            log::info!("Found region {}", id);
            Ok(id)
        }
        None => Err(MapError::NoInputFound { dir: dir.to_path_buf() }),
    }
}

fn is_export_extension(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("png") | Some("bmp")
    )
}

/// Paths of the six layer files for one region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayerFiles {
    pub biome: PathBuf,
    pub elevation_bare: PathBuf,
    pub elevation_water: PathBuf,
    pub temperature: PathBuf,
    pub vegetation: PathBuf,
    pub volcanism: PathBuf,
}

impl LayerFiles {
    pub fn get(&self, code: LayerCode) -> &Path {
        match code {
            LayerCode::Biome => &self.biome,
            LayerCode::ElevationBare => &self.elevation_bare,
            LayerCode::ElevationWater => &self.elevation_water,
            LayerCode::Temperature => &self.temperature,
            LayerCode::Vegetation => &self.vegetation,
            LayerCode::Volcanism => &self.volcanism,
        }
    }

    fn get_mut(&mut self, code: LayerCode) -> &mut PathBuf {
        match code {
            LayerCode::Biome => &mut self.biome,
            LayerCode::ElevationBare => &mut self.elevation_bare,
            LayerCode::ElevationWater => &mut self.elevation_water,
            LayerCode::Temperature => &mut self.temperature,
            LayerCode::Vegetation => &mut self.vegetation,
            LayerCode::Volcanism => &mut self.volcanism,
        }
    }

    /// Re-encode any bitmap layer as PNG next to it and delete the bitmap.
    pub fn compress_bitmaps(&mut self) -> Result<()> {
        for code in LayerCode::ALL {
            let path = self.get_mut(code);
            if path.extension().and_then(|e| e.to_str()) != Some("bmp") {
                continue;
            }
            let png = path.with_extension("png");
            image::open(&*path)?.save_with_format(&png, ImageFormat::Png)?;
            fs::remove_file(&*path)?;
            log::info!("Compressed {} to {}", path.display(), png.display());
            *path = png;
        }
        Ok(())
    }
}

/// Locate every layer for `id` in `dir`, preferring PNG over BMP.
///
/// Reports all missing codes at once. Nothing on disk is touched.
pub fn resolve_layers(dir: &Path, id: &RegionId) -> Result<LayerFiles> {
    let mut found = Vec::with_capacity(LayerCode::ALL.len());
    let mut missing = Vec::new();
    for code in LayerCode::ALL {
        let stem = format!("{}-{}", id, code.code());
        let path = ["png", "bmp"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext)))
            .find(|p| p.is_file());
        match path {
            Some(p) => found.push(p),
            None => missing.push(code.code().to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(MapError::InsufficientLayers {
            region: id.to_string(),
            missing,
        });
    }

    let mut paths = found.into_iter();
    let mut next = || paths.next().unwrap_or_default();
    Ok(LayerFiles {
        biome: next(),
        elevation_bare: next(),
        elevation_water: next(),
        temperature: next(),
        vegetation: next(),
        volcanism: next(),
    })
}

/// Paths of the three style textures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureFiles {
    pub dirt: PathBuf,
    pub mountains: PathBuf,
    pub trees: PathBuf,
}

/// Locate the textures for `style` in `dir`.
pub fn resolve_textures(dir: &Path, style: &str) -> Result<TextureFiles> {
    let path = |kind: TextureKind| -> Result<PathBuf> {
        let p = dir.join(kind.file_name(style));
        if p.is_file() {
            Ok(p)
        } else {
            Err(MapError::MissingTexture { path: p })
        }
    };
    Ok(TextureFiles {
        dirt: path(TextureKind::Dirt)?,
        mountains: path(TextureKind::Mountains)?,
        trees: path(TextureKind::Trees)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn touch_png(dir: &Path, name: &str) {
        RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])).save(dir.join(name)).unwrap();
    }

    fn full_export(dir: &Path, id: &RegionId) {
        for code in LayerCode::ALL {
            touch_png(dir, &id.file_name(code.code()));
        }
    }

    #[test]
    fn test_parse_file_name() {
        let id = RegionId::from_file_name("region1-00250-01-01-bm.png").unwrap();
        assert_eq!(id, RegionId::new("region1", "00250-01-01"));
        assert_eq!(id.to_string(), "region1-00250-01-01");
        assert_eq!(id.file_name("fantasy"), "region1-00250-01-01-fantasy.png");

        assert!(RegionId::from_file_name("fantasy_dirt.png").is_none());
        assert!(RegionId::from_file_name("region1-002.png").is_none());
    }

    #[test]
    fn test_discover_picks_sorted_first() {
        let dir = TempDir::new().unwrap();
        touch_png(dir.path(), "region7-00100-02-03-bm.png");
        touch_png(dir.path(), "region3-00250-01-01-el.png");
        touch_png(dir.path(), "fantasy_dirt.png");
        let id = discover(dir.path()).unwrap();
        assert_eq!(id, RegionId::new("region3", "00250-01-01"));
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = TempDir::new().unwrap();
        touch_png(dir.path(), "fantasy_dirt.png");
        assert!(matches!(discover(dir.path()), Err(MapError::NoInputFound { .. })));
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("no-such-dir");
        match discover(&gone) {
            Err(MapError::NoInputFound { dir }) => assert_eq!(dir, gone),
            other => panic!("expected NoInputFound, got {other:?}"),
        }
        // A plain file is not a directory of exports either.
        touch_png(dir.path(), "region1-00250-01-01-bm.png");
        let file = dir.path().join("region1-00250-01-01-bm.png");
        assert!(matches!(discover(&file), Err(MapError::NoInputFound { .. })));
    }

    #[test]
    fn test_resolve_reports_all_missing() {
        let dir = TempDir::new().unwrap();
        let id = RegionId::new("region1", "00250-01-01");
        touch_png(dir.path(), &id.file_name("bm"));
        touch_png(dir.path(), &id.file_name("el"));
        touch_png(dir.path(), &id.file_name("elw"));
        touch_png(dir.path(), &id.file_name("tmp"));

        match resolve_layers(dir.path(), &id) {
            Err(MapError::InsufficientLayers { region, missing }) => {
                assert_eq!(region, "region1-00250-01-01");
                assert_eq!(missing, vec!["veg".to_string(), "vol".to_string()]);
            }
            other => panic!("expected InsufficientLayers, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_maps_codes_to_fields() {
        let dir = TempDir::new().unwrap();
        let id = RegionId::new("region1", "00250-01-01");
        full_export(dir.path(), &id);
        let files = resolve_layers(dir.path(), &id).unwrap();
        assert!(files.elevation_water.ends_with("region1-00250-01-01-elw.png"));
        assert!(files.volcanism.ends_with("region1-00250-01-01-vol.png"));
        for code in LayerCode::ALL {
            assert!(files.get(code).to_string_lossy().ends_with(&format!("-{}.png", code.code())));
        }
    }

    #[test]
    fn test_bitmaps_are_compressed() {
        let dir = TempDir::new().unwrap();
        let id = RegionId::new("region2", "00100-05-06");
        full_export(dir.path(), &id);
        let png = dir.path().join(id.file_name("veg"));
        fs::remove_file(&png).unwrap();
        let bmp = png.with_extension("bmp");
        RgbImage::from_pixel(2, 2, Rgb([0, 90, 0])).save(&bmp).unwrap();

        let mut files = resolve_layers(dir.path(), &id).unwrap();
        assert_eq!(files.vegetation, bmp);
        files.compress_bitmaps().unwrap();

        assert_eq!(files.vegetation, png);
        assert!(png.is_file());
        assert!(!bmp.exists());
        let img = image::open(&png).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(1, 1), &Rgb([0, 90, 0]));
    }

    #[test]
    fn test_missing_texture() {
        let dir = TempDir::new().unwrap();
        touch_png(dir.path(), "fantasy_dirt.png");
        touch_png(dir.path(), "fantasy_mountains.png");
        match resolve_textures(dir.path(), "fantasy") {
            Err(MapError::MissingTexture { path }) => assert!(path.ends_with("fantasy_trees.png")),
            other => panic!("expected MissingTexture, got {other:?}"),
        }
        touch_png(dir.path(), "fantasy_trees.png");
        assert!(resolve_textures(dir.path(), "fantasy").is_ok());
    }
}
