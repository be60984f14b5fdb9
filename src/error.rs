//! Error types for map generation

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can stop a map run.
///
/// All variants are fatal: a failed run writes no output file.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("no region exports found in {}", dir.display())]
    NoInputFound { dir: PathBuf },

    #[error("insufficient layers for {region}: missing {}", missing.join(", "))]
    InsufficientLayers { region: String, missing: Vec<String> },

    #[error("style texture not found: {}", path.display())]
    MissingTexture { path: PathBuf },

    #[error("invalid format for layer '{layer}': {reason}")]
    InvalidFormat { layer: String, reason: String },

    #[error(
        "dimension mismatch for layer '{layer}': expected {}x{}, found {}x{}",
        expected.0, expected.1, found.0, found.1
    )]
    DimensionMismatch {
        layer: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MapError>;
