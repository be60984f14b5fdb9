//! Fantasy map rendering library
//!
//! Turns a set of world raster exports (biome, elevation, vegetation...)
//! into a stylized composite map. Re-exports modules for use by binaries
//! and tools.

pub mod compositor;
pub mod error;
pub mod layers;
pub mod logging;
pub mod mask;
pub mod mountains;
pub mod ocean;
pub mod pipeline;
pub mod raster;
pub mod region;
pub mod style;
pub mod tiling;

pub use error::{MapError, Result};
