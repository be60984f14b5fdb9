//! Repeat small style textures across the full canvas.

use rayon::prelude::*;

use crate::raster::RasterLayer;

/// Tile `texture` from the top-left corner until it covers `width` x `height`.
///
/// Tiles that overhang the right or bottom edge are clipped, never wrapped.
pub fn tile_to_size(texture: &RasterLayer, width: usize, height: usize) -> RasterLayer {
    let (tw, th) = texture.dimensions();
    let channels = texture.channels();
    if tw == 0 || th == 0 {
        log::warn!("texture '{}' is empty, tiling produces a blank layer", texture.name);
        return RasterLayer::new(&texture.name, width, height, channels);
    }

    let step = channels.count();
    let src = texture.as_bytes();
    let src_stride = tw * step;
    let mut tiled = RasterLayer::new(&texture.name, width, height, channels);
    tiled.par_rows_mut().for_each(|(y, row)| {
        let src_row = &src[(y % th) * src_stride..(y % th + 1) * src_stride];
        for dst in row.chunks_mut(src_stride) {
            let n = dst.len();
            dst.copy_from_slice(&src_row[..n]);
        }
    });
    tiled
}
