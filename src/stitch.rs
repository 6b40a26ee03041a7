//! Row and map stitching.
//!
//! Finished tiles are placed on row canvases, each row is persisted through
//! the row cache, and the cached rows are then stacked into the final map.
//! Going through disk keeps at most one row of decoded pixels in memory.

use crate::cache::CacheManager;
use crate::compose::{decode_image, encode_png, overlay_atop};
use crate::constants::ROOM_PIXELS;
use crate::error::PrinterError;
use crate::matrix::Matrix;
use image::{Rgba, RgbaImage};
use std::path::PathBuf;
use tracing::debug;

/// Stitches every row of tiles onto a background canvas and persists it
/// through the row cache.
///
/// The canvas width is the widest row times the tile unit, so ragged rows
/// all land on equally wide images. Gap cells leave the background visible.
/// Returns the row file paths plus the canvas width in pixels.
pub async fn stitch_rows(
    tiles: Matrix<Option<Vec<u8>>>,
    names: &Matrix<Option<String>>,
    cache: &CacheManager,
    background: Rgba<u8>,
) -> Result<(Vec<PathBuf>, u32), PrinterError> {
    let columns = tiles.iter().map(Vec::len).max().unwrap_or(0) as u32;
    let width = columns * ROOM_PIXELS;

    let mut row_paths = Vec::with_capacity(tiles.len());
    for (row_index, (tile_row, name_row)) in tiles.into_iter().zip(names).enumerate() {
        let mut canvas = RgbaImage::from_pixel(width, ROOM_PIXELS, background);

        for (column, tile) in tile_row.iter().enumerate() {
            let Some(bytes) = tile else { continue };
            let entity = name_row
                .get(column)
                .and_then(|name| name.as_deref())
                .unwrap_or("unnamed room");
            let image = decode_image(bytes, entity)?;
            overlay_atop(&mut canvas, &image, column as u32 * ROOM_PIXELS, 0);
        }

        let encoded = encode_png(&canvas, &format!("map row {row_index}"))?;
        let path = cache.store_row(name_row, &encoded).await?;
        debug!(row = row_index, path = %path.display(), "row stitched");
        row_paths.push(path);
    }

    Ok((row_paths, width))
}

/// Stacks the cached row images vertically into the final map and returns
/// the encoded PNG.
pub async fn stitch_map(
    row_paths: &[PathBuf],
    width: u32,
    background: Rgba<u8>,
) -> Result<Vec<u8>, PrinterError> {
    let height = row_paths.len() as u32 * ROOM_PIXELS;
    let mut canvas = RgbaImage::from_pixel(width, height, background);

    for (row_index, path) in row_paths.iter().enumerate() {
        let bytes = tokio::fs::read(path).await?;
        let image = decode_image(&bytes, &path.display().to_string())?;
        overlay_atop(&mut canvas, &image, 0, row_index as u32 * ROOM_PIXELS);
    }

    encode_png(&canvas, "world map")
}
