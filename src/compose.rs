//! Per-tile compositing: status mask and owner badge over the base tile.
//!
//! Layer order is fixed — mask first, badge second — so a badge is never
//! obscured by a status mask. All overlays use atop semantics: the source is
//! clipped to the destination's own coverage, keeping the tile's shape.

use crate::constants::{
    BADGE_SCALE_BY_LEVEL, HALF_ALPHA, INACTIVATED_MASK, NOVICE_MASK, RESPAWN_MASK,
};
use crate::error::PrinterError;
use crate::material::DrawMaterial;
use crate::types::RoomStatus;
use image::imageops::FilterType;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Renders one finished room tile as encoded PNG bytes.
///
/// A gap cell short-circuits to `Ok(None)`. Decode failures are fatal and
/// name the room.
pub async fn draw_room(material: Option<&DrawMaterial>) -> Result<Option<Vec<u8>>, PrinterError> {
    let Some(material) = material else {
        return Ok(None);
    };

    let tile_bytes = material.tile.read().await?;
    let mut tile = decode_image(&tile_bytes, &material.room_name)?;

    if let Some(color) = mask_color(material.stats.status) {
        let mask = RgbaImage::from_pixel(tile.width(), tile.height(), color);
        overlay_atop(&mut tile, &mask, 0, 0);
    }

    if let (Some(owner), Some(handle)) = (&material.stats.own, &material.badge) {
        let badge_bytes = handle.read().await?;
        let badge = decode_image(&badge_bytes, &material.room_name)?;

        let factor = BADGE_SCALE_BY_LEVEL[usize::from(owner.level.min(8))];
        let scaled_width = ((badge.width() as f32) * factor).ceil() as u32;
        let scaled_height = ((badge.height() as f32) * factor).ceil() as u32;
        let mut badge = image::imageops::resize(
            &badge,
            scaled_width.max(1),
            scaled_height.max(1),
            FilterType::Lanczos3,
        );

        // A level-0 owner is a remote claim; its badge renders half-faded.
        if owner.level == 0 {
            apply_opacity(&mut badge, HALF_ALPHA);
        }

        let left = (tile.width().saturating_sub(badge.width())) / 2;
        let top = (tile.height().saturating_sub(badge.height())) / 2;
        overlay_atop(&mut tile, &badge, left, top);
    }

    Ok(Some(encode_png(&tile, &material.room_name)?))
}

/// Mask color for a status, `None` for rooms drawn bare.
fn mask_color(status: RoomStatus) -> Option<Rgba<u8>> {
    let rgb = match status {
        RoomStatus::Normal => return None,
        RoomStatus::Inactivated => INACTIVATED_MASK,
        RoomStatus::Respawn => RESPAWN_MASK,
        RoomStatus::Novice => NOVICE_MASK,
    };
    Some(Rgba([rgb[0], rgb[1], rgb[2], HALF_ALPHA]))
}

/// Decodes image bytes, failing with the owning entity's name.
pub(crate) fn decode_image(bytes: &[u8], entity: &str) -> Result<RgbaImage, PrinterError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| PrinterError::decode(entity, e.to_string()))?
        .to_rgba8();

    if image.width() == 0 || image.height() == 0 {
        return Err(PrinterError::decode(
            entity,
            format!("invalid dimensions {}x{}", image.width(), image.height()),
        ));
    }
    Ok(image)
}

/// Encodes an image as PNG bytes.
pub(crate) fn encode_png(image: &RgbaImage, entity: &str) -> Result<Vec<u8>, PrinterError> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| PrinterError::decode(entity, format!("PNG encode failed: {e}")))?;
    Ok(buffer.into_inner())
}

/// Composites `src` over `dest` with atop semantics: colors blend by source
/// alpha, destination alpha is kept, so the source only shows where the
/// destination has coverage.
pub(crate) fn overlay_atop(dest: &mut RgbaImage, src: &RgbaImage, left: u32, top: u32) {
    for (sx, sy, src_pixel) in src.enumerate_pixels() {
        let dx = left + sx;
        let dy = top + sy;
        if dx >= dest.width() || dy >= dest.height() {
            continue;
        }

        let sa = u32::from(src_pixel[3]);
        if sa == 0 {
            continue;
        }

        let dest_pixel = dest.get_pixel_mut(dx, dy);
        if dest_pixel[3] == 0 {
            continue;
        }

        for channel in 0..3 {
            let blended = u32::from(src_pixel[channel]) * sa
                + u32::from(dest_pixel[channel]) * (255 - sa);
            dest_pixel[channel] = (blended / 255) as u8;
        }
    }
}

/// Multiplies the image's alpha channel by `alpha`, leaving colors alone.
/// Images that already carry their own alpha keep their shape.
pub(crate) fn apply_opacity(image: &mut RgbaImage, alpha: u8) {
    for pixel in image.pixels_mut() {
        pixel[3] = ((u16::from(pixel[3]) * u16::from(alpha)) / 255) as u8;
    }
}
