use image::RgbaImage;

use crate::sprite::frm::{DIRECTIONS, Frame, SpriteContainer};
use crate::sprite::palette::{Palette, PaletteError};

/// Palette slot that is always drawn fully transparent.
pub const TRANSPARENT_INDEX: u8 = 0;

// ── RgbaFrame ────────────────────────────────────────────────────────────────

/// A frame resolved to 8-bit RGBA, ready for upload or export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbaFrame {
    pub width: u16,
    pub height: u16,
    pub offset_x: i16,
    pub offset_y: i16,
    /// `width * height * 4` bytes, row-major RGBA.
    pub pixels: Vec<u8>,
}

impl RgbaFrame {
    /// Pixels viewed as one `[r, g, b, a]` per texel.
    pub fn texels(&self) -> &[[u8; 4]] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Copy into an `image` buffer (e.g. for PNG encoding).
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width as u32, self.height as u32, self.pixels.clone())
    }
}

// =============================================================================
// COMPOSITING
// =============================================================================

/// Resolve one indexed frame against `palette`.
///
/// Index 0 becomes `(0, 0, 0, 0)`; every other index becomes the palette
/// colour with alpha 255.
pub fn composite_frame(frame: &Frame, palette: &Palette) -> Result<RgbaFrame, PaletteError> {
    let mut pixels = vec![0u8; frame.pixels.len() * 4];

    let texels: &mut [[u8; 4]] = bytemuck::cast_slice_mut(&mut pixels);
    for (texel, &index) in texels.iter_mut().zip(&frame.pixels) {
        if index == TRANSPARENT_INDEX {
            continue;
        }
        let [r, g, b] = palette
            .rgb(index)
            .ok_or(PaletteError::IndexOutOfRange { index, colors: palette.len() })?;
        *texel = [r, g, b, 255];
    }

    Ok(RgbaFrame {
        width: frame.width,
        height: frame.height,
        offset_x: frame.offset_x,
        offset_y: frame.offset_y,
        pixels,
    })
}

/// Resolve every frame of every direction, indexed `[direction][frame]`.
pub fn apply_palette(
    container: &SpriteContainer,
    palette: &Palette,
) -> Result<[Vec<RgbaFrame>; DIRECTIONS], PaletteError> {
    let mut out: [Vec<RgbaFrame>; DIRECTIONS] = Default::default();
    for (direction, frames) in container.directions.iter().enumerate() {
        out[direction] = frames
            .iter()
            .map(|frame| composite_frame(frame, palette))
            .collect::<Result<_, _>>()?;
    }
    Ok(out)
}
