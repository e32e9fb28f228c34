// ── Palettes ─────────────────────────────────────────────────────────────────
//
// A palette is a flat list of RGB triples indexed by the bytes of an FRM
// frame. Palettes arrive as GIMP `.gpl` text, raw `.pal` binaries or JSON
// (flat bytes or colour tuples); all of them normalise to `Palette`.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Built-in Fallout palette in GIMP format.
pub const FALLOUT_GPL: &str = include_str!("../../resources/fallout.gpl");

/// Size of a full 256-colour binary palette.
const BINARY_PALETTE_LEN: usize = 768;
/// Legacy binary palettes carry a 4-byte block after the colours.
const PADDED_BINARY_PALETTE_LEN: usize = 772;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("palette index {index} is outside the {colors}-colour palette")]
    IndexOutOfRange { index: u8, colors: usize },
    #[error("invalid palette: {0}")]
    InvalidPalette(String),
}

impl PaletteError {
    fn invalid(reason: impl Into<String>) -> Self {
        PaletteError::InvalidPalette(reason.into())
    }
}

// ── Palette ──────────────────────────────────────────────────────────────────

/// Flat RGB triples. Entry 0 is treated as transparent when compositing,
/// whatever colour it holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    rgb: Vec<u8>,
}

impl Palette {
    /// Wrap flat RGB bytes; the length must be a multiple of 3.
    pub fn from_flat(bytes: impl Into<Vec<u8>>) -> Result<Self, PaletteError> {
        let rgb = bytes.into();
        if rgb.len() % 3 != 0 {
            return Err(PaletteError::invalid(format!(
                "{} bytes is not a whole number of RGB triples",
                rgb.len()
            )));
        }
        Ok(Self { rgb })
    }

    /// Build from `[R, G, B]` or `[R, G, B, A]` tuples. Channels are clamped
    /// to 0..=255 and rounded; alpha is ignored.
    pub fn from_colors<C: AsRef<[f64]>>(colors: &[C]) -> Result<Self, PaletteError> {
        let mut rgb = Vec::with_capacity(colors.len() * 3);
        for (i, color) in colors.iter().enumerate() {
            let color = color.as_ref();
            if color.len() < 3 {
                return Err(PaletteError::invalid(format!(
                    "colour #{i} needs at least 3 components, got {}",
                    color.len()
                )));
            }
            for &channel in &color[..3] {
                rgb.push(clamp_channel(channel)?);
            }
        }
        Ok(Self { rgb })
    }

    /// The built-in 256-colour Fallout palette.
    pub fn fallout() -> Result<Self, PaletteError> {
        parse_gimp_palette(FALLOUT_GPL)
    }

    /// Number of colours.
    pub fn len(&self) -> usize {
        self.rgb.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.rgb.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.rgb
    }

    /// Colour at `index`, or None past the end of the palette.
    #[inline]
    pub fn rgb(&self, index: u8) -> Option<[u8; 3]> {
        let base = index as usize * 3;
        self.rgb.get(base..base + 3).map(|c| [c[0], c[1], c[2]])
    }
}

fn clamp_channel(value: f64) -> Result<u8, PaletteError> {
    if !value.is_finite() {
        return Err(PaletteError::invalid("colour components must be finite numbers"));
    }
    Ok(value.clamp(0.0, 255.0).round() as u8)
}

// ── PaletteInput ─────────────────────────────────────────────────────────────

/// Palette as supplied by callers or JSON files, before normalisation.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PaletteInput {
    /// `[r, g, b, r, g, b, ...]`
    Flat(Vec<u8>),
    /// `[[r, g, b], [r, g, b, a], ...]`
    Colors(Vec<Vec<f64>>),
}

/// Normalise any accepted palette shape to flat RGB.
pub fn normalize_palette(input: &PaletteInput) -> Result<Palette, PaletteError> {
    match input {
        PaletteInput::Flat(bytes) => Palette::from_flat(bytes.as_slice()),
        PaletteInput::Colors(colors) => Palette::from_colors(colors.as_slice()),
    }
}

impl TryFrom<PaletteInput> for Palette {
    type Error = PaletteError;

    fn try_from(input: PaletteInput) -> Result<Self, Self::Error> {
        match input {
            PaletteInput::Flat(bytes) => Palette::from_flat(bytes),
            PaletteInput::Colors(colors) => Palette::from_colors(colors.as_slice()),
        }
    }
}

// =============================================================================
// PALETTE FILES
// =============================================================================

/// Parse a GIMP `.gpl` palette.
///
/// Blank lines, `#` comments and lines starting with a letter (`GIMP
/// Palette`, `Name:`, `Columns:`) are skipped. Every other line with at least
/// three numeric fields contributes one colour; extra columns such as colour
/// names are ignored. A field counts by its leading integer, so `255.5` reads
/// as 255 and `12abc` as 12.
pub fn parse_gimp_palette(text: &str) -> Result<Palette, PaletteError> {
    let mut rgb = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(|c: char| c.is_ascii_alphabetic()) {
            continue;
        }
        let values: Vec<i64> = line.split_whitespace().filter_map(leading_integer).collect();
        if values.len() >= 3 {
            rgb.extend(values[..3].iter().map(|&v| v.clamp(0, 255) as u8));
        }
    }

    if rgb.is_empty() {
        return Err(PaletteError::invalid("no colours found in GIMP palette"));
    }
    Ok(Palette { rgb })
}

/// Optional sign followed by at least one digit; the rest of the token is
/// ignored. Digit runs too long for `i64` saturate.
fn leading_integer(token: &str) -> Option<i64> {
    let (negative, unsigned) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    let digits = unsigned.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let magnitude = unsigned[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a raw binary palette (RGB triples, optionally followed by the
/// legacy 4-byte block in 772-byte files).
pub fn parse_binary_palette(bytes: &[u8]) -> Result<Palette, PaletteError> {
    match bytes.len() {
        0 => Err(PaletteError::invalid("binary palette is empty")),
        PADDED_BINARY_PALETTE_LEN => Ok(Palette { rgb: bytes[..BINARY_PALETTE_LEN].to_vec() }),
        _ => Palette::from_flat(bytes),
    }
}

/// Parse a palette file, picking the format from the file name's extension.
///
/// `.gpl` is GIMP text, `.json` is a [`PaletteInput`], anything else binary.
pub fn parse_palette_file(bytes: &[u8], name: Option<&str>) -> Result<Palette, PaletteError> {
    let extension = name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("gpl") => parse_gimp_palette(&String::from_utf8_lossy(bytes)),
        Some("json") => {
            let input: PaletteInput =
                serde_json::from_slice(bytes).map_err(|e| PaletteError::invalid(e.to_string()))?;
            Palette::try_from(input)
        }
        _ => parse_binary_palette(bytes),
    }
}
