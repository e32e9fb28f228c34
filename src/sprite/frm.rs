//! Decoder for FRM sprite containers.
//!
//! An FRM file holds one animation in six facings. There is no magic number
//! and no byte-order marker: files exist in both big- and little-endian
//! flavours, sometimes mixed within one file, so every structure is read
//! both ways and the plausible reading wins.
//!
//! # Layout
//! ```text
//! 0x00: version              u32
//! 0x04: fps                  u16
//! 0x06: action_frame         u16
//! 0x08: frames_per_direction u16
//! 0x0A: shift_x              i16 × 6
//! 0x16: shift_y              i16 × 6
//! 0x22: direction_offsets    u32 × 6  (relative to 0x3E)
//! 0x3A: frame_area_size      u32
//! 0x3E: frame area
//! ```
//! Each direction is `frames_per_direction` consecutive frame records:
//! ```text
//! +0:  width      u16
//! +2:  height     u16
//! +4:  pixel_size u32  (== width * height)
//! +8:  offset_x   i16
//! +10: offset_y   i16
//! +12: pixel_size palette indices
//! ```

use std::time::Duration;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

/// Number of facings stored in a container.
pub const DIRECTIONS: usize = 6;

/// Size of the fixed header; the frame area starts right after it.
pub const FRAME_AREA_OFFSET: usize = 0x3E;

const FRAME_RECORD_SIZE: usize = 12;
const MAX_FPS: u16 = 1000;
const MAX_FRAMES_PER_DIRECTION: u16 = 400;
const MAX_FRAME_DIMENSION: u16 = 4096;

// ── Errors ───────────────────────────────────────────────────────────────────

/// The ways an FRM file can be corrupt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("FRM file is corrupt: {len} bytes is shorter than the 62-byte header")]
    TruncatedHeader { len: usize },
    #[error("FRM file is corrupt: header is implausible in both byte orders")]
    CorruptHeader,
    #[error("FRM file is corrupt: frame area ends at byte {end}, past the end of the {len}-byte file")]
    FrameAreaOutOfBounds { end: usize, len: usize },
    #[error("FRM file is corrupt: record of frame {frame} in direction {direction} is truncated")]
    TruncatedFrame { direction: usize, frame: usize },
    #[error("FRM file is corrupt: frame {frame} in direction {direction} has implausible dimensions in both byte orders")]
    CorruptFrame { direction: usize, frame: usize },
    #[error("FRM file is corrupt: frame {frame} in direction {direction} declares {size} pixel bytes, only {available} left")]
    PixelDataOutOfBounds { direction: usize, frame: usize, size: usize, available: usize },
}

// ── Byte order ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    fn other(self) -> Self {
        match self {
            ByteOrder::Big => ByteOrder::Little,
            ByteOrder::Little => ByteOrder::Big,
        }
    }
}

/// Fixed-order view over a byte buffer. Callers check bounds before reading.
#[derive(Clone, Copy)]
struct Reader<'a> {
    bytes: &'a [u8],
    order: ByteOrder,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], order: ByteOrder) -> Self {
        Self { bytes, order }
    }

    fn u16(&self, at: usize) -> u16 {
        let raw = [self.bytes[at], self.bytes[at + 1]];
        match self.order {
            ByteOrder::Big => u16::from_be_bytes(raw),
            ByteOrder::Little => u16::from_le_bytes(raw),
        }
    }

    fn i16(&self, at: usize) -> i16 {
        self.u16(at) as i16
    }

    fn u32(&self, at: usize) -> u32 {
        let raw = [self.bytes[at], self.bytes[at + 1], self.bytes[at + 2], self.bytes[at + 3]];
        match self.order {
            ByteOrder::Big => u32::from_be_bytes(raw),
            ByteOrder::Little => u32::from_le_bytes(raw),
        }
    }
}

// ── Decoded structures ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrmHeader {
    pub version: u32,
    pub fps: u16,
    /// Frame on which the animation's action (hit, shot, ...) lands.
    pub action_frame: u16,
    pub frames_per_direction: u16,
    pub shift_x: [i16; DIRECTIONS],
    pub shift_y: [i16; DIRECTIONS],
    /// Offset of each direction's first record, relative to the frame area.
    pub direction_offsets: [u32; DIRECTIONS],
}

impl FrmHeader {
    /// How long each frame stays on screen. An fps of 0 plays at 1 fps.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fps.max(1)))
    }

    fn read(reader: Reader<'_>) -> (Self, u32) {
        let mut shift_x = [0i16; DIRECTIONS];
        let mut shift_y = [0i16; DIRECTIONS];
        let mut direction_offsets = [0u32; DIRECTIONS];
        for d in 0..DIRECTIONS {
            shift_x[d] = reader.i16(0x0A + d * 2);
            shift_y[d] = reader.i16(0x16 + d * 2);
            direction_offsets[d] = reader.u32(0x22 + d * 4);
        }
        let header = Self {
            version: reader.u32(0x00),
            fps: reader.u16(0x04),
            action_frame: reader.u16(0x06),
            frames_per_direction: reader.u16(0x08),
            shift_x,
            shift_y,
            direction_offsets,
        };
        (header, reader.u32(0x3A))
    }

    fn is_plausible(&self, frame_area_size: u32, buffer_len: usize) -> bool {
        if self.version == 0 || self.version > 0xFFFF {
            return false;
        }
        if self.fps > MAX_FPS {
            return false;
        }
        if self.frames_per_direction == 0 || self.frames_per_direction > MAX_FRAMES_PER_DIRECTION {
            return false;
        }
        let available = buffer_len - FRAME_AREA_OFFSET;
        if frame_area_size == 0 || frame_area_size as usize > available {
            return false;
        }
        self.direction_offsets.iter().all(|&offset| offset == 0 || offset < frame_area_size)
    }
}

/// One frame of palette-indexed pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    pub offset_x: i16,
    pub offset_y: i16,
    /// `width * height` palette indices.
    pub pixels: Vec<u8>,
}

/// A fully decoded FRM file.
///
/// Every direction owns its frames: mirrored directions are deep copies, so
/// editing one direction never shows up in another.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteContainer {
    pub header: FrmHeader,
    pub directions: [Vec<Frame>; DIRECTIONS],
}

impl SpriteContainer {
    /// Frames of one direction; empty for out-of-range directions.
    pub fn frames(&self, direction: usize) -> &[Frame] {
        self.directions.get(direction).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total frames over all directions, mirrored ones included.
    pub fn frame_count(&self) -> usize {
        self.directions.iter().map(Vec::len).sum()
    }
}

impl TryFrom<&[u8]> for SpriteContainer {
    type Error = DecodeError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        decode(bytes)
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decode an FRM file held in memory.
pub fn decode(bytes: &[u8]) -> Result<SpriteContainer, DecodeError> {
    if bytes.len() < FRAME_AREA_OFFSET {
        return Err(DecodeError::TruncatedHeader { len: bytes.len() });
    }

    let (header, frame_area_size, order) = read_header(bytes)?;

    let frame_area_end = FRAME_AREA_OFFSET + frame_area_size as usize;
    if frame_area_end > bytes.len() {
        return Err(DecodeError::FrameAreaOutOfBounds { end: frame_area_end, len: bytes.len() });
    }

    let mut directions: [Vec<Frame>; DIRECTIONS] = Default::default();

    for direction in 0..DIRECTIONS {
        let offset = header.direction_offsets[direction];

        // Facings without data reuse the previous one.
        if offset == 0 && direction > 0 {
            log::debug!("frm: direction {direction} mirrors direction {}", direction - 1);
            directions[direction] = directions[direction - 1].clone();
            continue;
        }

        let mut frames = Vec::with_capacity(header.frames_per_direction as usize);
        let mut cursor = FRAME_AREA_OFFSET + offset as usize;
        let mut frame_order = order;

        for frame in 0..header.frames_per_direction as usize {
            if cursor + FRAME_RECORD_SIZE > bytes.len() {
                return Err(DecodeError::TruncatedFrame { direction, frame });
            }

            let (record, used) = read_frame_record(bytes, cursor, frame_order, frame_area_end)
                .ok_or(DecodeError::CorruptFrame { direction, frame })?;
            if used != frame_order {
                log::debug!("frm: frame {frame} of direction {direction} is {used:?}-endian");
            }
            frame_order = used;
            cursor += FRAME_RECORD_SIZE;

            let size = record.pixel_size as usize;
            if cursor + size > frame_area_end {
                return Err(DecodeError::PixelDataOutOfBounds {
                    direction,
                    frame,
                    size,
                    available: frame_area_end.saturating_sub(cursor),
                });
            }

            log::trace!(
                "frm: direction {direction} frame {frame}: {}x{} at ({}, {})",
                record.width,
                record.height,
                record.offset_x,
                record.offset_y
            );

            frames.push(Frame {
                width: record.width,
                height: record.height,
                offset_x: record.offset_x,
                offset_y: record.offset_y,
                pixels: bytes[cursor..cursor + size].to_vec(),
            });
            cursor += size;
        }

        directions[direction] = frames;
    }

    Ok(SpriteContainer { header, directions })
}

/// Decode many independent files in parallel. Results keep input order.
pub fn decode_batch<B>(buffers: &[B]) -> Vec<Result<SpriteContainer, DecodeError>>
where
    B: AsRef<[u8]> + Sync,
{
    buffers.par_iter().map(|buffer| decode(buffer.as_ref())).collect()
}

/// Big-endian first, little-endian as fallback.
fn read_header(bytes: &[u8]) -> Result<(FrmHeader, u32, ByteOrder), DecodeError> {
    for order in [ByteOrder::Big, ByteOrder::Little] {
        let (header, frame_area_size) = FrmHeader::read(Reader::new(bytes, order));
        if header.is_plausible(frame_area_size, bytes.len()) {
            if order == ByteOrder::Little {
                log::debug!("frm: header is little-endian");
            }
            return Ok((header, frame_area_size, order));
        }
    }
    Err(DecodeError::CorruptHeader)
}

#[derive(Clone, Copy, Debug)]
struct FrameRecord {
    width: u16,
    height: u16,
    pixel_size: u32,
    offset_x: i16,
    offset_y: i16,
}

impl FrameRecord {
    fn read(reader: Reader<'_>, at: usize) -> Self {
        Self {
            width: reader.u16(at),
            height: reader.u16(at + 2),
            pixel_size: reader.u32(at + 4),
            offset_x: reader.i16(at + 8),
            offset_y: reader.i16(at + 10),
        }
    }

    /// The record and its pixels must fit before `frame_area_end`.
    fn is_plausible(&self, cursor: usize, frame_area_end: usize) -> bool {
        let dimension_ok = |d: u16| d > 0 && d <= MAX_FRAME_DIMENSION;
        if !dimension_ok(self.width) || !dimension_ok(self.height) {
            return false;
        }
        if self.pixel_size as usize != self.width as usize * self.height as usize {
            return false;
        }
        let remaining = frame_area_end.saturating_sub(cursor + FRAME_RECORD_SIZE);
        remaining >= self.pixel_size as usize
    }
}

/// Try the byte order of the previous record first, then the other one.
fn read_frame_record(
    bytes: &[u8],
    cursor: usize,
    preferred: ByteOrder,
    frame_area_end: usize,
) -> Option<(FrameRecord, ByteOrder)> {
    [preferred, preferred.other()].into_iter().find_map(|order| {
        let record = FrameRecord::read(Reader::new(bytes, order), cursor);
        record.is_plausible(cursor, frame_area_end).then_some((record, order))
    })
}
