// =============================================================================
// GEOMETRY.RS: Hex grid geometry for the isometric map
//
// The map is a staggered hex grid flattened row-major into one integer index:
// - Index <-> screen conversion (isometric projection, not axial)
// - 6-neighbour adjacency (offsets depend on column parity)
// - Orientation between neighbouring hexes
// - Screen-space distance, used as the pathfinding heuristic
// =============================================================================

use glam::DVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Flattened grid address: `index = r * width + q`.
///
/// Signed on purpose: `adjacent` happily produces negative neighbours at the
/// top edge and leaves bounds checking to the caller.
pub type HexIndex = i64;

/// Pixel position on the map canvas.
pub type ScreenPoint = DVec2;

/// Legacy hex grid width used by every shipped map.
pub const DEFAULT_HEX_WIDTH: u32 = 200;

/// Legacy width of the roof/floor tile grid.
pub const DEFAULT_TILE_COLUMNS: u32 = 100;

/// Pixel offset that lines the tile grid up with the hex grid.
pub const TILE_ALIGNMENT_OFFSET: DVec2 = DVec2::new(48.0, -3.0);

/// Number of neighbours of a hex.
pub const HEX_NEIGHBOURS: usize = 6;

/// Names of the `adjacent` slots, in slot order.
pub const ADJACENT_NAMES: [&str; HEX_NEIGHBOURS] = ["NW", "NE", "S", "SE", "SW", "N"];

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("grid width must be positive")]
    ZeroWidth,
    #[error("tile column count must be positive")]
    ZeroTileColumns,
    #[error("screen coordinates must be finite numbers")]
    NonFinite,
    #[error("origin and destination hexes are identical")]
    SameCell,
    #[error("hex {dest} is not adjacent to hex {origin}")]
    NotAdjacent { origin: HexIndex, dest: HexIndex },
    #[error("coordinates are outside the addressable hex range")]
    OutOfRange,
}

// ── HexGrid ──────────────────────────────────────────────────────────────────

/// Geometry options of a map: how wide the hex grid is and how wide the tile
/// grid drawn underneath it is.
///
/// The same `HexGrid` must be used for every conversion, adjacency and
/// pathfinding call on one map. Nothing cross-checks this; a mismatched width
/// quietly produces wrong neighbours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GridOptions", rename_all = "camelCase")]
pub struct HexGrid {
    width: u32,
    tile_columns: u32,
}

/// JSON-facing shape of `HexGrid`; validated through `TryFrom`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridOptions {
    #[serde(default = "default_width")]
    width: u32,
    #[serde(default = "default_tile_columns")]
    tile_columns: u32,
}

fn default_width() -> u32 {
    DEFAULT_HEX_WIDTH
}

fn default_tile_columns() -> u32 {
    DEFAULT_TILE_COLUMNS
}

impl TryFrom<GridOptions> for HexGrid {
    type Error = GeometryError;

    fn try_from(options: GridOptions) -> Result<Self, Self::Error> {
        HexGrid::new(options.width)?.with_tile_columns(options.tile_columns)
    }
}

impl Default for HexGrid {
    fn default() -> Self {
        Self { width: DEFAULT_HEX_WIDTH, tile_columns: DEFAULT_TILE_COLUMNS }
    }
}

impl HexGrid {
    /// Grid of the given hex width with the default tile grid.
    pub fn new(width: u32) -> Result<Self, GeometryError> {
        if width == 0 {
            return Err(GeometryError::ZeroWidth);
        }
        Ok(Self { width, tile_columns: DEFAULT_TILE_COLUMNS })
    }

    pub fn with_tile_columns(self, tile_columns: u32) -> Result<Self, GeometryError> {
        if tile_columns == 0 {
            return Err(GeometryError::ZeroTileColumns);
        }
        Ok(Self { tile_columns, ..self })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn tile_columns(&self) -> u32 {
        self.tile_columns
    }

    /// Flatten a (column, row) pair. Fails with `OutOfRange` when the
    /// index does not fit in a `HexIndex`.
    #[inline]
    pub fn to_hex_index(&self, q: i64, r: i64) -> Result<HexIndex, GeometryError> {
        r.checked_mul(self.width as i64)
            .and_then(|row_start| row_start.checked_add(q))
            .ok_or(GeometryError::OutOfRange)
    }

    /// Split an index into (column, row). The column is always in `0..width`.
    #[inline]
    pub fn from_hex_index(&self, index: HexIndex) -> (i64, i64) {
        let w = self.width as i64;
        (index.rem_euclid(w), index.div_euclid(w))
    }

    // =========================================================================
    // SCREEN PROJECTION
    // =========================================================================

    /// Top-left pixel position of a hex.
    ///
    /// ```text
    /// x = -32q + 16r + 16*floor(q/2)
    /// y =  12r       + 12*floor(q/2)
    /// ```
    ///
    /// Projected in `f64`, so every index has a position. Rows past 2^49
    /// lose whole-pixel precision.
    pub fn index_to_screen(&self, index: HexIndex) -> ScreenPoint {
        let (q, r) = self.from_hex_index(index);
        let (q, r, half) = (q as f64, r as f64, q.div_euclid(2) as f64);
        DVec2::new(-32.0 * q + 16.0 * r + 16.0 * half, 12.0 * r + 12.0 * half)
    }

    /// Inverse of `index_to_screen`.
    ///
    /// Writing `s = r + floor(q/2)` the projection is `y = 12s` and
    /// `x = 16s - 32q`, so both terms can be solved for directly. Points that
    /// are not exactly on the lattice snap to the nearest `s`, then the
    /// nearest `q`. Points too far out to have an index fail with
    /// `OutOfRange`.
    pub fn screen_to_index(&self, point: ScreenPoint) -> Result<HexIndex, GeometryError> {
        if !point.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let s = exact_integer((point.y / 12.0).round())?;
        let q = exact_integer(((16.0 * s as f64 - point.x) / 32.0).round())?;
        let r = s.checked_sub(q.div_euclid(2)).ok_or(GeometryError::OutOfRange)?;
        self.to_hex_index(q, r)
    }

    /// Top-left pixel position of a roof/floor tile.
    pub fn tile_index_to_screen(&self, index: i64) -> ScreenPoint {
        let columns = self.tile_columns as i64;
        let col = index.rem_euclid(columns);
        let row = index.div_euclid(columns);
        DVec2::new(
            -TILE_ALIGNMENT_OFFSET.x - (col * 48) as f64 + (row * 32) as f64,
            TILE_ALIGNMENT_OFFSET.y + (col * 12) as f64 + (row * 24) as f64,
        )
    }

    // =========================================================================
    // ADJACENCY
    // =========================================================================

    /// The six neighbours of `index` in `[NW, NE, S, SE, SW, N]` order.
    ///
    /// Odd and even columns are staggered, so the diagonal offsets differ by
    /// column parity. No bounds checking: results may be negative or past
    /// the last row.
    pub fn adjacent(&self, index: HexIndex) -> [HexIndex; HEX_NEIGHBOURS] {
        let w = self.width as i64;
        let odd_column = index.rem_euclid(w) % 2 != 0;
        if odd_column {
            [index - (w + 1), index - 1, index + w, index + 1, index - (w - 1), index - w]
        } else {
            [index - 1, index + (w - 1), index + w, index + (w + 1), index + 1, index - w]
        }
    }

    /// Slot (0..6) of `dest` in `adjacent(origin)`.
    pub fn orientation(&self, origin: HexIndex, dest: HexIndex) -> Result<usize, GeometryError> {
        if origin == dest {
            return Err(GeometryError::SameCell);
        }
        self.adjacent(origin)
            .iter()
            .position(|&n| n == dest)
            .ok_or(GeometryError::NotAdjacent { origin, dest })
    }

    /// Euclidean distance between the screen positions of two hexes.
    ///
    /// Not a hex step count: neighbouring hexes are 20 to 32 pixels apart
    /// depending on direction.
    pub fn heuristic_distance(&self, a: HexIndex, b: HexIndex) -> f64 {
        self.index_to_screen(a).distance(self.index_to_screen(b))
    }
}

/// Largest magnitude below which every integer is exactly representable in
/// an `f64`.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Convert an already-rounded float, refusing values that would saturate or
/// lose integer precision.
fn exact_integer(value: f64) -> Result<i64, GeometryError> {
    if value.abs() > MAX_EXACT_INTEGER {
        return Err(GeometryError::OutOfRange);
    }
    Ok(value as i64)
}

// =============================================================================
// AXIAL HEXES
//
// Free-standing axial coordinates on a 128x64 diamond tile, used by the
// client's world view independently of the flattened map grid.
// =============================================================================

/// Width of an axial hex tile in world pixels.
pub const HEX_TILE_WIDTH: f64 = 128.0;

/// Height of an axial hex tile in world pixels.
pub const HEX_TILE_HEIGHT: f64 = 64.0;

/// Axial hex coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Axial {
    pub q: i64,
    pub r: i64,
}

/// Unit steps to the six axial neighbours.
pub const HEX_DIRECTIONS: [Axial; HEX_NEIGHBOURS] = [
    Axial::new(1, 0),
    Axial::new(1, -1),
    Axial::new(0, -1),
    Axial::new(-1, 0),
    Axial::new(-1, 1),
    Axial::new(0, 1),
];

impl Axial {
    pub const fn new(q: i64, r: i64) -> Self {
        Self { q, r }
    }

    /// Neighbour in `HEX_DIRECTIONS[direction % 6]`.
    pub fn neighbour(self, direction: usize) -> Self {
        let step = HEX_DIRECTIONS[direction % HEX_NEIGHBOURS];
        Self::new(self.q + step.q, self.r + step.r)
    }

    /// Centre of the hex in world pixels.
    pub fn to_world(self) -> DVec2 {
        let (q, r) = (self.q as f64, self.r as f64);
        DVec2::new((q - r) * HEX_TILE_WIDTH / 2.0, (q + r) * HEX_TILE_HEIGHT / 2.0)
    }

    /// Hex whose centre is nearest to `point`, found by cube rounding.
    pub fn from_world(point: DVec2) -> Result<Self, GeometryError> {
        if !point.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let x = point.x / (HEX_TILE_WIDTH / 2.0);
        let y = point.y / (HEX_TILE_HEIGHT / 2.0);
        let q = 0.5 * (x + y);
        let r = 0.5 * (y - x);
        let [cx, _, cz] = cube_round([q, -q - r, r]);
        Ok(Self::new(exact_integer(cx)?, exact_integer(cz)?))
    }

    /// Hex steps between two cells (cube max-norm).
    pub fn distance(self, other: Axial) -> i64 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.q + self.r - other.q - other.r).abs();
        dq.max(dr).max(ds)
    }
}

/// Round each cube component, then rebuild the one with the largest rounding
/// error from the other two so that `x + y + z == 0` still holds. Ties go to
/// `z`, then `y`. Halves round toward positive infinity.
fn cube_round(cube: [f64; 3]) -> [f64; 3] {
    let round = |v: f64| (v + 0.5).floor();
    let [mut rx, mut ry, mut rz] = cube.map(round);
    let [dx, dy, dz] = [(rx - cube[0]).abs(), (ry - cube[1]).abs(), (rz - cube[2]).abs()];

    if dx > dy && dx > dz {
        rx = -ry - rz;
    } else if dy > dz {
        ry = -rx - rz;
    } else {
        rz = -rx - ry;
    }
    // Normalise -0.0 so the integer conversion is unambiguous.
    [rx + 0.0, ry + 0.0, rz + 0.0]
}

// =============================================================================
// RECTANGLES
// =============================================================================

/// Axis-aligned screen rectangle (top-left origin).
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Overlap test with inclusive edges: rectangles that only touch count.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.x > self.x + self.w
            || other.x + other.w < self.x
            || other.y > self.y + self.h
            || other.y + other.h < self.y)
    }
}
