use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;
use crate::geometry::HexGrid;

// ── Config ───────────────────────────────────────────────────────────────────

/// Map and asset defaults, usually read from a JSON file:
///
/// ```json
/// {
///   "grid": { "width": 200, "tileColumns": 100 },
///   "height": 200,
///   "palette": "assets/color.pal",
///   "maxPathIterations": 100000
/// }
/// ```
///
/// Every key is optional.
#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Hex grid geometry shared by every conversion and path query.
    pub grid: HexGrid,
    /// Map height in hex rows; bounds pathfinding when set.
    pub height: Option<u32>,
    /// Palette file used when decoding sprites. `None` means the built-in
    /// Fallout palette.
    pub palette: Option<PathBuf>,
    /// Cap on expanded nodes per path query.
    pub max_path_iterations: Option<usize>,
}

impl Config {
    /// Deserialise a `Config` from a JSON string.
    ///
    /// Returns a `serde_json::Error` if the input is malformed or the grid
    /// options are invalid (zero width or tile columns).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and parse a JSON config file. Relative palette paths are
    /// resolved against the config file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(Error::io(path))?;
        let mut config = Self::from_json(&json)?;

        if let (Some(palette), Some(dir)) = (config.palette.as_ref(), path.parent()) {
            if palette.is_relative() {
                config.palette = Some(dir.join(palette));
            }
        }

        log::debug!("config: loaded {}", path.display());
        Ok(config)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
