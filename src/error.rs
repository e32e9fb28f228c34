use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geometry::GeometryError;
use crate::sprite::frm::DecodeError;
use crate::sprite::palette::PaletteError;

/// Crate-level error for operations that touch the filesystem or combine
/// several stages (config loading, export, the command-line tool).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("{path}: {source}")]
    Decode { path: PathBuf, source: DecodeError },
    #[error(transparent)]
    Palette(#[from] PaletteError),
    #[error("{path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Adapter for `map_err` on I/O results.
    pub fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.as_ref().to_path_buf();
        move |source| Error::Io { path, source }
    }

    /// Adapter for `map_err` on decode results.
    pub fn decode(path: impl AsRef<Path>) -> impl FnOnce(DecodeError) -> Error {
        let path = path.as_ref().to_path_buf();
        move |source| Error::Decode { path, source }
    }
}
