use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Error;
use crate::sprite::compositor::apply_palette;
use crate::sprite::frm::{FrmHeader, SpriteContainer, decode, decode_batch};
use crate::sprite::palette::Palette;

// ── Metadata ─────────────────────────────────────────────────────────────────

/// One exported frame, as listed in the `{base}.json` sidecar.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetadata {
    pub frame: usize,
    pub width: u16,
    pub height: u16,
    pub x_off: i16,
    pub y_off: i16,
    /// PNG file name, relative to the output directory.
    pub file: String,
}

/// Contents of the `{base}.json` sidecar written next to the PNGs.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportMetadata {
    pub header: FrmHeader,
    pub directions: Vec<Vec<FrameMetadata>>,
}

/// Outcome of exporting a folder.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub exported: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, Error)>,
}

// =============================================================================
// EXPORT
// =============================================================================

/// Composite every frame of `container` and write it out as
/// `{base}_dir{d}_frame{i}.png`, plus a `{base}.json` metadata file.
pub fn export_container(
    container: &SpriteContainer,
    palette: &Palette,
    base: &str,
    out_dir: &Path,
) -> Result<ExportMetadata, Error> {
    let rgba = apply_palette(container, palette)?;
    fs::create_dir_all(out_dir).map_err(Error::io(out_dir))?;

    let mut directions = Vec::with_capacity(rgba.len());
    for (direction, frames) in rgba.iter().enumerate() {
        let mut listed = Vec::with_capacity(frames.len());
        for (index, frame) in frames.iter().enumerate() {
            let file = format!("{base}_dir{direction}_frame{index}.png");
            image::save_buffer(
                out_dir.join(&file),
                &frame.pixels,
                frame.width as u32,
                frame.height as u32,
                image::ColorType::Rgba8,
            )?;
            listed.push(FrameMetadata {
                frame: index,
                width: frame.width,
                height: frame.height,
                x_off: frame.offset_x,
                y_off: frame.offset_y,
                file,
            });
        }
        directions.push(listed);
    }

    let metadata = ExportMetadata { header: container.header.clone(), directions };
    let json_path = out_dir.join(format!("{base}.json"));
    fs::write(&json_path, serde_json::to_string_pretty(&metadata)?).map_err(Error::io(&json_path))?;

    Ok(metadata)
}

/// Read, decode and export a single FRM file. The file stem is the base name.
pub fn export_file(path: &Path, palette: &Palette, out_dir: &Path) -> Result<ExportMetadata, Error> {
    let bytes = fs::read(path).map_err(Error::io(path))?;
    let container = decode(&bytes).map_err(Error::decode(path))?;
    export_container(&container, palette, &base_name(path), out_dir)
}

/// Whether `path` looks like an FRM file: `.frm`, or `.fr0` to `.fr5` for
/// per-direction files.
pub fn is_frm_path(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    matches!(
        ext.to_ascii_lowercase().as_str(),
        "frm" | "fr0" | "fr1" | "fr2" | "fr3" | "fr4" | "fr5"
    )
}

/// Scan `path` recursively for FRM files, sorted for stable output.
pub fn find_frm_files(path: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_frm_path(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Export every FRM file under `in_dir` into `out_dir`.
///
/// Files are decoded in parallel; one bad file does not stop the batch.
/// Output names come from the file name, so a second file with the same
/// name (in another subfolder) is skipped.
pub fn export_folder(in_dir: &Path, palette: &Palette, out_dir: &Path) -> BatchReport {
    let mut report = BatchReport::default();

    // ── 1. Discover and read files ───────────────────────────────────────
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut loaded: Vec<(PathBuf, Vec<u8>)> = Vec::new();

    for path in find_frm_files(in_dir) {
        let name = base_name(&path);
        if !seen_names.insert(name.clone()) {
            log::warn!("export: duplicate name '{name}' from {}; skipping", path.display());
            continue;
        }
        match fs::read(&path) {
            Ok(bytes) => loaded.push((path, bytes)),
            Err(source) => report.failed.push((path.clone(), Error::Io { path, source })),
        }
    }

    // ── 2. Decode (parallel) ─────────────────────────────────────────────
    let buffers: Vec<&[u8]> = loaded.iter().map(|(_, bytes)| bytes.as_slice()).collect();
    let decoded = decode_batch(&buffers);

    // ── 3. Composite and write ───────────────────────────────────────────
    for ((path, _), result) in loaded.iter().zip(decoded) {
        let outcome = result
            .map_err(Error::decode(path))
            .and_then(|container| export_container(&container, palette, &base_name(path), out_dir));
        match outcome {
            Ok(_) => report.exported.push(path.clone()),
            Err(e) => {
                log::warn!("export: {e}");
                report.failed.push((path.clone(), e));
            }
        }
    }

    log::info!(
        "export: {} exported, {} failed from {}",
        report.exported.len(),
        report.failed.len(),
        in_dir.display()
    );
    report
}

/// File name with the extension stripped; `sprite` for odd paths.
fn base_name(path: &Path) -> String {
    match path.file_stem().and_then(|s| s.to_str()) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => "sprite".to_string(),
    }
}
