use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use glam::DVec2;
use serde::Serialize;

use pipboy::export::{export_file, export_folder};
use pipboy::geometry::{ADJACENT_NAMES, HexGrid, HexIndex};
use pipboy::pathfinding::prelude::PathRequest;
use pipboy::sprite::palette::{Palette, parse_palette_file};
use pipboy::{Config, Error};

/// Hex grid and FRM sprite tooling for the wasteland map.
#[derive(Parser)]
#[command(name = "pipboy", version)]
struct Cli {
    /// JSON config with grid, palette and pathfinding defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode one FRM file into per-frame PNGs plus a JSON sidecar
    Decode {
        /// FRM file (.frm, .fr0 .. .fr5)
        input: PathBuf,
        /// Directory to write PNG and JSON files into
        out_dir: PathBuf,
        /// Palette file (.gpl, .json or binary .pal); defaults to the Fallout palette
        #[arg(short, long)]
        palette: Option<PathBuf>,
    },
    /// Decode every FRM file below a directory
    Batch {
        input: PathBuf,
        out_dir: PathBuf,
        #[arg(short, long)]
        palette: Option<PathBuf>,
    },
    /// Find a path between two hexes and print it as JSON (`null` if unreachable)
    Path {
        #[arg(long)]
        start: HexIndex,
        #[arg(long)]
        dest: HexIndex,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Comma-separated blocked hexes
        #[arg(long, value_delimiter = ',')]
        blocked: Vec<HexIndex>,
    },
    /// Hex under a screen position
    Pick {
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        #[arg(long, allow_negative_numbers = true)]
        y: f64,
        #[arg(long)]
        width: Option<u32>,
    },
    /// Screen position and neighbours of a hex
    Locate {
        index: HexIndex,
        #[arg(long)]
        width: Option<u32>,
    },
}

#[derive(Serialize)]
struct Location {
    index: HexIndex,
    q: i64,
    r: i64,
    x: f64,
    y: f64,
    neighbours: Vec<(&'static str, HexIndex)>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Error> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Decode { input, out_dir, palette } => {
            let palette = load_palette(palette.as_deref(), &config)?;
            let metadata = export_file(&input, &palette, &out_dir)?;
            let frames: usize = metadata.directions.iter().map(Vec::len).sum();
            log::info!("saved {frames} frames to {}", out_dir.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Batch { input, out_dir, palette } => {
            let palette = load_palette(palette.as_deref(), &config)?;
            let report = export_folder(&input, &palette, &out_dir);
            if report.failed.is_empty() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Path { start, dest, width, height, blocked } => {
            let grid = resolve_grid(&config, width)?;
            let mut request = PathRequest::new(start, dest, |i| blocked.contains(&i));
            request.height = height.or(config.height);
            request.max_iterations = config.max_path_iterations;
            let path = request.find(&grid);
            println!("{}", serde_json::to_string(&path)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Pick { x, y, width } => {
            let grid = resolve_grid(&config, width)?;
            let index = grid.screen_to_index(DVec2::new(x, y))?;
            println!("{index}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Locate { index, width } => {
            let grid = resolve_grid(&config, width)?;
            let (q, r) = grid.from_hex_index(index);
            let point = grid.index_to_screen(index);
            let location = Location {
                index,
                q,
                r,
                x: point.x,
                y: point.y,
                neighbours: ADJACENT_NAMES.into_iter().zip(grid.adjacent(index)).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&location)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `--width` wins over the config file.
fn resolve_grid(config: &Config, width: Option<u32>) -> Result<HexGrid, Error> {
    match width {
        Some(width) => Ok(HexGrid::new(width)?.with_tile_columns(config.grid.tile_columns())?),
        None => Ok(config.grid),
    }
}

/// `--palette` wins over the config file, which wins over the built-in palette.
fn load_palette(flag: Option<&Path>, config: &Config) -> Result<Palette, Error> {
    let Some(path) = flag.or(config.palette.as_deref()) else {
        return Ok(Palette::fallout()?);
    };
    let bytes = std::fs::read(path).map_err(Error::io(path))?;
    let name = path.file_name().and_then(|n| n.to_str());
    Ok(parse_palette_file(&bytes, name)?)
}
