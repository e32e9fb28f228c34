pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod pathfinding;
pub mod sprite;

pub use config::Config;
pub use error::Error;
