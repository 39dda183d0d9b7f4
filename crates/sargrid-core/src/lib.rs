//! Domain logic for the field-search grid service: planar coordinate math,
//! cell labeling, grid layout, GPX encoding, surname transliteration, and
//! process configuration. Everything here is pure computation; persistence
//! and transport live in the sibling crates.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod geo;
pub mod gpx;
pub mod grid;
pub mod labels;
pub mod status;
pub mod translit;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use grid::{GeoPoint, GridLayout, GridParamsError, GridRequest, Segment, Waypoint};
pub use status::{GridCellStatus, StatusParseError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
