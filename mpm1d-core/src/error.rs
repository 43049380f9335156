//! Error types for mpm1d operations.

use thiserror::Error;

/// Result type alias using the mpm1d Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or running a simulation.
#[derive(Error, Debug)]
pub enum Error {
    /// Mesh construction or particle seeding errors, including a grid with
    /// no elements.
    #[error("mesh error: {0}")]
    Mesh(String),

    /// Invalid simulation configuration (scheme, time step, output selection).
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid material constants.
    #[error("invalid material: {0}")]
    InvalidMaterial(String),

    /// I/O errors (configuration files, series export).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML configuration.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV export errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
