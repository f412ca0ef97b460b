//! Error types for the pedal remapping core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Fatal at compile time; no partially compiled controller is ever produced.
    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config document error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
