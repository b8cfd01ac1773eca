//! Crate error type
//!
//! Everything here is recoverable: callers log and fall back rather than abort.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Level not found: {0}")]
    LevelNotFound(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("No audio input device found")]
    NoInputDevice,
    #[error("Audio stream error: {0}")]
    Stream(String),
}

pub type Result<T> = std::result::Result<T, Error>;
