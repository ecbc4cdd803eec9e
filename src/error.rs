//! Error types for deploy-dialogs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DialogError {
    #[error("Missing required text: {field}")]
    MissingText { field: &'static str },

    #[error("Icon not found: {}", path.display())]
    InvalidIcon { path: PathBuf },

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Restart failed: {0}")]
    Restart(String),

    #[error("Window host error: {0}")]
    Host(String),

    #[error("Dialog session already closed")]
    SessionClosed,

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DialogError>;
