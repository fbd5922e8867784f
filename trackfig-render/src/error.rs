use std::path::PathBuf;
use thiserror::Error;
use trackfig_core::io::FormatError;
use trackfig_core::ConfigError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid color '{0}'")]
    Color(String),
    #[error("Unknown colormap '{0}'")]
    Colormap(String),
    #[error("[{section}]: {message}")]
    Track { section: String, message: String },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Invalid figure layout: {0}")]
    Layout(String),
    #[error("Unsupported output format '{0}' (expected svg or png)")]
    UnsupportedFormat(String),
    #[error("Rasterization failed: {0}")]
    Raster(String),
    #[error("Cannot write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

impl RenderError {
    pub fn track(section: &str, message: impl Into<String>) -> Self {
        Self::Track { section: section.to_string(), message: message.into() }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;
