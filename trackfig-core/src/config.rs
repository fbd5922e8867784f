//! Tracks-file (`.ini`) parser.
//!
//! A tracks file is an ordered list of `[section]` blocks holding
//! `key = value` (or `key: value`) options. Section order is the drawing
//! order of the figure.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read tracks file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: duplicate section [{name}]")]
    DuplicateSection { name: String, line: usize },
    #[error("[{section}]: {message}")]
    Property { section: String, message: String },
    #[error("[{section}]: missing required property '{property}'")]
    MissingProperty { section: String, property: String },
    #[error("[{section}]: cannot determine the track type of '{file}'")]
    UnknownFileType { section: String, file: String },
    #[error("[{section}]: file not found: {path}")]
    FileNotFound { section: String, path: PathBuf },
}

impl ConfigError {
    pub fn property(section: &str, message: impl Into<String>) -> Self {
        Self::Property { section: section.to_string(), message: message.into() }
    }
}

/// One `[section]` of a tracks file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackSection {
    pub name: String,
    /// 1-based line of the section header.
    pub line: usize,
    pub options: IndexMap<String, String>,
}

impl TrackSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), line: 0, options: IndexMap::new() }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TracksFile {
    pub path: Option<PathBuf>,
    pub sections: Vec<TrackSection>,
}

impl TracksFile {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut tracks = Self::parse(&text, base_dir)?;
        tracks.path = Some(path.to_path_buf());
        log::info!("Loaded {} sections from {}", tracks.sections.len(), path.display());
        Ok(tracks)
    }

    /// Parse tracks-file text. Relative `file` values are joined to `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut sections: Vec<TrackSection> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                let Some(name) = rest.strip_suffix(']') else {
                    return Err(ConfigError::Syntax { line: line_no, message: format!("unterminated section header '{}'", line) });
                };
                let name = name.trim();
                if name.is_empty() {
                    return Err(ConfigError::Syntax { line: line_no, message: "empty section name".to_string() });
                }
                if sections.iter().any(|s| s.name == name) {
                    return Err(ConfigError::DuplicateSection { name: name.to_string(), line: line_no });
                }
                sections.push(TrackSection { name: name.to_string(), line: line_no, options: IndexMap::new() });
                continue;
            }

            let Some((key, value)) = split_option(line) else {
                return Err(ConfigError::Syntax { line: line_no, message: format!("expected 'key = value', found '{}'", line) });
            };
            let Some(section) = sections.last_mut() else {
                return Err(ConfigError::Syntax { line: line_no, message: format!("option '{}' outside of any section", key) });
            };

            let key = key.trim().to_lowercase();
            let mut value = value.trim().to_string();
            if key == "file" && !value.is_empty() {
                value = resolve_path(base_dir, &value).to_string_lossy().into_owned();
            }
            if section.options.insert(key.clone(), value).is_some() {
                log::warn!("[{}]: '{}' given more than once, the last value wins", section.name, key);
            }
        }

        Ok(Self { path: None, sections })
    }
}

/// Split on the first `=` or `:`, whichever comes first.
fn split_option(line: &str) -> Option<(&str, &str)> {
    let pos = line.find(['=', ':'])?;
    let (key, value) = (&line[..pos], &line[pos + 1..]);
    if key.trim().is_empty() {
        return None;
    }
    Some((key, value))
}

fn resolve_path(base_dir: &Path, value: &str) -> PathBuf {
    let path = Path::new(value);
    if path.is_absolute() || base_dir.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
