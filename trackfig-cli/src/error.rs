//! Error handling for the trackfig CLI

use std::path::PathBuf;
use thiserror::Error;
use trackfig_render::RenderError;

/// Errors reported to the user with suggestions
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid region: {message}")]
    Region { message: String },

    #[error("Tracks file error: {message}")]
    Tracks { message: String },

    #[error("Rendering error: {message}")]
    Rendering { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn region<S: Into<String>>(message: S) -> Self {
        Self::Region { message: message.into() }
    }

    pub fn tracks<S: Into<String>>(message: S) -> Self {
        Self::Tracks { message: message.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io { message: err.to_string() }
    }
}

impl From<RenderError> for CliError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Config(e) => Self::Tracks { message: e.to_string() },
            e @ RenderError::Track { .. } => Self::Tracks { message: e.to_string() },
            e => Self::Rendering { message: e.to_string() },
        }
    }
}

/// Suggestion block appended to the error message.
pub fn suggestions(error: &CliError) -> &'static str {
    match error {
        CliError::FileNotFound { .. } => {
            "\n\nSuggestions:\n\
             • Check that the file path is correct\n\
             • Relative paths in a tracks file are resolved from the tracks file's directory"
        }
        CliError::Region { .. } => {
            "\n\nSuggestions:\n\
             • Use chrom:start-end, e.g. chr1:1,000,000-2,000,000\n\
             • Positions accept k/M suffixes (chr1:1M-2M)\n\
             • The end must be greater than the start"
        }
        CliError::Tracks { .. } => {
            "\n\nSuggestions:\n\
             • Check the section named in the message\n\
             • Set 'file_type' when the extension is not recognised\n\
             • Generate a starting point with 'trackfig make-tracks-file'"
        }
        CliError::Config { .. } => {
            "\n\nSuggestions:\n\
             • Check your trackfig.toml configuration file\n\
             • Remove unknown keys from [figure] and [output]"
        }
        CliError::Rendering { .. } => {
            "\n\nSuggestions:\n\
             • Use an output file ending in .svg or .png\n\
             • Check the figure width, label fraction and dpi"
        }
        CliError::Io { .. } => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trackfig_core::ConfigError;

    #[test]
    fn test_error_creation() {
        let err = CliError::config("test message");
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_error_suggestions() {
        let err = CliError::file_not_found(PathBuf::from("tracks.ini"));
        let formatted = format!("{}{}", err, suggestions(&err));
        assert!(formatted.contains("Suggestions:"));
        assert!(formatted.contains("Check that the file path is correct"));
    }

    #[test]
    fn test_render_error_conversion() {
        let missing = ConfigError::MissingProperty { section: "genes".into(), property: "file".into() };
        let err: CliError = RenderError::from(missing).into();
        assert!(matches!(err, CliError::Tracks { .. }));
        assert!(err.to_string().contains("[genes]"));

        let err: CliError = RenderError::UnsupportedFormat("pdf".into()).into();
        assert!(matches!(err, CliError::Rendering { .. }));
    }
}
