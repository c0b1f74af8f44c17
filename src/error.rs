// Copyright (c) 2025 Chetan Conikee <conikee@gmail.com>
// Licensed under the MIT License

//! Error handling for specdrift.
//!
//! This module provides error types for all operations within the
//! specdrift engine, from pattern configuration loading to documentation
//! parsing, file scanning, and version-control queries.
//!
//! Only two variants abort an analysis run: [`DriftError::UnknownMode`] and
//! [`DriftError::MissingDocumentation`]. Everything else is caught close to
//! where it occurs, logged, and folded into counters so a single bad file or
//! pattern never sinks the whole scan.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for specdrift operations.
pub type Result<T> = std::result::Result<T, DriftError>;

/// Error type for all specdrift operations.
#[derive(Error, Debug)]
pub enum DriftError {
    /// The identifier-pattern configuration document was malformed.
    ///
    /// Recoverable: the loader falls back to built-in defaults.
    #[error("Pattern configuration error in '{}': {reason}", .path.display())]
    Configuration {
        /// The configuration file that failed to load.
        path: PathBuf,
        /// The reason the configuration was rejected.
        reason: String,
    },

    /// A documentation checklist line could not be interpreted.
    #[error("Documentation parse error at line {line}: {reason}")]
    DocumentationParse {
        /// 1-based line number of the offending line.
        line: usize,
        /// The reason the line was rejected.
        reason: String,
    },

    /// A source, test, or documentation file could not be read.
    #[error("File access error for path '{}': {source}", .path.display())]
    FileAccess {
        /// The file path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A supplied identifier pattern failed to compile as a regex.
    #[error("Pattern compile error for prefix '{prefix}': {reason}")]
    PatternCompile {
        /// The identifier prefix whose pattern was rejected.
        prefix: String,
        /// The regex compilation failure.
        reason: String,
    },

    /// Version-control history is unavailable for incremental scanning.
    ///
    /// Recoverable: callers degrade to scanning everything.
    #[error("Version control unavailable: {reason}")]
    VersionControlUnavailable {
        /// Why history could not be queried.
        reason: String,
    },

    /// The requested analysis mode is not recognized. Hard failure.
    #[error("Unknown analysis mode '{mode}'")]
    UnknownMode {
        /// The mode string that failed to resolve.
        mode: String,
    },

    /// The requested mode requires a documentation file that is missing.
    /// Hard failure.
    #[error("Missing documentation file '{}' required by mode '{mode}'", .path.display())]
    MissingDocumentation {
        /// The documentation file the mode needs.
        path: PathBuf,
        /// The mode that requires it.
        mode: String,
    },

    /// The emitted report could not be serialized or written.
    #[error("Report emission error: {reason}")]
    ReportEmission {
        /// The reason serialization or writing failed.
        reason: String,
    },
}

impl DriftError {
    /// Creates a new configuration error.
    pub fn configuration(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new documentation parse error.
    pub fn documentation_parse(line: usize, reason: impl Into<String>) -> Self {
        Self::DocumentationParse {
            line,
            reason: reason.into(),
        }
    }

    /// Creates a new file access error.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Creates a new pattern compile error.
    pub fn pattern_compile(prefix: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PatternCompile {
            prefix: prefix.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new version-control-unavailable error.
    pub fn version_control_unavailable(reason: impl Into<String>) -> Self {
        Self::VersionControlUnavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new unknown-mode error.
    pub fn unknown_mode(mode: impl Into<String>) -> Self {
        Self::UnknownMode { mode: mode.into() }
    }

    /// Creates a new missing-documentation error.
    pub fn missing_documentation(path: impl Into<PathBuf>, mode: impl Into<String>) -> Self {
        Self::MissingDocumentation {
            path: path.into(),
            mode: mode.into(),
        }
    }

    /// Creates a new report emission error.
    pub fn report_emission(reason: impl Into<String>) -> Self {
        Self::ReportEmission {
            reason: reason.into(),
        }
    }

    /// Whether this error aborts the analysis run instead of degrading it.
    #[must_use]
    pub fn is_hard_failure(&self) -> bool {
        matches!(
            self,
            Self::UnknownMode { .. } | Self::MissingDocumentation { .. }
        )
    }
}

// Automatic conversions from common error types
impl From<serde_json::Error> for DriftError {
    fn from(error: serde_json::Error) -> Self {
        Self::ReportEmission {
            reason: format!("JSON serialization failed: {error}"),
        }
    }
}

impl From<serde_yaml::Error> for DriftError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::Configuration {
            path: PathBuf::new(),
            reason: format!("YAML parsing failed: {error}"),
        }
    }
}
