//! Error types and exit codes for semfora-rts

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for semfora-rts operations
#[derive(Error, Debug)]
pub enum RtsError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("Failed to parse file: {message}")]
    ParseFailure { message: String },

    #[error("Instrumentation failed for {path}: {message}")]
    InstrumentationFailure { path: String, message: String },

    /// A prior artifact (registry, dependency graph, changed functions) is absent.
    /// The evaluation against this baseline cannot proceed.
    #[error("Missing required artifact: {path} ({hint})")]
    MissingArtifact { path: String, hint: String },

    /// The change description coming from version control could not be parsed.
    #[error("Failed to parse change description: {message}")]
    ChangeParseError { message: String },

    #[error("External process `{command}` failed: {message}")]
    ProcessFailure { command: String, message: String },

    #[error("Git error: {message}")]
    GitError { message: String },

    #[error("Not a git repository")]
    NotGitRepo,

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RtsError {
    /// Convert error to appropriate exit code:
    /// - 0: Success
    /// - 1: File not found / IO error
    /// - 2: Unsupported language
    /// - 3: Parse failure
    /// - 4: Analysis or instrumentation failure
    /// - 5: Git error
    /// - 6: Missing artifact
    /// - 7: External process failure
    /// - 8: Configuration error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileNotFound { .. } => ExitCode::from(1),
            Self::UnsupportedLanguage { .. } => ExitCode::from(2),
            Self::ParseFailure { .. } => ExitCode::from(3),
            Self::InstrumentationFailure { .. } => ExitCode::from(4),
            Self::Json(_) => ExitCode::from(4),
            Self::ChangeParseError { .. } => ExitCode::from(5),
            Self::GitError { .. } => ExitCode::from(5),
            Self::NotGitRepo => ExitCode::from(5),
            Self::MissingArtifact { .. } => ExitCode::from(6),
            Self::ProcessFailure { .. } => ExitCode::from(7),
            Self::ConfigError { .. } => ExitCode::from(8),
            Self::Io(_) => ExitCode::from(1),
        }
    }

    /// Shorthand for a missing artifact error
    pub fn missing_artifact(path: &std::path::Path, hint: &str) -> Self {
        Self::MissingArtifact {
            path: path.display().to_string(),
            hint: hint.to_string(),
        }
    }
}

/// Result type alias for semfora-rts operations
pub type Result<T> = std::result::Result<T, RtsError>;
