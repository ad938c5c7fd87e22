use std::path::PathBuf;

use thiserror::Error;

/// Central error type for the spleeter-stems crate.
///
/// Variants are split by who is at fault: bad input from the caller
/// (`InvalidInput`, `InvalidSettings`, `Download`) versus a broken system
/// (`Engine`, `DownloadTool`, `CacheIntegrity`, `Archive`, `Io`, `Config`).
#[derive(Debug, Error)]
pub enum SplitterError {
    // Generic fallback (wraps anyhow)
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),

    #[error("Separation engine failed for '{input}': {reason}")]
    Engine { input: PathBuf, reason: String },

    /// The URL is unusable or could not be resolved.
    #[error("Download failed for '{url}': {reason}")]
    Download { url: String, reason: String },

    /// The download tool could not be run or misbehaved.
    #[error("Download tool failed for '{url}': {reason}")]
    DownloadTool { url: String, reason: String },

    #[error("Cache integrity violated at '{path}': {reason}")]
    CacheIntegrity { path: PathBuf, reason: String },

    #[error("Invalid input '{path}': {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to write archive '{path}': {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SplitterError {
    /// True when the caller supplied something unusable, false when the
    /// system itself misbehaved.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SplitterError::InvalidInput { .. }
                | SplitterError::InvalidSettings(_)
                | SplitterError::Download { .. }
        )
    }

    pub fn engine(input: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SplitterError::Engine {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn download(url: impl Into<String>, reason: impl Into<String>) -> Self {
        SplitterError::Download {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn download_tool(url: impl Into<String>, reason: impl Into<String>) -> Self {
        SplitterError::DownloadTool {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn integrity(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SplitterError::CacheIntegrity {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SplitterError::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn archive(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        SplitterError::Archive {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for SplitterError {
    fn from(e: serde_json::Error) -> Self {
        SplitterError::Anyhow(e.into())
    }
}

impl From<walkdir::Error> for SplitterError {
    fn from(e: walkdir::Error) -> Self {
        SplitterError::Anyhow(e.into())
    }
}

pub type Result<T> = std::result::Result<T, SplitterError>;
