use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Failed to decode image {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("PNG optimization failed for {path:?}: {message}")]
    PngOptimization { path: PathBuf, message: String },

    #[error("Unsupported output format for {path:?}: {extension:?}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status} for {path:?}: {stderr}")]
    ExternalTool {
        tool: String,
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Could not run {tool}: {source}")]
    ToolUnavailable {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{path:?} is not inside source root {root:?}")]
    OutsideSourceRoot { path: PathBuf, root: PathBuf },

    #[error("Walkdir error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u8),

    #[error("Source directory not found: {0:?}")]
    SourceNotFound(PathBuf),

    #[error("Invalid extension allowlist: {0}")]
    InvalidExtension(String),
}

impl MirrorError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MirrorError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MirrorError>;
