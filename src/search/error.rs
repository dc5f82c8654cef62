//! Error types for dictionary loading / 词典加载错误

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Dictionary load failure. Fatal to initialization; the engine stays non-ready.
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    /// Dictionary file does not exist.
    #[error("Dictionary file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Dictionary file could not be read.
    #[error("Failed to read dictionary {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// Content is not a valid dictionary.
    #[error("Malformed dictionary {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    /// No valid term survived validation.
    #[error("Dictionary {} contains no valid terms", .0.display())]
    Empty(PathBuf),

    /// Build task panicked or exited without reporting.
    #[error("Index build task failed: {0}")]
    Task(String),
}
