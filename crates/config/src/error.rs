use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("invalid table prefix {prefix:?}: {reason}")]
    InvalidTablePrefix { prefix: String, reason: &'static str },

    #[error("invalid scheduler name: {reason}")]
    InvalidSchedulerName { reason: &'static str },

    #[error("job_store.max_connections must be at least 1")]
    EmptyPool,
}

impl ConfigError {
    #[must_use]
    pub fn parse(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
