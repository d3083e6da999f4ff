use std::fmt;
use std::path::PathBuf;

use attendance_ingestor::providers::{SourceError, SourceErrorKind, SourceInitError};
use shared_utils::config::ConfigError;

use crate::pipeline::Stage;

/// Failures of the storage layer.
#[derive(thiserror::Error, Debug)]
pub enum PersistenceError {
    /// A statement failed or a constraint was violated; the transaction rolled back.
    #[error("database query failed: {0}")]
    Query(#[from] diesel::result::Error),

    /// The database could not be opened.
    #[error("cannot connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: diesel::ConnectionError,
    },

    /// Applying the embedded migrations failed.
    #[error("migration failed: {0}")]
    Migration(String),
}

/// Result alias for storage operations.
pub type PersistResult<T> = Result<T, PersistenceError>;

/// Every failure the pipeline can surface.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    SourceInit(#[from] SourceInitError),

    /// Input data cannot satisfy the operation (too few rows, bad argument).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Nothing to serve yet.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("model artifact {path}: {source}")]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Wraps the failure of one stage of [`Pipeline::run`](crate::pipeline::Pipeline::run).
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<PipelineError>,
    },
}

impl From<diesel::result::Error> for PipelineError {
    fn from(e: diesel::result::Error) -> Self {
        PipelineError::Persistence(e.into())
    }
}

/// Result alias used across the pipeline.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Caller-facing classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SourceUnavailable,
    Parse,
    Validation,
    Persistence,
    NotFound,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::SourceUnavailable => "SourceUnavailableError",
            ErrorKind::Parse => "ParseError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Persistence => "PersistenceError",
            ErrorKind::NotFound => "NotFoundError",
        })
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Source(e) => match e.kind() {
                SourceErrorKind::Unavailable => ErrorKind::SourceUnavailable,
                SourceErrorKind::Parse => ErrorKind::Parse,
            },
            PipelineError::SourceInit(_) => ErrorKind::SourceUnavailable,
            PipelineError::Validation(_) | PipelineError::Config(_) => ErrorKind::Validation,
            PipelineError::Persistence(_) | PipelineError::Artifact { .. } => {
                ErrorKind::Persistence
            }
            PipelineError::NotFound(_) => ErrorKind::NotFound,
            PipelineError::Stage { source, .. } => source.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_keep_the_inner_kind() {
        let err = PipelineError::Stage {
            stage: Stage::Train,
            source: Box::new(PipelineError::Validation("too few rows".into())),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "train stage failed: validation failed: too few rows"
        );
    }

    #[test]
    fn diesel_errors_are_persistence_errors() {
        let err: PipelineError = diesel::result::Error::NotFound.into();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(ErrorKind::Persistence.to_string(), "PersistenceError");
    }
}
