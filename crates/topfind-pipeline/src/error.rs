use std::path::PathBuf;

use thiserror::Error;
use topfind_core::ValidationError;

/// A provider mapping that does not cover its unified schema exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("{provider}: unified column '{column}' has no source")]
    Unmapped {
        provider: String,
        column: &'static str,
    },

    #[error("{provider}: unified column '{column}' has {count} sources")]
    DuplicateSource {
        provider: String,
        column: &'static str,
        count: usize,
    },

    #[error("{provider}: mapping targets unknown column '{column}'")]
    UnknownColumn {
        provider: String,
        column: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Caller-side contract violations, reported before any network call.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }
}
