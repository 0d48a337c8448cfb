use thiserror::Error;

use crate::resource::ResourceKind;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Caller-side contract violations. Raised before any provider is queried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unknown filter '{name}' for {kind}")]
    UnknownFilter { kind: ResourceKind, name: String },

    #[error("filter '{name}' for {kind} expects {expected}, got {found}")]
    FilterTypeMismatch {
        kind: ResourceKind,
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("filter '{name}' value out of range: {reason}")]
    FilterOutOfRange { name: String, reason: String },

    #[error("invalid metadata specification: {0}")]
    InvalidMetadataSpec(String),
}
