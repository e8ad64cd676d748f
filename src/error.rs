//! Error types for Unimatch
//!
//! Training-time failures are explicit and never retried. Inference never
//! surfaces these: the predictor degrades to its heuristic instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Unimatch error types
#[derive(Error, Debug)]
pub enum Error {
    /// Required training input is absent (no sensible recovery)
    #[error("Training data not found: {}\nRun the data preparation step first", .0.display())]
    TrainingDataMissing(PathBuf),

    /// Caller supplied unusable input (empty dataset, single class, bad ratio)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Artifact bytes could not be decoded
    #[error("Model artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    /// Artifact was written by an incompatible schema
    #[error("Model artifact schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch {
        /// Schema this build understands
        expected: String,
        /// Schema recorded in the artifact
        found: String,
    },

    /// Storage error (compression, atomic replace)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
