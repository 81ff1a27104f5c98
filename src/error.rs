//! Error types for the soft startup wizard.

use std::time::Duration;

use crate::session::state::{Location, Phase};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("AI error: {0}")]
    Ai(#[from] AiError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Persistence backend errors.
///
/// Only writes surface these. Reads that fail are logged by the store and
/// treated as an empty collection.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Session and wizard errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session not found: {id}")]
    NotFound { id: String },

    #[error("Invalid position: step {step} is not valid for phase {phase}")]
    InvalidPosition { phase: Phase, step: u8 },

    #[error("Session {id} is completed and read-only")]
    ReadOnly { id: String },

    #[error("Step mismatch: session is at {expected}, submission was for {actual}")]
    StepMismatch { expected: Location, actual: Location },

    #[error("Cannot continue from {step}: {reason}")]
    InvalidInput { step: Location, reason: String },

    #[error("Session {id} only moves forward by advancing; progress fields cannot be patched")]
    ProgressUpdate { id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from the external reframing service.
///
/// None of these are fatal: callers fall back to manual text entry.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI service unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("AI service timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("AI service returned status {status}")]
    Status { status: u16 },

    #[error("Invalid response from AI service: {reason}")]
    InvalidResponse { reason: String },

    #[error("Nothing to reframe: input is empty")]
    EmptyInput,

    #[error("AI assistance is disabled")]
    Disabled,
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
