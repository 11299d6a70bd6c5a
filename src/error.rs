//! Unified error types for renshu.
//!
//! Only the model gateway recovers from failures (primary → fallback).
//! Everything above it propagates errors unchanged, so a failed turn never
//! produces a partial result or touches persisted state.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for renshu operations.
#[derive(Error, Debug)]
pub enum CoachError {
    /// The gateway was handed an empty conversation.
    #[error("empty input: conversation has no messages")]
    EmptyInput,

    /// A single model backend failed (transport, status, or body).
    #[error("model backend '{backend}' failed: {message}")]
    Model { backend: String, message: String },

    /// Both the primary and the fallback backend failed.
    #[error("model unavailable: primary failed ({primary}); fallback failed ({fallback})")]
    ModelUnavailable {
        primary: Box<CoachError>,
        #[source]
        fallback: Box<CoachError>,
    },

    /// I/O errors from state file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// A user id that cannot be used as a storage key.
    #[error("invalid user id: {user_id:?}")]
    InvalidUserId { user_id: String },

    /// Unknown lesson or scenario identifier.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Step index outside a lesson or scenario script.
    #[error("step index {index} out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A specialized Result type for renshu operations.
pub type Result<T> = std::result::Result<T, CoachError>;

impl CoachError {
    /// Create a single-backend model error.
    pub fn model(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Model {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Combine a primary and a fallback failure.
    pub fn model_unavailable(primary: CoachError, fallback: CoachError) -> Self {
        Self::ModelUnavailable {
            primary: Box::new(primary),
            fallback: Box::new(fallback),
        }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid user id error.
    pub fn invalid_user_id(user_id: impl Into<String>) -> Self {
        Self::InvalidUserId {
            user_id: user_id.into(),
        }
    }

    /// Create a not found error for a lesson, scenario, etc.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create an index out of range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Whether this error came from text generation.
    ///
    /// True for a single-backend failure (fallback disabled) as well as for
    /// the combined primary + fallback failure.
    pub fn is_model_failure(&self) -> bool {
        matches!(self, Self::Model { .. } | Self::ModelUnavailable { .. })
    }
}

impl From<io::Error> for CoachError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for CoachError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Exit codes for the renshu CLI.
pub mod exit_codes {
    /// Command succeeded.
    pub const SUCCESS: i32 = 0;

    /// Command ran but reported a failure.
    pub const ERROR: i32 = 1;

    /// The process panicked.
    pub const CRASH: i32 = 3;
}
