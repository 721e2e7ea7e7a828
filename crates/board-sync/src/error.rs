//! Error types for board synchronization
//!
//! Provides error handling for:
//! - Collaborator failures (fetch and update calls)
//! - Pre-flight rejections (permission, unknown task, stale drag)
//! - Configuration loading

use crate::permission::ProjectRole;
use board_model::{ModelError, ProjectId, TaskId};
use board_planner::PlanError;
use std::path::PathBuf;

/// Failure reported by the board backend.
///
/// Backends map their transport's failures onto these classes; the HTTP
/// mapping is [`RemoteError::from_status`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// Caller may not perform the write (403-class)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Write was rejected as invalid (other 4xx)
    #[error("rejected: {0}")]
    Validation(String),

    /// Write conflicts with server state (409-class)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Board or task does not exist on the server
    #[error("not found: {0}")]
    NotFound(String),

    /// Network or server failure
    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    /// Classify an HTTP status code
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 | 412 => Self::Conflict(message),
            400..=499 => Self::Validation(message),
            _ => Self::Transport(message),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    #[inline]
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Message suitable for a notice
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Forbidden(_) => "You don't have permission to change this task".to_string(),
            Self::Validation(msg) => format!("The change was rejected: {msg}"),
            Self::Conflict(_) => "The task was changed by someone else".to_string(),
            Self::NotFound(_) => "The task no longer exists".to_string(),
            Self::Transport(_) => "Could not reach the server, your change was undone".to_string(),
        }
    }
}

/// Main synchronization error type.
///
/// Only pre-flight failures are returned as errors. Once a write has been
/// applied to the cache, its settlement is reported as a
/// [`crate::WriteOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The permission gate rejected the move
    #[error("permission denied: role {role} may not move tasks")]
    PermissionDenied { role: ProjectRole },

    /// No board is cached for the project
    #[error("no board loaded for project {0}")]
    BoardNotLoaded(ProjectId),

    /// A session for the project is already open
    #[error("board for project {0} is already open")]
    AlreadyOpen(ProjectId),

    /// Session was closed
    #[error("session closed")]
    SessionClosed,

    /// Edit with nothing to change
    #[error("edit for task {0} changes nothing")]
    EmptyPatch(TaskId),

    /// Model lookup failed
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Move could not be planned
    #[error("move rejected: {0}")]
    Plan(#[from] PlanError),

    /// Board fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] RemoteError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error while reading the file
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed TOML
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field holds an unusable value
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
