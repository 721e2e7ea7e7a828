//! Permission gate
//!
//! A synchronous pre-flight check run before a move touches the cache. The
//! gate only knows what membership data has already been loaded. While the
//! caller's role is unknown it lets the move through and leaves the decision
//! to the server's own check on the write.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Caller's role in the project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
            Self::Viewer => "viewer",
        };
        f.write_str(name)
    }
}

/// Capability predicate deciding which roles may move tasks
#[cfg_attr(test, mockall::automock)]
pub trait MovePolicy: Send + Sync {
    /// Whether `role` may move tasks between columns
    fn can_move_task(&self, role: &ProjectRole) -> bool;
}

/// Everyone but viewers may move tasks
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMovePolicy;

impl MovePolicy for DefaultMovePolicy {
    fn can_move_task(&self, role: &ProjectRole) -> bool {
        !matches!(role, ProjectRole::Viewer)
    }
}

/// Pre-flight move check
#[derive(Clone)]
pub struct PermissionGate {
    policy: Arc<dyn MovePolicy>,
}

impl PermissionGate {
    #[must_use]
    pub fn new(policy: Arc<dyn MovePolicy>) -> Self {
        Self { policy }
    }

    /// Whether a move may be attempted. `None` means the role has not been
    /// loaded yet, which is permissive.
    #[must_use]
    pub fn can_move(&self, role: Option<&ProjectRole>) -> bool {
        match role {
            Some(role) => self.policy.can_move_task(role),
            None => true,
        }
    }

    /// [`PermissionGate::can_move`] as a `Result`
    ///
    /// # Errors
    /// `SyncError::PermissionDenied` if the known role may not move tasks.
    pub fn check(&self, role: Option<&ProjectRole>) -> Result<(), SyncError> {
        match role {
            Some(role) if !self.policy.can_move_task(role) => Err(SyncError::PermissionDenied {
                role: role.clone(),
            }),
            _ => Ok(()),
        }
    }
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new(Arc::new(DefaultMovePolicy))
    }
}

impl fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionGate").finish_non_exhaustive()
    }
}
