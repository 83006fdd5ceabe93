//! Access policy.
//!
//! Every mutating operation receives an explicit [`Actor`]; there is no
//! ambient session. Reads (list, get, compare) are open to every role and
//! take no actor.
//!
//! | Action | admin | staff | viewer | system |
//! |--------|-------|-------|--------|--------|
//! | generate | yes | yes | no | yes |
//! | delete | yes | no | no | no |

#![allow(clippy::should_implement_trait)]

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

/// Role of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Health office administrator.
    Admin,
    /// Office staff.
    Staff,
    /// Read-only user.
    Viewer,
    /// Scheduled or automated caller.
    System,
}

impl Role {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Viewer => "viewer",
            Self::System => "system",
        }
    }

    /// Parse from string.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "staff" => Some(Self::Staff),
            "viewer" => Some(Self::Viewer),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Capture a new snapshot.
    Generate,
    /// Permanently remove a snapshot.
    Delete,
}

impl Action {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whoever is performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable identifier, recorded as `created_by`.
    pub id: String,
    /// Role used for authorization.
    pub role: Role,
}

impl Actor {
    /// Create an actor.
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// The built-in actor used by scheduled generation.
    #[must_use]
    pub fn system() -> Self {
        Self::new("system", Role::System)
    }
}

/// Returns true if `role` may perform `action`.
#[must_use]
pub const fn is_allowed(role: Role, action: Action) -> bool {
    match action {
        Action::Generate => matches!(role, Role::Admin | Role::Staff | Role::System),
        Action::Delete => matches!(role, Role::Admin),
    }
}

/// Check that `actor` may perform `action`.
///
/// # Errors
///
/// Returns [`PolicyError::Forbidden`] if the actor's role does not allow it.
pub fn authorize(actor: &Actor, action: Action) -> Result<(), PolicyError> {
    if is_allowed(actor.role, action) {
        return Ok(());
    }
    tracing::warn!(actor = %actor.id, role = %actor.role, action = %action, "forbidden");
    Err(PolicyError::Forbidden {
        actor: actor.id.clone(),
        role: actor.role.as_str().to_string(),
        action: action.as_str().to_string(),
    })
}
