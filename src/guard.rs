//! Ownership-scoped access decisions.
//!
//! The guard is a pure function of the actor, the resource's owner, and the
//! requested action. It performs no I/O and holds no state; ownership is read
//! by the caller from the current resource record at decision time.

use uuid::Uuid;

use crate::{auth::AuthUser, error::ApiError};

/// Action
///
/// What the actor wants to do to an owned resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Mutate,
    Delete,
}

/// Decision
///
/// Outcome of an authorization check. `Deny` always means the actor was
/// authenticated but not permitted; unauthenticated requests are rejected
/// upstream by the identity verifier and never reach the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Converts the decision into a handler-ready result, mapping `Deny` to
    /// `ApiError::Forbidden`.
    pub fn require(self) -> Result<(), ApiError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny => Err(ApiError::Forbidden),
        }
    }
}

/// authorize
///
/// Decides whether `actor` may perform `action` on a resource owned by
/// `owner_id`. Reads are always allowed (tenders are public); Mutate and
/// Delete require ownership, or the admin flag when `admin_override_allowed`
/// is set. Total over every input combination.
pub fn authorize(
    actor: &AuthUser,
    owner_id: Uuid,
    action: Action,
    admin_override_allowed: bool,
) -> Decision {
    match action {
        Action::Read => Decision::Allow,
        Action::Mutate | Action::Delete => {
            if actor.id == owner_id || (admin_override_allowed && actor.is_admin) {
                Decision::Allow
            } else {
                Decision::Deny
            }
        }
    }
}

/// require_admin
///
/// Admin-only policy with no owner exception. Used where no owner id can
/// ever match the actor (report status transitions).
pub fn require_admin(actor: &AuthUser) -> Decision {
    if actor.is_admin {
        Decision::Allow
    } else {
        Decision::Deny
    }
}
