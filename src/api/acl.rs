//! Route access control for authenticated users.

use roster_core::{DomainError, Entity, EntityId, Value};

use crate::models::Role;

/// Who may access a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Officer,
    Admin,
    /// The user the route is about
    Owner,
}

/// Passes if `user` satisfies any entry of `allowed`. `target` is the user id
/// named by the route, if any.
pub fn allow_any_of(
    user: &Entity,
    allowed: &[Access],
    target: Option<EntityId>,
) -> Result<(), DomainError> {
    let role = user
        .get("role_id")
        .and_then(Value::as_i64)
        .and_then(Role::from_id);
    let is_admin = user.get("is_admin").and_then(Value::as_i64) == Some(1);

    let granted = allowed.iter().any(|access| match access {
        Access::Officer => role == Some(Role::Officer),
        Access::Admin => role == Some(Role::Admin) || is_admin,
        Access::Owner => target == Some(user.id()),
    });

    if granted {
        Ok(())
    } else {
        Err(DomainError::forbidden("Not authorized to access this route."))
    }
}
