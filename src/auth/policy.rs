use uuid::Uuid;

use super::Role;
use crate::{db::entities::user, error::AppError};

/// Who may call a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    AdminOnly,
    AnyOf(Vec<Role>),
    /// The subject user themself, or an admin.
    SelfOrAdmin(Uuid),
}

pub fn authorize(policy: &Policy, caller: &user::Model) -> Result<(), AppError> {
    let role = Role::try_from(caller.role.as_str()).ok();
    let allowed = match policy {
        Policy::AdminOnly => role == Some(Role::Admin),
        Policy::AnyOf(roles) => role.is_some_and(|role| roles.contains(&role)),
        Policy::SelfOrAdmin(subject) => caller.id == *subject || role == Some(Role::Admin),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::forbidden("Forbidden"))
    }
}
