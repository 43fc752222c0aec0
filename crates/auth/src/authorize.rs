use thiserror::Error;

use crate::{Permission, Principal};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Permissions a request needs before it reaches the store.
///
/// The API layer checks these before running the operation.
pub trait CommandAuthorization {
    fn required_permissions(&self) -> &[Permission];
}

/// Check a single permission for a principal.
///
/// Pure policy check: no IO, no ownership rules. Ownership and visibility
/// of individual inventories are decided by the inventory access policy.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let granted = principal.permissions();
    if granted.iter().any(|p| p.is_wildcard() || p == required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Role, permissions};
    use shelfwise_core::UserId;

    #[test]
    fn users_can_write_content_but_not_read_admin_views() {
        let user = Principal::new(UserId::new(), Role::User);
        assert!(authorize(&user, &permissions::templates::WRITE).is_ok());
        assert!(authorize(&user, &permissions::discussions::POST).is_ok());
        assert_eq!(
            authorize(&user, &permissions::admin::READ),
            Err(AuthzError::Forbidden("admin.read".to_string()))
        );
    }

    #[test]
    fn admins_hold_the_wildcard() {
        let admin = Principal::new(UserId::new(), Role::Admin);
        assert!(authorize(&admin, &permissions::admin::READ).is_ok());
        assert!(authorize(&admin, &Permission::new("anything.else")).is_ok());
    }
}
