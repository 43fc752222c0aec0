use shelfwise_core::UserId;

use crate::permissions::{self, Permission};
use crate::{JwtClaims, Role};

/// A resolved, authenticated caller.
///
/// Built from verified claims; the permission set follows from the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self::new(claims.sub, claims.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Permissions granted by the role.
    ///
    /// Admins hold the wildcard. Regular users may create and like content
    /// and post to discussions, but never read admin views.
    pub fn permissions(&self) -> Vec<Permission> {
        match self.role {
            Role::Admin => vec![permissions::WILDCARD],
            Role::User => vec![
                permissions::templates::WRITE,
                permissions::templates::LIKE,
                permissions::inventories::WRITE,
                permissions::inventories::LIKE,
                permissions::discussions::POST,
            ],
        }
    }
}
