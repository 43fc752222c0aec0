//! API-side authorization guard for commands.
//!
//! Role permissions are checked here, before a handler touches storage.
//! Ownership and visibility rules live with the resources themselves.

use shelfwise_auth::{AuthzError, CommandAuthorization, authorize};

use crate::context::UserContext;

pub fn authorize_command<C: CommandAuthorization>(user: &UserContext, command: &C) -> Result<(), AuthzError> {
    let principal = user.principal();
    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use shelfwise_auth::{JwtClaims, Profile, Role, permissions};
    use shelfwise_core::UserId;

    use crate::app::routes::common::CmdAuth;

    fn user(role: Role) -> UserContext {
        let id = UserId::new();
        let now = Utc::now();
        UserContext::new(
            JwtClaims::new(id, Role::User, now, Duration::minutes(5)),
            Profile {
                id,
                email: "someone@example.com".to_string(),
                full_name: None,
                role,
                created_at: now,
            },
        )
    }

    #[test]
    fn admin_views_need_the_admin_role() {
        let cmd = CmdAuth::new((), vec![permissions::admin::READ]);
        assert!(authorize_command(&user(Role::User), &cmd).is_err());
        assert!(authorize_command(&user(Role::Admin), &cmd).is_ok());
    }

    #[test]
    fn every_listed_permission_is_checked() {
        let cmd = CmdAuth::new((), vec![permissions::inventories::WRITE, permissions::admin::READ]);
        let err = authorize_command(&user(Role::User), &cmd).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("admin.read".to_string()));
    }
}
