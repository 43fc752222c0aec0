use shelfwise_auth::{JwtClaims, Principal, Profile};
use shelfwise_core::UserId;

/// The authenticated caller of a request.
///
/// Inserted by the auth middleware; every protected handler can rely on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    claims: JwtClaims,
    profile: Profile,
}

impl UserContext {
    pub fn new(claims: JwtClaims, profile: Profile) -> Self {
        Self { claims, profile }
    }

    pub fn user_id(&self) -> UserId {
        self.profile.id
    }

    /// The stored profile role decides, not the role in the token.
    pub fn principal(&self) -> Principal {
        Principal::new(self.profile.id, self.profile.role)
    }

    pub fn claims(&self) -> &JwtClaims {
        &self.claims
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }
}
