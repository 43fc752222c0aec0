//! Email/password accounts and bearer sessions.
//!
//! Sign-in issues an HS256 access token; sign-out records the token id as
//! revoked so [`AuthProvider::authenticate`] rejects it from then on, even
//! before it expires.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use shelfwise_auth::{
    Hs256JwtValidator, JwtClaims, JwtValidator, PasswordError, Profile, Role, SignUp, TokenError, hash_password,
    normalize_email, verify_password,
};
use shelfwise_core::{DomainError, UserId};

use crate::store::{Backend, StoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Token was revoked or its profile is gone.
    #[error("authentication required")]
    Unauthenticated,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("password hashing task failed: {0}")]
    Hashing(#[from] tokio::task::JoinError),
}

/// A signed-in session as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub profile: Profile,
}

pub struct AuthProvider {
    backend: Arc<dyn Backend>,
    jwt: Hs256JwtValidator,
    token_ttl: Duration,
    admin_emails: HashSet<String>,
}

impl AuthProvider {
    pub fn new(
        backend: Arc<dyn Backend>,
        jwt: Hs256JwtValidator,
        token_ttl: Duration,
        admin_emails: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            backend,
            jwt,
            token_ttl,
            admin_emails: admin_emails.into_iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    /// Register a new account. Emails listed as admin emails get the admin role.
    #[instrument(skip_all, err)]
    pub async fn sign_up(&self, request: &SignUp, now: DateTime<Utc>) -> Result<Profile, AuthError> {
        let mut profile = request.into_profile(UserId::new(), now)?;
        if self.admin_emails.contains(&profile.email) {
            profile.role = Role::Admin;
        }
        let password = request.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        match self.backend.insert_profile(&profile, &password_hash).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                return Err(DomainError::field("email", "An account with this email already exists").into());
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %profile.id, role = profile.role.as_str(), "account created");
        Ok(profile)
    }

    #[instrument(skip_all, err)]
    pub async fn sign_in(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<Session, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let Some((profile, password_hash)) = self.backend.credentials_by_email(&email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        let password = password.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &password_hash)).await??;
        if !matches {
            warn!(user_id = %profile.id, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.jwt.issue(profile.id, profile.role, now, self.token_ttl)?;
        let expires_at = issued.claims.expires_at().unwrap_or(now + self.token_ttl);

        info!(user_id = %profile.id, "signed in");
        Ok(Session {
            access_token: issued.access_token,
            token_type: "Bearer",
            expires_at,
            profile,
        })
    }

    /// Revoke the token these claims came from.
    pub async fn sign_out(&self, claims: &JwtClaims) -> Result<(), AuthError> {
        let expires_at = claims.expires_at().unwrap_or_else(Utc::now);
        self.backend.revoke_token(claims.jti, expires_at).await?;
        info!(user_id = %claims.sub, "signed out");
        Ok(())
    }

    /// Resolve a bearer token to its claims and current profile.
    ///
    /// The profile is reloaded on every call; its role wins over the role
    /// baked into the token.
    pub async fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<(JwtClaims, Profile), AuthError> {
        let claims = self.jwt.validate(token, now)?;
        if self.backend.is_token_revoked(claims.jti).await? {
            return Err(AuthError::Unauthenticated);
        }
        let profile = self
            .backend
            .profile(claims.sub)
            .await?
            .ok_or(AuthError::Unauthenticated)?;
        Ok((claims, profile))
    }
}

impl core::fmt::Debug for AuthProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthProvider")
            .field("token_ttl", &self.token_ttl)
            .field("admin_emails", &self.admin_emails)
            .finish_non_exhaustive()
    }
}
