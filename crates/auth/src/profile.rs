use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shelfwise_core::{DomainError, DomainResult, Entity, UserId};

use crate::{MIN_PASSWORD_LENGTH, Role, validate_password_strength};

/// A registered user. `id` is the auth identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Full name when set, otherwise the local part of the email.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }

    /// First letter of every word of the full name, or of the email.
    pub fn initials(&self) -> String {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name
                .split_whitespace()
                .filter_map(|word| word.chars().next())
                .flat_map(char::to_uppercase)
                .collect(),
            _ => self.email.chars().next().into_iter().flat_map(char::to_uppercase).collect(),
        }
    }
}

impl Entity for Profile {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Registration request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl SignUp {
    /// Check the request and build the profile it would create.
    ///
    /// Emails are trimmed and lowercased. The password itself is hashed by
    /// the caller; only its strength is checked here.
    pub fn into_profile(&self, id: UserId, created_at: DateTime<Utc>) -> DomainResult<Profile> {
        let email = normalize_email(&self.email)?;
        validate_password_strength(&self.password, MIN_PASSWORD_LENGTH)
            .map_err(|e| DomainError::field("password", e.to_string()))?;

        let full_name = self
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(Profile {
            id,
            email,
            full_name,
            role: Role::User,
            created_at,
        })
    }
}

pub fn normalize_email(raw: &str) -> DomainResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => Ok(email),
        _ => Err(DomainError::field("email", "invalid email format")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(email: &str, full_name: Option<&str>) -> Profile {
        Profile {
            id: UserId::new(),
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn display_name_prefers_full_name() {
        assert_eq!(profile("ada@example.com", Some("Ada Lovelace")).display_name(), "Ada Lovelace");
        assert_eq!(profile("ada@example.com", None).display_name(), "ada");
        assert_eq!(profile("ada@example.com", Some("  ")).display_name(), "ada");
    }

    #[test]
    fn initials_come_from_name_words_or_email() {
        assert_eq!(profile("x@example.com", Some("ada  king lovelace")).initials(), "AKL");
        assert_eq!(profile("grace@example.com", None).initials(), "G");
    }

    #[test]
    fn sign_up_normalizes_and_defaults_to_user_role() {
        let req = SignUp {
            email: "  Ada@Example.COM ".to_string(),
            password: "long-enough".to_string(),
            full_name: Some(" Ada ".to_string()),
        };
        let p = req.into_profile(UserId::new(), Utc::now()).unwrap();
        assert_eq!(p.email, "ada@example.com");
        assert_eq!(p.full_name.as_deref(), Some("Ada"));
        assert_eq!(p.role, Role::User);
    }

    #[test]
    fn sign_up_rejects_bad_email_and_short_password() {
        let mut req = SignUp {
            email: "no-at-sign".to_string(),
            password: "long-enough".to_string(),
            full_name: None,
        };
        let err = req.into_profile(UserId::new(), Utc::now()).unwrap_err();
        assert_eq!(err.offending_field(), Some("email"));

        req.email = "a@b.c".to_string();
        req.password = "short".to_string();
        let err = req.into_profile(UserId::new(), Utc::now()).unwrap_err();
        assert_eq!(err.offending_field(), Some("password"));
    }
}
