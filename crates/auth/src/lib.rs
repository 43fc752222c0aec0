//! `shelfwise-auth`: authentication and authorization boundary.
//!
//! Claims, roles, permissions, token signing/verification and password
//! hashing. Decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod profile;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, IssuedToken, JwtValidator, TokenError};
pub use password::{MIN_PASSWORD_LENGTH, PasswordError, hash_password, validate_password_strength, verify_password};
pub use permissions::Permission;
pub use principal::Principal;
pub use profile::{Profile, SignUp, normalize_email};
pub use roles::Role;
