//! Infrastructure layer: configuration, storage backends, the auth provider
//! and realtime delivery.

pub mod auth_provider;
pub mod config;
pub mod realtime;
pub mod store;

pub use auth_provider::{AuthError, AuthProvider, Session};
pub use config::{AppConfig, ConfigError};
pub use realtime::{PresenceGuard, RealtimeError, RealtimeHub, presence_subject};
pub use store::{Backend, StoreError, StoreResult};
