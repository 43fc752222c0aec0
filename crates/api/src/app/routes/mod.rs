use axum::{Router, routing::get};

pub mod admin;
pub mod auth;
pub mod common;
pub mod discussions;
pub mod inventories;
pub mod items;
pub mod presence;
pub mod system;
pub mod templates;

/// Routes reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .merge(auth::public_router())
}

/// Routes for signed-in callers.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .merge(auth::router())
        .nest("/templates", templates::router())
        .nest(
            "/inventories",
            inventories::router()
                .merge(items::router())
                .merge(discussions::router())
                .merge(presence::router()),
        )
        .nest("/admin", admin::router())
}
