//! Account routes: sign-up and sign-in are public, the rest need a token.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use shelfwise_auth::SignUp;

use crate::app::dto::{SessionInfo, SignInRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::UserContext;

pub fn public_router() -> Router {
    Router::new()
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-in", post(sign_in))
}

pub fn router() -> Router {
    Router::new()
        .route("/auth/sign-out", post(sign_out))
        .route("/auth/session", get(session))
}

/// POST /auth/sign-up
pub async fn sign_up(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SignUp>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = services.auth.sign_up(&body, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// POST /auth/sign-in
pub async fn sign_in(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<SignInRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = services.auth.sign_in(&body.email, &body.password, Utc::now()).await?;
    Ok(Json(session))
}

/// POST /auth/sign-out
pub async fn sign_out(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> Result<StatusCode, ApiError> {
    services.auth.sign_out(user.claims()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/session
pub async fn session(Extension(user): Extension<UserContext>) -> Json<SessionInfo> {
    Json(SessionInfo::from_context(&user))
}
