use axum::{Json, extract::Extension, http::StatusCode};

use crate::app::dto::SessionInfo;
use crate::context::UserContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(user): Extension<UserContext>) -> Json<SessionInfo> {
    Json(SessionInfo::from_context(&user))
}
