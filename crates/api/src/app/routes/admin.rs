//! Admin views: site totals, users and templates across all owners.
//!
//! Read-only. Every handler requires `admin.read`, which only the admin role
//! holds.

use std::sync::Arc;

use axum::{Json, Router, extract::Extension, routing::get};

use shelfwise_auth::permissions;
use shelfwise_core::UserId;
use shelfwise_infra::store::UserSummary;
use shelfwise_templates::Template;

use crate::app::dto::{AdminDashboard, AdminTemplateRow};
use crate::app::errors::ApiError;
use crate::app::routes::common::CmdAuth;
use crate::app::services::AppServices;
use crate::authz::authorize_command;
use crate::context::UserContext;

/// How many recent users/templates the dashboard shows.
const RECENT_LIMIT: usize = 5;

pub fn router() -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/users", get(users))
        .route("/templates", get(templates))
}

fn require_admin(user: &UserContext) -> Result<(), ApiError> {
    authorize_command(user, &CmdAuth::new((), vec![permissions::admin::READ]))?;
    Ok(())
}

/// GET /admin/stats
pub async fn stats(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<AdminDashboard>, ApiError> {
    require_admin(&user)?;

    let totals = services.backend.stats().await?;
    let recent_users = services.backend.recent_profiles(RECENT_LIMIT).await?;
    let mut recent = services.backend.all_templates().await?;
    recent.truncate(RECENT_LIMIT);

    Ok(Json(AdminDashboard {
        totals,
        recent_users,
        recent_templates: template_rows(&services, &recent).await?,
    }))
}

/// GET /admin/users
pub async fn users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<UserSummary>>, ApiError> {
    require_admin(&user)?;
    Ok(Json(services.backend.user_summaries().await?))
}

/// GET /admin/templates
pub async fn templates(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<AdminTemplateRow>>, ApiError> {
    require_admin(&user)?;
    let all = services.backend.all_templates().await?;
    Ok(Json(template_rows(&services, &all).await?))
}

async fn template_rows(services: &AppServices, templates: &[Template]) -> Result<Vec<AdminTemplateRow>, ApiError> {
    let mut owner_ids: Vec<UserId> = templates.iter().map(|t| t.owner_id()).collect();
    owner_ids.sort();
    owner_ids.dedup();
    let owners = services.backend.profiles(&owner_ids).await?;

    Ok(templates
        .iter()
        .map(|t| AdminTemplateRow::new(t, owners.get(&t.owner_id())))
        .collect())
}
