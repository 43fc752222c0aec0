use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use shelfwise_auth::permissions;
use shelfwise_core::{Entity, TemplateId};
use shelfwise_templates::{NewTemplate, Template};

use crate::app::dto::{LikeState, TemplateDetail, TemplateListing};
use crate::app::errors::ApiError;
use crate::app::routes::common::{CmdAuth, parse_id};
use crate::app::services::AppServices;
use crate::authz::authorize_command;
use crate::context::UserContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_template).get(list_own_templates))
        .route("/available", get(list_available_templates))
        .route("/:id", get(get_template))
        .route("/:id/like", post(like_template).delete(unlike_template))
}

/// POST /templates
pub async fn create_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Json(body): Json<NewTemplate>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CmdAuth::new(body, vec![permissions::templates::WRITE]);
    authorize_command(&user, &cmd)?;

    let template = Template::create(TemplateId::new(), user.user_id(), cmd.inner, Utc::now())?;
    services.backend.insert_template(&template).await?;

    tracing::info!(
        template_id = %template.id(),
        field_count = template.fields().len(),
        "template created"
    );
    Ok((StatusCode::CREATED, Json(TemplateDetail::new(template, 0))))
}

/// GET /templates: the caller's own templates, newest first.
pub async fn list_own_templates(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<TemplateListing>>, ApiError> {
    let templates = services.backend.templates_owned_by(user.user_id()).await?;
    with_like_counts(&services, templates).await.map(Json)
}

/// GET /templates/available: public or own templates, by name.
pub async fn list_available_templates(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<TemplateListing>>, ApiError> {
    let templates = services.backend.templates_available_to(user.user_id()).await?;
    with_like_counts(&services, templates).await.map(Json)
}

/// GET /templates/:id
pub async fn get_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<TemplateDetail>, ApiError> {
    let template = services.visible_template(parse_id(&id)?, user.user_id()).await?;
    let like_count = services.backend.template_like_count(*template.id()).await?;
    Ok(Json(TemplateDetail::new(template, like_count)))
}

/// POST /templates/:id/like
pub async fn like_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<LikeState>, ApiError> {
    set_like(&services, &user, &id, true).await.map(Json)
}

/// DELETE /templates/:id/like
pub async fn unlike_template(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<UserContext>,
    Path(id): Path<String>,
) -> Result<Json<LikeState>, ApiError> {
    set_like(&services, &user, &id, false).await.map(Json)
}

async fn set_like(services: &AppServices, user: &UserContext, id: &str, liked: bool) -> Result<LikeState, ApiError> {
    let template_id: TemplateId = parse_id(id)?;
    authorize_command(user, &CmdAuth::new(template_id, vec![permissions::templates::LIKE]))?;
    services.visible_template(template_id, user.user_id()).await?;

    services.backend.set_template_like(user.user_id(), template_id, liked).await?;
    let like_count = services.backend.template_like_count(template_id).await?;
    Ok(LikeState { liked, like_count })
}

async fn with_like_counts(services: &AppServices, templates: Vec<Template>) -> Result<Vec<TemplateListing>, ApiError> {
    let mut listings = Vec::with_capacity(templates.len());
    for template in templates {
        let like_count = services.backend.template_like_count(*template.id()).await?;
        listings.push(TemplateListing { template, like_count });
    }
    Ok(listings)
}
