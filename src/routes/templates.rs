use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{EmailTemplate, TemplatePayload};
use crate::state::AppState;
use crate::validation::{normalize, normalize_new, validate};

#[derive(Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

pub async fn list_templates(State(state): State<AppState>) -> AppResult<Json<Vec<EmailTemplate>>> {
    let templates = state.templates.list_newest_first().await?;
    Ok(Json(templates))
}

pub async fn search_templates(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<EmailTemplate>>> {
    let templates = state.templates.search_by_title(&params.query).await?;
    Ok(Json(templates))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
) -> AppResult<Json<EmailTemplate>> {
    state
        .templates
        .find(template_id)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

pub async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<TemplatePayload>,
) -> AppResult<Json<EmailTemplate>> {
    let errors = validate(&payload);
    if !errors.is_empty() {
        warn!(fields = ?errors.keys().collect::<Vec<_>>(), "template create rejected");
        return Err(AppError::validation(errors));
    }

    let template = state.templates.insert(normalize_new(payload)).await?;
    info!(template_id = template.id, title = %template.title, "template created");
    Ok(Json(template))
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
    Json(payload): Json<TemplatePayload>,
) -> AppResult<Json<EmailTemplate>> {
    if !state.templates.exists(template_id).await? {
        return Err(AppError::not_found());
    }

    let errors = validate(&payload);
    if !errors.is_empty() {
        warn!(template_id, fields = ?errors.keys().collect::<Vec<_>>(), "template update rejected");
        return Err(AppError::validation(errors));
    }

    let template = state
        .templates
        .update(template_id, normalize(payload))
        .await?
        .ok_or_else(AppError::not_found)?;
    info!(template_id, "template updated");
    Ok(Json(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
) -> AppResult<StatusCode> {
    if !state.templates.exists(template_id).await? {
        return Err(AppError::not_found());
    }

    if !state.templates.delete(template_id).await? {
        return Err(AppError::not_found());
    }

    info!(template_id, "template deleted");
    Ok(StatusCode::OK)
}
