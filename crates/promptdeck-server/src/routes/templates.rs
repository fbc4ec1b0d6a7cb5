//! Template lifecycle and relationship routes

use crate::{
    AppState,
    auth::{AuthUser, MaybeAuthUser},
    error::Result,
    models::{ApiResponse, FavoriteStatus, ReadQuery, TemplateDetails, TemplateSummary},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use promptdeck_engine::entities::{CloneOverrides, NewTemplate, TemplateId, TemplatePatch};
use serde_json::json;
use tracing::{debug, info};

/// Create template routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_templates).post(create_template))
        .route(
            "/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/{id}/publish", post(publish_template))
        .route("/{id}/unpublish", post(unpublish_template))
        .route("/{id}/clone", post(clone_template))
        .route("/{id}/fork", post(fork_template))
        .route(
            "/{id}/favorite",
            get(favorite_status).post(add_favorite).delete(remove_favorite),
        )
}

/// List the caller's non-deleted templates
async fn list_templates(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<ApiResponse<Vec<TemplateSummary>>>> {
    debug!(owner = %principal.id, "listing templates");

    let templates = state.engine.lifecycle.list_owned(&principal).await?;
    let summaries = templates.into_iter().map(TemplateSummary::from).collect();
    Ok(Json(ApiResponse::ok(summaries)))
}

/// Create a new template draft
async fn create_template(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(request): Json<NewTemplate>,
) -> Result<impl IntoResponse> {
    info!(owner = %principal.id, "creating template");

    let template = state.engine.lifecycle.create(&principal, request).await?;
    let details = TemplateDetails::from(template);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(details))))
}

/// Get a template by id, recording a view on the default path.
///
/// `?include_deleted=true` is the owner-only audit path; it does not
/// record a view.
async fn get_template(
    State(state): State<AppState>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(id): Path<String>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<ApiResponse<TemplateDetails>>> {
    debug!(template = %id, "getting template");
    let id = TemplateId::from(id);

    let template = if query.include_deleted {
        state
            .engine
            .lifecycle
            .read(principal.as_ref(), &id, true)
            .await?
    } else {
        state.engine.lifecycle.view(principal.as_ref(), &id).await?
    };
    Ok(Json(ApiResponse::ok(TemplateDetails::from(template))))
}

/// Apply a partial update (owner only)
async fn update_template(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<TemplatePatch>,
) -> Result<Json<ApiResponse<TemplateDetails>>> {
    info!(template = %id, owner = %principal.id, "updating template");
    let id = TemplateId::from(id);

    let template = state.engine.lifecycle.update(&principal, &id, patch).await?;
    Ok(Json(ApiResponse::ok(TemplateDetails::from(template))))
}

/// Soft-delete a template (owner only)
async fn delete_template(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>> {
    info!(template = %id, owner = %principal.id, "deleting template");
    let id = TemplateId::from(id);

    state.engine.lifecycle.delete(&principal, &id).await?;
    Ok(Json(ApiResponse::ok(json!({"deleted": true}))))
}

/// Publish a draft (owner only)
async fn publish_template(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TemplateDetails>>> {
    info!(template = %id, owner = %principal.id, "publishing template");
    let id = TemplateId::from(id);

    let template = state.engine.lifecycle.publish(&principal, &id).await?;
    Ok(Json(ApiResponse::ok(TemplateDetails::from(template))))
}

/// Return a published template to draft (owner only)
async fn unpublish_template(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TemplateDetails>>> {
    info!(template = %id, owner = %principal.id, "unpublishing template");
    let id = TemplateId::from(id);

    let template = state.engine.lifecycle.unpublish(&principal, &id).await?;
    Ok(Json(ApiResponse::ok(TemplateDetails::from(template))))
}

/// Copy a template without lineage counting; anonymous callers allowed
async fn clone_template(
    State(state): State<AppState>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(id): Path<String>,
    body: Option<Json<CloneOverrides>>,
) -> Result<impl IntoResponse> {
    info!(template = %id, "cloning template");
    let id = TemplateId::from(id);
    let overrides = body.map(|Json(o)| o).unwrap_or_default();

    let template = state
        .engine
        .lifecycle
        .clone_template(principal.as_ref(), &id, overrides)
        .await?;
    let details = TemplateDetails::from(template);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(details))))
}

/// Fork a template into an owned derivative (auth required)
async fn fork_template(
    State(state): State<AppState>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    info!(template = %id, "forking template");
    let id = TemplateId::from(id);

    let template = state
        .engine
        .lifecycle
        .fork(principal.as_ref(), &id)
        .await?;
    let details = TemplateDetails::from(template);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(details))))
}

/// Favorite membership and count for the caller
async fn favorite_status(
    State(state): State<AppState>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FavoriteStatus>>> {
    let id = TemplateId::from(id);
    state
        .engine
        .lifecycle
        .read(principal.as_ref(), &id, false)
        .await?;

    let is_favorite = match &principal {
        Some(p) => state.engine.ledger.is_favorite(&id, &p.id).await?,
        None => false,
    };
    let favorite_count = state.engine.ledger.favorite_count(&id).await?;
    Ok(Json(ApiResponse::ok(FavoriteStatus {
        is_favorite,
        favorite_count,
    })))
}

/// Add the caller to a template's favorite set (idempotent)
async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FavoriteStatus>>> {
    debug!(template = %id, user = %principal.id, "adding favorite");
    let id = TemplateId::from(id);
    state
        .engine
        .lifecycle
        .read(Some(&principal), &id, false)
        .await?;

    state.engine.ledger.add_favorite(&id, &principal.id).await?;
    let favorite_count = state.engine.ledger.favorite_count(&id).await?;
    Ok(Json(ApiResponse::ok(FavoriteStatus {
        is_favorite: true,
        favorite_count,
    })))
}

/// Remove the caller from a template's favorite set (idempotent)
async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FavoriteStatus>>> {
    debug!(template = %id, user = %principal.id, "removing favorite");
    let id = TemplateId::from(id);
    state
        .engine
        .lifecycle
        .read(Some(&principal), &id, false)
        .await?;

    state
        .engine
        .ledger
        .remove_favorite(&id, &principal.id)
        .await?;
    let favorite_count = state.engine.ledger.favorite_count(&id).await?;
    Ok(Json(ApiResponse::ok(FavoriteStatus {
        is_favorite: false,
        favorite_count,
    })))
}
