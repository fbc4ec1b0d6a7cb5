//! Search and tag aggregation routes

use crate::{
    AppState,
    auth::MaybeAuthUser,
    error::{ApiError, Result},
    models::{ApiResponse, SearchAction, SearchParams, TemplateDetails},
};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use promptdeck_engine::entities::TagCount;
use serde_json::Value;
use tracing::debug;

/// Create search routes
pub fn router() -> Router<AppState> {
    Router::new().route("/search", get(search_templates).post(search_actions))
}

/// Full-text search over published public templates
async fn search_templates(
    State(state): State<AppState>,
    MaybeAuthUser(principal): MaybeAuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<Vec<TemplateDetails>>>> {
    debug!(query = %params.q, "searching templates");

    let results = state
        .engine
        .search
        .search(principal.as_ref(), &params.q, params.limit)
        .await?;
    let details = results.into_iter().map(TemplateDetails::from).collect();
    Ok(Json(ApiResponse::ok(details)))
}

/// Dispatch body-addressed search actions, e.g. `{"action": "popular-tags"}`
async fn search_actions(
    State(state): State<AppState>,
    Json(request): Json<Value>,
) -> Result<Json<ApiResponse<Vec<TagCount>>>> {
    let action: SearchAction = serde_json::from_value(request)
        .map_err(|e| ApiError::validation(&format!("unsupported search action: {e}")))?;

    match action {
        SearchAction::PopularTags { limit } => {
            let tags = state.engine.search.popular_tags(limit).await?;
            Ok(Json(ApiResponse::ok(tags)))
        }
    }
}
