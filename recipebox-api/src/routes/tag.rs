/// Tag endpoints
///
/// Tags are created implicitly through recipes; these endpoints list and
/// rename them.
///
/// # Endpoints
///
/// - `GET /api/recipe/tags` - List the caller's tags, alphabetical
/// - `PUT /api/recipe/tags/:id` - Rename (name required)
/// - `PATCH /api/recipe/tags/:id` - Partial update

use super::trim_field;
use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use recipebox_shared::{
    auth::context::AuthContext,
    models::tag::{Tag, UpdateTag},
};
use serde::Deserialize;
use validator::Validate;

/// Tag update request (PUT and PATCH)
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(length(min = 1, max = 255, message = "Ensure this field has 1 to 255 characters"))]
    pub name: Option<String>,
}

/// List the caller's tags
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(state.store.list_tags(auth.user_id()).await?))
}

/// Rename one of the caller's tags
pub async fn update_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateTagRequest>,
) -> ApiResult<Json<Tag>> {
    if req.name.is_none() {
        return Err(ApiError::required(&["name"]));
    }

    apply_update(&state, &auth, id, req).await
}

/// Partial update of one of the caller's tags
pub async fn partial_update_tag(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<UpdateTagRequest>,
) -> ApiResult<Json<Tag>> {
    apply_update(&state, &auth, id, req).await
}

async fn apply_update(
    state: &AppState,
    auth: &AuthContext,
    id: i64,
    mut req: UpdateTagRequest,
) -> ApiResult<Json<Tag>> {
    if let Some(name) = req.name.as_mut() {
        trim_field(name);
    }
    req.validate()?;

    let tag = state
        .store
        .update_tag(
            auth.user_id(),
            id,
            UpdateTag {
                name: req.name,
            },
        )
        .await?
        .ok_or_else(ApiError::not_found)?;

    tracing::info!(user_id = auth.user_id(), tag_id = tag.id, "Tag updated");

    Ok(Json(tag))
}
