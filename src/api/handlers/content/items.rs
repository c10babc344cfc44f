use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;

use super::super::auth::{principal::require_auth, AuthState};
use super::super::error::ApiError;
use super::{
    slug::normalize_slug,
    storage,
    types::{ContentCreate, ContentPatch, ContentResponse},
    SLUG_MAX, SLUG_MIN,
};

#[utoipa::path(
    get,
    path = "/v1/content",
    responses(
        (status = 200, description = "List content entries", body = [ContentResponse]),
    ),
    tag = "content"
)]
pub async fn list_content(
    pool: Extension<PgPool>,
) -> Result<Json<Vec<ContentResponse>>, ApiError> {
    let entries = storage::fetch_all(&pool).await?;
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/v1/content/{id_or_slug}",
    params(
        ("id_or_slug" = String, Path, description = "Numeric content id or exact slug")
    ),
    responses(
        (status = 200, description = "Content detail", body = ContentResponse),
        (status = 404, description = "Content not found"),
    ),
    tag = "content"
)]
pub async fn get_content(
    Path(id_or_slug): Path<String>,
    pool: Extension<PgPool>,
) -> Result<Json<ContentResponse>, ApiError> {
    let entry = storage::fetch_by_key(&pool, id_or_slug.trim())
        .await?
        .ok_or(ApiError::NotFound("Content not found"))?;
    Ok(Json(entry))
}

#[utoipa::path(
    post,
    path = "/v1/content",
    request_body = ContentCreate,
    responses(
        (status = 201, description = "Content created", body = ContentResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Invalid slug, or the title does not yield one"),
    ),
    tag = "content"
)]
pub async fn create_content(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Json(payload): Json<ContentCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_active()?;

    // An explicit slug wins, the title is the fallback.
    let base_slug = match &payload.slug {
        Some(raw) => normalize_slug(raw, SLUG_MIN, SLUG_MAX)
            .ok_or(ApiError::Unprocessable("Invalid slug"))?,
        None => normalize_slug(&payload.title, SLUG_MIN, SLUG_MAX)
            .ok_or(ApiError::Unprocessable("Title does not yield a usable slug"))?,
    };

    let entry = storage::insert_content(&pool, principal.id, &payload, &base_slug).await?;

    debug!("Content {} created by {}", entry.slug, principal.username);

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    patch,
    path = "/v1/content/{id_or_slug}",
    request_body = ContentPatch,
    params(
        ("id_or_slug" = String, Path, description = "Numeric content id or exact slug")
    ),
    responses(
        (status = 200, description = "Content updated", body = ContentResponse),
        (status = 400, description = "Empty patch payload"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Content not found"),
        (status = 422, description = "Invalid slug or slug already exists"),
    ),
    tag = "content"
)]
pub async fn patch_content(
    Path(id_or_slug): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Json(patch): Json<ContentPatch>,
) -> Result<Json<ContentResponse>, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_active()?;

    let entry = storage::fetch_by_key(&pool, id_or_slug.trim())
        .await?
        .ok_or(ApiError::NotFound("Content not found"))?;

    principal.require_owner_or_admin(entry.owner_id)?;

    if patch.is_empty() {
        return Err(ApiError::BadRequest("No updates provided"));
    }

    let slug = match patch.slug {
        Some(raw) => Some(
            normalize_slug(&raw, SLUG_MIN, SLUG_MAX).ok_or(ApiError::Unprocessable("Invalid slug"))?,
        ),
        None => None,
    };

    let update = storage::ContentUpdate {
        title: patch.title,
        text: patch.text,
        published: patch.published,
        tags: patch.tags.as_deref().map(storage::join_tags),
        slug,
    };

    let entry = storage::update_content(&pool, entry.id, update)
        .await?
        .ok_or(ApiError::NotFound("Content not found"))?;

    Ok(Json(entry))
}

#[utoipa::path(
    delete,
    path = "/v1/content/{id_or_slug}",
    params(
        ("id_or_slug" = String, Path, description = "Numeric content id or exact slug")
    ),
    responses(
        (status = 204, description = "Content deleted"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Content not found"),
    ),
    tag = "content"
)]
pub async fn delete_content(
    Path(id_or_slug): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<StatusCode, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_active()?;

    let entry = storage::fetch_by_key(&pool, id_or_slug.trim())
        .await?
        .ok_or(ApiError::NotFound("Content not found"))?;

    principal.require_owner_or_admin(entry.owner_id)?;

    storage::delete_content(&pool, entry.id).await?;

    debug!("Content {} deleted by {}", entry.slug, principal.username);

    Ok(StatusCode::NO_CONTENT)
}
