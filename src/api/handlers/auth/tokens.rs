//! Login and refresh endpoints.
//!
//! `POST /v1/token` exchanges a username/password form for a token pair with
//! a fresh access token. `POST /v1/refresh_token` exchanges an unexpired
//! refresh token for a new pair whose access token is never fresh, so a
//! session kept alive only by refreshes cannot pass the freshness guard
//! until the user logs in again. Expiry is the only way out: there is no
//! logout endpoint and no server-side session state.

use anyhow::anyhow;
use axum::{extract::Extension, Form, Json};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, warn};
use utoipa::ToSchema;

use super::password;
use super::state::AuthState;
use super::storage::{find_user_by_username, touch_last_login, UserRecord};
use super::token::Purpose;
use crate::api::handlers::error::ApiError;

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[utoipa::path(
    post,
    path = "/v1/token",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login successful", body = TokenPair),
        (status = 401, description = "Incorrect username or password"),
    ),
    tag = "auth"
)]
pub async fn token(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenPair>, ApiError> {
    let user = authenticate_user(&pool, &form.username, &form.password).await?;

    // Best-effort bookkeeping; a failed timestamp must not block login.
    if let Err(err) = touch_last_login(&pool, user.id).await {
        warn!("Failed to update last_login for {}: {err}", user.username);
    }

    debug!("Password login for {}", user.username);

    let pair = issue_pair(&auth_state, &user.username, true)?;
    Ok(Json(pair))
}

#[utoipa::path(
    post,
    path = "/v1/refresh_token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair; the access token is never fresh", body = TokenPair),
        (status = 401, description = "Invalid or expired refresh token"),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let claims = auth_state
        .codec()
        .decode(&request.refresh_token)
        .map_err(|_| ApiError::Unauthenticated)?;

    if claims.purpose != Purpose::Refresh {
        return Err(ApiError::Unauthenticated);
    }

    // Re-check the row: a deactivated or deleted user cannot keep a session
    // alive through refreshes.
    let user = find_user_by_username(&pool, &claims.sub)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    if !user.is_active {
        return Err(ApiError::Unauthenticated);
    }

    let pair = issue_pair(&auth_state, &user.username, false)?;
    Ok(Json(pair))
}

/// Verify credentials against the stored digest.
///
/// A wrong password, unknown username, and inactive account are
/// indistinguishable to the caller.
async fn authenticate_user(
    pool: &PgPool,
    username: &str,
    password: &str,
) -> Result<UserRecord, ApiError> {
    let user = find_user_by_username(pool, username)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    if !password::verify(password, &user.password_hash) {
        return Err(ApiError::Unauthenticated);
    }

    if !user.is_active {
        return Err(ApiError::Unauthenticated);
    }

    Ok(user)
}

fn issue_pair(state: &AuthState, username: &str, fresh: bool) -> Result<TokenPair, ApiError> {
    let access_token = state
        .codec()
        .issue(username, Purpose::Access, fresh)
        .map_err(|err| ApiError::Internal(anyhow!(err)))?;
    let refresh_token = state
        .codec()
        .issue(username, Purpose::Refresh, false)
        .map_err(|err| ApiError::Internal(anyhow!(err)))?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        token_type: "bearer".to_string(),
    })
}
