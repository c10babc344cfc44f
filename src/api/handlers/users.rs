//! User account management endpoints.
//!
//! Flow Overview:
//! 1) Resolve the bearer token into a principal.
//! 2) Enforce the guard for the route (admin, active, fresh + ownership).
//! 3) Perform the read or allow-listed write for the requested user.

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};
use utoipa::ToSchema;

use super::auth::{
    password,
    principal::require_auth,
    storage::update_password_hash,
    AuthState,
};
use super::error::ApiError;
use super::{is_unique_violation, valid_email, valid_username};

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub superuser: bool,
    pub is_active: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserPasswordPatch {
    pub password: String,
    pub password_confirm: String,
}

const USER_COLUMNS: &str = r#"
    id,
    username,
    email,
    phone_number,
    profile_picture,
    first_name,
    last_name,
    gender,
    superuser,
    is_active,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(last_login AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS last_login
"#;

fn user_from_row(row: &sqlx::postgres::PgRow) -> UserResponse {
    UserResponse {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        phone_number: row.get("phone_number"),
        profile_picture: row.get("profile_picture"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        gender: row.get("gender"),
        superuser: row.get("superuser"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        last_login: row.get("last_login"),
    }
}

#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "List users (admin only)", body = [UserResponse]),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
    ),
    tag = "users"
)]
pub async fn list_users(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_admin()?;

    let users = fetch_users(&pool).await?;
    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/v1/users",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created (admin only)", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 422, description = "Invalid input or username/email already exists"),
    ),
    tag = "users"
)]
pub async fn create_user(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Json(payload): Json<UserCreate>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_admin()?;

    if !valid_username(&payload.username) {
        return Err(ApiError::Unprocessable("Invalid username"));
    }
    if !valid_email(&payload.email) {
        return Err(ApiError::Unprocessable("Invalid email"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::Unprocessable("Password must not be empty"));
    }

    let digest = password::hash(&payload.password)?;
    let user = insert_user(&pool, &payload, &digest).await?;

    debug!("User {} created by {}", user.username, principal.username);

    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/v1/users/{id_or_username}",
    params(
        ("id_or_username" = String, Path, description = "Numeric user id or exact username")
    ),
    responses(
        (status = 200, description = "User detail", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_user(
    Path(id_or_username): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<UserResponse>, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_active()?;

    let user = fetch_user_by_key(&pool, id_or_username.trim())
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(user))
}

#[utoipa::path(
    patch,
    path = "/v1/users/{id_or_username}/password",
    request_body = UserPasswordPatch,
    params(
        ("id_or_username" = String, Path, description = "Numeric user id or exact username")
    ),
    responses(
        (status = 200, description = "Password replaced", body = UserResponse),
        (status = 400, description = "Passwords don't match"),
        (status = 401, description = "Missing, invalid, or non-fresh token"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn update_user_password(
    Path(id_or_username): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Json(patch): Json<UserPasswordPatch>,
) -> Result<Json<UserResponse>, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    // Password changes demand a token from a direct login, not a refresh.
    principal.require_fresh()?;

    let user = fetch_user_by_key(&pool, id_or_username.trim())
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    principal.require_owner_or_admin(user.id)?;

    if patch.password != patch.password_confirm {
        return Err(ApiError::BadRequest("Passwords don't match"));
    }
    if patch.password.is_empty() {
        return Err(ApiError::BadRequest("Password must not be empty"));
    }

    let digest = password::hash(&patch.password)?;
    if !update_password_hash(&pool, user.id, &digest).await? {
        return Err(ApiError::NotFound("User not found"));
    }

    debug!("Password updated for user {}", user.username);

    Ok(Json(user))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{id_or_username}",
    params(
        ("id_or_username" = String, Path, description = "Numeric user id or exact username")
    ),
    responses(
        (status = 204, description = "User deleted (admin only)"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin, or tried to delete themselves"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    Path(id_or_username): Path<String>,
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<StatusCode, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_admin()?;

    let user = fetch_user_by_key(&pool, id_or_username.trim())
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    // Admins can delete anyone but themselves; the settings row goes with
    // the user via ON DELETE CASCADE.
    principal.reject_self_target(user.id)?;

    delete_user_row(&pool, user.id).await?;

    debug!("User {} deleted by {}", user.username, principal.username);

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_users(pool: &PgPool) -> Result<Vec<UserResponse>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let rows = sqlx::query(&query).fetch_all(pool).instrument(span).await?;
    Ok(rows.iter().map(user_from_row).collect())
}

pub(crate) async fn fetch_user_by_id(
    pool: &PgPool,
    id: i64,
) -> Result<Option<UserResponse>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.as_ref().map(user_from_row))
}

/// Numeric keys match the id column, everything else matches the username.
async fn fetch_user_by_key(pool: &PgPool, key: &str) -> Result<Option<UserResponse>, sqlx::Error> {
    if let Ok(id) = key.parse::<i64>() {
        return fetch_user_by_id(pool, id).await;
    }

    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let row = sqlx::query(&query)
        .bind(key)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    Ok(row.as_ref().map(user_from_row))
}

async fn insert_user(
    pool: &PgPool,
    payload: &UserCreate,
    digest: &str,
) -> Result<UserResponse, ApiError> {
    let query = format!(
        r"
        INSERT INTO users
            (username, email, phone_number, password_hash, profile_picture,
             first_name, last_name, gender)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {USER_COLUMNS}
        "
    );
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT"
    );
    let row = sqlx::query(&query)
        .bind(&payload.username)
        .bind(&payload.email)
        .bind(&payload.phone_number)
        .bind(digest)
        .bind(&payload.profile_picture)
        .bind(&payload.first_name)
        .bind(&payload.last_name)
        .bind(&payload.gender)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(user_from_row(&row)),
        Err(err) if is_unique_violation(&err) => {
            Err(ApiError::Unprocessable("Username or email already exists"))
        }
        Err(err) => Err(ApiError::Database(err)),
    }
}

async fn delete_user_row(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    let query = "DELETE FROM users WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_patch_rejects_unknown_fields() {
        let result: Result<UserPasswordPatch, _> = serde_json::from_value(serde_json::json!({
            "password": "a",
            "password_confirm": "a",
            "superuser": true
        }));
        assert!(result.is_err());
    }

    #[test]
    fn user_create_rejects_unknown_fields() {
        let result: Result<UserCreate, _> = serde_json::from_value(serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret",
            "is_active": false
        }));
        assert!(result.is_err());
    }

    #[test]
    fn user_create_accepts_optional_fields_missing() {
        let user: UserCreate = serde_json::from_value(serde_json::json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret"
        }))
        .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.first_name, None);
    }
}
