//! Authenticated self-service endpoints.
//!
//! Flow Overview:
//! 1) Resolve the bearer token into a principal.
//! 2) Read the caller's profile or settings row.
//! 3) Apply allow-listed settings updates via upsert.
//!
//! Settings are lazily created: a user without a row gets the defaults back
//! on read, and the first patch inserts the row.

use axum::{
    extract::Extension,
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{info_span, Instrument};
use utoipa::ToSchema;

use super::auth::{principal::require_auth, AuthState};
use super::error::ApiError;
use super::users::{fetch_user_by_id, UserResponse};

const THEMES: [&str; 3] = ["light", "dark", "system"];

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub theme: String,
    pub language: String,
    pub time_zone: String,
    pub notification_preferences: serde_json::Value,
    pub ai_assistant_enabled: bool,
}

impl Default for SettingsResponse {
    fn default() -> Self {
        Self {
            theme: "system".to_string(),
            language: "en".to_string(),
            time_zone: "UTC".to_string(),
            notification_preferences: serde_json::json!({}),
            ai_assistant_enabled: true,
        }
    }
}

/// Allow-listed patch payload. Unknown fields are rejected so a caller can
/// never touch `user_id` or other columns.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SettingsPatch {
    pub theme: Option<String>,
    pub language: Option<String>,
    pub time_zone: Option<String>,
    pub notification_preferences: Option<serde_json::Value>,
    pub ai_assistant_enabled: Option<bool>,
}

impl SettingsPatch {
    fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.language.is_none()
            && self.time_zone.is_none()
            && self.notification_preferences.is_none()
            && self.ai_assistant_enabled.is_none()
    }
}

#[utoipa::path(
    get,
    path = "/v1/me",
    responses(
        (status = 200, description = "Return the authenticated user profile", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "me"
)]
pub async fn get_me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<UserResponse>, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_active()?;

    let user = fetch_user_by_id(&pool, principal.id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/v1/me/settings",
    responses(
        (status = 200, description = "Return the caller's settings, defaults when unset", body = SettingsResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    tag = "me"
)]
pub async fn get_settings(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_active()?;

    let settings = fetch_settings(&pool, principal.id)
        .await?
        .unwrap_or_default();

    Ok(Json(settings))
}

#[utoipa::path(
    patch,
    path = "/v1/me/settings",
    request_body = SettingsPatch,
    responses(
        (status = 200, description = "Settings updated", body = SettingsResponse),
        (status = 400, description = "Empty patch payload"),
        (status = 401, description = "Missing or invalid token"),
        (status = 422, description = "Invalid theme or notification preferences"),
    ),
    tag = "me"
)]
pub async fn patch_settings(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<SettingsResponse>, ApiError> {
    let principal = require_auth(&headers, &pool, &auth_state).await?;
    principal.require_active()?;

    if patch.is_empty() {
        return Err(ApiError::BadRequest("No updates provided"));
    }

    if let Some(theme) = &patch.theme {
        if !THEMES.contains(&theme.as_str()) {
            return Err(ApiError::Unprocessable("Theme must be light, dark or system"));
        }
    }

    if let Some(preferences) = &patch.notification_preferences {
        if !preferences.is_object() {
            return Err(ApiError::Unprocessable(
                "Notification preferences must be an object",
            ));
        }
    }

    let current = fetch_settings(&pool, principal.id)
        .await?
        .unwrap_or_default();

    let merged = SettingsResponse {
        theme: patch.theme.unwrap_or(current.theme),
        language: patch.language.unwrap_or(current.language),
        time_zone: patch.time_zone.unwrap_or(current.time_zone),
        notification_preferences: patch
            .notification_preferences
            .unwrap_or(current.notification_preferences),
        ai_assistant_enabled: patch
            .ai_assistant_enabled
            .unwrap_or(current.ai_assistant_enabled),
    };

    let settings = upsert_settings(&pool, principal.id, &merged).await?;

    Ok(Json(settings))
}

fn settings_from_row(row: &sqlx::postgres::PgRow) -> Result<SettingsResponse, ApiError> {
    let preferences: String = row.get("notification_preferences");
    let preferences = serde_json::from_str(&preferences)
        .map_err(|err| ApiError::Internal(anyhow::anyhow!("Invalid stored preferences: {err}")))?;
    Ok(SettingsResponse {
        theme: row.get("theme"),
        language: row.get("language"),
        time_zone: row.get("time_zone"),
        notification_preferences: preferences,
        ai_assistant_enabled: row.get("ai_assistant_enabled"),
    })
}

async fn fetch_settings(pool: &PgPool, user_id: i64) -> Result<Option<SettingsResponse>, ApiError> {
    let query = r"
        SELECT theme, language, time_zone,
               notification_preferences::text AS notification_preferences,
               ai_assistant_enabled
        FROM user_settings WHERE user_id = $1
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await?;
    row.as_ref().map(settings_from_row).transpose()
}

async fn upsert_settings(
    pool: &PgPool,
    user_id: i64,
    settings: &SettingsResponse,
) -> Result<SettingsResponse, ApiError> {
    let preferences = settings.notification_preferences.to_string();
    let query = r"
        INSERT INTO user_settings
            (user_id, theme, language, time_zone, notification_preferences, ai_assistant_enabled)
        VALUES ($1, $2, $3, $4, $5::jsonb, $6)
        ON CONFLICT (user_id) DO UPDATE SET
            theme = EXCLUDED.theme,
            language = EXCLUDED.language,
            time_zone = EXCLUDED.time_zone,
            notification_preferences = EXCLUDED.notification_preferences,
            ai_assistant_enabled = EXCLUDED.ai_assistant_enabled
        RETURNING theme, language, time_zone,
                  notification_preferences::text AS notification_preferences,
                  ai_assistant_enabled
    ";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(&settings.theme)
        .bind(&settings.language)
        .bind(&settings.time_zone)
        .bind(&preferences)
        .bind(settings.ai_assistant_enabled)
        .fetch_one(pool)
        .instrument(span)
        .await?;
    settings_from_row(&row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_initial_account_state() {
        let settings = SettingsResponse::default();
        assert_eq!(settings.theme, "system");
        assert_eq!(settings.language, "en");
        assert_eq!(settings.time_zone, "UTC");
        assert_eq!(settings.notification_preferences, serde_json::json!({}));
        assert!(settings.ai_assistant_enabled);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: Result<SettingsPatch, _> = serde_json::from_value(serde_json::json!({
            "theme": "dark",
            "user_id": 7
        }));
        assert!(result.is_err());
    }

    #[test]
    fn patch_detects_empty_payload() {
        let patch: SettingsPatch = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn theme_allow_list_covers_check_constraint() {
        for theme in THEMES {
            assert!(["light", "dark", "system"].contains(&theme));
        }
    }
}
