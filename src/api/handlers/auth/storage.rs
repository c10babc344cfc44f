//! Database helpers for authentication state.

use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};

/// Fields of a user row the auth core needs.
#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) is_active: bool,
    pub(crate) superuser: bool,
}

/// Look up a user by exact username.
pub(crate) async fn find_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let query = "SELECT id, username, password_hash, is_active, superuser FROM users WHERE username = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await?;

    Ok(row.map(|row| UserRecord {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        superuser: row.get("superuser"),
    }))
}

/// Replace a user's password digest wholesale.
///
/// Returns `false` when no such user exists.
pub(crate) async fn update_password_hash(
    pool: &PgPool,
    user_id: i64,
    digest: &str,
) -> Result<bool, sqlx::Error> {
    let query = "UPDATE users SET password_hash = $1 WHERE id = $2";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(digest)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a successful password login.
pub(crate) async fn touch_last_login(pool: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    let query = "UPDATE users SET last_login = NOW() WHERE id = $1";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .execute(pool)
        .instrument(span)
        .await?;

    Ok(())
}
