//! SQL storage helpers for content entries.
//!
//! Tags are stored as a single comma-joined column and exposed as a list at
//! the API boundary, so the join/split pair lives next to the queries that
//! read and write the column.

use sqlx::{PgPool, Row};
use tracing::{info_span, Instrument};

use super::super::{error::ApiError, is_unique_violation};
use super::{
    slug::with_suffix,
    types::{ContentCreate, ContentResponse},
    SLUG_MAX,
};

const CONTENT_COLUMNS: &str = r#"
    id,
    title,
    slug,
    text,
    published,
    tags,
    owner_id,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

/// Comma-joins tags for storage, dropping empties and surrounding whitespace.
pub(super) fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits the stored column back into a list; an empty column means no tags.
pub(super) fn split_tags(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

fn content_from_row(row: &sqlx::postgres::PgRow) -> ContentResponse {
    let tags: String = row.get("tags");
    ContentResponse {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        text: row.get("text"),
        published: row.get("published"),
        tags: split_tags(&tags),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(super) async fn fetch_all(pool: &PgPool) -> Result<Vec<ContentResponse>, sqlx::Error> {
    let query = format!("SELECT {CONTENT_COLUMNS} FROM content ORDER BY created_at DESC");
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT"
    );
    let rows = sqlx::query(&query).fetch_all(pool).instrument(span).await?;
    Ok(rows.iter().map(content_from_row).collect())
}

pub(super) async fn fetch_by_id(
    pool: &PgPool,
    id: i64,
) -> Result<Option<ContentResponse>, sqlx::Error> {
    let query = format!("SELECT {CONTENT_COLUMNS} FROM content WHERE id = $1");
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
    Ok(row.as_ref().map(content_from_row))
}

/// Numeric keys match the id column, everything else matches the slug.
pub(super) async fn fetch_by_key(
    pool: &PgPool,
    key: &str,
) -> Result<Option<ContentResponse>, sqlx::Error> {
    if let Ok(id) = key.parse::<i64>() {
        return fetch_by_id(pool, id).await;
    }

    let query = format!("SELECT {CONTENT_COLUMNS} FROM content WHERE slug = $1");
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
    Ok(row.as_ref().map(content_from_row))
}

/// Inserts a new entry, resolving slug collisions by suffixing within
/// `SLUG_MAX`. Gives up after a handful of attempts rather than looping
/// forever on a pathological title.
pub(super) async fn insert_content(
    pool: &PgPool,
    owner_id: i64,
    payload: &ContentCreate,
    base_slug: &str,
) -> Result<ContentResponse, ApiError> {
    let tags = join_tags(&payload.tags);
    let query = format!(
        r"
        INSERT INTO content (title, slug, text, published, tags, owner_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {CONTENT_COLUMNS}
        "
    );

    let mut attempt = 0;
    loop {
        let slug = if attempt == 0 {
            base_slug.to_string()
        } else {
            let Some(slug) = with_suffix(base_slug, attempt + 1, SLUG_MAX) else {
                return Err(ApiError::Unprocessable("Could not allocate a slug"));
            };
            slug
        };

        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT"
        );
        let row = sqlx::query(&query)
            .bind(&payload.title)
            .bind(&slug)
            .bind(&payload.text)
            .bind(payload.published)
            .bind(&tags)
            .bind(owner_id)
            .fetch_one(pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => return Ok(content_from_row(&row)),
            Err(err) if is_unique_violation(&err) && attempt < 5 => {
                attempt += 1;
            }
            Err(err) if is_unique_violation(&err) => {
                return Err(ApiError::Unprocessable("Slug already exists"));
            }
            Err(err) => return Err(ApiError::Database(err)),
        }
    }
}

pub(super) struct ContentUpdate {
    pub title: Option<String>,
    pub text: Option<String>,
    pub published: Option<bool>,
    pub tags: Option<String>,
    pub slug: Option<String>,
}

/// Applies an allow-listed partial update and returns the fresh row.
pub(super) async fn update_content(
    pool: &PgPool,
    id: i64,
    update: ContentUpdate,
) -> Result<Option<ContentResponse>, ApiError> {
    let mut builder: sqlx::QueryBuilder<sqlx::Postgres> =
        sqlx::QueryBuilder::new("UPDATE content SET updated_at = NOW()");
    if let Some(title) = update.title {
        builder.push(", title = ").push_bind(title);
    }
    if let Some(text) = update.text {
        builder.push(", text = ").push_bind(text);
    }
    if let Some(published) = update.published {
        builder.push(", published = ").push_bind(published);
    }
    if let Some(tags) = update.tags {
        builder.push(", tags = ").push_bind(tags);
    }
    if let Some(slug) = update.slug {
        builder.push(", slug = ").push_bind(slug);
    }
    builder.push(" WHERE id = ").push_bind(id);
    builder.push(format!(" RETURNING {CONTENT_COLUMNS}"));

    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE"
    );
    let row = builder
        .build()
        .fetch_optional(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(row.as_ref().map(content_from_row)),
        Err(err) if is_unique_violation(&err) => Err(ApiError::Unprocessable("Slug already exists")),
        Err(err) => Err(ApiError::Database(err)),
    }
}

pub(super) async fn delete_content(pool: &PgPool, id: i64) -> Result<(), sqlx::Error> {
    let query = "DELETE FROM content WHERE id = $1";
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
    fn join_tags_drops_empties_and_trims() {
        let tags = vec![
            " home ".to_string(),
            String::new(),
            "errands".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(join_tags(&tags), "home,errands");
    }

    #[test]
    fn split_tags_handles_empty_column() {
        assert!(split_tags("").is_empty());
        assert_eq!(split_tags("home, errands"), vec!["home", "errands"]);
    }
}
