//! Request/response types for the content API.
//!
//! These payloads are shared between handlers and `OpenAPI` generation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ContentResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub text: String,
    pub published: bool,
    pub tags: Vec<String>,
    pub owner_id: i64,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ContentCreate {
    pub title: String,
    pub text: String,
    /// Derived from the title when not provided.
    pub slug: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub published: bool,
}

/// Allow-listed patch payload. Unknown fields are rejected so a caller can
/// never smuggle `owner_id` or other columns into an update.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ContentPatch {
    pub title: Option<String>,
    pub text: Option<String>,
    pub published: Option<bool>,
    pub tags: Option<Vec<String>>,
    pub slug: Option<String>,
}

impl ContentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.text.is_none()
            && self.published.is_none()
            && self.tags.is_none()
            && self.slug.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: Result<ContentPatch, _> = serde_json::from_value(serde_json::json!({
            "title": "new",
            "owner_id": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn patch_detects_empty_payload() {
        let patch: ContentPatch = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn create_defaults_tags_and_published() {
        let create: ContentCreate = serde_json::from_value(serde_json::json!({
            "title": "Weekly groceries",
            "text": "milk, eggs"
        }))
        .unwrap();
        assert!(create.slug.is_none());
        assert!(create.tags.is_empty());
        assert!(!create.published);
    }

    #[test]
    fn create_accepts_explicit_slug() {
        let create: ContentCreate = serde_json::from_value(serde_json::json!({
            "title": "Weekly groceries",
            "text": "milk, eggs",
            "slug": "groceries-w12"
        }))
        .unwrap();
        assert_eq!(create.slug.as_deref(), Some("groceries-w12"));
    }
}
