//! Principal resolution and authorization guards.
//!
//! Flow Overview: read the bearer token, decode and verify it, resolve the
//! subject against the current user row, and return a principal that
//! downstream handlers thread through explicit guard calls. Nothing is
//! cached between requests, so deactivating a user takes effect on their
//! very next request even while their token is unexpired.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use sqlx::PgPool;

use super::state::AuthState;
use super::storage::{find_user_by_username, UserRecord};
use super::token::{Purpose, TokenClaims};
use crate::api::handlers::error::ApiError;

/// Resolved identity and authorization attributes of the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub active: bool,
    pub superuser: bool,
    /// True only for access tokens minted by a direct password login.
    pub fresh: bool,
}

impl Principal {
    /// Passes iff the principal is active.
    ///
    /// # Errors
    /// `Unauthenticated` for inactive principals.
    pub fn require_active(&self) -> Result<(), ApiError> {
        if self.active {
            Ok(())
        } else {
            Err(ApiError::Unauthenticated)
        }
    }

    /// Passes iff the principal is active and its token came from a direct
    /// login. Gates password changes: a refresh-derived token never passes.
    ///
    /// # Errors
    /// `Unauthenticated` for inactive or stale principals.
    pub fn require_fresh(&self) -> Result<(), ApiError> {
        self.require_active()?;
        if self.fresh {
            Ok(())
        } else {
            Err(ApiError::Unauthenticated)
        }
    }

    /// Passes iff the principal is active and a superuser.
    ///
    /// # Errors
    /// `Unauthenticated` for inactive principals, `Forbidden` otherwise.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        self.require_active()?;
        if self.superuser {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin privileges required"))
        }
    }

    /// Passes iff the principal owns the resource or is a superuser.
    ///
    /// # Errors
    /// `Unauthenticated` for inactive principals, `Forbidden` otherwise.
    pub fn require_owner_or_admin(&self, owner_id: i64) -> Result<(), ApiError> {
        self.require_active()?;
        if self.id == owner_id || self.superuser {
            Ok(())
        } else {
            Err(ApiError::Forbidden("You don't own this resource"))
        }
    }

    /// Rejects operations an account must not apply to itself, admin or not.
    /// Distinct from ownership: this prevents self-lockout, it is not a
    /// permission hierarchy.
    ///
    /// # Errors
    /// `Forbidden` when `target_id` is the principal's own id.
    pub fn reject_self_target(&self, target_id: i64) -> Result<(), ApiError> {
        if self.id == target_id {
            Err(ApiError::Forbidden("You can't delete yourself"))
        } else {
            Ok(())
        }
    }
}

/// Resolve the bearer token into a principal, or fail `Unauthenticated`.
///
/// The token must be a valid, unexpired access token whose subject matches
/// an active user row. Read-only: no stored state is mutated.
///
/// # Errors
/// `Unauthenticated` for missing/invalid/expired tokens, refresh tokens
/// presented as access tokens, unknown subjects, and inactive users.
pub async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    state: &AuthState,
) -> Result<Principal, ApiError> {
    let token = extract_bearer_token(headers).ok_or(ApiError::Unauthenticated)?;

    let claims = state
        .codec()
        .decode(&token)
        .map_err(|_| ApiError::Unauthenticated)?;

    let user = find_user_by_username(pool, &claims.sub).await?;

    resolve_principal(user, &claims)
}

/// Turn verified claims plus the current user row into a principal.
///
/// The row is re-read on every request, so a user deactivated after the
/// token was issued fails here even while the token is unexpired.
fn resolve_principal(
    user: Option<UserRecord>,
    claims: &TokenClaims,
) -> Result<Principal, ApiError> {
    if claims.purpose != Purpose::Access {
        return Err(ApiError::Unauthenticated);
    }

    let user = user.ok_or(ApiError::Unauthenticated)?;

    if !user.is_active {
        return Err(ApiError::Unauthenticated);
    }

    Ok(Principal {
        id: user.id,
        username: user.username,
        active: user.is_active,
        superuser: user.superuser,
        fresh: claims.fresh,
    })
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn principal(id: i64, active: bool, superuser: bool, fresh: bool) -> Principal {
        Principal {
            id,
            username: format!("user-{id}"),
            active,
            superuser,
            fresh,
        }
    }

    #[test]
    fn active_guard() {
        assert!(principal(1, true, false, false).require_active().is_ok());
        assert!(matches!(
            principal(1, false, false, false).require_active(),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn fresh_guard_rejects_refresh_derived_tokens() {
        assert!(principal(1, true, false, true).require_fresh().is_ok());
        assert!(matches!(
            principal(1, true, false, false).require_fresh(),
            Err(ApiError::Unauthenticated)
        ));
        // Inactive beats fresh.
        assert!(matches!(
            principal(1, false, false, true).require_fresh(),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn admin_guard() {
        assert!(principal(1, true, true, false).require_admin().is_ok());
        assert!(matches!(
            principal(1, true, false, false).require_admin(),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            principal(1, false, true, false).require_admin(),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn owner_or_admin_guard() {
        let owner = principal(7, true, false, false);
        assert!(owner.require_owner_or_admin(7).is_ok());
        assert!(matches!(
            owner.require_owner_or_admin(8),
            Err(ApiError::Forbidden(_))
        ));

        let admin = principal(1, true, true, false);
        assert!(admin.require_owner_or_admin(8).is_ok());
    }

    #[test]
    fn self_delete_is_forbidden_even_for_admins() {
        let admin = principal(1, true, true, true);
        assert!(matches!(
            admin.reject_self_target(1),
            Err(ApiError::Forbidden(_))
        ));
        assert!(admin.reject_self_target(2).is_ok());
    }

    fn access_claims(sub: &str, fresh: bool) -> TokenClaims {
        TokenClaims {
            sub: sub.to_string(),
            purpose: Purpose::Access,
            fresh,
            exp: i64::MAX,
            iat: 0,
        }
    }

    fn record(active: bool) -> UserRecord {
        UserRecord {
            id: 7,
            username: "alice".to_string(),
            password_hash: String::new(),
            is_active: active,
            superuser: false,
        }
    }

    #[test]
    fn resolution_carries_token_freshness() {
        let principal = resolve_principal(Some(record(true)), &access_claims("alice", true)).unwrap();
        assert_eq!(principal.id, 7);
        assert!(principal.fresh);

        let stale = resolve_principal(Some(record(true)), &access_claims("alice", false)).unwrap();
        assert!(!stale.fresh);
    }

    #[test]
    fn deactivated_user_fails_resolution_with_valid_token() {
        // The token was minted while the account was active; the current row
        // decides, not the claims.
        assert!(matches!(
            resolve_principal(Some(record(false)), &access_claims("alice", true)),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn unknown_subject_fails_resolution() {
        assert!(matches!(
            resolve_principal(None, &access_claims("ghost", true)),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn refresh_token_cannot_resolve_a_principal() {
        let claims = TokenClaims {
            purpose: Purpose::Refresh,
            ..access_claims("alice", false)
        };
        assert!(matches!(
            resolve_principal(Some(record(true)), &claims),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers), Some("abc".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer  xyz "));
        assert_eq!(extract_bearer_token(&headers), Some("xyz".to_string()));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
