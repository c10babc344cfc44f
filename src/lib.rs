//! # Organizer
//!
//! `organizer` is a small life-organizer backend: user accounts, password +
//! token authentication, per-user settings, and content (title/text/tags)
//! resources over HTTP with Postgres behind `sqlx`.
//!
//! ## Authentication
//!
//! Login exchanges a username/password for a signed access/refresh token
//! pair. Tokens are stateless HMAC-SHA256 signed strings carrying the subject
//! username, a freshness flag, a purpose (`access` or `refresh`), and an
//! expiry. There is no server-side session store: a token is valid until it
//! expires, and expiry is the only termination path.
//!
//! - Only a direct password login mints a `fresh` access token. Access tokens
//!   obtained through `/v1/refresh_token` always carry `fresh = false` and
//!   cannot pass the freshness guard that protects password changes.
//! - The principal is resolved from the token **and** the current user row on
//!   every request, so deactivating a user immediately blocks an otherwise
//!   valid token.
//!
//! ## Authorization
//!
//! Handlers thread an explicit `Principal`
//! through guard predicates (active, fresh, admin, owner-or-admin). Deleting
//! your own account is rejected even for admins; that rule is deliberately
//! separate from the ownership checks.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
