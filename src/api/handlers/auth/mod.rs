//! Authentication core: password hashing, token issuing/validation,
//! principal resolution, and authorization guards.
//!
//! ## Token model
//!
//! Access and refresh tokens share one HMAC-SHA256 signing mechanism and
//! differ only in `purpose` and configured lifetime. Both are stateless
//! bearer tokens: nothing is stored server-side and there is no revocation
//! list, so rotating the signing secret is the only way to invalidate
//! tokens early.
//!
//! ## Freshness
//!
//! Only a direct password login mints a `fresh` access token. Refreshing
//! always produces `fresh = false`, which is what lets the password-change
//! endpoint insist on recently proven credentials.

pub mod password;
pub mod principal;
pub mod token;
pub mod tokens;

mod state;
pub(crate) mod storage;

pub use state::{AuthConfig, AuthState};
