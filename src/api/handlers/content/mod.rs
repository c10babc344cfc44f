//! Content entry endpoints.
//!
//! Reads are public: anyone can list entries or fetch one by id or slug.
//! Writes derive authorization from the bearer token: any active user can
//! create, while updates and deletes require ownership of the entry or admin
//! privileges. Slugs are derived from the title at creation time and stay
//! stable afterwards unless the patch payload replaces them explicitly.
//!
//! This module is split into a route-focused file plus a shared storage layer
//! so the HTTP surface stays easy to read and the SQL logic stays easy to
//! test. The handler module only parses inputs and maps the high-level flow,
//! while `storage` owns database queries and response shaping.
//!
//! Flow Overview:
//! 1) Resolve the bearer token into a principal (writes only).
//! 2) Resolve the entry and enforce ownership for updates and deletes.
//! 3) Perform the read or allow-listed write.

pub(crate) mod items;
mod slug;
mod storage;
pub(crate) mod types;

const SLUG_MIN: usize = 1;
const SLUG_MAX: usize = 64;
