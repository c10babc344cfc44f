//! API handlers and shared utilities.
//!
//! This module organizes the service's route handlers and provides common
//! functions for input validation and database error classification.

pub mod auth;
pub mod content;
pub mod error;
pub mod health;
pub mod me;
pub mod root;
pub mod users;

use regex::Regex;

/// Lightweight email sanity check used before persisting account data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Usernames are short lowercase identifiers; they must not parse as an
/// integer or the id-or-username lookup becomes ambiguous.
pub fn valid_username(username: &str) -> bool {
    Regex::new(r"^[a-z0-9][a-z0-9_.-]{2,31}$").is_ok_and(|re| re.is_match(username))
        && username.parse::<i64>().is_err()
}

/// Unique-constraint violations surface as 422 instead of 500.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}
