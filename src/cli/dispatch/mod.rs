//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the server action with its full
//! configuration.

use crate::cli::actions::Action;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);

    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let token_secret = matches
        .get_one::<String>("token-secret")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --token-secret")?;

    let access_token_expire_minutes = matches
        .get_one::<u64>("access-token-expire-minutes")
        .copied()
        .unwrap_or(30);

    let refresh_token_expire_minutes = matches
        .get_one::<u64>("refresh-token-expire-minutes")
        .copied()
        .unwrap_or(1440);

    let cors_origin = matches.get_one::<String>("cors-origin").cloned();

    Ok(Action::Server {
        port,
        dsn,
        token_secret,
        access_token_expire_minutes,
        refresh_token_expire_minutes,
        cors_origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    #[test]
    fn test_dispatch_server_action() {
        temp_env::with_vars([("ORGANIZER_CORS_ORIGIN", None::<&str>)], || {
            let matches = commands::new().get_matches_from(vec![
                "organizer",
                "--dsn",
                "postgres://localhost:5432/organizer",
                "--token-secret",
                "sekret",
                "--port",
                "9000",
            ]);

            let action = handler(&matches);
            assert!(action.is_ok());

            if let Ok(Action::Server {
                port,
                dsn,
                token_secret,
                access_token_expire_minutes,
                refresh_token_expire_minutes,
                cors_origin,
            }) = action
            {
                assert_eq!(port, 9000);
                assert_eq!(dsn, "postgres://localhost:5432/organizer");
                assert_eq!(token_secret.expose_secret(), "sekret");
                assert_eq!(access_token_expire_minutes, 30);
                assert_eq!(refresh_token_expire_minutes, 1440);
                assert_eq!(cors_origin, None);
            }
        });
    }
}
