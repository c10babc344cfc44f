use crate::{api, api::handlers::auth::AuthConfig, cli::actions::Action};
use anyhow::Result;
use url::Url;

/// Execute the server action.
///
/// # Errors
/// Returns an error if the DSN is invalid or the server fails to start.
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            token_secret,
            access_token_expire_minutes,
            refresh_token_expire_minutes,
            cors_origin,
        } => {
            // Fail early on malformed connection strings instead of at pool
            // connect time.
            let dsn = Url::parse(&dsn)?;

            let auth_config = AuthConfig::new(token_secret)
                .with_access_token_expire_minutes(access_token_expire_minutes)
                .with_refresh_token_expire_minutes(refresh_token_expire_minutes);

            api::new(port, dsn.to_string(), auth_config, cors_origin).await?;
        }
    }

    Ok(())
}
