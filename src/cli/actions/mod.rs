pub mod server;

use secrecy::SecretString;

/// Actions the CLI can dispatch to.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        token_secret: SecretString,
        access_token_expire_minutes: u64,
        refresh_token_expire_minutes: u64,
        cors_origin: Option<String>,
    },
}
