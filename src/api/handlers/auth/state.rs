//! Auth configuration and shared state.
//!
//! The signing secret and both token lifetimes travel in an explicitly
//! constructed [`AuthConfig`] handed to the codec at startup. There is no
//! module-level configuration singleton.

use secrecy::SecretString;

use super::token::TokenCodec;

const DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES: u64 = 30;
const DEFAULT_REFRESH_TOKEN_EXPIRE_MINUTES: u64 = 24 * 60;

#[derive(Clone)]
pub struct AuthConfig {
    token_secret: SecretString,
    access_token_expire_minutes: u64,
    refresh_token_expire_minutes: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            token_secret,
            access_token_expire_minutes: DEFAULT_ACCESS_TOKEN_EXPIRE_MINUTES,
            refresh_token_expire_minutes: DEFAULT_REFRESH_TOKEN_EXPIRE_MINUTES,
        }
    }

    #[must_use]
    pub fn with_access_token_expire_minutes(mut self, minutes: u64) -> Self {
        self.access_token_expire_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_refresh_token_expire_minutes(mut self, minutes: u64) -> Self {
        self.refresh_token_expire_minutes = minutes;
        self
    }

    #[must_use]
    pub fn token_secret(&self) -> &SecretString {
        &self.token_secret
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        i64::try_from(self.access_token_expire_minutes.saturating_mul(60)).unwrap_or(i64::MAX)
    }

    #[must_use]
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        i64::try_from(self.refresh_token_expire_minutes.saturating_mul(60)).unwrap_or(i64::MAX)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"***")
            .field(
                "access_token_expire_minutes",
                &self.access_token_expire_minutes,
            )
            .field(
                "refresh_token_expire_minutes",
                &self.refresh_token_expire_minutes,
            )
            .finish()
    }
}

/// Per-process auth state shared with handlers through an axum `Extension`.
#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let codec = TokenCodec::new(&config);
        Self { config, codec }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = AuthConfig::new(SecretString::from("sekret"));
        assert_eq!(config.access_token_ttl_seconds(), 30 * 60);
        assert_eq!(config.refresh_token_ttl_seconds(), 24 * 60 * 60);

        let config = config
            .with_access_token_expire_minutes(5)
            .with_refresh_token_expire_minutes(10);
        assert_eq!(config.access_token_ttl_seconds(), 5 * 60);
        assert_eq!(config.refresh_token_ttl_seconds(), 10 * 60);
    }

    #[test]
    fn debug_redacts_secret() {
        let config = AuthConfig::new(SecretString::from("sekret"));
        let printed = format!("{config:?}");
        assert!(printed.contains("***"));
        assert!(!printed.contains("sekret"));
    }
}
