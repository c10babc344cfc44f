//! Stateless signed tokens for access and refresh.
//!
//! Tokens are compact `header.claims.signature` strings with
//! base64url-unpadded JSON segments, signed with HMAC-SHA256 under a
//! process-wide secret. There is no server-side token store and no replay
//! protection beyond expiry: a token is valid for any number of uses until
//! its `exp` passes. Rotating the secret invalidates every outstanding token.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use super::state::AuthConfig;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Distinguishes short-lived access tokens from long-lived refresh tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: String,
    pub purpose: Purpose,
    pub fresh: bool,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(s: &str) -> Result<T, TokenError> {
    let bytes = Base64UrlUnpadded::decode_vec(s).map_err(|_| TokenError::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(0))
}

fn mac(secret: &[u8], signing_input: &str) -> HmacSha256 {
    // HMAC accepts keys of any length, so new_from_slice cannot fail.
    #[allow(clippy::expect_used)]
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(signing_input.as_bytes());
    mac
}

fn sign_hs256(secret: &[u8], claims: &TokenClaims) -> Result<String, TokenError> {
    let header_b64 = b64e_json(&TokenHeader::hs256())?;
    let claims_b64 = b64e_json(claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    let signature = mac(secret, &signing_input).finalize().into_bytes();
    let signature_b64 = Base64UrlUnpadded::encode_string(&signature);

    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Issues and validates access/refresh tokens for a single signing secret.
pub struct TokenCodec {
    secret: SecretString,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.token_secret().clone(),
            access_ttl_seconds: config.access_token_ttl_seconds(),
            refresh_ttl_seconds: config.refresh_token_ttl_seconds(),
        }
    }

    /// Create a signed token for `subject` with the purpose's configured TTL.
    ///
    /// Refresh tokens never carry freshness; only a direct login may pass
    /// `fresh = true` for an access token.
    ///
    /// # Errors
    /// Returns an error if the claims cannot be encoded.
    pub fn issue(&self, subject: &str, purpose: Purpose, fresh: bool) -> Result<String, TokenError> {
        let now = now_unix_seconds();
        let ttl = match purpose {
            Purpose::Access => self.access_ttl_seconds,
            Purpose::Refresh => self.refresh_ttl_seconds,
        };
        let claims = TokenClaims {
            sub: subject.to_string(),
            purpose,
            fresh: match purpose {
                Purpose::Access => fresh,
                Purpose::Refresh => false,
            },
            exp: now.saturating_add(ttl),
            iat: now,
        };

        sign_hs256(self.secret.expose_secret().as_bytes(), &claims)
    }

    /// Validate signature and expiry, returning the claims.
    ///
    /// The signature is verified before any claim is trusted.
    ///
    /// # Errors
    /// Returns an error for malformed, tampered, or expired tokens.
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::TokenFormat);
        };

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(TokenError::UnsupportedAlg(header.alg));
        }

        let signature =
            Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| TokenError::Base64)?;
        let signing_input = format!("{header_b64}.{claims_b64}");
        mac(self.secret.expose_secret().as_bytes(), &signing_input)
            .verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: TokenClaims = b64d_json(claims_b64)?;
        if claims.exp <= now_unix_seconds() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"***")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new(&AuthConfig::new(SecretString::from("test-secret")))
    }

    #[test]
    fn access_token_round_trip() {
        let codec = codec();
        let token = codec.issue("alice", Purpose::Access, true).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.purpose, Purpose::Access);
        assert!(claims.fresh);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_never_fresh() {
        let codec = codec();
        // Even a caller asking for freshness gets a stale refresh token.
        let token = codec.issue("alice", Purpose::Refresh, true).unwrap();
        let claims = codec.decode(&token).unwrap();
        assert_eq!(claims.purpose, Purpose::Refresh);
        assert!(!claims.fresh);
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = codec();
        let claims = TokenClaims {
            sub: "alice".to_string(),
            purpose: Purpose::Access,
            fresh: true,
            exp: now_unix_seconds() - 60,
            iat: now_unix_seconds() - 120,
        };
        let token = sign_hs256(b"test-secret", &claims).unwrap();
        assert!(matches!(codec.decode(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn tampered_claims_are_rejected() {
        let codec = codec();
        let token = codec.issue("alice", Purpose::Access, false).unwrap();

        let mut forged = TokenClaims {
            sub: "mallory".to_string(),
            purpose: Purpose::Access,
            fresh: true,
            exp: now_unix_seconds() + 600,
            iat: now_unix_seconds(),
        };
        forged.sub.make_ascii_lowercase();
        let forged_b64 = b64e_json(&forged).unwrap();

        let mut parts = token.split('.');
        let header = parts.next().unwrap();
        let _claims = parts.next().unwrap();
        let signature = parts.next().unwrap();
        let tampered = format!("{header}.{forged_b64}.{signature}");

        assert!(matches!(
            codec.decode(&tampered),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let codec = codec();
        let other = TokenCodec::new(&AuthConfig::new(SecretString::from("other-secret")));
        let token = codec.issue("alice", Purpose::Access, true).unwrap();
        assert!(matches!(
            other.decode(&token),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let codec = codec();
        assert!(matches!(
            codec.decode("not-a-token"),
            Err(TokenError::TokenFormat)
        ));
        assert!(matches!(
            codec.decode("a.b.c.d"),
            Err(TokenError::TokenFormat)
        ));
        assert!(codec.decode("!!.!!.!!").is_err());
    }

    #[test]
    fn missing_claims_are_rejected() {
        let codec = codec();
        // Structurally valid JWT whose payload lacks required fields.
        let header_b64 = b64e_json(&TokenHeader::hs256()).unwrap();
        let claims_b64 = Base64UrlUnpadded::encode_string(br#"{"sub":"alice"}"#);
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = mac(b"test-secret", &signing_input).finalize().into_bytes();
        let token = format!(
            "{signing_input}.{}",
            Base64UrlUnpadded::encode_string(&signature)
        );
        assert!(matches!(codec.decode(&token), Err(TokenError::Json(_))));
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let codec = codec();
        let header = TokenHeader {
            alg: "none".to_string(),
            typ: "JWT".to_string(),
        };
        let header_b64 = b64e_json(&header).unwrap();
        let token = format!("{header_b64}.e30.e30");
        assert!(matches!(
            codec.decode(&token),
            Err(TokenError::UnsupportedAlg(alg)) if alg == "none"
        ));
    }
}
