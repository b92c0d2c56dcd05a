//! Session tokens — short-lived signed tokens naming an account.
//!
//! Tokens are HS256 JWTs. The subject is the account id; older tokens that
//! carry it as `userId` are still accepted.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use linkbot_core::config::AuthConfig;
use linkbot_core::{LinkbotError, Result};

/// Verified token contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    #[serde(alias = "userId")]
    pub sub: String,
    #[serde(default)]
    pub email: String,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
}

/// Issues and verifies session tokens.
pub trait IdentityService: Send + Sync {
    /// Issue a token for `account_id`.
    fn issue(&self, account_id: &str, email: &str) -> Result<String>;

    /// Verify signature and expiry, returning the claims.
    ///
    /// Fails with [`LinkbotError::InvalidToken`].
    fn verify(&self, token: &str) -> Result<Claims>;
}

/// [`IdentityService`] backed by HS256 JWTs.
pub struct JwtIdentity {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentity").field("ttl", &self.ttl).finish()
    }
}

impl JwtIdentity {
    /// Build from the auth config. The signing secret must be set.
    pub fn new(config: &AuthConfig) -> Result<Self> {
        if !config.is_configured() {
            return Err(LinkbotError::validation("auth.jwtSecret is not set"));
        }
        let ttl_hours = i64::try_from(config.token_ttl_hours)
            .map_err(|_| LinkbotError::validation("auth.tokenTtlHours is too large"))?;

        Ok(JwtIdentity {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        })
    }
}

impl IdentityService for JwtIdentity {
    fn issue(&self, account_id: &str, email: &str) -> Result<String> {
        if account_id.is_empty() {
            return Err(LinkbotError::validation("account id is required"));
        }
        let exp = (Utc::now() + self.ttl).timestamp().max(0) as usize;
        let claims = Claims {
            sub: account_id.to_string(),
            email: email.to_string(),
            exp,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| LinkbotError::InvalidToken(format!("failed to sign token: {e}")))
    }

    fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| LinkbotError::InvalidToken(e.to_string()))?;

        if data.claims.sub.is_empty() {
            return Err(LinkbotError::InvalidToken("token has no subject".into()));
        }
        debug!(account_id = %data.claims.sub, "token verified");
        Ok(data.claims)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
