use crate::config::AuthConfig;
use crate::error::AppError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The `type` claim value that marks a token as a refresh credential.
/// Access tokens carry no type claim at all.
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Represents the claims encoded within a JWT (JSON Web Token).
///
/// Access tokens carry only `sub` and `exp`. Refresh tokens additionally carry
/// `type = "refresh"` and a unique `jti` that keys the persisted record.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject of the token: the user's unique identifier.
    pub sub: Uuid,
    /// Expiration timestamp (seconds since epoch) for the token.
    pub exp: usize,
    /// Discriminates refresh tokens from access tokens.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Unique token identifier, present on refresh tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
}

impl Claims {
    /// Returns `true` if this token carries the refresh type tag.
    pub fn is_refresh(&self) -> bool {
        self.token_type.as_deref() == Some(REFRESH_TOKEN_TYPE)
    }

    /// Extracts the token identifier of a refresh token.
    ///
    /// Fails with `AppError::InvalidToken` if the type tag is missing or wrong,
    /// or if the identifier claim is absent. An access token presented where a
    /// refresh token is expected lands here.
    pub fn refresh_token_id(&self) -> Result<Uuid, AppError> {
        if !self.is_refresh() {
            return Err(AppError::InvalidToken("not a refresh token".into()));
        }
        self.jti
            .ok_or_else(|| AppError::InvalidToken("refresh token missing identifier".into()))
    }
}

/// Stateless signer/verifier for both token kinds.
///
/// Holds the HS256 keys and the two lifetimes, all derived once from
/// `AuthConfig` at startup. Verification performs no I/O, so access token
/// checks on the request hot path never touch the store.
#[derive(Clone)]
pub struct TokenEncoder {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenEncoder {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_lifetime: Duration::minutes(config.access_token_minutes),
            refresh_lifetime: Duration::days(config.refresh_token_days),
        }
    }

    /// Signs a short-lived access token for the given user.
    pub fn sign_access(&self, user_id: Uuid) -> Result<String, AppError> {
        let expires_at = Utc::now() + self.access_lifetime;
        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            token_type: None,
            jti: None,
        };
        self.sign(&claims)
    }

    /// Signs a long-lived refresh token bound to `token_id`.
    ///
    /// Returns the expiry alongside the token so the caller can persist a
    /// record whose expiry matches the token's `exp` claim exactly.
    pub fn sign_refresh(
        &self,
        user_id: Uuid,
        token_id: Uuid,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = Utc::now() + self.refresh_lifetime;
        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            token_type: Some(REFRESH_TOKEN_TYPE.to_string()),
            jti: Some(token_id),
        };
        Ok((self.sign(&claims)?, expires_at))
    }

    /// Verifies a token's signature and expiry and decodes its claims.
    ///
    /// Malformed, tampered and expired tokens all fail with
    /// `AppError::InvalidToken`; expiry is part of verification, never left to
    /// the caller.
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| AppError::InvalidToken(e.to_string()))
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to sign token: {}", e)))
    }
}
