//! Session credential lifecycle: issuance, rotation, reuse detection, revocation.
//!
//! Each refresh token identifier moves through a small state machine: Active,
//! then Expired (detected lazily on use) or Revoked, both terminal. Rotation
//! revokes the presented token before minting its successor, so a second
//! presentation of the same token is rejected no matter who makes it. That
//! covers a stolen token being replayed, and also a legitimate client retrying
//! after a dropped response; the latter loses its session and must log in
//! again, which is the accepted trade-off.

use crate::auth::store::RefreshTokenStore;
use crate::auth::token::TokenEncoder;
use crate::error::AppError;
use crate::models::RefreshTokenRecord;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// An access/refresh pair as handed to the routing layer.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Identifier collisions are retried with a fresh identifier rather than
/// surfaced to the caller. More than one collision in a row means something is
/// wrong with the random source, and that does get surfaced.
const MAX_ISSUE_ATTEMPTS: u32 = 3;

/// Orchestrates the encoder and the store; holds no per-request state of its
/// own, so it can be cloned freely and invoked concurrently.
#[derive(Clone)]
pub struct SessionManager {
    encoder: TokenEncoder,
    store: Arc<dyn RefreshTokenStore>,
}

impl SessionManager {
    pub fn new(encoder: TokenEncoder, store: Arc<dyn RefreshTokenStore>) -> Self {
        Self { encoder, store }
    }

    /// Issues a fresh access/refresh pair for `user_id` and persists the
    /// refresh record. Requires no prior state for the user.
    pub async fn issue(&self, user_id: Uuid) -> Result<TokenPair, AppError> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let token_id = Uuid::new_v4();
            let (refresh_token, expires_at) = self.encoder.sign_refresh(user_id, token_id)?;
            let record = RefreshTokenRecord::new(token_id, user_id, expires_at);

            match self.store.insert(&record).await {
                Ok(()) => {
                    let access_token = self.encoder.sign_access(user_id)?;
                    return Ok(TokenPair {
                        access_token,
                        refresh_token,
                    });
                }
                Err(AppError::DuplicateIdentifier) if attempts < MAX_ISSUE_ATTEMPTS => {
                    log::warn!(
                        "refresh token identifier collision for user {}, retrying",
                        user_id
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Exchanges a refresh token for a brand-new pair, revoking the presented
    /// token first.
    ///
    /// Failure modes, in evaluation order:
    /// - `InvalidToken`: bad signature, past the token's own expiry, or not a
    ///   refresh token at all.
    /// - `ReuseDetected`: the store has no active record for this identifier
    ///   and owner. Never issued, already rotated, explicitly revoked and
    ///   owner mismatch are indistinguishable outcomes on purpose.
    /// - `CredentialExpired`: the record existed and was active but its expiry
    ///   has passed. The consume above already revoked it, so a retry gets
    ///   `ReuseDetected`.
    ///
    /// The revoke happens before the new insert; a crash between the two
    /// leaves the old token dead and no new token live, forcing a fresh login
    /// rather than ever allowing replay.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.encoder.verify(refresh_token)?;
        let token_id = claims.refresh_token_id()?;

        match self.store.consume_active(token_id, claims.sub).await? {
            None => {
                log::warn!(
                    "refresh token reuse detected for user {} (token {})",
                    claims.sub,
                    token_id
                );
                Err(AppError::ReuseDetected)
            }
            Some(record) if record.is_expired(Utc::now()) => {
                log::info!(
                    "expired refresh token {} presented by user {}",
                    token_id,
                    claims.sub
                );
                Err(AppError::CredentialExpired)
            }
            Some(_) => self.issue(claims.sub).await,
        }
    }

    /// Revokes the presented refresh token. Best-effort cleanup: as long as
    /// the token itself parses, revocation succeeds whether or not the store
    /// ever knew the identifier.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        let claims = self.encoder.verify(refresh_token)?;
        let token_id = claims.refresh_token_id()?;
        self.store.revoke(token_id).await
    }

    /// Authenticates an access token, returning its subject. Pure signature
    /// and expiry checks; never touches the store.
    pub fn verify_access(&self, access_token: &str) -> Result<Uuid, AppError> {
        let claims = self.encoder.verify(access_token)?;
        if claims.is_refresh() {
            return Err(AppError::InvalidToken(
                "refresh token cannot be used for access".into(),
            ));
        }
        Ok(claims.sub)
    }
}
