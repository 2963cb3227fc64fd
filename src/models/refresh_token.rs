use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted bookkeeping for one issued refresh token.
///
/// The record is the durable source of truth for whether the token identified by
/// `id` may still be rotated. Records are never deleted; revocation flips
/// `revoked` in place and the row is retained as reuse-detection history.
///
/// Invariant: every live refresh token's `jti` claim has exactly one record here,
/// and that record's `user_id` matches the token's `sub` claim.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshTokenRecord {
    /// The token identifier (`jti` claim). Primary key.
    pub id: Uuid,
    /// The subject the token was issued to.
    pub user_id: Uuid,
    /// Mirrors the token's `exp` claim. Checked lazily on use.
    pub expires_at: DateTime<Utc>,
    /// Terminal once set. Rotation, logout and expiry-on-use all end up here.
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn new(id: Uuid, user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            expires_at,
            revoked: false,
            created_at: Utc::now(),
        }
    }

    /// Whether the record's expiry has passed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_record_starts_active() {
        let record = RefreshTokenRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now() + Duration::days(7),
        );
        assert!(!record.revoked);
        assert!(!record.is_expired(Utc::now()));
    }

    #[test]
    fn test_expiry_check() {
        let record = RefreshTokenRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now() - Duration::seconds(1),
        );
        assert!(record.is_expired(Utc::now()));
    }
}
