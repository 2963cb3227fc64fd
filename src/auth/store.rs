//! Durable bookkeeping for issued refresh tokens.
//!
//! The store is the single source of truth for revocation. The session manager
//! never touches rows directly; everything goes through `RefreshTokenStore`, so
//! there is exactly one writer path and the rotation check-and-set stays atomic.

use crate::error::AppError;
use crate::models::RefreshTokenRecord;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Persistence seam for refresh token records.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Creates a new record with `revoked = false`.
    ///
    /// Fails with `AppError::DuplicateIdentifier` if the identifier already
    /// exists. Identifiers are random v4 UUIDs, so a collision is not expected
    /// in correct operation; it must be surfaced, not silently ignored.
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AppError>;

    /// Returns the record only if it exists, belongs to `owner_id`, and is not
    /// revoked. Missing, foreign-owned and revoked records are all `None`, so
    /// a caller cannot tell which failure occurred.
    async fn find_active(
        &self,
        token_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Atomically marks the record revoked if, and only if, it is currently
    /// active for `owner_id`, returning the record as it was before the flip.
    ///
    /// This is the rotation primitive: of any number of concurrent callers
    /// presenting the same identifier, exactly one gets `Some` and the rest
    /// get `None`.
    async fn consume_active(
        &self,
        token_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError>;

    /// Sets `revoked = true`. Idempotent: revoking an already-revoked or
    /// nonexistent record is a no-op, not an error.
    async fn revoke(&self, token_id: Uuid) -> Result<(), AppError>;
}

/// Postgres-backed store used in production.
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        let result = sqlx::query(
            "INSERT INTO refresh_tokens (id, user_id, expires_at, revoked, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.expires_at)
        .bind(record.revoked)
        .bind(record.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(AppError::DuplicateIdentifier)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_active(
        &self,
        token_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT id, user_id, expires_at, revoked, created_at
             FROM refresh_tokens
             WHERE id = $1 AND user_id = $2 AND revoked = FALSE",
        )
        .bind(token_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn consume_active(
        &self,
        token_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        // Single-statement check-and-set: concurrent rotations of the same
        // identifier serialize on the row lock and only one sees revoked = FALSE.
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            "UPDATE refresh_tokens
             SET revoked = TRUE
             WHERE id = $1 AND user_id = $2 AND revoked = FALSE
             RETURNING id, user_id, expires_at, FALSE AS revoked, created_at",
        )
        .bind(token_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn revoke(&self, token_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1")
            .bind(token_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// In-memory store for tests and local development. Same semantics as the
/// Postgres store; the map mutex makes `consume_active` atomic.
#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    records: std::sync::Mutex<std::collections::HashMap<Uuid, RefreshTokenRecord>>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: overwrite a record's expiry to simulate the passage of time.
    pub fn set_expiry(&self, token_id: Uuid, expires_at: chrono::DateTime<Utc>) {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(&token_id) {
            record.expires_at = expires_at;
        }
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), AppError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.id) {
            return Err(AppError::DuplicateIdentifier);
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn find_active(
        &self,
        token_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(&token_id)
            .filter(|r| r.user_id == owner_id && !r.revoked)
            .cloned())
    }

    async fn consume_active(
        &self,
        token_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<RefreshTokenRecord>, AppError> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&token_id) {
            Some(record) if record.user_id == owner_id && !record.revoked => {
                let before = record.clone();
                record.revoked = true;
                Ok(Some(before))
            }
            _ => Ok(None),
        }
    }

    async fn revoke(&self, token_id: Uuid) -> Result<(), AppError> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(&token_id) {
            record.revoked = true;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(user_id: Uuid) -> RefreshTokenRecord {
        RefreshTokenRecord::new(Uuid::new_v4(), user_id, Utc::now() + Duration::days(7))
    }

    #[actix_rt::test]
    async fn test_insert_then_find_active() {
        let store = MemoryRefreshTokenStore::new();
        let user_id = Uuid::new_v4();
        let rec = record(user_id);

        store.insert(&rec).await.unwrap();

        let found = store.find_active(rec.id, user_id).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().id, rec.id);
    }

    #[actix_rt::test]
    async fn test_duplicate_insert_is_surfaced() {
        let store = MemoryRefreshTokenStore::new();
        let rec = record(Uuid::new_v4());

        store.insert(&rec).await.unwrap();
        assert_eq!(
            store.insert(&rec).await.unwrap_err(),
            AppError::DuplicateIdentifier
        );
    }

    #[actix_rt::test]
    async fn test_owner_mismatch_reads_as_not_found() {
        let store = MemoryRefreshTokenStore::new();
        let rec = record(Uuid::new_v4());
        store.insert(&rec).await.unwrap();

        let other_user = Uuid::new_v4();
        assert!(store.find_active(rec.id, other_user).await.unwrap().is_none());
        assert!(store
            .consume_active(rec.id, other_user)
            .await
            .unwrap()
            .is_none());

        // Still active for the real owner
        assert!(store
            .find_active(rec.id, rec.user_id)
            .await
            .unwrap()
            .is_some());
    }

    #[actix_rt::test]
    async fn test_consume_active_wins_only_once() {
        let store = MemoryRefreshTokenStore::new();
        let rec = record(Uuid::new_v4());
        store.insert(&rec).await.unwrap();

        let first = store.consume_active(rec.id, rec.user_id).await.unwrap();
        assert!(first.is_some());
        assert!(!first.unwrap().revoked);

        let second = store.consume_active(rec.id, rec.user_id).await.unwrap();
        assert!(second.is_none());
    }

    #[actix_rt::test]
    async fn test_revoke_is_idempotent() {
        let store = MemoryRefreshTokenStore::new();
        let rec = record(Uuid::new_v4());
        store.insert(&rec).await.unwrap();

        store.revoke(rec.id).await.unwrap();
        store.revoke(rec.id).await.unwrap();
        // Unknown identifiers are a no-op too
        store.revoke(Uuid::new_v4()).await.unwrap();

        assert!(store
            .find_active(rec.id, rec.user_id)
            .await
            .unwrap()
            .is_none());
    }
}
