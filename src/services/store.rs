use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ConfirmedInsert, ConfirmedPairing, PairingFamily, Slot, TentativePairing,
};

/// Errors raised by a pairing store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no {family} pairing: {id}")]
    NotFound { family: PairingFamily, id: Uuid },

    #[error("a pairing already exists for {party_a} and {party_b}")]
    Conflict { party_a: String, party_b: String },

    #[error("cannot pair {0} with itself")]
    SelfPair(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Durable repository for the two pairing families.
///
/// Every method is a single atomic unit against the backing storage; the
/// lifecycle service performs no locking of its own, so all ordering
/// guarantees live here:
///
/// - `set_liked_and_fetch` is linearizable per record id: concurrent calls
///   on different slots of the same record must both land.
/// - `create_confirmed` is linearizable per unordered-pair key: concurrent
///   calls for the same pair store exactly one record and every caller
///   observes it.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Create a tentative pairing with both liked flags false.
    ///
    /// Fails with [`StoreError::Conflict`] when a tentative or confirmed
    /// record already exists for the unordered pair, and with
    /// [`StoreError::SelfPair`] when both identifiers are equal.
    async fn create_tentative(
        &self,
        party_a: &str,
        party_b: &str,
    ) -> Result<TentativePairing, StoreError>;

    /// Insert a confirmed pairing, tolerating a concurrent insert for the
    /// same unordered pair: the existing record is returned as
    /// [`ConfirmedInsert::Existing`] instead of failing or duplicating.
    async fn create_confirmed(
        &self,
        party_a: &str,
        party_b: &str,
    ) -> Result<ConfirmedInsert, StoreError>;

    async fn get_tentative(&self, id: Uuid) -> Result<TentativePairing, StoreError>;

    async fn get_confirmed(&self, id: Uuid) -> Result<ConfirmedPairing, StoreError>;

    /// Tentative pairings involving `party` where `party`'s own flag is
    /// still false, oldest first.
    async fn list_tentative_awaiting(
        &self,
        party: &str,
    ) -> Result<Vec<TentativePairing>, StoreError>;

    /// Confirmed pairings involving `party`, oldest first.
    async fn list_confirmed(&self, party: &str) -> Result<Vec<ConfirmedPairing>, StoreError>;

    /// Set the named slot's liked flag to true and return the post-update
    /// record from the same operation. Setting an already-true flag is a
    /// no-op at the data level.
    async fn set_liked_and_fetch(
        &self,
        id: Uuid,
        slot: Slot,
    ) -> Result<TentativePairing, StoreError>;

    /// Remove a record by id and family. Deleting an absent id fails with
    /// [`StoreError::NotFound`]; retrying callers treat that as already done.
    async fn delete(&self, id: Uuid, family: PairingFamily) -> Result<(), StoreError>;
}
