use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::core::pair::same_pair;
use crate::models::{
    ConfirmedInsert, ConfirmedPairing, PairingFamily, Slot, TentativePairing,
};
use crate::services::store::{MatchStore, StoreError};

/// In-memory pairing store.
///
/// Backs the test suite and lets the lifecycle engine be embedded without a
/// database. One mutex guards both record tables, so every trait method is a
/// single critical section and the store-level atomicity contracts hold
/// trivially.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    tentative: HashMap<Uuid, TentativePairing>,
    confirmed: HashMap<Uuid, ConfirmedPairing>,
}

impl Tables {
    fn tentative_for_pair(&self, party_a: &str, party_b: &str) -> Option<&TentativePairing> {
        self.tentative
            .values()
            .find(|p| same_pair(&p.party_one, &p.party_two, party_a, party_b))
    }

    fn confirmed_for_pair(&self, party_a: &str, party_b: &str) -> Option<&ConfirmedPairing> {
        self.confirmed
            .values()
            .find(|p| same_pair(&p.party_one, &p.party_two, party_a, party_b))
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn create_tentative(
        &self,
        party_a: &str,
        party_b: &str,
    ) -> Result<TentativePairing, StoreError> {
        if party_a == party_b {
            return Err(StoreError::SelfPair(party_a.to_string()));
        }

        let mut tables = self.inner.lock().await;
        if tables.tentative_for_pair(party_a, party_b).is_some()
            || tables.confirmed_for_pair(party_a, party_b).is_some()
        {
            return Err(StoreError::Conflict {
                party_a: party_a.to_string(),
                party_b: party_b.to_string(),
            });
        }

        let pairing = TentativePairing {
            id: Uuid::new_v4(),
            party_one: party_a.to_string(),
            party_two: party_b.to_string(),
            party_one_liked: false,
            party_two_liked: false,
            created_at: chrono::Utc::now(),
        };
        tables.tentative.insert(pairing.id, pairing.clone());
        tracing::debug!("created tentative pairing {} ({party_a}, {party_b})", pairing.id);
        Ok(pairing)
    }

    async fn create_confirmed(
        &self,
        party_a: &str,
        party_b: &str,
    ) -> Result<ConfirmedInsert, StoreError> {
        if party_a == party_b {
            return Err(StoreError::SelfPair(party_a.to_string()));
        }

        let mut tables = self.inner.lock().await;
        if let Some(existing) = tables.confirmed_for_pair(party_a, party_b) {
            return Ok(ConfirmedInsert::Existing(existing.clone()));
        }

        let pairing = ConfirmedPairing {
            id: Uuid::new_v4(),
            party_one: party_a.to_string(),
            party_two: party_b.to_string(),
            created_at: chrono::Utc::now(),
        };
        tables.confirmed.insert(pairing.id, pairing.clone());
        Ok(ConfirmedInsert::Created(pairing))
    }

    async fn get_tentative(&self, id: Uuid) -> Result<TentativePairing, StoreError> {
        let tables = self.inner.lock().await;
        tables
            .tentative
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                family: PairingFamily::Tentative,
                id,
            })
    }

    async fn get_confirmed(&self, id: Uuid) -> Result<ConfirmedPairing, StoreError> {
        let tables = self.inner.lock().await;
        tables
            .confirmed
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                family: PairingFamily::Confirmed,
                id,
            })
    }

    async fn list_tentative_awaiting(
        &self,
        party: &str,
    ) -> Result<Vec<TentativePairing>, StoreError> {
        let tables = self.inner.lock().await;
        let mut pairings: Vec<TentativePairing> = tables
            .tentative
            .values()
            .filter(|p| match p.slot_of(party) {
                Some(slot) => !p.liked(slot),
                None => false,
            })
            .cloned()
            .collect();
        pairings.sort_by_key(|p| p.created_at);
        Ok(pairings)
    }

    async fn list_confirmed(&self, party: &str) -> Result<Vec<ConfirmedPairing>, StoreError> {
        let tables = self.inner.lock().await;
        let mut pairings: Vec<ConfirmedPairing> = tables
            .confirmed
            .values()
            .filter(|p| p.party_one == party || p.party_two == party)
            .cloned()
            .collect();
        pairings.sort_by_key(|p| p.created_at);
        Ok(pairings)
    }

    async fn set_liked_and_fetch(
        &self,
        id: Uuid,
        slot: Slot,
    ) -> Result<TentativePairing, StoreError> {
        let mut tables = self.inner.lock().await;
        let pairing = tables.tentative.get_mut(&id).ok_or(StoreError::NotFound {
            family: PairingFamily::Tentative,
            id,
        })?;
        match slot {
            Slot::One => pairing.party_one_liked = true,
            Slot::Two => pairing.party_two_liked = true,
        }
        Ok(pairing.clone())
    }

    async fn delete(&self, id: Uuid, family: PairingFamily) -> Result<(), StoreError> {
        let mut tables = self.inner.lock().await;
        let removed = match family {
            PairingFamily::Tentative => tables.tentative.remove(&id).map(|_| ()),
            PairingFamily::Confirmed => tables.confirmed.remove(&id).map(|_| ()),
        };
        removed.ok_or(StoreError::NotFound { family, id })
    }
}
