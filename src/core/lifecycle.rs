use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ConfirmedPairing, LikeOutcome, PairingFamily, TentativePairing,
};
use crate::services::store::{MatchStore, StoreError};

/// Errors raised by the lifecycle service.
#[derive(Debug, Error)]
pub enum MatchError {
    /// The acting party occupies neither slot of the referenced pairing.
    #[error("{party} is not a participant in pairing {id}")]
    NotParticipant { party: String, id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Match lifecycle orchestrator.
///
/// Encodes the mutual-interest protocol on top of the store's atomic
/// primitives: propose a tentative pairing, record one-sided likes, promote
/// to a confirmed pairing exactly once both sides have liked, and remove
/// records on withdrawal. Holds no state of its own between calls; the store
/// is the single source of truth and the only synchronization point.
pub struct MatchService<S> {
    store: S,
}

impl<S: MatchStore> MatchService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a tentative pairing between two parties.
    ///
    /// Pass-through to the store today; a recommendation policy deciding
    /// who gets proposed to whom would sit in front of this call.
    pub async fn propose(
        &self,
        party_a: &str,
        party_b: &str,
    ) -> Result<TentativePairing, MatchError> {
        let pairing = self.store.create_tentative(party_a, party_b).await?;
        tracing::debug!("proposed pairing {} ({party_a}, {party_b})", pairing.id);
        Ok(pairing)
    }

    /// Record that `acting_party` likes the other side of a tentative
    /// pairing, promoting to a confirmed pairing when interest is mutual.
    ///
    /// Safe to call twice for the same party and id: an already-true flag
    /// stays true and the outcome is recomputed from the stored state. Two
    /// racing calls on opposite slots both land (the flag update returns the
    /// post-update record atomically) and at most one of them observes
    /// `newly_promoted`: the confirmed insert is conflict-tolerant, so the
    /// pair is promoted exactly once no matter the interleaving.
    pub async fn record_like(
        &self,
        acting_party: &str,
        id: Uuid,
    ) -> Result<LikeOutcome, MatchError> {
        let pairing = self.store.get_tentative(id).await?;

        let slot = pairing
            .slot_of(acting_party)
            .ok_or_else(|| MatchError::NotParticipant {
                party: acting_party.to_string(),
                id,
            })?;

        let updated = self.store.set_liked_and_fetch(id, slot).await?;
        tracing::debug!("{acting_party} liked pairing {id}");

        if !updated.is_mutual() {
            return Ok(LikeOutcome::Pending(updated));
        }

        let insert = self
            .store
            .create_confirmed(&updated.party_one, &updated.party_two)
            .await?;
        let newly_promoted = insert.was_created();
        let confirmed = insert.into_record();

        if newly_promoted {
            tracing::info!(
                "promoted pairing {id} to confirmed match {} ({}, {})",
                confirmed.id,
                confirmed.party_one,
                confirmed.party_two
            );
        }

        Ok(LikeOutcome::Matched {
            confirmed,
            newly_promoted,
        })
    }

    /// Remove a pairing record: one party declining a tentative pairing, or
    /// an unconditional unmatch of a confirmed one.
    pub async fn withdraw(&self, id: Uuid, family: PairingFamily) -> Result<(), MatchError> {
        self.store.delete(id, family).await?;
        tracing::debug!("withdrew {family} pairing {id}");
        Ok(())
    }

    /// Tentative pairings still awaiting `party`'s decision, oldest first.
    pub async fn pairings_awaiting(
        &self,
        party: &str,
    ) -> Result<Vec<TentativePairing>, MatchError> {
        Ok(self.store.list_tentative_awaiting(party).await?)
    }

    /// Confirmed pairings involving `party`, oldest first.
    pub async fn confirmed_pairings(
        &self,
        party: &str,
    ) -> Result<Vec<ConfirmedPairing>, MatchError> {
        Ok(self.store.list_confirmed(party).await?)
    }
}
