// End-to-end lifecycle tests against the in-memory store.

use std::sync::Arc;

use matchbook::{
    LikeOutcome, MatchError, MatchService, MatchStore, MemoryStore, PairingFamily,
};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

fn service() -> MatchService<MemoryStore> {
    init_tracing();
    MatchService::new(MemoryStore::new())
}

#[tokio::test]
async fn test_single_like_leaves_pairing_tentative() {
    let service = service();
    let pairing = service.propose("u1", "u2").await.unwrap();

    let outcome = service.record_like("u1", pairing.id).await.unwrap();

    let updated = match outcome {
        LikeOutcome::Pending(p) => p,
        other => panic!("expected pending, got {other:?}"),
    };
    assert!(updated.party_one_liked);
    assert!(!updated.party_two_liked);
    assert!(service.confirmed_pairings("u1").await.unwrap().is_empty());

    // u1 has decided; only u2 still sees the pairing as awaiting.
    assert!(service.pairings_awaiting("u1").await.unwrap().is_empty());
    let awaiting_u2 = service.pairings_awaiting("u2").await.unwrap();
    assert_eq!(awaiting_u2.len(), 1);
    assert_eq!(awaiting_u2[0].id, pairing.id);
}

#[tokio::test]
async fn test_second_like_promotes_and_both_parties_see_the_match() {
    let service = service();
    let pairing = service.propose("u1", "u2").await.unwrap();

    service.record_like("u1", pairing.id).await.unwrap();
    let outcome = service.record_like("u2", pairing.id).await.unwrap();

    let confirmed = match outcome {
        LikeOutcome::Matched {
            confirmed,
            newly_promoted,
        } => {
            assert!(newly_promoted);
            confirmed
        }
        other => panic!("expected match, got {other:?}"),
    };

    let for_u1 = service.confirmed_pairings("u1").await.unwrap();
    let for_u2 = service.confirmed_pairings("u2").await.unwrap();
    assert_eq!(for_u1, vec![confirmed.clone()]);
    assert_eq!(for_u2, vec![confirmed]);
}

#[tokio::test]
async fn test_concurrent_likes_on_opposite_slots_promote_exactly_once() {
    let service = Arc::new(service());
    let pairing = service.propose("u1", "u2").await.unwrap();

    let a = {
        let service = Arc::clone(&service);
        let id = pairing.id;
        tokio::spawn(async move { service.record_like("u1", id).await })
    };
    let b = {
        let service = Arc::clone(&service);
        let id = pairing.id;
        tokio::spawn(async move { service.record_like("u2", id).await })
    };

    let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];

    // Both flags landed, no lost update.
    let stored = service.store().get_tentative(pairing.id).await.unwrap();
    assert!(stored.is_mutual());

    // Exactly one confirmed record, and exactly one caller created it.
    let promoted = outcomes.iter().filter(|o| o.newly_promoted()).count();
    assert_eq!(promoted, 1);
    assert_eq!(service.confirmed_pairings("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_duplicate_likes_promote_exactly_once() {
    // A client retry storm: u1 already liked, then two copies of u2's like
    // race each other.
    let service = Arc::new(service());
    let pairing = service.propose("u1", "u2").await.unwrap();
    service.record_like("u1", pairing.id).await.unwrap();

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let service = Arc::clone(&service);
            let id = pairing.id;
            tokio::spawn(async move { service.record_like("u2", id).await })
        })
        .collect();

    let mut matched = 0;
    let mut promoted = 0;
    for task in tasks {
        let outcome = task.await.unwrap().unwrap();
        matched += outcome.is_matched() as usize;
        promoted += outcome.newly_promoted() as usize;
    }

    assert_eq!(matched, 2);
    assert_eq!(promoted, 1);
    assert_eq!(service.confirmed_pairings("u2").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_withdraw_then_repropose_yields_fresh_pairing() {
    let service = service();
    let first = service.propose("u1", "u2").await.unwrap();
    service.record_like("u1", first.id).await.unwrap();

    service
        .withdraw(first.id, PairingFamily::Tentative)
        .await
        .unwrap();

    let err = service.store().get_tentative(first.id).await.unwrap_err();
    assert!(err.is_not_found());

    let fresh = service.propose("u1", "u2").await.unwrap();
    assert_ne!(fresh.id, first.id);
    assert!(!fresh.party_one_liked);
    assert!(!fresh.party_two_liked);
}

#[tokio::test]
async fn test_withdraw_is_not_silently_idempotent() {
    let service = service();
    let pairing = service.propose("u1", "u2").await.unwrap();

    service
        .withdraw(pairing.id, PairingFamily::Tentative)
        .await
        .unwrap();

    // A retried withdraw surfaces NotFound for the caller to absorb.
    let err = service
        .withdraw(pairing.id, PairingFamily::Tentative)
        .await
        .unwrap_err();
    assert!(matches!(err, MatchError::Store(e) if e.is_not_found()));
}

#[tokio::test]
async fn test_unmatch_removes_only_the_confirmed_record() {
    let service = service();
    let pairing = service.propose("u1", "u2").await.unwrap();
    service.record_like("u1", pairing.id).await.unwrap();
    let outcome = service.record_like("u2", pairing.id).await.unwrap();
    let confirmed = match outcome {
        LikeOutcome::Matched { confirmed, .. } => confirmed,
        other => panic!("expected match, got {other:?}"),
    };

    service
        .withdraw(confirmed.id, PairingFamily::Confirmed)
        .await
        .unwrap();

    assert!(service.confirmed_pairings("u1").await.unwrap().is_empty());
    // The tentative record (both flags true) is retained as history.
    let stored = service.store().get_tentative(pairing.id).await.unwrap();
    assert!(stored.is_mutual());
}

#[tokio::test]
async fn test_promotion_leaves_pairing_out_of_awaiting_lists() {
    let service = service();
    let pairing = service.propose("u1", "u2").await.unwrap();
    service.record_like("u1", pairing.id).await.unwrap();
    service.record_like("u2", pairing.id).await.unwrap();

    assert!(service.pairings_awaiting("u1").await.unwrap().is_empty());
    assert!(service.pairings_awaiting("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_awaiting_lists_are_oldest_first() {
    let service = service();
    let older = service.propose("u2", "u1").await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let newer = service.propose("u1", "u3").await.unwrap();

    let awaiting = service.pairings_awaiting("u1").await.unwrap();
    assert_eq!(
        awaiting.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![older.id, newer.id]
    );
}

#[tokio::test]
async fn test_stranger_cannot_like_or_observe_effects() {
    let service = service();
    let pairing = service.propose("u1", "u2").await.unwrap();

    let err = service.record_like("u9", pairing.id).await.unwrap_err();
    assert!(matches!(err, MatchError::NotParticipant { .. }));

    let stored = service.store().get_tentative(pairing.id).await.unwrap();
    assert!(!stored.party_one_liked && !stored.party_two_liked);
}
