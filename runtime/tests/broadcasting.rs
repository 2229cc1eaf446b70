//! Integration tests for Store action broadcasting.
//!
//! Effect-produced actions are broadcast to observers before they feed
//! back into the reducer. That is what lets a caller fire an action and
//! wait for the cascade's outcome without polling state, so these tests
//! pin the semantics down: who gets broadcast, who does not, and how
//! `send_and_wait_for` behaves at the edges.

#![allow(clippy::unwrap_used)] // Test assertions
#![allow(clippy::panic)] // Test assertions

use divvy_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use divvy_runtime::{Store, StoreError};
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

// ────────────────────────────────────────────────────────────────────
// Fixture: a miniature sync protocol with single, fan-out, and chained
// feedback shapes
// ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum SyncAction {
    /// Ask for one refresh; answered by `RefreshFinished`.
    RefreshRequested { id: u64 },
    RefreshFinished { id: u64 },
    /// Fan out three item syncs in parallel.
    BatchRequested,
    ItemSynced { id: u64 },
    /// Two-hop cascade ending in `HandshakeSettled`.
    HandshakeStarted,
    HandshakeAccepted,
    HandshakeSettled,
    /// Produces no effects at all.
    Idle,
}

#[derive(Debug, Clone, Default)]
struct SyncState {
    refreshed: Vec<u64>,
    synced: Vec<u64>,
    settled: bool,
}

#[derive(Debug, Clone)]
struct SyncReducer;

impl Reducer for SyncReducer {
    type State = SyncState;
    type Action = SyncAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            SyncAction::RefreshRequested { id } => {
                smallvec![Effect::Future(Box::pin(async move {
                    Some(SyncAction::RefreshFinished { id })
                }))]
            },
            SyncAction::RefreshFinished { id } => {
                state.refreshed.push(id);
                smallvec![Effect::None]
            },
            SyncAction::BatchRequested => {
                smallvec![Effect::Parallel(vec![
                    Effect::Future(Box::pin(async { Some(SyncAction::ItemSynced { id: 1 }) })),
                    Effect::Future(Box::pin(async { Some(SyncAction::ItemSynced { id: 2 }) })),
                    Effect::Future(Box::pin(async { Some(SyncAction::ItemSynced { id: 3 }) })),
                ])]
            },
            SyncAction::ItemSynced { id } => {
                state.synced.push(id);
                smallvec![Effect::None]
            },
            SyncAction::HandshakeStarted => {
                smallvec![Effect::Future(Box::pin(async {
                    Some(SyncAction::HandshakeAccepted)
                }))]
            },
            SyncAction::HandshakeAccepted => {
                smallvec![Effect::delay(
                    Duration::from_millis(10),
                    SyncAction::HandshakeSettled,
                )]
            },
            SyncAction::HandshakeSettled => {
                state.settled = true;
                smallvec![Effect::None]
            },
            SyncAction::Idle => smallvec![Effect::None],
        }
    }
}

fn test_store() -> Store<SyncState, SyncAction, (), SyncReducer> {
    Store::new(SyncState::default(), SyncReducer, ())
}

async fn next_action(
    rx: &mut tokio::sync::broadcast::Receiver<SyncAction>,
) -> SyncAction {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap()
}

// ────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn feedback_actions_reach_subscribers_but_direct_sends_do_not() {
    let store = test_store();
    let mut rx = store.subscribe_actions();

    store
        .send(SyncAction::RefreshRequested { id: 7 })
        .await
        .unwrap()
        .wait()
        .await;

    // Only the effect's answer is broadcast; the action the caller sent
    // directly never echoes back to observers.
    assert_eq!(next_action(&mut rx).await, SyncAction::RefreshFinished { id: 7 });
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn send_and_wait_for_resolves_on_a_cascaded_action() {
    let store = test_store();

    // Two hops away from the action sent: future, then delay
    let outcome = store
        .send_and_wait_for(
            SyncAction::HandshakeStarted,
            |action| matches!(action, SyncAction::HandshakeSettled),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
    assert_eq!(outcome, SyncAction::HandshakeSettled);

    // The broadcast races the feedback reduce by design, so the state
    // flip lands immediately after, not necessarily before, the return
    for _ in 0..100 {
        if store.state(|state| state.settled).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("handshake never settled in state");
}

#[tokio::test]
async fn send_and_wait_for_times_out_without_a_match() {
    let store = test_store();

    let outcome = store
        .send_and_wait_for(
            SyncAction::Idle,
            |action| matches!(action, SyncAction::HandshakeSettled),
            Duration::from_millis(50),
        )
        .await;
    assert!(matches!(outcome, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn every_subscriber_sees_the_whole_fan_out() {
    let store = test_store();
    let mut first = store.subscribe_actions();
    let mut second = store.subscribe_actions();

    store
        .send(SyncAction::BatchRequested)
        .await
        .unwrap()
        .wait()
        .await;

    // Parallel effects finish in any order; both observers still see
    // all three items
    for rx in [&mut first, &mut second] {
        let mut ids = Vec::new();
        for _ in 0..3 {
            match next_action(rx).await {
                SyncAction::ItemSynced { id } => ids.push(id),
                other => panic!("unexpected broadcast: {other:?}"),
            }
        }
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}

#[tokio::test]
async fn a_late_subscriber_misses_earlier_feedback() {
    let store = test_store();

    store
        .send(SyncAction::RefreshRequested { id: 1 })
        .await
        .unwrap()
        .wait()
        .await;

    let mut rx = store.subscribe_actions();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}
