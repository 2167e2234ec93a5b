//! Backend-agnostic checks every `RequestStore` must pass.
//!
//! Each check gets a fresh, empty store from the factory.

use std::future::Future;

use crate::domain::{
    Coordinate, FailureCause, RequestToken, Solution, StoredRequest, UNKNOWN_ERROR_MESSAGE,
};

use super::{RequestStore, StoreError};

fn token(s: &str) -> RequestToken {
    RequestToken::parse(s).unwrap()
}

fn path() -> Vec<Coordinate> {
    vec![
        Coordinate::new(1.0, 2.0).unwrap(),
        Coordinate::new(8.0, 9.0).unwrap(),
    ]
}

fn solution() -> Solution {
    Solution {
        path: vec![
            Coordinate::new(1.0, 2.0).unwrap(),
            Coordinate::new(8.0, 9.0).unwrap(),
        ],
        total_distance: 600,
        total_time: 700,
    }
}

/// Run every check against stores produced by `make`.
pub async fn run_all<S, F, Fut>(make: F)
where
    S: RequestStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    create_then_lookup_in_progress(&make().await).await;
    duplicate_create_is_invariant_violation(&make().await).await;
    finalize_moves_to_success(&make().await).await;
    finalize_requires_provisional(&make().await).await;
    finalize_twice_fails(&make().await).await;
    failure_message_is_normalized(&make().await).await;
    discard_missing_is_ok(&make().await).await;
    compensation_leaves_only_failure(&make().await).await;
    lookup_removes_stale_provisional(&make().await).await;
    unknown_token_is_not_found(&make().await).await;
    create_after_failure_is_rejected(&make().await).await;
}

async fn create_then_lookup_in_progress(store: &impl RequestStore) {
    let t = token("CREATE");
    let record = store.create_provisional(&t, &path()).await.unwrap();
    assert_eq!(record.path, path());
    assert_eq!(record.created_at, record.updated_at);

    match store.lookup(&t).await.unwrap() {
        Some(StoredRequest::InProgress(found)) => assert_eq!(found, record),
        other => panic!("expected in-progress record, got {other:?}"),
    }
}

async fn duplicate_create_is_invariant_violation(store: &impl RequestStore) {
    let t = token("DUPLICATE");
    store.create_provisional(&t, &path()).await.unwrap();

    let err = store.create_provisional(&t, &path()).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateToken(_)));
    assert!(err.is_invariant_violation());
}

async fn finalize_moves_to_success(store: &impl RequestStore) {
    let t = token("FINALIZE");
    let created = store.create_provisional(&t, &path()).await.unwrap();
    let finalized = store.finalize(&t, solution()).await.unwrap();

    assert_eq!(finalized.created_at, created.created_at);
    assert!(finalized.updated_at >= created.updated_at);

    match store.lookup(&t).await.unwrap() {
        Some(StoredRequest::Succeeded(found)) => {
            assert_eq!(found.path, solution().path);
            assert_eq!(found.total_distance, Some(600));
            assert_eq!(found.total_time, Some(700));
        }
        other => panic!("expected success record, got {other:?}"),
    }
}

async fn finalize_requires_provisional(store: &impl RequestStore) {
    let err = store
        .finalize(&token("MISSING"), solution())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingProvisional(_)));
    assert!(err.is_invariant_violation());
}

async fn finalize_twice_fails(store: &impl RequestStore) {
    let t = token("TWICE");
    store.create_provisional(&t, &path()).await.unwrap();
    store.finalize(&t, solution()).await.unwrap();

    let err = store.finalize(&t, solution()).await.unwrap_err();
    assert!(matches!(err, StoreError::MissingProvisional(_)));
}

async fn failure_message_is_normalized(store: &impl RequestStore) {
    let t = token("EMPTYMSG");
    let record = store.record_failure(&t, &FailureCause::Empty).await.unwrap();
    assert_eq!(record.message, UNKNOWN_ERROR_MESSAGE);

    let t = token("LISTMSG");
    let cause = FailureCause::List(vec!["first".into(), "second".into()]);
    let record = store.record_failure(&t, &cause).await.unwrap();
    assert_eq!(record.message, "first, second");
}

async fn discard_missing_is_ok(store: &impl RequestStore) {
    store.discard_provisional(&token("NOTHING")).await.unwrap();
}

async fn compensation_leaves_only_failure(store: &impl RequestStore) {
    let t = token("COMPENSATE");
    store.create_provisional(&t, &path()).await.unwrap();
    store
        .record_failure(&t, &"Something went wrong".into())
        .await
        .unwrap();
    store.discard_provisional(&t).await.unwrap();

    match store.lookup(&t).await.unwrap() {
        Some(StoredRequest::Failed(found)) => assert_eq!(found.message, "Something went wrong"),
        other => panic!("expected failure record, got {other:?}"),
    }
    let err = store.finalize(&t, solution()).await.unwrap_err();
    assert!(matches!(err, StoreError::MissingProvisional(_)));
}

async fn lookup_removes_stale_provisional(store: &impl RequestStore) {
    let t = token("RACE");
    store.create_provisional(&t, &path()).await.unwrap();
    store.record_failure(&t, &"lost race".into()).await.unwrap();

    match store.lookup(&t).await.unwrap() {
        Some(StoredRequest::Failed(found)) => assert_eq!(found.message, "lost race"),
        other => panic!("expected failure to take precedence, got {other:?}"),
    }

    // The stale provisional record is gone, so it can no longer be finalized.
    let err = store.finalize(&t, solution()).await.unwrap_err();
    assert!(matches!(err, StoreError::MissingProvisional(_)));
}

async fn unknown_token_is_not_found(store: &impl RequestStore) {
    assert_eq!(store.lookup(&token("UNKNOWN")).await.unwrap(), None);
}

async fn create_after_failure_is_rejected(store: &impl RequestStore) {
    let t = token("FAILEDFIRST");
    store.record_failure(&t, &"early".into()).await.unwrap();

    let err = store.create_provisional(&t, &path()).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateToken(_)));
}
