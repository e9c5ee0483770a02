mod common;

use common::{stack, stale_session};
use futures_util::future::join_all;
use keeper_client::application_port::ApiError;
use keeper_client::domain_port::CredentialStore;
use keeper_client::infra_fake::DEMO_EMAIL;
use keeper_client::session::{RefreshError, RefreshState};
use std::time::Duration;

const FAN_OUT: usize = 16;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_refresh() {
    let s = stack();
    let stale = stale_session(&s);
    s.api.set_refresh_delay(Duration::from_millis(100));

    let results = join_all((0..FAN_OUT).map(|_| s.client.bucket_service.list_buckets())).await;
    assert!(results.iter().all(Result::is_ok));

    assert_eq!(s.api.refresh_calls(), 1);
    assert_eq!(s.client.http.coordinator().refresh_calls(), 1);

    let current = s.credentials.get_access().unwrap();
    assert_ne!(current, stale.access_token);
    let requests = s.api.api_requests();
    assert_eq!(requests.len(), FAN_OUT);
    assert!(
        requests
            .iter()
            .all(|r| r.authorization.as_deref() == Some(current.bearer().as_str()))
    );
    assert_eq!(s.client.http.refresh_state(), RefreshState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_started_from_tasks_share_one_refresh() {
    let s = stack();
    stale_session(&s);
    s.api.set_refresh_delay(Duration::from_millis(50));
    let service = s.client.bucket_service.clone();

    let handles: Vec<_> = (0..FAN_OUT)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.list_buckets().await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert_eq!(s.api.refresh_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_refresh_rejects_every_waiter_and_clears_session() {
    let s = stack();
    stale_session(&s);
    s.api.set_fail_refresh(true);
    s.api.set_refresh_delay(Duration::from_millis(100));

    let results = join_all((0..FAN_OUT).map(|_| s.client.bucket_service.list_buckets())).await;
    for result in &results {
        let err = result.as_ref().unwrap_err();
        assert!(err.is_unauthorized(), "unexpected error {err:?}");
    }
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(ApiError::RefreshDenied(_))))
    );

    assert_eq!(s.api.refresh_calls(), 1);
    assert!(s.credentials.snapshot().is_empty());
    assert_eq!(s.client.http.refresh_state(), RefreshState::Idle);
    assert!(matches!(
        s.client.http.coordinator().last_failure(),
        Some(RefreshError::Denied(_))
    ));
    assert!(s.api.api_requests().iter().all(|r| r.authorization.is_none()));
}

#[tokio::test]
async fn next_session_starts_clean_after_failure() {
    let s = stack();
    stale_session(&s);
    s.api.set_fail_refresh(true);
    assert!(s.client.bucket_service.list_buckets().await.is_err());

    s.api.set_fail_refresh(false);
    stale_session(&s);
    assert!(s.client.bucket_service.list_buckets().await.is_ok());
    assert_eq!(s.api.refresh_calls(), 2);
    assert_eq!(s.client.http.refresh_state(), RefreshState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn logout_during_refresh_leaves_slots_empty() {
    let s = stack();
    stale_session(&s);
    s.api.set_refresh_delay(Duration::from_millis(200));

    let service = s.client.bucket_service.clone();
    let pending = tokio::spawn(async move { service.list_buckets().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    s.client.auth_service.logout().await;

    let result = pending.await.unwrap();
    assert!(result.unwrap_err().is_unauthorized());
    // Give the detached refresh task time to settle.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(s.credentials.snapshot().is_empty());
    assert_eq!(s.api.refresh_calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn login_during_refresh_hands_waiters_the_new_session() {
    let s = stack();
    stale_session(&s);
    s.api.set_refresh_delay(Duration::from_millis(200));

    let service = s.client.bucket_service.clone();
    let pending = tokio::spawn(async move { service.list_buckets().await });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fresh = s
        .api
        .issue_tokens(DEMO_EMAIL, chrono::Duration::minutes(15))
        .unwrap();
    s.client.http.coordinator().login(&fresh);

    assert!(pending.await.unwrap().is_ok());
    let listing = s
        .api
        .api_requests()
        .into_iter()
        .find(|r| r.path == "/buckets")
        .unwrap();
    assert_eq!(listing.authorization, Some(fresh.access_token.bearer()));

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(s.credentials.get_access(), Some(fresh.access_token));
    assert_eq!(s.credentials.get_refresh(), Some(fresh.refresh_token));
    assert_eq!(s.api.refresh_calls(), 1);
}

#[tokio::test]
async fn dropped_waiter_does_not_cancel_refresh() {
    let s = stack();
    stale_session(&s);
    s.api.set_refresh_delay(Duration::from_millis(100));

    let attempt = tokio::time::timeout(
        Duration::from_millis(20),
        s.client.bucket_service.list_buckets(),
    )
    .await;
    assert!(attempt.is_err());

    // The refresh keeps running and the next call joins it.
    assert!(s.client.bucket_service.list_buckets().await.is_ok());
    assert_eq!(s.api.refresh_calls(), 1);
}

#[tokio::test]
async fn refresh_without_rotation_keeps_refresh_token() {
    let s = stack();
    let tokens = stale_session(&s);
    s.api.set_rotate_refresh(false);

    assert!(s.client.bucket_service.list_buckets().await.is_ok());
    assert_eq!(s.credentials.get_refresh(), Some(tokens.refresh_token));
    assert_ne!(s.credentials.get_access(), Some(tokens.access_token));
}
