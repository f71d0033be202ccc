//! Tests for identifiers, clock, and retry helpers

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use uuid::Uuid;
use volunteer_match::core::MatchError;
use volunteer_match::util::ids::{ApplicationId, OpportunityId};
use volunteer_match::util::retry::{retry_transient, RetryPolicy};
use volunteer_match::util::clock::now_ms;

#[test]
fn test_ids_are_unique_and_display_as_uuid() {
    let a = ApplicationId::new();
    let b = ApplicationId::new();
    assert_ne!(a, b);
    assert_eq!(a.to_string(), a.0.to_string());

    let raw = Uuid::new_v4();
    assert_eq!(OpportunityId::from(raw).0, raw);
}

#[test]
fn test_ids_serialize_transparently() {
    let id = OpportunityId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{}\"", id.0));
    let back: OpportunityId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn test_now_ms_is_after_2020() {
    assert!(now_ms() > 1_577_836_800_000);
}

#[test]
fn test_retry_delay_caps() {
    let policy = RetryPolicy {
        max_retries: 10,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_millis(500),
    };
    assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
    assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
    assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(500));
    assert_eq!(policy.delay_for_attempt(40), Duration::from_millis(500));
}

#[tokio::test]
async fn test_retry_gives_up_after_max_retries() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy {
        max_retries: 2,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    };
    let result: Result<(), MatchError> = retry_transient(&policy, || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async { Err(MatchError::StoreUnavailable("down".to_string())) }
    })
    .await;
    assert!(matches!(result, Err(MatchError::StoreUnavailable(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_recovers_from_transient_failure() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy {
        max_retries: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    };
    let result = retry_transient(&policy, || {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if attempt == 0 {
                Err(MatchError::StoreUnavailable("blip".to_string()))
            } else {
                Ok(attempt)
            }
        }
    })
    .await;
    assert_eq!(result, Ok(1));
}

#[test]
fn test_init_tracing_is_idempotent() {
    volunteer_match::util::telemetry::init_tracing();
    volunteer_match::util::telemetry::init_tracing();
    tracing::info!("tracing initialized twice without panicking");
}
