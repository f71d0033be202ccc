//! Tests for API request/response models

use std::sync::Arc;

use volunteer_match::core::{
    Actor, ApplicationStatus, Decision, Engine, EngineOptions, MatchError, NewOpportunity,
    Organization,
};
use volunteer_match::infra::{InMemoryNotificationStore, MemoryStore};
use volunteer_match::runtime::api::{
    self, DecideRequest, ErrorBody, MarkReadRequest, SubmitApplicationRequest, WithdrawRequest,
};
use volunteer_match::util::ids::{OrganizationId, UserId};

#[test]
fn test_error_body_from_domain_error() {
    let body = ErrorBody::from(MatchError::OpportunityFull);
    assert_eq!(body.kind, "opportunity_full");
    assert_eq!(body.message, "opportunity full");
    assert!(!body.retryable);

    let body = ErrorBody::from(&MatchError::StoreUnavailable("timeout".to_string()));
    assert_eq!(body.kind, "store_unavailable");
    assert!(body.retryable);
}

#[test]
fn test_decide_request_deserializes() {
    let json = format!(
        r#"{{ "application_id": "{}", "decision": "approve" }}"#,
        uuid::Uuid::new_v4()
    );
    let req: DecideRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(req.decision, Decision::Approve);
}

#[test]
fn test_submit_request_message_is_optional() {
    let json = format!(r#"{{ "opportunity_id": "{}" }}"#, uuid::Uuid::new_v4());
    let req: SubmitApplicationRequest = serde_json::from_str(&json).unwrap();
    assert!(req.message.is_none());
}

#[test]
fn test_health() {
    assert!(api::health().ok);
}

#[tokio::test]
async fn test_request_handlers_round_trip_through_engine() {
    let store = Arc::new(MemoryStore::new());
    let staff_id = UserId::new();
    let organization = OrganizationId::new();
    store.put_organization(Organization {
        id: organization,
        name: "Food Bank".to_string(),
        staff: vec![staff_id],
    });
    let engine = Engine::new(
        Arc::clone(&store),
        Arc::new(InMemoryNotificationStore::new()),
        EngineOptions::default(),
    );
    let staff = Actor::staff(staff_id, organization);
    let volunteer = Actor::volunteer(UserId::new());

    let opp = engine
        .create_opportunity(
            &staff,
            NewOpportunity {
                title: "Sorting shift".to_string(),
                max_participants: 1,
                ..NewOpportunity::default()
            },
        )
        .await
        .unwrap();

    let submitted = api::submit_application(
        &engine,
        &volunteer,
        SubmitApplicationRequest {
            opportunity_id: opp.id,
            message: Some("  ".to_string()),
        },
    )
    .await
    .unwrap();
    assert!(submitted.changed);
    assert!(submitted.application.message.is_none());

    let decided = api::decide(
        &engine,
        &staff,
        DecideRequest {
            application_id: submitted.application.id,
            decision: Decision::Approve,
        },
    )
    .await
    .unwrap();
    assert_eq!(decided.application.status, ApplicationStatus::Approved);

    let repeated = api::decide(
        &engine,
        &staff,
        DecideRequest {
            application_id: submitted.application.id,
            decision: Decision::Approve,
        },
    )
    .await
    .unwrap();
    assert!(!repeated.changed);

    let inbox = engine.recent_notifications(volunteer.user_id).await.unwrap();
    let marked = api::mark_read(
        &engine,
        &volunteer,
        MarkReadRequest {
            notification_id: inbox[0].id,
        },
    )
    .await
    .unwrap();
    assert!(marked.changed);
    assert_eq!(marked.unread_count, 0);

    let err = api::withdraw(
        &engine,
        &staff,
        WithdrawRequest {
            application_id: submitted.application.id,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, "not_authorized");

    let withdrawn = api::withdraw(
        &engine,
        &volunteer,
        WithdrawRequest {
            application_id: submitted.application.id,
        },
    )
    .await
    .unwrap();
    assert_eq!(withdrawn.application.status, ApplicationStatus::Withdrawn);
}
