//! Tests for error types

use volunteer_match::core::{ApplicationStatus, MatchError};

#[test]
fn test_domain_error_messages() {
    assert_eq!(
        format!("{}", MatchError::DuplicateApplication),
        "duplicate application for this opportunity"
    );
    assert_eq!(format!("{}", MatchError::OpportunityFull), "opportunity full");
    assert_eq!(format!("{}", MatchError::NotAuthorized), "not authorized");
    assert_eq!(
        format!("{}", MatchError::AlreadyDecided),
        "application already decided"
    );
}

#[test]
fn test_invalid_transition_message() {
    let err = MatchError::InvalidTransition {
        from: ApplicationStatus::Withdrawn,
        to: ApplicationStatus::Approved,
    };
    assert_eq!(format!("{}", err), "invalid transition from withdrawn to approved");
}

#[test]
fn test_not_found_helper() {
    let err = MatchError::not_found("application", "abc");
    assert_eq!(format!("{}", err), "application not found: abc");
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn test_store_unavailable_is_the_only_retryable_error() {
    let transient = MatchError::StoreUnavailable("connection reset".to_string());
    assert!(transient.is_retryable());
    assert!(!transient.is_domain_rejection());
    assert_eq!(format!("{}", transient), "store unavailable: connection reset");

    for err in [
        MatchError::DuplicateApplication,
        MatchError::OpportunityUnavailable,
        MatchError::OpportunityFull,
        MatchError::NotAuthorized,
        MatchError::AlreadyDecided,
    ] {
        assert!(!err.is_retryable(), "{err}");
        assert!(err.is_domain_rejection(), "{err}");
    }
}

#[test]
fn test_internal_error_is_neither_retryable_nor_domain() {
    let err = MatchError::Internal("counter underflow".to_string());
    assert!(!err.is_retryable());
    assert!(!err.is_domain_rejection());
    assert_eq!(err.kind(), "internal");
}

#[test]
fn test_match_error_converts_into_anyhow() {
    fn fails() -> volunteer_match::core::AppResult<()> {
        Err(MatchError::OpportunityFull)?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert_eq!(err.downcast_ref::<MatchError>(), Some(&MatchError::OpportunityFull));
}
