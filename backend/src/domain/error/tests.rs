//! Tests for domain error construction and serialisation.

use super::*;
use rstest::rstest;
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[rstest]
#[case(ErrorCode::StoreUnavailable, true)]
#[case(ErrorCode::DuplicateEmail, false)]
#[case(ErrorCode::InvalidRole, false)]
#[case(ErrorCode::InvalidOrExpiredCode, false)]
#[case(ErrorCode::AlreadyVerified, false)]
#[case(ErrorCode::NotFound, false)]
#[case(ErrorCode::InvalidRequest, false)]
#[case(ErrorCode::InternalError, false)]
fn only_store_outages_are_retryable(#[case] code: ErrorCode, #[case] retryable: bool) {
    assert_eq!(code.is_retryable(), retryable);
}

#[rstest]
fn try_new_rejects_blank_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert_eq!(result, Err(ErrorValidationError::EmptyMessage));
}

#[rstest]
fn enumeration_safe_constructors_use_fixed_messages() {
    assert_eq!(Error::duplicate_email().message(), DUPLICATE_EMAIL_MESSAGE);
    assert_eq!(
        Error::invalid_or_expired_code().message(),
        INVALID_OR_EXPIRED_CODE_MESSAGE
    );
}

#[rstest]
fn invalid_role_names_the_rejected_value() {
    let err = Error::invalid_role("superuser");
    assert_eq!(err.code(), ErrorCode::InvalidRole);
    assert!(err.message().contains("superuser"));
}

#[rstest]
fn trace_id_is_absent_outside_a_request_scope() {
    assert!(Error::internal("boom").trace_id().is_none());
}

#[tokio::test]
async fn trace_id_is_captured_inside_a_request_scope() {
    let trace_id: TraceId = TRACE_ID.parse().expect("valid uuid");
    let err = TraceId::scope(trace_id, async { Error::not_found("missing") }).await;
    assert_eq!(err.trace_id(), Some(TRACE_ID));
}

#[rstest]
fn serialises_to_camel_case_payload() {
    let err = Error::invalid_request("bad email")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "field": "email" }));

    let value = serde_json::to_value(&err).expect("serialise error");
    assert_eq!(
        value,
        json!({
            "code": "invalid_request",
            "message": "bad email",
            "traceId": TRACE_ID,
            "details": { "field": "email" },
        })
    );
}

#[rstest]
fn deserialising_rejects_blank_messages() {
    let payload = json!({ "code": "not_found", "message": " " });
    assert!(serde_json::from_value::<Error>(payload).is_err());
}

#[rstest]
fn deserialising_keeps_payload_trace_id() {
    let payload = json!({ "code": "already_verified", "message": "done", "traceId": "abc" });
    let err: Error = serde_json::from_value(payload).expect("valid payload");
    assert_eq!(err.code(), ErrorCode::AlreadyVerified);
    assert_eq!(err.trace_id(), Some("abc"));
}
