//! Verification state machine end to end over the in-memory store.

mod support;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use marketplace::domain::ports::{
    AccountVerification, FixtureVerificationNotifier, VerificationCodeGenerator,
};
use marketplace::domain::{
    AccountId, AccountVerificationService, ErrorCode, ProfileKind, VerificationCode,
    VerificationPolicy, VerificationState,
};
use rstest::rstest;
use support::{FIXTURE_CODE, Harness};

fn code(raw: &str) -> VerificationCode {
    VerificationCode::from(raw)
}

/// Hands out the queued codes in order.
struct SequencedCodes(Mutex<VecDeque<VerificationCode>>);

impl SequencedCodes {
    fn new(codes: &[&str]) -> Self {
        Self(Mutex::new(codes.iter().copied().map(code).collect()))
    }
}

impl VerificationCodeGenerator for SequencedCodes {
    fn generate(&self) -> VerificationCode {
        self.0
            .lock()
            .expect("code queue lock")
            .pop_front()
            .expect("code queued")
    }
}

#[rstest]
#[tokio::test]
async fn alice_expired_then_wrong_then_right_code() {
    let harness = Harness::new();
    let alice = harness.provision("alice@example.com", "client").await;
    let alice_id = *alice.account.id();
    let profile = alice.profile.expect("client profile");
    assert_eq!(profile.kind, ProfileKind::Client);
    assert_eq!(harness.store.profile_owner(&profile), Some(alice_id));

    // First code lapses before use.
    let first = harness.verification.issue(&alice_id).await.expect("issued");
    assert_eq!(first.expires_at, harness.now() + chrono::TimeDelta::minutes(10));
    harness.clock.advance_seconds(11 * 60);
    let expired = harness
        .verification
        .confirm("alice@example.com", &code(FIXTURE_CODE))
        .await
        .expect_err("expired");
    assert_eq!(expired.code(), ErrorCode::InvalidOrExpiredCode);

    // A fresh code supersedes the stale one.
    harness.verification.issue(&alice_id).await.expect("reissued");
    let wrong = harness
        .verification
        .confirm("alice@example.com", &code("000000"))
        .await
        .expect_err("wrong code");
    assert_eq!(wrong.code(), ErrorCode::InvalidOrExpiredCode);
    assert_eq!(wrong.message(), expired.message());

    let activated = harness
        .verification
        .confirm("Alice@Example.com", &code(FIXTURE_CODE))
        .await
        .expect("activated");
    assert!(activated.is_active());
    assert_eq!(
        activated.verification_state(harness.now()),
        VerificationState::Verified
    );

    let again = harness
        .verification
        .confirm("alice@example.com", &code(FIXTURE_CODE))
        .await
        .expect_err("already verified");
    assert_eq!(again.code(), ErrorCode::AlreadyVerified);

    let reissue = harness
        .verification
        .issue(&alice_id)
        .await
        .expect_err("active accounts get no codes");
    assert_eq!(reissue.code(), ErrorCode::AlreadyVerified);
}

#[rstest]
#[tokio::test]
async fn code_is_live_until_just_before_expiry() {
    let harness = Harness::new();
    let account = harness.provision("hal@example.com", "client").await;
    harness
        .verification
        .issue(account.account.id())
        .await
        .expect("issued");

    harness.clock.advance_seconds(10 * 60 - 1);
    harness
        .verification
        .confirm("hal@example.com", &code(FIXTURE_CODE))
        .await
        .expect("still live");
}

#[rstest]
#[tokio::test]
async fn code_expires_at_its_expiry_instant() {
    let harness = Harness::new();
    let account = harness.provision("ivy@example.com", "client").await;
    harness
        .verification
        .issue(account.account.id())
        .await
        .expect("issued");

    harness.clock.advance_seconds(10 * 60);
    let err = harness
        .verification
        .confirm("ivy@example.com", &code(FIXTURE_CODE))
        .await
        .expect_err("expired");
    assert_eq!(err.code(), ErrorCode::InvalidOrExpiredCode);
}

#[rstest]
#[case("nobody@example.com")]
#[case("not an email")]
#[tokio::test]
async fn unknown_or_malformed_emails_look_like_bad_codes(#[case] email: &str) {
    let harness = Harness::new();
    let err = harness
        .verification
        .confirm(email, &code(FIXTURE_CODE))
        .await
        .expect_err("rejected");
    assert_eq!(err.code(), ErrorCode::InvalidOrExpiredCode);
}

#[rstest]
#[tokio::test]
async fn confirming_without_an_issued_code_is_rejected() {
    let harness = Harness::new();
    harness.provision("jo@example.com", "client").await;
    let err = harness
        .verification
        .confirm("jo@example.com", &code(FIXTURE_CODE))
        .await
        .expect_err("no code issued");
    assert_eq!(err.code(), ErrorCode::InvalidOrExpiredCode);
}

#[rstest]
#[tokio::test]
async fn issuing_for_an_unknown_account_is_not_found() {
    let harness = Harness::new();
    let err = harness
        .verification
        .issue(&AccountId::random())
        .await
        .expect_err("unknown account");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn issue_and_notify_reports_the_expiry() {
    let harness = Harness::new();
    let account = harness.provision("kim@example.com", "client").await;
    let expires_at = harness
        .verification
        .issue_and_notify(account.account.id())
        .await
        .expect("issued");
    assert!(expires_at > harness.now());
}

#[rstest]
#[tokio::test]
async fn reissuing_invalidates_an_unexpired_code() {
    let harness = Harness::new();
    let verification = AccountVerificationService::new(
        harness.store.clone(),
        Arc::new(SequencedCodes::new(&["111111", "222222"])),
        Arc::new(FixtureVerificationNotifier),
        VerificationPolicy::default(),
    );
    let account = harness.provision("lee@example.com", "client").await;
    let account_id = *account.account.id();

    verification.issue(&account_id).await.expect("first code");
    harness.clock.advance_seconds(60);
    verification.issue(&account_id).await.expect("second code");

    let stale = verification
        .confirm("lee@example.com", &code("111111"))
        .await
        .expect_err("superseded code");
    assert_eq!(stale.code(), ErrorCode::InvalidOrExpiredCode);

    let activated = verification
        .confirm("lee@example.com", &code("222222"))
        .await
        .expect("current code");
    assert!(activated.is_active());
}
