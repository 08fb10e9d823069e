//! Tests for rating HTTP handlers.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

use super::*;
use crate::inbound::http::test_utils::{MockPorts, test_app};

fn stored_rating(score: i64, state: RatingState) -> Rating {
    Rating {
        id: RatingId::random(),
        session_id: SessionId::random(),
        professional_id: ProfessionalId::random(),
        score: RatingScore::new(score).expect("valid score"),
        comment: None,
        state,
        created_at: Utc::now(),
    }
}

async fn send(ports: MockPorts, req: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(test_app(ports)).await;
    let res = actix_test::call_service(&app, req.to_request()).await;
    let status = res.status();
    let body = actix_test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON body")
    };
    (status, value)
}

#[rstest]
#[actix_web::test]
async fn record_rating_returns_created_rating() {
    let session_id = SessionId::random();
    let mut ports = MockPorts::default();
    ports
        .ratings
        .expect_record_rating()
        .times(1)
        .withf(move |rating| {
            rating.session_id == session_id
                && rating.score.value() == 4
                && rating.comment.as_ref().map(AsRef::as_ref) == Some("great")
        })
        .return_once(|rating| {
            Ok(Rating {
                id: rating.id,
                session_id: rating.session_id,
                professional_id: ProfessionalId::random(),
                score: rating.score,
                comment: rating.comment,
                state: RatingState::Active,
                created_at: Utc::now(),
            })
        });

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post().uri("/api/v1/ratings").set_json(json!({
            "sessionId": session_id.to_string(),
            "score": 4,
            "comment": "  great  "
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["score"], 4);
    assert_eq!(body["state"], "active");
    assert_eq!(body["comment"], "great");
}

#[rstest]
#[case(json!({"sessionId": "00000000-0000-0000-0000-000000000001", "score": 0}))]
#[case(json!({"sessionId": "00000000-0000-0000-0000-000000000001", "score": 6}))]
#[case(json!({"sessionId": "not-a-uuid", "score": 3}))]
#[case(json!({"sessionId": "00000000-0000-0000-0000-000000000001", "score": 3, "stars": 3}))]
#[actix_web::test]
async fn record_rating_rejects_invalid_payloads(#[case] payload: Value) {
    let mut ports = MockPorts::default();
    ports.ratings.expect_record_rating().never();

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/ratings")
            .set_json(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[rstest]
#[case(json!({"kind": "rescore", "score": 2}), RatingChange::Rescore(RatingScore::new(2).expect("valid")))]
#[case(json!({"kind": "edit_comment", "comment": "thanks"}), RatingChange::EditComment(RatingComment::parse("thanks").expect("valid")))]
#[case(json!({"kind": "edit_comment"}), RatingChange::EditComment(None))]
#[case(json!({"kind": "withdraw"}), RatingChange::Withdraw)]
#[case(json!({"kind": "reinstate"}), RatingChange::Reinstate)]
#[actix_web::test]
async fn patch_maps_each_tagged_change(#[case] payload: Value, #[case] expected: RatingChange) {
    let id = RatingId::random();
    let mut ports = MockPorts::default();
    ports
        .ratings
        .expect_change_rating()
        .times(1)
        .with(eq(id), eq(expected))
        .return_once(|_, _| Ok(stored_rating(3, RatingState::Active)));

    let (status, _) = send(
        ports,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/ratings/{id}"))
            .set_json(payload),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[rstest]
#[case(json!({"kind": "rescore", "score": 9}))]
#[case(json!({"kind": "rescore", "score": 3, "state": "withdrawn"}))]
#[case(json!({"kind": "delete"}))]
#[case(json!({"score": 3}))]
#[actix_web::test]
async fn patch_rejects_unknown_or_invalid_changes(#[case] payload: Value) {
    let mut ports = MockPorts::default();
    ports.ratings.expect_change_rating().never();

    let (status, _) = send(
        ports,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/ratings/{}", RatingId::random()))
            .set_json(payload),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn delete_returns_no_content_and_missing_is_not_found() {
    let id = RatingId::random();
    let mut ports = MockPorts::default();
    ports
        .ratings
        .expect_remove_rating()
        .with(eq(id))
        .return_once(|_| Ok(stored_rating(5, RatingState::Active)));
    let (status, _) = send(
        ports,
        actix_test::TestRequest::delete().uri(&format!("/api/v1/ratings/{id}")),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let mut ports = MockPorts::default();
    ports
        .ratings
        .expect_remove_rating()
        .return_once(|_| Err(Error::not_found("rating not found")));
    let (status, body) = send(
        ports,
        actix_test::TestRequest::delete().uri(&format!("/api/v1/ratings/{id}")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[rstest]
#[case(AggregateRating::Average(4.0), json!(4.0))]
#[case(AggregateRating::Unrated, Value::Null)]
#[actix_web::test]
async fn recompute_reports_the_aggregate(
    #[case] aggregate: AggregateRating,
    #[case] expected: Value,
) {
    let professional_id = ProfessionalId::random();
    let mut ports = MockPorts::default();
    ports
        .ratings
        .expect_recompute()
        .with(eq(professional_id))
        .return_once(move |_| Ok(aggregate));

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/professionals/{professional_id}/rating/recompute")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["averageRating"], expected);
    assert_eq!(body["professionalId"], professional_id.to_string());
}

#[rstest]
#[actix_web::test]
async fn recompute_surfaces_store_outage_as_retryable() {
    let mut ports = MockPorts::default();
    ports
        .ratings
        .expect_recompute()
        .return_once(|_| Err(Error::store_unavailable("statement timeout")));

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post().uri(&format!(
            "/api/v1/professionals/{}/rating/recompute",
            ProfessionalId::random()
        )),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "store_unavailable");
}
