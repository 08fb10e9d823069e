//! Tests for the rating consistency service.

use std::sync::Arc;

use super::*;
use crate::domain::ports::MockRatingRepository;
use crate::domain::{ErrorCode, RatingScore, RatingState, SessionId};
use chrono::Utc;
use mockall::predicate::eq;
use rstest::rstest;

fn rating_for(professional_id: ProfessionalId, score: i64) -> Rating {
    Rating {
        id: RatingId::random(),
        session_id: SessionId::random(),
        professional_id,
        score: RatingScore::new(score).expect("valid score"),
        comment: None,
        state: RatingState::Active,
        created_at: Utc::now(),
    }
}

fn new_rating(score: i64) -> NewRating {
    NewRating {
        id: RatingId::random(),
        session_id: SessionId::random(),
        score: RatingScore::new(score).expect("valid score"),
        comment: None,
    }
}

fn service(repo: MockRatingRepository) -> RatingConsistencyService<MockRatingRepository> {
    RatingConsistencyService::new(Arc::new(repo))
}

#[rstest]
#[tokio::test]
async fn record_rating_recomputes_owning_professional() {
    let professional_id = ProfessionalId::random();
    let stored = rating_for(professional_id, 5);
    let mut repo = MockRatingRepository::new();
    repo.expect_insert_rating()
        .times(1)
        .return_once(move |_| Ok(stored));
    repo.expect_recompute_aggregate()
        .with(eq(professional_id))
        .times(1)
        .return_once(|_| Ok(Some(AggregateRating::Average(5.0))));

    let rating = service(repo)
        .record_rating(new_rating(5))
        .await
        .expect("recorded");
    assert_eq!(rating.professional_id, professional_id);
}

#[rstest]
#[case(RatingRepositoryError::session_not_found(), ErrorCode::NotFound)]
#[case(RatingRepositoryError::session_not_completed(), ErrorCode::InvalidRequest)]
#[case(RatingRepositoryError::connection("reset"), ErrorCode::StoreUnavailable)]
#[tokio::test]
async fn record_rating_failures_skip_recompute(
    #[case] failure: RatingRepositoryError,
    #[case] expected: ErrorCode,
) {
    let mut repo = MockRatingRepository::new();
    repo.expect_insert_rating()
        .times(1)
        .return_once(move |_| Err(failure));
    repo.expect_recompute_aggregate().never();

    let err = service(repo)
        .record_rating(new_rating(4))
        .await
        .expect_err("insert failed");
    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn failed_recompute_does_not_fail_the_mutation() {
    let professional_id = ProfessionalId::random();
    let removed = rating_for(professional_id, 3);
    let rating_id = removed.id;
    let mut repo = MockRatingRepository::new();
    repo.expect_delete_rating()
        .times(1)
        .return_once(move |_| Ok(Some(removed)));
    repo.expect_recompute_aggregate()
        .times(1)
        .return_once(|_| Err(RatingRepositoryError::connection("timeout")));

    let removed = service(repo)
        .remove_rating(&rating_id)
        .await
        .expect("delete committed");
    assert_eq!(removed.id, rating_id);
}

#[rstest]
#[case(RatingChange::Withdraw, 1)]
#[case(RatingChange::Rescore(RatingScore::new(2).expect("valid")), 1)]
#[case(RatingChange::EditComment(None), 0)]
#[tokio::test]
async fn only_aggregate_affecting_changes_recompute(
    #[case] change: RatingChange,
    #[case] recomputes: usize,
) {
    let professional_id = ProfessionalId::random();
    let mut updated = rating_for(professional_id, 4);
    change.apply_to(&mut updated);
    let rating_id = updated.id;
    let mut repo = MockRatingRepository::new();
    repo.expect_apply_change()
        .times(1)
        .return_once(move |_, _| Ok(Some(updated)));
    repo.expect_recompute_aggregate()
        .times(recomputes)
        .returning(|_| Ok(Some(AggregateRating::Unrated)));

    service(repo)
        .change_rating(&rating_id, change)
        .await
        .expect("changed");
}

#[rstest]
#[tokio::test]
async fn missing_rating_is_not_found() {
    let mut repo = MockRatingRepository::new();
    repo.expect_apply_change()
        .times(1)
        .return_once(|_, _| Ok(None));
    repo.expect_recompute_aggregate().never();

    let err = service(repo)
        .change_rating(&RatingId::random(), RatingChange::Withdraw)
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn recompute_of_unknown_professional_is_not_found() {
    let mut repo = MockRatingRepository::new();
    repo.expect_recompute_aggregate()
        .times(1)
        .return_once(|_| Ok(None));

    let err = service(repo)
        .recompute(&ProfessionalId::random())
        .await
        .expect_err("unknown professional");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn reconciliation_collects_failures_and_continues() {
    let healthy = ProfessionalId::random();
    let broken = ProfessionalId::random();
    let also_healthy = ProfessionalId::random();
    let mut repo = MockRatingRepository::new();
    repo.expect_professional_ids()
        .times(1)
        .return_once(move || Ok(vec![healthy, broken, also_healthy]));
    repo.expect_recompute_aggregate()
        .times(3)
        .returning(move |id| {
            if *id == broken {
                Err(RatingRepositoryError::query("deadlock detected"))
            } else {
                Ok(Some(AggregateRating::Average(4.0)))
            }
        });

    let report = service(repo).reconcile_all().await.expect("report");
    assert_eq!(report.recomputed, vec![healthy, also_healthy]);
    assert_eq!(report.failed, vec![broken]);
    assert!(!report.is_complete());
}
