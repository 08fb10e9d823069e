//! Aggregate consistency across rating mutations.

mod support;

use marketplace::domain::ports::RatingMaintenance;
use marketplace::domain::{
    AggregateRating, ErrorCode, NewRating, ProfessionalId, Rating, RatingChange, RatingComment,
    RatingId, RatingScore, SessionId,
};
use rstest::rstest;
use support::Harness;

fn score(value: i64) -> RatingScore {
    RatingScore::new(value).expect("valid score")
}

async fn rate(harness: &Harness, session_id: SessionId, value: i64) -> Rating {
    harness
        .ratings
        .record_rating(NewRating {
            id: RatingId::random(),
            session_id,
            score: score(value),
            comment: None,
        })
        .await
        .expect("rating recorded")
}

async fn rate_completed(harness: &Harness, professional: &ProfessionalId, value: i64) -> Rating {
    let session = harness.store.seed_session(professional, true);
    rate(harness, session, value).await
}

#[rstest]
#[tokio::test]
async fn ratings_five_four_three_average_to_four_then_withdrawals_move_it() {
    let harness = Harness::new();
    let pro = harness.professional("pat@example.com").await;
    assert_eq!(harness.store.stored_aggregate(&pro), Some(AggregateRating::Unrated));

    let mut recorded = Vec::new();
    for value in [5, 4, 3] {
        recorded.push(rate_completed(&harness, &pro, value).await);
    }
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(4.0))
    );

    let recomputed = harness.ratings.recompute(&pro).await.expect("recomputed");
    assert_eq!(recomputed, AggregateRating::Average(4.0));
    let again = harness.ratings.recompute(&pro).await.expect("recomputed");
    assert_eq!(again, recomputed);

    let three = recorded.pop().expect("score three rating");
    harness
        .ratings
        .change_rating(&three.id, RatingChange::Withdraw)
        .await
        .expect("withdrawn");
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(4.5))
    );

    for rating in &recorded {
        harness
            .ratings
            .change_rating(&rating.id, RatingChange::Withdraw)
            .await
            .expect("withdrawn");
    }
    assert_eq!(harness.store.stored_aggregate(&pro), Some(AggregateRating::Unrated));
}

#[rstest]
#[tokio::test]
async fn every_mutation_keeps_the_aggregate_equal_to_the_active_mean() {
    let harness = Harness::new();
    let pro = harness.professional("quinn@example.com").await;
    let five = rate_completed(&harness, &pro, 5).await;
    let two = rate_completed(&harness, &pro, 2).await;
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(3.5))
    );

    harness
        .ratings
        .change_rating(&two.id, RatingChange::Rescore(score(3)))
        .await
        .expect("rescored");
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(4.0))
    );

    harness
        .ratings
        .change_rating(&five.id, RatingChange::Withdraw)
        .await
        .expect("withdrawn");
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(3.0))
    );

    harness
        .ratings
        .change_rating(&five.id, RatingChange::Reinstate)
        .await
        .expect("reinstated");
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(4.0))
    );

    harness
        .ratings
        .remove_rating(&two.id)
        .await
        .expect("removed");
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(5.0))
    );
}

#[rstest]
#[tokio::test]
async fn withdrawing_the_last_active_rating_leaves_the_professional_unrated() {
    let harness = Harness::new();
    let pro = harness.professional("rae@example.com").await;
    let only = rate_completed(&harness, &pro, 4).await;

    harness
        .ratings
        .change_rating(&only.id, RatingChange::Withdraw)
        .await
        .expect("withdrawn");

    assert_eq!(harness.store.stored_aggregate(&pro), Some(AggregateRating::Unrated));
    assert_eq!(
        harness.ratings.recompute(&pro).await.expect("recomputed"),
        AggregateRating::Unrated
    );
}

#[rstest]
#[tokio::test]
async fn ratings_of_other_professionals_do_not_leak() {
    let harness = Harness::new();
    let first = harness.professional("sam@example.com").await;
    let second = harness.professional("tess@example.com").await;
    rate_completed(&harness, &first, 1).await;
    rate_completed(&harness, &second, 5).await;

    assert_eq!(
        harness.store.stored_aggregate(&first),
        Some(AggregateRating::Average(1.0))
    );
    assert_eq!(
        harness.store.stored_aggregate(&second),
        Some(AggregateRating::Average(5.0))
    );
}

#[rstest]
#[tokio::test]
async fn comment_edits_keep_the_score_and_aggregate() {
    let harness = Harness::new();
    let pro = harness.professional("uma@example.com").await;
    let rating = rate_completed(&harness, &pro, 4).await;

    let edited = harness
        .ratings
        .change_rating(
            &rating.id,
            RatingChange::EditComment(RatingComment::parse("on time").expect("valid")),
        )
        .await
        .expect("edited");
    assert_eq!(edited.comment.as_ref().map(AsRef::as_ref), Some("on time"));
    assert_eq!(edited.score, score(4));
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(4.0))
    );
}

#[rstest]
#[tokio::test]
async fn sessions_must_exist_and_be_completed() {
    let harness = Harness::new();
    let pro = harness.professional("vic@example.com").await;

    let missing = harness
        .ratings
        .record_rating(NewRating {
            id: RatingId::random(),
            session_id: SessionId::random(),
            score: score(3),
            comment: None,
        })
        .await
        .expect_err("unknown session");
    assert_eq!(missing.code(), ErrorCode::NotFound);

    let open = harness.store.seed_session(&pro, false);
    let err = harness
        .ratings
        .record_rating(NewRating {
            id: RatingId::random(),
            session_id: open,
            score: score(3),
            comment: None,
        })
        .await
        .expect_err("session open");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);

    harness.store.complete_session(&open);
    rate(&harness, open, 3).await;
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(3.0))
    );
}

#[rstest]
#[tokio::test]
async fn failed_recompute_does_not_undo_the_mutation_and_reconcile_repairs_it() {
    let harness = Harness::new();
    let pro = harness.professional("wren@example.com").await;
    rate_completed(&harness, &pro, 2).await;

    harness.store.fail_recompute(true);
    let stored = rate_completed(&harness, &pro, 4).await;
    assert_eq!(stored.score, score(4));
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(2.0))
    );

    let report = harness.ratings.reconcile_all().await.expect("report");
    assert_eq!(report.failed, vec![pro]);
    assert!(!report.is_complete());

    harness.store.fail_recompute(false);
    let report = harness.ratings.reconcile_all().await.expect("report");
    assert_eq!(report.recomputed, vec![pro]);
    assert!(report.is_complete());
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(3.0))
    );
}

#[rstest]
#[tokio::test]
async fn reconcile_repairs_drifted_aggregates() {
    let harness = Harness::new();
    let pro = harness.professional("xena@example.com").await;
    rate_completed(&harness, &pro, 5).await;
    harness.store.corrupt_aggregate(&pro, Some(1.0));

    let report = harness.ratings.reconcile_all().await.expect("report");
    assert!(report.is_complete());
    assert_eq!(
        harness.store.stored_aggregate(&pro),
        Some(AggregateRating::Average(5.0))
    );
}

#[rstest]
#[tokio::test]
async fn unknown_targets_are_not_found() {
    let harness = Harness::new();
    let err = harness
        .ratings
        .recompute(&ProfessionalId::random())
        .await
        .expect_err("unknown professional");
    assert_eq!(err.code(), ErrorCode::NotFound);

    let err = harness
        .ratings
        .remove_rating(&RatingId::random())
        .await
        .expect_err("unknown rating");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
