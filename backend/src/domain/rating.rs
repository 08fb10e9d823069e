//! Ratings and the derived professional aggregate.
//!
//! A professional's aggregate is the arithmetic mean of the scores of every
//! active rating on that professional's sessions, or [`AggregateRating::Unrated`]
//! when none remain. [`AggregateRating::from_scores`] is the reference
//! definition every store adapter must agree with.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::{ProfessionalId, RatingId, SessionId};

/// Lowest accepted score.
pub const SCORE_MIN: u8 = 1;
/// Highest accepted score.
pub const SCORE_MAX: u8 = 5;
/// Maximum comment length in characters.
pub const COMMENT_MAX: usize = 2000;

/// Validation errors for rating values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RatingValidationError {
    /// Score outside `[1, 5]`.
    #[error("score must be between 1 and 5, got {value}")]
    ScoreOutOfRange {
        /// Rejected value.
        value: i64,
    },
    /// Comment longer than [`COMMENT_MAX`].
    #[error("comment must be at most {max} characters")]
    CommentTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Unknown persisted state string.
    #[error("unknown rating state: {value}")]
    UnknownState {
        /// Rejected value.
        value: String,
    },
}

/// Score in the closed range `[1, 5]`.
///
/// # Examples
/// ```
/// use marketplace::domain::RatingScore;
///
/// assert_eq!(RatingScore::new(5).map(RatingScore::value), Ok(5));
/// assert!(RatingScore::new(0).is_err());
/// assert!(RatingScore::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingScore(u8);

impl RatingScore {
    /// Validate a score.
    pub fn new(value: i64) -> Result<Self, RatingValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|score| (SCORE_MIN..=SCORE_MAX).contains(score))
            .map(Self)
            .ok_or(RatingValidationError::ScoreOutOfRange { value })
    }

    /// Numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingScore {
    type Error = RatingValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingScore> for u8 {
    fn from(value: RatingScore) -> Self {
        value.0
    }
}

/// Optional free-text comment; blank input collapses to no comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingComment(String);

impl RatingComment {
    /// Validate a comment, returning `None` for blank input.
    pub fn parse(comment: &str) -> Result<Option<Self>, RatingValidationError> {
        let trimmed = comment.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.chars().count() > COMMENT_MAX {
            return Err(RatingValidationError::CommentTooLong { max: COMMENT_MAX });
        }
        Ok(Some(Self(trimmed.to_owned())))
    }
}

impl AsRef<str> for RatingComment {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Whether a rating counts towards the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RatingState {
    /// Counts towards the aggregate.
    Active,
    /// Retracted; never contributes.
    Withdrawn,
}

impl RatingState {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for RatingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RatingState {
    type Err = RatingValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "withdrawn" => Ok(Self::Withdrawn),
            other => Err(RatingValidationError::UnknownState {
                value: other.to_owned(),
            }),
        }
    }
}

/// A stored rating, resolved to the professional whose session it rates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    /// Rating identifier.
    pub id: RatingId,
    /// Rated session.
    pub session_id: SessionId,
    /// Professional owning the session; the aggregate to refresh.
    pub professional_id: ProfessionalId,
    /// Score.
    pub score: RatingScore,
    /// Optional comment.
    pub comment: Option<RatingComment>,
    /// Active or withdrawn.
    pub state: RatingState,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

/// Request to rate a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRating {
    /// Identifier to assign.
    pub id: RatingId,
    /// Session being rated; must be completed.
    pub session_id: SessionId,
    /// Score.
    pub score: RatingScore,
    /// Optional comment.
    pub comment: Option<RatingComment>,
}

/// Closed set of edits a rating accepts.
///
/// Every updatable field has exactly one variant, so adapters translate each
/// into a fixed statement instead of assembling `SET` clauses from input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingChange {
    /// Replace the score.
    Rescore(RatingScore),
    /// Replace or clear the comment.
    EditComment(Option<RatingComment>),
    /// Stop counting the rating.
    Withdraw,
    /// Count a withdrawn rating again.
    Reinstate,
}

impl RatingChange {
    /// Whether the edit can move the aggregate.
    #[must_use]
    pub const fn affects_aggregate(&self) -> bool {
        !matches!(self, Self::EditComment(_))
    }

    /// Apply the edit to an in-memory rating.
    pub fn apply_to(&self, rating: &mut Rating) {
        match self {
            Self::Rescore(score) => rating.score = *score,
            Self::EditComment(comment) => rating.comment.clone_from(comment),
            Self::Withdraw => rating.state = RatingState::Withdrawn,
            Self::Reinstate => rating.state = RatingState::Active,
        }
    }
}

/// Derived mean score held on a professional profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum AggregateRating {
    /// No active ratings; stored as `NULL`.
    Unrated,
    /// Mean of the active scores.
    Average(f64),
}

impl AggregateRating {
    /// Mean of `scores`, or [`Self::Unrated`] when empty.
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::{AggregateRating, RatingScore};
    ///
    /// let scores = [5, 4, 3].map(|s| RatingScore::new(s).unwrap());
    /// assert_eq!(AggregateRating::from_scores(scores), AggregateRating::Average(4.0));
    /// assert_eq!(AggregateRating::from_scores([]), AggregateRating::Unrated);
    /// ```
    pub fn from_scores(scores: impl IntoIterator<Item = RatingScore>) -> Self {
        let (sum, count) = scores
            .into_iter()
            .fold((0_u32, 0_u32), |(sum, count), score| {
                (sum + u32::from(score.value()), count + 1)
            });
        if count == 0 {
            Self::Unrated
        } else {
            Self::Average(f64::from(sum) / f64::from(count))
        }
    }

    /// Mean as an optional number.
    #[must_use]
    pub const fn as_option(self) -> Option<f64> {
        match self {
            Self::Unrated => None,
            Self::Average(value) => Some(value),
        }
    }
}

impl From<Option<f64>> for AggregateRating {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unrated, Self::Average)
    }
}

impl From<AggregateRating> for Option<f64> {
    fn from(value: AggregateRating) -> Self {
        value.as_option()
    }
}

/// Outcome of a full corrective pass over every professional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationReport {
    /// Professionals whose aggregate was rewritten.
    pub recomputed: Vec<ProfessionalId>,
    /// Professionals whose recompute failed; eligible for the next pass.
    pub failed: Vec<ProfessionalId>,
}

impl ReconciliationReport {
    /// Whether every professional was recomputed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scores(values: &[i64]) -> Vec<RatingScore> {
        values
            .iter()
            .map(|v| RatingScore::new(*v).expect("valid score"))
            .collect()
    }

    fn sample_rating() -> Rating {
        Rating {
            id: RatingId::random(),
            session_id: SessionId::random(),
            professional_id: ProfessionalId::random(),
            score: RatingScore::new(3).expect("valid score"),
            comment: None,
            state: RatingState::Active,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-1)]
    #[case(256)]
    fn score_rejects_values_outside_range(#[case] value: i64) {
        assert_eq!(
            RatingScore::new(value),
            Err(RatingValidationError::ScoreOutOfRange { value })
        );
    }

    #[rstest]
    #[case(&[5, 4, 3], AggregateRating::Average(4.0))]
    #[case(&[5, 4], AggregateRating::Average(4.5))]
    #[case(&[1], AggregateRating::Average(1.0))]
    #[case(&[], AggregateRating::Unrated)]
    fn aggregate_is_mean_or_unrated(#[case] values: &[i64], #[case] expected: AggregateRating) {
        assert_eq!(AggregateRating::from_scores(scores(values)), expected);
    }

    #[rstest]
    fn aggregate_serialises_unrated_as_null() {
        assert_eq!(
            serde_json::to_value(AggregateRating::Unrated).expect("serialise"),
            serde_json::Value::Null
        );
        assert_eq!(
            serde_json::to_value(AggregateRating::Average(4.5)).expect("serialise"),
            serde_json::json!(4.5)
        );
    }

    #[rstest]
    fn blank_comment_collapses_to_none() {
        assert_eq!(RatingComment::parse("   "), Ok(None));
        let comment = RatingComment::parse(" great ").expect("valid").expect("present");
        assert_eq!(comment.as_ref(), "great");
    }

    #[rstest]
    fn overlong_comment_is_rejected() {
        let raw = "x".repeat(COMMENT_MAX + 1);
        assert_eq!(
            RatingComment::parse(&raw),
            Err(RatingValidationError::CommentTooLong { max: COMMENT_MAX })
        );
    }

    #[rstest]
    fn changes_apply_to_their_own_field_only() {
        let mut rating = sample_rating();
        RatingChange::Rescore(RatingScore::new(5).expect("valid")).apply_to(&mut rating);
        assert_eq!(rating.score.value(), 5);
        assert_eq!(rating.state, RatingState::Active);

        RatingChange::Withdraw.apply_to(&mut rating);
        assert_eq!(rating.state, RatingState::Withdrawn);
        assert_eq!(rating.score.value(), 5);

        RatingChange::Reinstate.apply_to(&mut rating);
        assert_eq!(rating.state, RatingState::Active);
    }

    #[rstest]
    fn comment_edits_do_not_affect_the_aggregate() {
        assert!(!RatingChange::EditComment(None).affects_aggregate());
        assert!(RatingChange::Withdraw.affects_aggregate());
    }

    #[rstest]
    #[case("active", RatingState::Active)]
    #[case("withdrawn", RatingState::Withdrawn)]
    fn state_round_trips_through_text(#[case] raw: &str, #[case] state: RatingState) {
        assert_eq!(raw.parse::<RatingState>(), Ok(state));
        assert_eq!(state.as_str(), raw);
    }
}
