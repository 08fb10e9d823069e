//! Port for rating persistence and the professional aggregate.
//!
//! Mutations and the aggregate refresh are separate calls: the rating
//! service commits a mutation, then asks the repository to recompute the
//! owning professional's aggregate from scratch.

use async_trait::async_trait;

use crate::domain::{AggregateRating, NewRating, ProfessionalId, Rating, RatingChange, RatingId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by rating repository adapters.
    pub enum RatingRepositoryError {
        /// Store could not be reached or dropped the connection.
        Connection { message: String } =>
            "rating repository connection failed: {message}",
        /// Statement failed during execution.
        Query { message: String } =>
            "rating repository query failed: {message}",
        /// The referenced session does not exist.
        SessionNotFound => "session not found",
        /// The referenced session has not been completed.
        SessionNotCompleted => "session has not been completed",
    }
}

/// Rating storage and aggregate maintenance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Insert an active rating for a completed session.
    async fn insert_rating(&self, rating: &NewRating) -> Result<Rating, RatingRepositoryError>;

    /// Apply one closed edit. Returns `None` when the rating does not exist.
    async fn apply_change(
        &self,
        id: &RatingId,
        change: &RatingChange,
    ) -> Result<Option<Rating>, RatingRepositoryError>;

    /// Hard-delete a rating, returning the removed row.
    async fn delete_rating(&self, id: &RatingId) -> Result<Option<Rating>, RatingRepositoryError>;

    /// Recompute the professional's aggregate from the active ratings on
    /// their sessions and write it in one statement.
    ///
    /// Returns `None` when no such professional profile exists.
    async fn recompute_aggregate(
        &self,
        professional_id: &ProfessionalId,
    ) -> Result<Option<AggregateRating>, RatingRepositoryError>;

    /// Every professional profile id, for the reconciliation pass.
    async fn professional_ids(&self) -> Result<Vec<ProfessionalId>, RatingRepositoryError>;
}
