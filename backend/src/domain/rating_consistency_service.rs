//! Rating consistency engine.
//!
//! Keeps each professional's aggregate equal to the mean of the active
//! ratings on their sessions. Every mutation is committed first and then
//! followed by an explicit recompute-from-scratch; a failed recompute is
//! logged and left for [`RatingMaintenance::reconcile_all`] to repair.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::ports::{RatingMaintenance, RatingRepository, RatingRepositoryError};
use crate::domain::{
    AggregateRating, Error, NewRating, ProfessionalId, Rating, RatingChange, RatingId,
    ReconciliationReport,
};

/// Rating service implementing [`RatingMaintenance`].
#[derive(Clone)]
pub struct RatingConsistencyService<R> {
    ratings: Arc<R>,
}

impl<R> RatingConsistencyService<R> {
    /// Create a service over the given rating store.
    pub fn new(ratings: Arc<R>) -> Self {
        Self { ratings }
    }
}

fn map_rating_error(error: RatingRepositoryError) -> Error {
    match error {
        RatingRepositoryError::Connection { message } => {
            Error::store_unavailable(format!("rating store unavailable: {message}"))
        }
        RatingRepositoryError::Query { message } => {
            Error::internal(format!("rating store error: {message}"))
        }
        RatingRepositoryError::SessionNotFound => Error::not_found("session not found"),
        RatingRepositoryError::SessionNotCompleted => {
            Error::invalid_request("only completed sessions can be rated")
        }
    }
}

fn rating_not_found(id: &RatingId) -> Error {
    Error::not_found(format!("rating {id} not found"))
}

impl<R> RatingConsistencyService<R>
where
    R: RatingRepository,
{
    async fn refresh_after_mutation(&self, rating: &Rating) {
        if let Err(error) = self.recompute(&rating.professional_id).await {
            warn!(
                professional_id = %rating.professional_id,
                rating_id = %rating.id,
                %error,
                "aggregate recompute failed after rating mutation"
            );
        }
    }
}

#[async_trait]
impl<R> RatingMaintenance for RatingConsistencyService<R>
where
    R: RatingRepository,
{
    async fn recompute(&self, professional_id: &ProfessionalId) -> Result<AggregateRating, Error> {
        let aggregate = self
            .ratings
            .recompute_aggregate(professional_id)
            .await
            .map_err(map_rating_error)?
            .ok_or_else(|| Error::not_found(format!("professional {professional_id} not found")))?;
        debug!(
            professional_id = %professional_id,
            aggregate = ?aggregate.as_option(),
            "aggregate recomputed"
        );
        Ok(aggregate)
    }

    async fn record_rating(&self, rating: NewRating) -> Result<Rating, Error> {
        let stored = self
            .ratings
            .insert_rating(&rating)
            .await
            .map_err(map_rating_error)?;
        info!(
            rating_id = %stored.id,
            professional_id = %stored.professional_id,
            score = stored.score.value(),
            "rating recorded"
        );
        self.refresh_after_mutation(&stored).await;
        Ok(stored)
    }

    async fn change_rating(&self, id: &RatingId, change: RatingChange) -> Result<Rating, Error> {
        let updated = self
            .ratings
            .apply_change(id, &change)
            .await
            .map_err(map_rating_error)?
            .ok_or_else(|| rating_not_found(id))?;
        info!(rating_id = %id, state = %updated.state, "rating changed");
        if change.affects_aggregate() {
            self.refresh_after_mutation(&updated).await;
        }
        Ok(updated)
    }

    async fn remove_rating(&self, id: &RatingId) -> Result<Rating, Error> {
        let removed = self
            .ratings
            .delete_rating(id)
            .await
            .map_err(map_rating_error)?
            .ok_or_else(|| rating_not_found(id))?;
        info!(rating_id = %id, professional_id = %removed.professional_id, "rating removed");
        self.refresh_after_mutation(&removed).await;
        Ok(removed)
    }

    async fn reconcile_all(&self) -> Result<ReconciliationReport, Error> {
        let professionals = self
            .ratings
            .professional_ids()
            .await
            .map_err(map_rating_error)?;

        let mut report = ReconciliationReport::default();
        for professional_id in professionals {
            match self.ratings.recompute_aggregate(&professional_id).await {
                Ok(Some(_)) => report.recomputed.push(professional_id),
                Ok(None) => {
                    debug!(professional_id = %professional_id, "professional vanished during reconciliation");
                }
                Err(error) => {
                    warn!(professional_id = %professional_id, %error, "reconciliation recompute failed");
                    report.failed.push(professional_id);
                }
            }
        }
        info!(
            recomputed = report.recomputed.len(),
            failed = report.failed.len(),
            "rating reconciliation finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "rating_consistency_service_tests.rs"]
mod tests;
