//! Driving port for rating mutations and aggregate upkeep.

use async_trait::async_trait;

use crate::domain::{
    AggregateRating, Error, NewRating, ProfessionalId, Rating, RatingChange, RatingId,
    ReconciliationReport,
};

/// Rating use-cases. Every mutation is followed by an explicit recompute of
/// the owning professional's aggregate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RatingMaintenance: Send + Sync {
    /// Recompute one professional's aggregate from scratch.
    async fn recompute(&self, professional_id: &ProfessionalId) -> Result<AggregateRating, Error>;

    /// Rate a completed session.
    async fn record_rating(&self, rating: NewRating) -> Result<Rating, Error>;

    /// Apply one closed edit to a rating.
    async fn change_rating(&self, id: &RatingId, change: RatingChange) -> Result<Rating, Error>;

    /// Delete a rating.
    async fn remove_rating(&self, id: &RatingId) -> Result<Rating, Error>;

    /// Recompute every professional, collecting failures instead of stopping.
    async fn reconcile_all(&self) -> Result<ReconciliationReport, Error>;
}
