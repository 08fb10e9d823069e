//! PostgreSQL adapter for [`RatingRepository`].
//!
//! The aggregate is rewritten by a single `UPDATE` whose value is computed
//! from the live rating rows, so a recompute never reads a stale snapshot of
//! its own inputs.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Double, Nullable, Uuid as SqlUuid};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{RatingRepository, RatingRepositoryError};
use crate::domain::{
    AggregateRating, NewRating, ProfessionalId, Rating, RatingChange, RatingId, RatingState,
};

use super::error_mapping::{StoreFailure, classify_diesel_error, classify_pool_error};
use super::models::{
    NewRatingRow, RatingCommentUpdate, RatingRow, RatingScoreUpdate, RatingStateUpdate,
};
use super::pool::{DbPool, PoolError};
use super::schema::{professional_profiles, ratings, sessions};

const COMPLETED_SESSION: &str = "completed";

const RECOMPUTE_AGGREGATE_SQL: &str = "\
UPDATE professional_profiles AS p
SET average_rating = (
    SELECT SUM(r.score)::float8 / NULLIF(COUNT(*), 0)
    FROM ratings r
    JOIN sessions s ON s.id = r.session_id
    WHERE s.professional_id = p.id AND r.state = 'active'
)
WHERE p.id = $1
RETURNING average_rating";

#[derive(Debug, QueryableByName)]
struct AggregateRow {
    #[diesel(sql_type = Nullable<Double>)]
    average_rating: Option<f64>,
}

enum InsertOutcome {
    Inserted(RatingRow, Uuid),
    SessionMissing,
    SessionOpen,
}

/// Diesel-backed rating repository.
#[derive(Clone)]
pub struct DieselRatingRepository {
    pool: DbPool,
}

impl DieselRatingRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: StoreFailure) -> RatingRepositoryError {
    match failure {
        StoreFailure::Connection(message) => RatingRepositoryError::connection(message),
        StoreFailure::ForeignKeyViolation => RatingRepositoryError::session_not_found(),
        StoreFailure::UniqueViolation { .. } => {
            RatingRepositoryError::query("rating already exists")
        }
        StoreFailure::Query(message) => RatingRepositoryError::query(message),
    }
}

fn pool_error(error: PoolError) -> RatingRepositoryError {
    map_failure(classify_pool_error(error))
}

fn diesel_error(
    operation: &'static str,
) -> impl Fn(diesel::result::Error) -> RatingRepositoryError {
    move |error| map_failure(classify_diesel_error(error, operation))
}

fn into_rating(row: RatingRow, professional_id: Uuid) -> Result<Rating, RatingRepositoryError> {
    row.into_rating(professional_id)
        .map_err(|reason| RatingRepositoryError::query(format!("corrupt rating row: {reason}")))
}

async fn session_professional(
    conn: &mut AsyncPgConnection,
    session_id: Uuid,
) -> QueryResult<Uuid> {
    sessions::table
        .find(session_id)
        .select(sessions::professional_id)
        .first(conn)
        .await
}

async fn update_rating(
    conn: &mut AsyncPgConnection,
    id: Uuid,
    change: &RatingChange,
) -> QueryResult<Option<RatingRow>> {
    let target = ratings::table.find(id);
    let updated = match change {
        RatingChange::Rescore(score) => {
            diesel::update(target)
                .set(RatingScoreUpdate {
                    score: i16::from(score.value()),
                })
                .returning(RatingRow::as_returning())
                .get_result(conn)
                .await
        }
        RatingChange::EditComment(comment) => {
            diesel::update(target)
                .set(RatingCommentUpdate {
                    comment: comment.as_ref().map(AsRef::as_ref),
                })
                .returning(RatingRow::as_returning())
                .get_result(conn)
                .await
        }
        RatingChange::Withdraw | RatingChange::Reinstate => {
            let state = if matches!(change, RatingChange::Withdraw) {
                RatingState::Withdrawn
            } else {
                RatingState::Active
            };
            diesel::update(target)
                .set(RatingStateUpdate {
                    state: state.as_str(),
                })
                .returning(RatingRow::as_returning())
                .get_result(conn)
                .await
        }
    };
    updated.optional()
}

#[async_trait]
impl RatingRepository for DieselRatingRepository {
    async fn insert_rating(&self, rating: &NewRating) -> Result<Rating, RatingRepositoryError> {
        let row = NewRatingRow {
            id: *rating.id.as_uuid(),
            session_id: *rating.session_id.as_uuid(),
            score: i16::from(rating.score.value()),
            comment: rating.comment.as_ref().map(AsRef::as_ref),
            state: RatingState::Active.as_str(),
        };
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let outcome = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let session: Option<(Uuid, String)> = sessions::table
                        .find(row.session_id)
                        .select((sessions::professional_id, sessions::status))
                        .for_share()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some((professional_id, status)) = session else {
                        return Ok(InsertOutcome::SessionMissing);
                    };
                    if status != COMPLETED_SESSION {
                        return Ok(InsertOutcome::SessionOpen);
                    }
                    let stored = diesel::insert_into(ratings::table)
                        .values(&row)
                        .returning(RatingRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(InsertOutcome::Inserted(stored, professional_id))
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error("insert rating"))?;

        match outcome {
            InsertOutcome::Inserted(stored, professional_id) => {
                into_rating(stored, professional_id)
            }
            InsertOutcome::SessionMissing => Err(RatingRepositoryError::session_not_found()),
            InsertOutcome::SessionOpen => Err(RatingRepositoryError::session_not_completed()),
        }
    }

    async fn apply_change(
        &self,
        id: &RatingId,
        change: &RatingChange,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let updated = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let Some(row) = update_rating(conn, id, change).await? else {
                        return Ok(None);
                    };
                    let professional_id = session_professional(conn, row.session_id).await?;
                    Ok(Some((row, professional_id)))
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error("update rating"))?;

        updated
            .map(|(row, professional_id)| into_rating(row, professional_id))
            .transpose()
    }

    async fn delete_rating(&self, id: &RatingId) -> Result<Option<Rating>, RatingRepositoryError> {
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let removed = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let removed: Option<RatingRow> = diesel::delete(ratings::table.find(id))
                        .returning(RatingRow::as_returning())
                        .get_result(conn)
                        .await
                        .optional()?;
                    let Some(row) = removed else {
                        return Ok(None);
                    };
                    let professional_id = session_professional(conn, row.session_id).await?;
                    Ok(Some((row, professional_id)))
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error("delete rating"))?;

        removed
            .map(|(row, professional_id)| into_rating(row, professional_id))
            .transpose()
    }

    async fn recompute_aggregate(
        &self,
        professional_id: &ProfessionalId,
    ) -> Result<Option<AggregateRating>, RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<AggregateRow> = sql_query(RECOMPUTE_AGGREGATE_SQL)
            .bind::<SqlUuid, _>(professional_id.as_uuid())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("recompute aggregate"))?;
        Ok(row.map(|row| AggregateRating::from(row.average_rating)))
    }

    async fn professional_ids(&self) -> Result<Vec<ProfessionalId>, RatingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let ids: Vec<Uuid> = professional_profiles::table
            .select(professional_profiles::id)
            .order(professional_profiles::id)
            .load(&mut conn)
            .await
            .map_err(diesel_error("list professionals"))?;
        Ok(ids.into_iter().map(ProfessionalId::from_uuid).collect())
    }
}
