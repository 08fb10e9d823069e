//! Rating HTTP handlers.
//!
//! ```text
//! POST   /api/v1/ratings
//! PATCH  /api/v1/ratings/{id}
//! DELETE /api/v1/ratings/{id}
//! POST   /api/v1/professionals/{id}/rating/recompute
//! ```

use actix_web::{HttpResponse, delete, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    AggregateRating, Error, NewRating, ProfessionalId, Rating, RatingChange, RatingComment,
    RatingId, RatingScore, RatingState, SessionId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Request payload for rating a completed session.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecordRatingPayload {
    pub session_id: String,
    #[schema(minimum = 1, maximum = 5)]
    pub score: i64,
    pub comment: Option<String>,
}

/// Closed set of edits accepted by `PATCH /ratings/{id}`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum RatingChangePayload {
    Rescore {
        score: i64,
    },
    EditComment {
        #[serde(default)]
        comment: Option<String>,
    },
    Withdraw,
    Reinstate,
}

/// Rating representation returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub id: String,
    pub session_id: String,
    pub professional_id: String,
    pub score: u8,
    pub comment: Option<String>,
    pub state: RatingState,
    pub created_at: DateTime<Utc>,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            id: rating.id.to_string(),
            session_id: rating.session_id.to_string(),
            professional_id: rating.professional_id.to_string(),
            score: rating.score.value(),
            comment: rating.comment.map(|comment| comment.as_ref().to_owned()),
            state: rating.state,
            created_at: rating.created_at,
        }
    }
}

/// Aggregate rating of a professional; `null` when unrated.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    pub professional_id: String,
    pub average_rating: Option<f64>,
}

fn field_error(field: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field }))
}

fn parse_score(raw: i64) -> Result<RatingScore, Error> {
    RatingScore::new(raw).map_err(|err| field_error("score", err.to_string()))
}

fn parse_comment(raw: Option<&str>) -> Result<Option<RatingComment>, Error> {
    match raw {
        Some(text) => {
            RatingComment::parse(text).map_err(|err| field_error("comment", err.to_string()))
        }
        None => Ok(None),
    }
}

fn parse_rating_id(raw: &str) -> Result<RatingId, Error> {
    RatingId::new(raw).map_err(|err| field_error("id", err.to_string()))
}

fn parse_professional_id(raw: &str) -> Result<ProfessionalId, Error> {
    ProfessionalId::new(raw).map_err(|err| field_error("id", err.to_string()))
}

impl RatingChangePayload {
    fn into_change(self) -> Result<RatingChange, Error> {
        Ok(match self {
            Self::Rescore { score } => RatingChange::Rescore(parse_score(score)?),
            Self::EditComment { comment } => {
                RatingChange::EditComment(parse_comment(comment.as_deref())?)
            }
            Self::Withdraw => RatingChange::Withdraw,
            Self::Reinstate => RatingChange::Reinstate,
        })
    }
}

fn parse_new_rating(payload: RecordRatingPayload) -> Result<NewRating, Error> {
    let session_id = SessionId::new(&payload.session_id)
        .map_err(|err| field_error("sessionId", err.to_string()))?;
    Ok(NewRating {
        id: RatingId::random(),
        session_id,
        score: parse_score(payload.score)?,
        comment: parse_comment(payload.comment.as_deref())?,
    })
}

/// Rate a completed session; the professional's aggregate is refreshed.
#[utoipa::path(
    post,
    path = "/api/v1/ratings",
    request_body = RecordRatingPayload,
    responses(
        (status = 201, description = "Rating recorded", body = RatingResponse),
        (status = 400, description = "Invalid score, comment, or session state", body = ErrorSchema),
        (status = 404, description = "Unknown session", body = ErrorSchema)
    ),
    tags = ["ratings"],
    operation_id = "recordRating"
)]
#[post("/ratings")]
pub async fn record_rating(
    state: web::Data<HttpState>,
    payload: web::Json<RecordRatingPayload>,
) -> ApiResult<HttpResponse> {
    let rating = parse_new_rating(payload.into_inner())?;
    let stored = state.ratings.record_rating(rating).await?;
    Ok(HttpResponse::Created().json(RatingResponse::from(stored)))
}

/// Apply one typed edit to a rating.
#[utoipa::path(
    patch,
    path = "/api/v1/ratings/{id}",
    params(("id" = String, Path, description = "Rating identifier")),
    request_body = RatingChangePayload,
    responses(
        (status = 200, description = "Rating updated", body = RatingResponse),
        (status = 400, description = "Invalid change", body = ErrorSchema),
        (status = 404, description = "Unknown rating", body = ErrorSchema)
    ),
    tags = ["ratings"],
    operation_id = "changeRating"
)]
#[patch("/ratings/{id}")]
pub async fn change_rating(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<RatingChangePayload>,
) -> ApiResult<web::Json<RatingResponse>> {
    let id = parse_rating_id(&path.into_inner())?;
    let change = payload.into_inner().into_change()?;
    let rating = state.ratings.change_rating(&id, change).await?;
    Ok(web::Json(RatingResponse::from(rating)))
}

/// Delete a rating outright.
#[utoipa::path(
    delete,
    path = "/api/v1/ratings/{id}",
    params(("id" = String, Path, description = "Rating identifier")),
    responses(
        (status = 204, description = "Rating removed"),
        (status = 404, description = "Unknown rating", body = ErrorSchema)
    ),
    tags = ["ratings"],
    operation_id = "removeRating"
)]
#[delete("/ratings/{id}")]
pub async fn remove_rating(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_rating_id(&path.into_inner())?;
    state.ratings.remove_rating(&id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Recompute a professional's aggregate from their active ratings.
#[utoipa::path(
    post,
    path = "/api/v1/professionals/{id}/rating/recompute",
    params(("id" = String, Path, description = "Professional profile identifier")),
    responses(
        (status = 200, description = "Aggregate recomputed", body = AggregateResponse),
        (status = 404, description = "Unknown professional", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["ratings"],
    operation_id = "recomputeRating"
)]
#[post("/professionals/{id}/rating/recompute")]
pub async fn recompute_rating(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<AggregateResponse>> {
    let professional_id = parse_professional_id(&path.into_inner())?;
    let aggregate: AggregateRating = state.ratings.recompute(&professional_id).await?;
    Ok(web::Json(AggregateResponse {
        professional_id: professional_id.to_string(),
        average_rating: aggregate.as_option(),
    }))
}

#[cfg(test)]
#[path = "ratings_tests.rs"]
mod tests;
