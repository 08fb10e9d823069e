//! Diesel row structs. Persistence-internal; converted to domain types at
//! the repository boundary.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, AccountStatus, CredentialDigest, DisplayName, EmailAddress,
    ProfessionalId, Rating, RatingComment, RatingId, RatingScore, RatingState, Role, SessionId,
};

use super::schema::{accounts, client_profiles, professional_profiles, ratings};

/// Read shape of an `accounts` row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub credential_digest: Option<String>,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
    pub verification_code: Option<String>,
    pub verification_expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<AccountRow> for Account {
    type Error = String;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = EmailAddress::new(&row.email).map_err(|err| err.to_string())?;
        let display_name = DisplayName::new(&row.display_name).map_err(|err| err.to_string())?;
        let role = row.role.parse::<Role>().map_err(|err| err.to_string())?;
        let status = AccountStatus::from_columns(
            row.is_active,
            row.verification_code,
            row.verification_expires_at,
        )
        .map_err(|err| err.to_string())?;
        Ok(Self::new(
            AccountId::from_uuid(row.id),
            email,
            row.credential_digest.map(CredentialDigest::new),
            display_name,
            role,
            status,
        ))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = accounts)]
pub(crate) struct NewAccountRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub credential_digest: Option<&'a str>,
    pub display_name: &'a str,
    pub role: &'a str,
    pub is_active: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = professional_profiles)]
pub(crate) struct NewProfessionalProfileRow<'a> {
    pub id: Uuid,
    pub account_id: Uuid,
    pub display_name: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = client_profiles)]
pub(crate) struct NewClientProfileRow<'a> {
    pub id: Uuid,
    pub account_id: Uuid,
    pub display_name: &'a str,
    pub email: &'a str,
}

/// Read shape of a `ratings` row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RatingRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub score: i16,
    pub comment: Option<String>,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

impl RatingRow {
    /// Convert to the domain rating, attaching the session's professional.
    pub(crate) fn into_rating(self, professional_id: Uuid) -> Result<Rating, String> {
        let score = RatingScore::new(i64::from(self.score)).map_err(|err| err.to_string())?;
        let comment = match self.comment.as_deref() {
            Some(text) => RatingComment::parse(text).map_err(|err| err.to_string())?,
            None => None,
        };
        let state = self
            .state
            .parse::<RatingState>()
            .map_err(|err| err.to_string())?;
        Ok(Rating {
            id: RatingId::from_uuid(self.id),
            session_id: SessionId::from_uuid(self.session_id),
            professional_id: ProfessionalId::from_uuid(professional_id),
            score,
            comment,
            state,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ratings)]
pub(crate) struct NewRatingRow<'a> {
    pub id: Uuid,
    pub session_id: Uuid,
    pub score: i16,
    pub comment: Option<&'a str>,
    pub state: &'a str,
}

/// Closed changesets, one per [`crate::domain::RatingChange`] variant.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = ratings)]
pub(crate) struct RatingScoreUpdate {
    pub score: i16,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = ratings)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct RatingCommentUpdate<'a> {
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = ratings)]
pub(crate) struct RatingStateUpdate<'a> {
    pub state: &'a str,
}
