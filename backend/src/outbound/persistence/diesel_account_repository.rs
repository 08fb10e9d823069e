//! PostgreSQL adapter for [`AccountRepository`].
//!
//! Provisioning inserts the account and its role profile inside one
//! transaction. Verification codes are stamped with `now() + interval` and
//! checked with `verification_expires_at > now()`, so only the database
//! clock ever decides expiry.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Bool, Double, Text, Timestamptz, Uuid as SqlUuid};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, CodeConsumeOutcome, CodeIssueOutcome, NewAccount,
};
use crate::domain::{
    Account, AccountId, EmailAddress, ProfileKind, ProvisionedAccount, RoleProfile,
    VerificationCode,
};

use super::error_mapping::{
    ACCOUNTS_EMAIL_KEY, StoreFailure, classify_diesel_error, classify_pool_error,
};
use super::models::{AccountRow, NewAccountRow, NewClientProfileRow, NewProfessionalProfileRow};
use super::pool::{DbPool, PoolError};
use super::schema::{accounts, client_profiles, professional_profiles};

const ISSUE_CODE_SQL: &str = "\
UPDATE accounts
SET verification_code = $2,
    verification_expires_at = now() + make_interval(secs => $3)
WHERE id = $1 AND NOT is_active
RETURNING email, verification_expires_at";

#[derive(Debug, QueryableByName)]
struct IssuedCodeRow {
    #[diesel(sql_type = Text)]
    email: String,
    #[diesel(sql_type = Timestamptz)]
    verification_expires_at: DateTime<Utc>,
}

enum ConsumeRow {
    Activated(AccountRow),
    AlreadyActive,
    Rejected,
}

/// Diesel-backed account repository.
#[derive(Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a repository over `pool`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use marketplace::outbound::persistence::{DbPool, DieselAccountRepository, PoolConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/marketplace")).await?;
    /// let accounts = DieselAccountRepository::new(pool);
    /// # let _ = accounts;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_failure(failure: StoreFailure) -> AccountRepositoryError {
    match failure {
        StoreFailure::Connection(message) => AccountRepositoryError::connection(message),
        StoreFailure::UniqueViolation { constraint }
            if constraint.as_deref().is_none_or(|name| name == ACCOUNTS_EMAIL_KEY) =>
        {
            AccountRepositoryError::duplicate_email()
        }
        StoreFailure::UniqueViolation { .. } => {
            AccountRepositoryError::query("unique constraint violated")
        }
        StoreFailure::ForeignKeyViolation => {
            AccountRepositoryError::query("foreign key constraint violated")
        }
        StoreFailure::Query(message) => AccountRepositoryError::query(message),
    }
}

fn pool_error(error: PoolError) -> AccountRepositoryError {
    map_failure(classify_pool_error(error))
}

fn diesel_error(
    operation: &'static str,
) -> impl Fn(diesel::result::Error) -> AccountRepositoryError {
    move |error| map_failure(classify_diesel_error(error, operation))
}

fn into_account(row: AccountRow) -> Result<Account, AccountRepositoryError> {
    Account::try_from(row)
        .map_err(|reason| AccountRepositoryError::query(format!("corrupt account row: {reason}")))
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn create_with_profile(
        &self,
        account: &NewAccount,
    ) -> Result<ProvisionedAccount, AccountRepositoryError> {
        let account_row = NewAccountRow {
            id: *account.id.as_uuid(),
            email: account.email.as_ref(),
            credential_digest: account.credential_digest.as_ref().map(AsRef::as_ref),
            display_name: account.display_name.as_ref(),
            role: account.role.as_str(),
            is_active: account.active,
        };
        let profile = account.role.profile_kind().map(|kind| RoleProfile {
            kind,
            id: Uuid::new_v4(),
        });
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let stored = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let stored: AccountRow = diesel::insert_into(accounts::table)
                        .values(&account_row)
                        .returning(AccountRow::as_returning())
                        .get_result(conn)
                        .await?;

                    match profile {
                        Some(RoleProfile {
                            kind: ProfileKind::Professional,
                            id,
                        }) => {
                            diesel::insert_into(professional_profiles::table)
                                .values(&NewProfessionalProfileRow {
                                    id,
                                    account_id: account_row.id,
                                    display_name: account_row.display_name,
                                    email: account_row.email,
                                })
                                .execute(conn)
                                .await?;
                        }
                        Some(RoleProfile {
                            kind: ProfileKind::Client,
                            id,
                        }) => {
                            diesel::insert_into(client_profiles::table)
                                .values(&NewClientProfileRow {
                                    id,
                                    account_id: account_row.id,
                                    display_name: account_row.display_name,
                                    email: account_row.email,
                                })
                                .execute(conn)
                                .await?;
                        }
                        None => {}
                    }

                    Ok(stored)
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error("provision account"))?;

        Ok(ProvisionedAccount {
            account: into_account(stored)?,
            profile,
        })
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = accounts::table
            .find(id.as_uuid())
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("find account by id"))?;
        row.map(into_account).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = accounts::table
            .filter(accounts::email.eq(email.as_ref()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("find account by email"))?;
        row.map(into_account).transpose()
    }

    async fn store_verification_code(
        &self,
        id: &AccountId,
        code: &VerificationCode,
        ttl: Duration,
    ) -> Result<CodeIssueOutcome, AccountRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let issued: Option<IssuedCodeRow> = sql_query(ISSUE_CODE_SQL)
            .bind::<SqlUuid, _>(id.as_uuid())
            .bind::<Text, _>(code.as_str())
            .bind::<Double, _>(ttl.as_secs_f64())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("issue verification code"))?;

        if let Some(row) = issued {
            let email = EmailAddress::new(&row.email).map_err(|err| {
                AccountRepositoryError::query(format!("corrupt account email: {err}"))
            })?;
            return Ok(CodeIssueOutcome::Issued {
                email,
                expires_at: row.verification_expires_at,
            });
        }

        let active = accounts::table
            .find(id.as_uuid())
            .select(accounts::is_active)
            .first::<bool>(&mut conn)
            .await
            .optional()
            .map_err(diesel_error("probe account state"))?;
        Ok(match active {
            Some(_) => CodeIssueOutcome::AlreadyActive,
            None => CodeIssueOutcome::AccountNotFound,
        })
    }

    async fn consume_verification_code(
        &self,
        email: &EmailAddress,
        code: &VerificationCode,
    ) -> Result<CodeConsumeOutcome, AccountRepositoryError> {
        let email = email.as_ref();
        let code = code.as_str();
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let outcome = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                async move {
                    let locked: Option<AccountRow> = accounts::table
                        .filter(accounts::email.eq(email))
                        .select(AccountRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(locked) = locked else {
                        return Ok(ConsumeRow::Rejected);
                    };
                    if locked.is_active {
                        return Ok(ConsumeRow::AlreadyActive);
                    }

                    let activated: Option<AccountRow> = diesel::update(
                        accounts::table
                            .filter(accounts::id.eq(locked.id))
                            .filter(accounts::verification_code.eq(code))
                            .filter(sql::<Bool>("verification_expires_at > now()")),
                    )
                    .set((
                        accounts::is_active.eq(true),
                        accounts::verification_code.eq(None::<String>),
                        accounts::verification_expires_at.eq(None::<DateTime<Utc>>),
                    ))
                    .returning(AccountRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;

                    Ok(activated.map_or(ConsumeRow::Rejected, ConsumeRow::Activated))
                }
                .scope_boxed()
            })
            .await
            .map_err(diesel_error("confirm verification code"))?;

        match outcome {
            ConsumeRow::Activated(row) => into_account(row).map(CodeConsumeOutcome::Activated),
            ConsumeRow::AlreadyActive => Ok(CodeConsumeOutcome::AlreadyActive),
            ConsumeRow::Rejected => Ok(CodeConsumeOutcome::Rejected),
        }
    }
}
