//! Port for account persistence and the verification columns.
//!
//! Every method is one atomic unit in the store. In particular
//! [`AccountRepository::create_with_profile`] writes the account and its role
//! profile in a single transaction, and the two verification methods stamp
//! and compare expiry with the store's own clock.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Account, AccountId, CredentialDigest, DisplayName, EmailAddress, ProvisionedAccount, Role,
    VerificationCode,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by account repository adapters.
    pub enum AccountRepositoryError {
        /// Store could not be reached or dropped the connection.
        Connection { message: String } =>
            "account repository connection failed: {message}",
        /// Statement failed during execution.
        Query { message: String } =>
            "account repository query failed: {message}",
        /// The email uniqueness constraint rejected the insert.
        DuplicateEmail => "account email already exists",
    }
}

/// Validated account row ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// Identifier to assign.
    pub id: AccountId,
    /// Normalised email.
    pub email: EmailAddress,
    /// Digest of the caller's secret; `None` for external identities.
    pub credential_digest: Option<CredentialDigest>,
    /// Display name, also copied onto the profile row.
    pub display_name: DisplayName,
    /// Role selecting the profile table.
    pub role: Role,
    /// Whether the account starts active.
    pub active: bool,
}

/// Result of writing a fresh code onto an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeIssueOutcome {
    /// Code and expiry were written together.
    Issued {
        /// Account email, the delivery destination.
        email: EmailAddress,
        /// Expiry stamped by the store clock.
        expires_at: DateTime<Utc>,
    },
    /// The account is active; nothing was written.
    AlreadyActive,
    /// No account has this id.
    AccountNotFound,
}

/// Result of submitting a code for an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeConsumeOutcome {
    /// Code matched and was live; account activated with code and expiry cleared.
    Activated(Account),
    /// The account was already active; nothing was written.
    AlreadyActive,
    /// Unknown email, wrong code, no code, or expired code.
    Rejected,
}

/// Account storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert the account and, for non-administrators, its role profile in
    /// one transaction.
    ///
    /// Returns [`AccountRepositoryError::DuplicateEmail`] when the email is
    /// taken; in that case, as on any other error, neither row exists.
    async fn create_with_profile(
        &self,
        account: &NewAccount,
    ) -> Result<ProvisionedAccount, AccountRepositoryError>;

    /// Fetch an account by id.
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountRepositoryError>;

    /// Fetch an account by normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError>;

    /// Overwrite the pending account's code, setting expiry to store-now
    /// plus `ttl` in the same statement.
    async fn store_verification_code(
        &self,
        id: &AccountId,
        code: &VerificationCode,
        ttl: Duration,
    ) -> Result<CodeIssueOutcome, AccountRepositoryError>;

    /// Check `code` against the locked row and activate on a live match.
    ///
    /// The comparison and the activation happen in one transaction holding
    /// the row lock, so a concurrent issue is either fully before or fully
    /// after.
    async fn consume_verification_code(
        &self,
        email: &EmailAddress,
        code: &VerificationCode,
    ) -> Result<CodeConsumeOutcome, AccountRepositoryError>;
}
