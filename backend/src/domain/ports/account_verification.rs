//! Driving port for the email verification lifecycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Account, AccountId, Error, IssuedCode, VerificationCode};

/// Verification use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountVerification: Send + Sync {
    /// Generate and store a fresh code, overwriting any previous one.
    async fn issue(&self, account_id: &AccountId) -> Result<IssuedCode, Error>;

    /// Issue a code and hand it to the notifier. Returns the expiry only,
    /// keeping the code out of the caller's hands.
    async fn issue_and_notify(&self, account_id: &AccountId) -> Result<DateTime<Utc>, Error>;

    /// Consume a code submitted for `email`, activating the account.
    async fn confirm(&self, email: &str, code: &VerificationCode) -> Result<Account, Error>;
}
