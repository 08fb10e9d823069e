//! Verification state machine over the account row.
//!
//! The service owns code generation and outcome mapping. Expiry stamping,
//! the live-code comparison, and the activation write all happen inside the
//! repository against the store clock.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::account_provisioning_service::map_account_repository_error;
use crate::domain::ports::{
    AccountRepository, AccountVerification, CodeConsumeOutcome, CodeIssueOutcome,
    VerificationCodeGenerator, VerificationNotifier,
};
use crate::domain::{
    Account, AccountId, EmailAddress, Error, IssuedCode, VerificationCode, VerificationPolicy,
};

/// Verification service implementing [`AccountVerification`].
#[derive(Clone)]
pub struct AccountVerificationService<R, G, N> {
    accounts: Arc<R>,
    generator: Arc<G>,
    notifier: Arc<N>,
    policy: VerificationPolicy,
}

impl<R, G, N> AccountVerificationService<R, G, N> {
    /// Create a service issuing codes that live for `policy.ttl()`.
    pub fn new(
        accounts: Arc<R>,
        generator: Arc<G>,
        notifier: Arc<N>,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            accounts,
            generator,
            notifier,
            policy,
        }
    }
}

#[async_trait]
impl<R, G, N> AccountVerification for AccountVerificationService<R, G, N>
where
    R: AccountRepository,
    G: VerificationCodeGenerator,
    N: VerificationNotifier,
{
    async fn issue(&self, account_id: &AccountId) -> Result<IssuedCode, Error> {
        let code = self.generator.generate();
        let outcome = self
            .accounts
            .store_verification_code(account_id, &code, self.policy.ttl())
            .await
            .map_err(map_account_repository_error)?;

        match outcome {
            CodeIssueOutcome::Issued { email, expires_at } => {
                info!(account_id = %account_id, %expires_at, "verification code issued");
                Ok(IssuedCode {
                    account_id: *account_id,
                    email,
                    code,
                    expires_at,
                })
            }
            CodeIssueOutcome::AlreadyActive => Err(Error::already_verified()),
            CodeIssueOutcome::AccountNotFound => {
                Err(Error::not_found(format!("account {account_id} not found")))
            }
        }
    }

    async fn issue_and_notify(&self, account_id: &AccountId) -> Result<DateTime<Utc>, Error> {
        let issued = self.issue(account_id).await?;
        if let Err(error) = self.notifier.deliver(&issued.email, &issued.code).await {
            warn!(account_id = %account_id, %error, "verification code delivery failed");
        }
        Ok(issued.expires_at)
    }

    async fn confirm(&self, email: &str, code: &VerificationCode) -> Result<Account, Error> {
        let Ok(email) = EmailAddress::new(email) else {
            debug!("verification rejected: malformed email");
            return Err(Error::invalid_or_expired_code());
        };

        let outcome = self
            .accounts
            .consume_verification_code(&email, code)
            .await
            .map_err(map_account_repository_error)?;

        match outcome {
            CodeConsumeOutcome::Activated(account) => {
                info!(account_id = %account.id(), "account verified");
                Ok(account)
            }
            CodeConsumeOutcome::AlreadyActive => Err(Error::already_verified()),
            CodeConsumeOutcome::Rejected => Err(Error::invalid_or_expired_code()),
        }
    }
}

#[cfg(test)]
#[path = "account_verification_service_tests.rs"]
mod tests;
