//! Account provisioning: account plus role profile in one atomic unit.
//!
//! The secret is hashed before the store transaction opens; the repository
//! then writes the account row followed by the profile row and commits both
//! or neither. Provisioning never sends a verification code.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ports::{
    AccountProvisioning, AccountRepository, AccountRepositoryError, CredentialStore,
    CredentialStoreError, NewAccount, ProvisionAccountRequest,
};
use crate::domain::{AccountId, Error, ProvisionedAccount};

/// Provisioning service implementing [`AccountProvisioning`].
#[derive(Clone)]
pub struct AccountProvisioningService<R, C> {
    accounts: Arc<R>,
    credentials: Arc<C>,
}

impl<R, C> AccountProvisioningService<R, C> {
    /// Create a service over the given account store and credential hasher.
    pub fn new(accounts: Arc<R>, credentials: Arc<C>) -> Self {
        Self {
            accounts,
            credentials,
        }
    }
}

pub(crate) fn map_account_repository_error(error: AccountRepositoryError) -> Error {
    match error {
        AccountRepositoryError::Connection { message } => {
            Error::store_unavailable(format!("account store unavailable: {message}"))
        }
        AccountRepositoryError::Query { message } => {
            Error::internal(format!("account store error: {message}"))
        }
        AccountRepositoryError::DuplicateEmail => Error::duplicate_email(),
    }
}

fn map_credential_error(error: CredentialStoreError) -> Error {
    Error::internal(format!("credential store error: {error}"))
}

#[async_trait]
impl<R, C> AccountProvisioning for AccountProvisioningService<R, C>
where
    R: AccountRepository,
    C: CredentialStore,
{
    async fn provision(
        &self,
        request: ProvisionAccountRequest,
    ) -> Result<ProvisionedAccount, Error> {
        let ProvisionAccountRequest {
            email,
            secret,
            display_name,
            role,
            external_identity,
        } = request;

        let active = external_identity.is_some();
        let credential_digest = match (&external_identity, secret) {
            (Some(identity), _) => {
                debug!(provider = %identity.provider, "provisioning via external identity");
                None
            }
            (None, Some(secret)) => Some(
                self.credentials
                    .hash(&secret)
                    .map_err(map_credential_error)?,
            ),
            (None, None) => {
                return Err(Error::invalid_request(
                    "a secret is required without an external identity",
                ));
            }
        };

        let new_account = NewAccount {
            id: AccountId::random(),
            email,
            credential_digest,
            display_name,
            role,
            active,
        };
        let provisioned = self
            .accounts
            .create_with_profile(&new_account)
            .await
            .map_err(map_account_repository_error)?;

        info!(
            account_id = %provisioned.account.id(),
            role = %role,
            active,
            "account provisioned"
        );
        Ok(provisioned)
    }
}

#[cfg(test)]
#[path = "account_provisioning_service_tests.rs"]
mod tests;
