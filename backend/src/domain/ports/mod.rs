//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, credential store, notifier, code generator)
//! return typed errors from `define_port_error!`; driving ports return the
//! domain [`crate::domain::Error`].

mod macros;
pub(crate) use macros::define_port_error;

mod account_provisioning;
mod account_repository;
mod account_verification;
mod code_generator;
mod credential_store;
mod rating_maintenance;
mod rating_repository;
mod verification_notifier;

#[cfg(test)]
pub use account_provisioning::MockAccountProvisioning;
pub use account_provisioning::{AccountProvisioning, ProvisionAccountRequest};
#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{
    AccountRepository, AccountRepositoryError, CodeConsumeOutcome, CodeIssueOutcome, NewAccount,
};
pub use account_verification::AccountVerification;
#[cfg(test)]
pub use account_verification::MockAccountVerification;
#[cfg(test)]
pub use code_generator::MockVerificationCodeGenerator;
pub use code_generator::{FixtureCodeGenerator, VerificationCodeGenerator};
#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{CredentialStore, CredentialStoreError, FixtureCredentialStore};
#[cfg(test)]
pub use rating_maintenance::MockRatingMaintenance;
pub use rating_maintenance::RatingMaintenance;
#[cfg(test)]
pub use rating_repository::MockRatingRepository;
pub use rating_repository::{RatingRepository, RatingRepositoryError};
#[cfg(test)]
pub use verification_notifier::MockVerificationNotifier;
pub use verification_notifier::{FixtureVerificationNotifier, NotifierError, VerificationNotifier};
