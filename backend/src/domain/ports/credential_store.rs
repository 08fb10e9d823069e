//! Port for the one-way credential hashing primitive.

use crate::domain::{CredentialDigest, Secret};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential store adapters.
    pub enum CredentialStoreError {
        /// Hashing the secret failed.
        Hashing { message: String } => "credential hashing failed: {message}",
        /// A stored digest could not be parsed.
        MalformedDigest { message: String } =>
            "stored credential digest is malformed: {message}",
    }
}

/// One-way hashing of caller secrets.
///
/// Called outside any store transaction so a slow hash never holds a
/// connection.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    /// Produce a salted digest of `secret`.
    fn hash(&self, secret: &Secret) -> Result<CredentialDigest, CredentialStoreError>;

    /// Check `secret` against a stored digest.
    fn verify(
        &self,
        secret: &Secret,
        digest: &CredentialDigest,
    ) -> Result<bool, CredentialStoreError>;
}

const FIXTURE_PREFIX: &str = "fixture$";

/// Reversible stand-in for tests that do not exercise hashing cost.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCredentialStore;

impl CredentialStore for FixtureCredentialStore {
    fn hash(&self, secret: &Secret) -> Result<CredentialDigest, CredentialStoreError> {
        Ok(CredentialDigest::new(format!(
            "{FIXTURE_PREFIX}{}",
            secret.expose()
        )))
    }

    fn verify(
        &self,
        secret: &Secret,
        digest: &CredentialDigest,
    ) -> Result<bool, CredentialStoreError> {
        let stored = digest
            .as_ref()
            .strip_prefix(FIXTURE_PREFIX)
            .ok_or_else(|| CredentialStoreError::malformed_digest("missing fixture prefix"))?;
        Ok(stored == secret.expose())
    }
}
