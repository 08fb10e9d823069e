//! Argon2id adapter for [`CredentialStore`].
//!
//! Digests are PHC strings (`$argon2id$v=19$m=...`), so the parameters used
//! for a digest travel with it and older digests keep verifying after a
//! cost change.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::domain::ports::{CredentialStore, CredentialStoreError};
use crate::domain::{CredentialDigest, Secret};

const SALT_LEN: usize = 16;

/// Password hashing with Argon2id.
#[derive(Debug, Clone, Default)]
pub struct Argon2CredentialStore {
    params: Params,
}

impl Argon2CredentialStore {
    /// Use explicit cost parameters: memory in KiB, iterations, lanes.
    pub fn with_cost(
        memory_kib: u32,
        iterations: u32,
        parallelism: u32,
    ) -> Result<Self, CredentialStoreError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|err| CredentialStoreError::hashing(err.to_string()))?;
        Ok(Self { params })
    }

    fn hasher(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

fn random_salt() -> Result<SaltString, CredentialStoreError> {
    let mut bytes = [0_u8; SALT_LEN];
    OsRng.fill_bytes(&mut bytes);
    SaltString::encode_b64(&bytes).map_err(|err| CredentialStoreError::hashing(err.to_string()))
}

impl CredentialStore for Argon2CredentialStore {
    fn hash(&self, secret: &Secret) -> Result<CredentialDigest, CredentialStoreError> {
        let salt = random_salt()?;
        let digest = self
            .hasher()
            .hash_password(secret.expose().as_bytes(), &salt)
            .map_err(|err| CredentialStoreError::hashing(err.to_string()))?;
        Ok(CredentialDigest::new(digest.to_string()))
    }

    fn verify(
        &self,
        secret: &Secret,
        digest: &CredentialDigest,
    ) -> Result<bool, CredentialStoreError> {
        let parsed = PasswordHash::new(digest.as_ref())
            .map_err(|err| CredentialStoreError::malformed_digest(err.to_string()))?;
        match self
            .hasher()
            .verify_password(secret.expose().as_bytes(), &parsed)
        {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(CredentialStoreError::hashing(err.to_string())),
        }
    }
}
