//! Credential primitives: caller secrets, stored digests, external identities.

use std::fmt;

use zeroize::Zeroizing;

/// Error returned when a secret is blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("secret must not be empty")]
pub struct EmptySecret;

/// Plain-text secret supplied at registration.
///
/// The buffer is zeroed on drop and `Debug` never prints it. Whitespace is
/// kept as supplied to avoid surprising credential comparisons.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Zeroizing<String>);

impl Secret {
    /// Wrap a non-empty secret.
    pub fn new(secret: impl Into<String>) -> Result<Self, EmptySecret> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(EmptySecret);
        }
        Ok(Self(Zeroizing::new(secret)))
    }

    /// Expose the secret to a hashing primitive.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// Opaque digest produced by the credential store (a PHC string for Argon2).
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialDigest(String);

impl CredentialDigest {
    /// Wrap a stored digest.
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }
}

impl AsRef<str> for CredentialDigest {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for CredentialDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialDigest(..)")
    }
}

/// Identity asserted by an external provider (e.g. an OAuth sign-in).
///
/// Its presence marks the provisioning fast path: the account is active
/// immediately and carries no credential digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Provider name, e.g. `google`.
    pub provider: String,
    /// Provider-scoped subject identifier.
    pub subject: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_rejects_empty_input_but_keeps_whitespace() {
        assert_eq!(Secret::new(""), Err(EmptySecret));
        let secret = Secret::new(" s3cret! ").expect("non-empty secret");
        assert_eq!(secret.expose(), " s3cret! ");
    }

    #[test]
    fn debug_output_redacts_secret_material() {
        let secret = Secret::new("hunter2").expect("non-empty secret");
        let digest = CredentialDigest::new("$argon2id$v=19$...");
        assert!(!format!("{secret:?}").contains("hunter2"));
        assert!(!format!("{digest:?}").contains("argon2id"));
    }
}
