//! Driving port for account registration.

use async_trait::async_trait;

use crate::domain::{
    DisplayName, EmailAddress, Error, ExternalIdentity, ProvisionedAccount, Role, Secret,
};

/// Validated registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionAccountRequest {
    /// Normalised email.
    pub email: EmailAddress,
    /// Caller secret; required unless an external identity is present.
    pub secret: Option<Secret>,
    /// Display name.
    pub display_name: DisplayName,
    /// Role.
    pub role: Role,
    /// External identity; when present the secret is ignored and the
    /// account starts active.
    pub external_identity: Option<ExternalIdentity>,
}

impl ProvisionAccountRequest {
    /// Build a request from raw inbound values.
    ///
    /// Invalid email, display name, or a missing secret without an external
    /// identity yield `invalid_request`; an unknown role yields
    /// `invalid_role`.
    ///
    /// # Examples
    /// ```
    /// use marketplace::domain::ports::ProvisionAccountRequest;
    /// use marketplace::domain::{ErrorCode, Role};
    ///
    /// let request =
    ///     ProvisionAccountRequest::parse("Alice@Example.com", Some("s3cret!"), "Alice", "client", None)
    ///         .unwrap();
    /// assert_eq!(request.role, Role::Client);
    ///
    /// let err = ProvisionAccountRequest::parse("a@b.co", Some("x"), "A", "root", None).unwrap_err();
    /// assert_eq!(err.code(), ErrorCode::InvalidRole);
    /// ```
    pub fn parse(
        email: &str,
        secret: Option<&str>,
        display_name: &str,
        role: &str,
        external_identity: Option<ExternalIdentity>,
    ) -> Result<Self, Error> {
        let email = EmailAddress::new(email).map_err(|err| Error::invalid_request(err.to_string()))?;
        let display_name =
            DisplayName::new(display_name).map_err(|err| Error::invalid_request(err.to_string()))?;
        let role = role.parse::<Role>().map_err(|err| Error::invalid_role(err.input))?;
        let secret = match (&external_identity, secret) {
            (Some(_), _) => None,
            (None, Some(raw)) => {
                Some(Secret::new(raw).map_err(|err| Error::invalid_request(err.to_string()))?)
            }
            (None, None) => {
                return Err(Error::invalid_request(
                    "a secret is required without an external identity",
                ));
            }
        };
        Ok(Self {
            email,
            secret,
            display_name,
            role,
            external_identity,
        })
    }
}

/// Account registration use-case.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountProvisioning: Send + Sync {
    /// Create an account and its role profile atomically.
    async fn provision(&self, request: ProvisionAccountRequest)
    -> Result<ProvisionedAccount, Error>;
}
