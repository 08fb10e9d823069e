//! Account data model.
//!
//! An account is the authentication identity: email, credential digest, role,
//! and activation state. Role-specific business data lives in the profile
//! rows created alongside it.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::credentials::CredentialDigest;
use super::ids::{AccountId, ProfessionalId};
use super::verification::{PendingVerification, VerificationState};

/// Validation errors raised while building account values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    /// Email was blank once trimmed.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Email exceeded the maximum length.
    #[error("email must be at most {max} characters")]
    EmailTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Email did not look like `local@domain.tld`.
    #[error("email must be a valid address")]
    MalformedEmail,
    /// Display name was blank once trimmed.
    #[error("display name must not be empty")]
    EmptyDisplayName,
    /// Display name exceeded the maximum length.
    #[error("display name must be at most {max} characters")]
    DisplayNameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Stored activation columns contradict each other.
    #[error("account activation state is inconsistent: {reason}")]
    InconsistentActivation {
        /// Which combination of columns was found.
        reason: &'static str,
    },
}

/// Maximum accepted email length (RFC 5321 path limit).
pub const EMAIL_MAX: usize = 254;
/// Maximum accepted display name length.
pub const DISPLAY_NAME_MAX: usize = 100;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Case-normalised email address.
///
/// Input is trimmed and lower-cased on construction, so equality and the
/// store's unique index both compare case-insensitively.
///
/// # Examples
/// ```
/// use marketplace::domain::EmailAddress;
///
/// let email = EmailAddress::new("  Alice@Example.COM ").unwrap();
/// assert_eq!(email.as_ref(), "alice@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(email: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let normalised = email.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(AccountValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(AccountValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        if !email_regex().is_match(&normalised) {
            return Err(AccountValidationError::MalformedEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Name shown to other marketplace users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate a display name, trimming surrounding whitespace.
    pub fn new(display_name: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let trimmed = display_name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AccountValidationError::EmptyDisplayName);
        }
        if trimmed.chars().count() > DISPLAY_NAME_MAX {
            return Err(AccountValidationError::DisplayNameTooLong {
                max: DISPLAY_NAME_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Marketplace role; fixes which profile table an account owns a row in.
///
/// # Examples
/// ```
/// use marketplace::domain::{ProfileKind, Role};
///
/// let role: Role = "Professional".parse().unwrap();
/// assert_eq!(role, Role::Professional);
/// assert_eq!(role.profile_kind(), Some(ProfileKind::Professional));
/// assert_eq!(Role::Administrator.profile_kind(), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Back-office operator; owns no profile row.
    Administrator,
    /// Service provider; owns a professional profile carrying the aggregate rating.
    Professional,
    /// Customer booking sessions; owns a client profile.
    Client,
}

/// Role profile table an account's business record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    /// `professional_profiles`.
    Professional,
    /// `client_profiles`.
    Client,
}

impl Role {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => "administrator",
            Self::Professional => "professional",
            Self::Client => "client",
        }
    }

    /// Profile table created together with an account of this role.
    #[must_use]
    pub const fn profile_kind(self) -> Option<ProfileKind> {
        match self {
            Self::Administrator => None,
            Self::Professional => Some(ProfileKind::Professional),
            Self::Client => Some(ProfileKind::Client),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a role outside the fixed enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {input}")]
pub struct ParseRoleError {
    /// The unrecognised input value.
    pub input: String,
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "administrator" | "admin" => Ok(Self::Administrator),
            "professional" => Ok(Self::Professional),
            "client" => Ok(Self::Client),
            _ => Err(ParseRoleError {
                input: s.to_owned(),
            }),
        }
    }
}

/// Activation state of an account.
///
/// Encodes the invariant that an active account never retains a code: the
/// only way to hold a [`PendingVerification`] is to be [`Self::Pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    /// Verified, or provisioned through an external identity.
    Active,
    /// Awaiting verification; `None` until the first code is issued.
    Pending(Option<PendingVerification>),
}

impl AccountStatus {
    /// Rebuild the status from the stored columns, rejecting combinations the
    /// store must never hold.
    pub fn from_columns(
        active: bool,
        code: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, AccountValidationError> {
        match (active, code, expires_at) {
            (true, None, None) => Ok(Self::Active),
            (true, _, _) => Err(AccountValidationError::InconsistentActivation {
                reason: "active account retains a verification code",
            }),
            (false, None, None) => Ok(Self::Pending(None)),
            (false, Some(code), Some(expires_at)) => Ok(Self::Pending(Some(
                PendingVerification::new(code.into(), expires_at),
            ))),
            (false, _, _) => Err(AccountValidationError::InconsistentActivation {
                reason: "verification code and expiry must be set together",
            }),
        }
    }

    /// Whether the account may sign in.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Marketplace account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    email: EmailAddress,
    credential_digest: Option<CredentialDigest>,
    display_name: DisplayName,
    role: Role,
    status: AccountStatus,
}

impl Account {
    /// Assemble an account from validated components.
    #[must_use]
    pub fn new(
        id: AccountId,
        email: EmailAddress,
        credential_digest: Option<CredentialDigest>,
        display_name: DisplayName,
        role: Role,
        status: AccountStatus,
    ) -> Self {
        Self {
            id,
            email,
            credential_digest,
            display_name,
            role,
            status,
        }
    }

    /// Stable account identifier.
    #[must_use]
    pub fn id(&self) -> &AccountId {
        &self.id
    }

    /// Normalised email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Stored credential digest; `None` for externally authenticated accounts.
    #[must_use]
    pub fn credential_digest(&self) -> Option<&CredentialDigest> {
        self.credential_digest.as_ref()
    }

    /// Display name.
    #[must_use]
    pub fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Account role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Activation state.
    #[must_use]
    pub fn status(&self) -> &AccountStatus {
        &self.status
    }

    /// Whether the account has been activated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Position in the verification state machine as of `now`.
    ///
    /// `now` should come from the same clock that stamped the expiry.
    #[must_use]
    pub fn verification_state(&self, now: DateTime<Utc>) -> VerificationState {
        match &self.status {
            AccountStatus::Active => VerificationState::Verified,
            AccountStatus::Pending(None) => VerificationState::NoCodeIssued,
            AccountStatus::Pending(Some(pending)) if pending.is_live_at(now) => {
                VerificationState::CodePending
            }
            AccountStatus::Pending(Some(_)) => VerificationState::CodeExpired,
        }
    }
}

/// Role profile row created in the same transaction as its account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleProfile {
    /// Table the row lives in.
    pub kind: ProfileKind,
    /// Profile row identifier.
    pub id: Uuid,
}

impl RoleProfile {
    /// Professional profile id, when this is a professional profile.
    #[must_use]
    pub fn professional_id(&self) -> Option<ProfessionalId> {
        match self.kind {
            ProfileKind::Professional => Some(ProfessionalId::from_uuid(self.id)),
            ProfileKind::Client => None,
        }
    }
}

/// Account together with the profile row provisioned for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedAccount {
    /// The stored account.
    pub account: Account,
    /// Role profile; `None` for administrators.
    pub profile: Option<RoleProfile>,
}
