//! Domain primitives, services, and ports.
//!
//! Purpose: model accounts, verification codes, and ratings as strongly
//! typed values, and implement the three consistency-critical use-cases
//! (provisioning, verification, rating upkeep) against port traits so the
//! persistence and transport adapters stay outside the hexagon.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: boundary error payload and stable identifiers.
//! - `Account`, `EmailAddress`, `Role`: account identity.
//! - `VerificationPolicy`, `VerificationCode`: code shape and lifetime.
//! - `Rating`, `RatingChange`, `AggregateRating`: rating model.
//! - `*Service`: driving port implementations.

pub mod account;
mod account_provisioning_service;
mod account_verification_service;
pub mod credentials;
pub mod error;
pub mod ids;
pub mod ports;
pub mod rating;
mod rating_consistency_service;
pub mod trace_id;
pub mod verification;

pub use self::account::{
    Account, AccountStatus, AccountValidationError, DISPLAY_NAME_MAX, DisplayName, EMAIL_MAX,
    EmailAddress, ParseRoleError, ProfileKind, ProvisionedAccount, Role, RoleProfile,
};
pub use self::account_provisioning_service::AccountProvisioningService;
pub use self::account_verification_service::AccountVerificationService;
pub use self::credentials::{CredentialDigest, EmptySecret, ExternalIdentity, Secret};
pub use self::error::{
    DUPLICATE_EMAIL_MESSAGE, Error, ErrorCode, ErrorValidationError,
    INVALID_OR_EXPIRED_CODE_MESSAGE,
};
pub use self::ids::{AccountId, InvalidIdentifier, ProfessionalId, RatingId, SessionId};
pub use self::rating::{
    AggregateRating, NewRating, Rating, RatingChange, RatingComment, RatingScore, RatingState,
    RatingValidationError, ReconciliationReport,
};
pub use self::rating_consistency_service::RatingConsistencyService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::verification::{
    IssuedCode, PendingVerification, RandomCodeGenerator, VerificationCode, VerificationPolicy,
    VerificationPolicyError, VerificationState,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use marketplace::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::not_found("no such rating"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
