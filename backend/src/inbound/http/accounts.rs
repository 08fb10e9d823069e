//! Account provisioning and verification HTTP handlers.
//!
//! ```text
//! POST /api/v1/accounts
//! POST /api/v1/accounts/verification
//! POST /api/v1/accounts/{id}/verification-code
//! ```
//!
//! Verification codes travel only through the notifier; no response body
//! carries one.

use actix_web::{HttpResponse, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::ports::ProvisionAccountRequest;
use crate::domain::{
    Account, AccountId, Error, ExternalIdentity, ProvisionedAccount, Role, VerificationCode,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Federated identity supplied instead of a password.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExternalIdentityRequest {
    pub provider: String,
    pub subject: String,
}

/// Request payload for provisioning an account.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProvisionAccountPayload {
    #[schema(example = "alice@example.com")]
    pub email: String,
    pub password: Option<String>,
    #[schema(example = "Alice")]
    pub display_name: String,
    #[schema(example = "professional")]
    pub role: String,
    pub external_identity: Option<ExternalIdentityRequest>,
}

/// Request payload for confirming an email address.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfirmVerificationPayload {
    pub email: String,
    pub code: String,
}

/// Account representation returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub active: bool,
    /// Professional or client profile created with the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    /// Expiry of the code sent at registration, when one was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_expires_at: Option<DateTime<Utc>>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id().to_string(),
            email: account.email().to_string(),
            display_name: account.display_name().to_string(),
            role: account.role(),
            active: account.is_active(),
            profile_id: None,
            verification_expires_at: None,
        }
    }
}

impl From<&ProvisionedAccount> for AccountResponse {
    fn from(provisioned: &ProvisionedAccount) -> Self {
        Self {
            profile_id: provisioned.profile.map(|profile| profile.id.to_string()),
            ..Self::from(&provisioned.account)
        }
    }
}

/// Response payload acknowledging a re-issued code.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationIssuedResponse {
    pub verification_expires_at: DateTime<Utc>,
}

fn parse_account_id(raw: &str) -> Result<AccountId, Error> {
    AccountId::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": "id",
            "value": raw,
            "code": "invalid_account_id",
        }))
    })
}

fn parse_provision_payload(
    payload: ProvisionAccountPayload,
) -> Result<ProvisionAccountRequest, Error> {
    let external_identity = payload.external_identity.map(|identity| ExternalIdentity {
        provider: identity.provider,
        subject: identity.subject,
    });
    ProvisionAccountRequest::parse(
        &payload.email,
        payload.password.as_deref(),
        &payload.display_name,
        &payload.role,
        external_identity,
    )
}

/// Provision an account and, when it is pending, send its first code.
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = ProvisionAccountPayload,
    responses(
        (status = 201, description = "Account provisioned", body = AccountResponse),
        (status = 400, description = "Invalid request or role", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "provisionAccount"
)]
#[post("/accounts")]
pub async fn provision_account(
    state: web::Data<HttpState>,
    payload: web::Json<ProvisionAccountPayload>,
) -> ApiResult<HttpResponse> {
    let request = parse_provision_payload(payload.into_inner())?;
    let provisioned = state.provisioning.provision(request).await?;
    let mut body = AccountResponse::from(&provisioned);

    if !provisioned.account.is_active() {
        match state
            .verification
            .issue_and_notify(provisioned.account.id())
            .await
        {
            Ok(expires_at) => body.verification_expires_at = Some(expires_at),
            // The account exists; the caller can request a fresh code.
            Err(error) => warn!(
                account_id = %provisioned.account.id(),
                error = %error,
                "initial verification code was not issued"
            ),
        }
    }

    Ok(HttpResponse::Created().json(body))
}

/// Confirm an email address with the code that was sent to it.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/verification",
    request_body = ConfirmVerificationPayload,
    responses(
        (status = 200, description = "Account activated", body = AccountResponse),
        (status = 400, description = "Code invalid or expired", body = ErrorSchema),
        (status = 409, description = "Account already verified", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "confirmVerification"
)]
#[post("/accounts/verification")]
pub async fn confirm_verification(
    state: web::Data<HttpState>,
    payload: web::Json<ConfirmVerificationPayload>,
) -> ApiResult<web::Json<AccountResponse>> {
    let ConfirmVerificationPayload { email, code } = payload.into_inner();
    let account = state
        .verification
        .confirm(&email, &VerificationCode::from(code))
        .await?;
    Ok(web::Json(AccountResponse::from(&account)))
}

/// Issue a fresh code for a pending account, superseding any earlier one.
#[utoipa::path(
    post,
    path = "/api/v1/accounts/{id}/verification-code",
    params(("id" = String, Path, description = "Account identifier")),
    responses(
        (status = 202, description = "Code issued and handed to the notifier", body = VerificationIssuedResponse),
        (status = 400, description = "Malformed identifier", body = ErrorSchema),
        (status = 404, description = "Unknown account", body = ErrorSchema),
        (status = 409, description = "Account already verified", body = ErrorSchema)
    ),
    tags = ["accounts"],
    operation_id = "issueVerificationCode"
)]
#[post("/accounts/{id}/verification-code")]
pub async fn issue_verification_code(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let account_id = parse_account_id(&path.into_inner())?;
    let verification_expires_at = state.verification.issue_and_notify(&account_id).await?;
    Ok(HttpResponse::Accepted().json(VerificationIssuedResponse {
        verification_expires_at,
    }))
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
