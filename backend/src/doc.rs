//! OpenAPI document for the marketplace REST API.
//!
//! Served through Swagger UI in debug builds and printed by the
//! `openapi-dump` binary for external tooling.

use utoipa::OpenApi;

use crate::inbound::http::accounts::{
    AccountResponse, ConfirmVerificationPayload, ExternalIdentityRequest,
    ProvisionAccountPayload, VerificationIssuedResponse,
};
use crate::inbound::http::ratings::{
    AggregateResponse, RatingChangePayload, RatingResponse, RecordRatingPayload,
};
use crate::inbound::http::schemas::ErrorSchema;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Marketplace core API",
        description = "Account provisioning, email verification, and rating upkeep."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::accounts::provision_account,
        crate::inbound::http::accounts::confirm_verification,
        crate::inbound::http::accounts::issue_verification_code,
        crate::inbound::http::ratings::record_rating,
        crate::inbound::http::ratings::change_rating,
        crate::inbound::http::ratings::remove_rating,
        crate::inbound::http::ratings::recompute_rating,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        crate::domain::ErrorCode,
        crate::domain::Role,
        crate::domain::RatingState,
        ProvisionAccountPayload,
        ExternalIdentityRequest,
        ConfirmVerificationPayload,
        AccountResponse,
        VerificationIssuedResponse,
        RecordRatingPayload,
        RatingChangePayload,
        RatingResponse,
        AggregateResponse,
    )),
    tags(
        (name = "accounts", description = "Provisioning and email verification"),
        (name = "ratings", description = "Session ratings and professional aggregates"),
        (name = "health", description = "Orchestration probes")
    )
)]
pub struct ApiDoc;
