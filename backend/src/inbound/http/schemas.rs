//! OpenAPI schema for the error payload.
//!
//! [`crate::domain::Error`] serialises through a private DTO, so utoipa cannot
//! derive its schema directly; this wrapper mirrors the wire shape.

use utoipa::ToSchema;

use crate::domain::ErrorCode;

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "duplicate_email")]
    code: ErrorCode,
    /// Human-readable message returned to clients.
    #[schema(example = "an account with this email already exists")]
    message: String,
    /// Correlation identifier matching the `trace-id` response header.
    #[schema(rename = "traceId", example = "6f1c2f4e-8a55-4d7b-9c59-2a8d2c1f9b10")]
    trace_id: Option<String>,
    /// Supplementary details, such as the offending field.
    details: Option<serde_json::Value>,
}
