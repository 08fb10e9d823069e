//! HTTP inbound adapter exposing the marketplace REST endpoints.
//!
//! Handlers parse payloads into domain types, call a driving port from
//! [`state::HttpState`], and serialise the result. Failures are domain
//! [`crate::domain::Error`] values rendered by [`error`].

use actix_web::web;

use crate::domain::Error;

pub mod accounts;
pub mod error;
pub mod health;
pub mod ratings;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub(crate) mod test_utils;

pub use error::ApiResult;

/// JSON extractor settings that report malformed bodies as domain errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _req| Error::invalid_request(err.to_string()).into())
}

/// Register every `/api/v1` handler on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(accounts::provision_account)
        .service(accounts::confirm_verification)
        .service(accounts::issue_verification_code)
        .service(ratings::record_rating)
        .service(ratings::change_rating)
        .service(ratings::remove_rating)
        .service(ratings::recompute_rating);
}
