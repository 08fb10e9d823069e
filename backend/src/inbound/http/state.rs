//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see driving ports, so
//! the whole HTTP surface can be exercised against mocks without a database.

use std::sync::Arc;

use crate::domain::ports::{AccountProvisioning, AccountVerification, RatingMaintenance};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub provisioning: Arc<dyn AccountProvisioning>,
    pub verification: Arc<dyn AccountVerification>,
    pub ratings: Arc<dyn RatingMaintenance>,
}

impl HttpState {
    /// Bundle the three use-cases.
    pub fn new(
        provisioning: Arc<dyn AccountProvisioning>,
        verification: Arc<dyn AccountVerification>,
        ratings: Arc<dyn RatingMaintenance>,
    ) -> Self {
        Self {
            provisioning,
            verification,
            ratings,
        }
    }
}
