//! Port for out-of-band delivery of verification codes.

use async_trait::async_trait;

use crate::domain::{EmailAddress, VerificationCode};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notifier adapters.
    pub enum NotifierError {
        /// The transport refused or failed to accept the message.
        Delivery { message: String } => "verification delivery failed: {message}",
    }
}

/// Delivers a code to its destination. Fire-and-forget from the domain's
/// point of view: a failure never rolls back the issued code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationNotifier: Send + Sync {
    /// Send `code` to `destination`.
    async fn deliver(
        &self,
        destination: &EmailAddress,
        code: &VerificationCode,
    ) -> Result<(), NotifierError>;
}

/// Notifier that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVerificationNotifier;

#[async_trait]
impl VerificationNotifier for FixtureVerificationNotifier {
    async fn deliver(
        &self,
        _destination: &EmailAddress,
        _code: &VerificationCode,
    ) -> Result<(), NotifierError> {
        Ok(())
    }
}
