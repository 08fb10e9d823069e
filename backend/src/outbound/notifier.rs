//! Development notifier that writes codes to the log.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{NotifierError, VerificationNotifier};
use crate::domain::{EmailAddress, VerificationCode};

/// Emits each code as a `debug` event instead of sending mail.
///
/// Only suitable for local environments: the code is readable by anyone with
/// access to debug logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingVerificationNotifier;

#[async_trait]
impl VerificationNotifier for TracingVerificationNotifier {
    async fn deliver(
        &self,
        destination: &EmailAddress,
        code: &VerificationCode,
    ) -> Result<(), NotifierError> {
        debug!(
            destination = %destination,
            code = code.as_str(),
            "verification code ready for delivery"
        );
        Ok(())
    }
}
