//! Port for producing verification codes.

use crate::domain::VerificationCode;

/// Source of fresh verification codes.
///
/// Production uses [`crate::domain::RandomCodeGenerator`]; tests substitute
/// a fixed sequence.
#[cfg_attr(test, mockall::automock)]
pub trait VerificationCodeGenerator: Send + Sync {
    /// Generate one code.
    fn generate(&self) -> VerificationCode;
}

/// Generator that always returns the same code.
#[derive(Debug, Clone)]
pub struct FixtureCodeGenerator(pub VerificationCode);

impl VerificationCodeGenerator for FixtureCodeGenerator {
    fn generate(&self) -> VerificationCode {
        self.0.clone()
    }
}
