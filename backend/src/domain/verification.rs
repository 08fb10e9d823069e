//! Email verification codes and their lifecycle.
//!
//! ```text
//! NoCodeIssued --issue--> CodePending --confirm--> Verified
//!                              |  ^
//!                     expiry   v  | issue (overwrites)
//!                          CodeExpired
//! ```
//!
//! Expiry instants are always stamped and compared by the store's clock.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::rngs::OsRng;

use super::account::EmailAddress;
use super::ids::AccountId;
use super::ports::VerificationCodeGenerator;

/// Default number of characters in a verification code.
pub const DEFAULT_CODE_LENGTH: usize = 6;
/// Default code alphabet: decimal digits only.
pub const DEFAULT_CODE_ALPHABET: &str = "0123456789";
/// Default lifetime of an issued code.
pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(10 * 60);

/// Short, single-use code proving control of an email address.
///
/// Compared by exact string equality; no case folding or trimming is applied
/// to submissions. `Debug` redacts the value so codes stay out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Borrow the code text, e.g. for delivery or persistence.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for VerificationCode {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for VerificationCode {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationCode(..)")
    }
}

/// Code and expiry held on a pending account. Written and cleared together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingVerification {
    code: VerificationCode,
    expires_at: DateTime<Utc>,
}

impl PendingVerification {
    /// Pair a code with its absolute expiry.
    #[must_use]
    pub fn new(code: VerificationCode, expires_at: DateTime<Utc>) -> Self {
        Self { code, expires_at }
    }

    /// Stored code.
    #[must_use]
    pub fn code(&self) -> &VerificationCode {
        &self.code
    }

    /// Absolute expiry instant.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the code is still usable at `now`. Expiry is exclusive.
    #[must_use]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Position of an account in the verification lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// Pending account that has never been sent a code.
    NoCodeIssued,
    /// A code is outstanding and unexpired.
    CodePending,
    /// The outstanding code has expired; a new one may be issued.
    CodeExpired,
    /// The account is active.
    Verified,
}

/// Result of a successful `issue` call, handed to the notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// Account the code belongs to.
    pub account_id: AccountId,
    /// Delivery destination.
    pub email: EmailAddress,
    /// The freshly generated code.
    pub code: VerificationCode,
    /// Store-clock expiry instant.
    pub expires_at: DateTime<Utc>,
}

/// Validation errors for [`VerificationPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationPolicyError {
    /// Code length outside the accepted range.
    #[error("verification code length must be between {min} and {max}")]
    CodeLength {
        /// Smallest accepted length.
        min: usize,
        /// Largest accepted length.
        max: usize,
    },
    /// Alphabet was empty or contained non-printable ASCII.
    #[error("verification code alphabet must be non-empty printable ASCII")]
    Alphabet,
    /// Zero lifetime would make every code born expired.
    #[error("verification code ttl must be positive")]
    ZeroTtl,
}

const MIN_CODE_LENGTH: usize = 4;
const MAX_CODE_LENGTH: usize = 12;

/// Shape and lifetime of issued codes.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use marketplace::domain::VerificationPolicy;
///
/// let policy = VerificationPolicy::default()
///     .with_code_length(8)
///     .and_then(|p| p.with_ttl(Duration::from_secs(300)))
///     .unwrap();
/// assert_eq!(policy.code_length(), 8);
/// assert_eq!(policy.alphabet(), "0123456789");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPolicy {
    code_length: usize,
    alphabet: Vec<char>,
    ttl: Duration,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            alphabet: DEFAULT_CODE_ALPHABET.chars().collect(),
            ttl: DEFAULT_CODE_TTL,
        }
    }
}

impl VerificationPolicy {
    /// Set the number of characters per code.
    pub fn with_code_length(mut self, code_length: usize) -> Result<Self, VerificationPolicyError> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&code_length) {
            return Err(VerificationPolicyError::CodeLength {
                min: MIN_CODE_LENGTH,
                max: MAX_CODE_LENGTH,
            });
        }
        self.code_length = code_length;
        Ok(self)
    }

    /// Replace the code alphabet.
    pub fn with_alphabet(mut self, alphabet: &str) -> Result<Self, VerificationPolicyError> {
        if alphabet.is_empty() || !alphabet.chars().all(|c| c.is_ascii_graphic()) {
            return Err(VerificationPolicyError::Alphabet);
        }
        let mut chars: Vec<char> = alphabet.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        self.alphabet = chars;
        Ok(self)
    }

    /// Set how long an issued code stays valid.
    pub fn with_ttl(mut self, ttl: Duration) -> Result<Self, VerificationPolicyError> {
        if ttl.is_zero() {
            return Err(VerificationPolicyError::ZeroTtl);
        }
        self.ttl = ttl;
        Ok(self)
    }

    /// Characters per code.
    #[must_use]
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Alphabet codes are drawn from.
    #[must_use]
    pub fn alphabet(&self) -> String {
        self.alphabet.iter().collect()
    }

    /// Code lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Generator drawing each character uniformly from the OS CSPRNG.
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    code_length: usize,
    alphabet: Vec<char>,
}

impl RandomCodeGenerator {
    /// Build a generator matching `policy`'s length and alphabet.
    #[must_use]
    pub fn new(policy: &VerificationPolicy) -> Self {
        Self {
            code_length: policy.code_length,
            alphabet: policy.alphabet.clone(),
        }
    }
}

impl VerificationCodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> VerificationCode {
        let mut rng = OsRng;
        let code: String = (0..self.code_length)
            .filter_map(|_| self.alphabet.get(rng.gen_range(0..self.alphabet.len())))
            .collect();
        VerificationCode(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use rstest::rstest;

    #[rstest]
    fn default_policy_matches_six_digit_ten_minute_codes() {
        let policy = VerificationPolicy::default();
        assert_eq!(policy.code_length(), 6);
        assert_eq!(policy.alphabet(), "0123456789");
        assert_eq!(policy.ttl(), Duration::from_secs(600));
    }

    #[rstest]
    #[case(3)]
    #[case(13)]
    fn rejects_out_of_range_code_lengths(#[case] length: usize) {
        let err = VerificationPolicy::default()
            .with_code_length(length)
            .expect_err("length out of range");
        assert!(matches!(err, VerificationPolicyError::CodeLength { .. }));
    }

    #[rstest]
    #[case("")]
    #[case("ab c")]
    #[case("\u{e9}")]
    fn rejects_unusable_alphabets(#[case] alphabet: &str) {
        assert_eq!(
            VerificationPolicy::default().with_alphabet(alphabet),
            Err(VerificationPolicyError::Alphabet)
        );
    }

    #[rstest]
    fn rejects_zero_ttl() {
        assert_eq!(
            VerificationPolicy::default().with_ttl(Duration::ZERO),
            Err(VerificationPolicyError::ZeroTtl)
        );
    }

    #[rstest]
    fn default_generator_emits_fixed_length_decimal_codes() {
        let generator = RandomCodeGenerator::new(&VerificationPolicy::default());
        for _ in 0..200 {
            let code = generator.generate();
            assert_eq!(code.as_str().len(), 6);
            assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[rstest]
    fn generator_honours_custom_alphabet_and_length() {
        let policy = VerificationPolicy::default()
            .with_alphabet("ABC")
            .and_then(|p| p.with_code_length(10))
            .expect("valid policy");
        let code = RandomCodeGenerator::new(&policy).generate();
        assert_eq!(code.as_str().len(), 10);
        assert!(code.as_str().chars().all(|c| "ABC".contains(c)));
    }

    #[rstest]
    fn expiry_instant_itself_is_not_live() {
        let expires_at = Utc::now();
        let pending = PendingVerification::new("123456".into(), expires_at);
        assert!(pending.is_live_at(expires_at - TimeDelta::seconds(1)));
        assert!(!pending.is_live_at(expires_at));
    }

    #[rstest]
    fn debug_output_redacts_code() {
        let code = VerificationCode::from("424242");
        assert!(!format!("{code:?}").contains("424242"));
    }
}
