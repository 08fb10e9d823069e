//! UUID-backed identifiers for accounts, profiles, sessions, and ratings.
//!
//! Each identifier is a distinct newtype so an account id can never be passed
//! where a professional profile id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when identifier text is not a canonical UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a valid UUID")]
pub struct InvalidIdentifier {
    /// Human-readable identifier kind, e.g. `account id`.
    pub kind: &'static str,
}

macro_rules! define_uuid_id {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Parse an identifier from text, rejecting surrounding whitespace.
            pub fn new(id: impl AsRef<str>) -> Result<Self, InvalidIdentifier> {
                let raw = id.as_ref();
                if raw.trim() != raw {
                    return Err(InvalidIdentifier { kind: $kind });
                }
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| InvalidIdentifier { kind: $kind })
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

define_uuid_id! {
    /// Stable account identifier.
    AccountId => "account id"
}

define_uuid_id! {
    /// Identifier of a professional's role profile.
    ///
    /// The aggregate rating lives on this row, so rating recomputation is
    /// keyed by it rather than by the owning account.
    ProfessionalId => "professional id"
}

define_uuid_id! {
    /// Identifier of a booked session.
    SessionId => "session id"
}

define_uuid_id! {
    /// Identifier of a single rating.
    RatingId => "rating id"
}
