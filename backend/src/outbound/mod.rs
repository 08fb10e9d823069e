//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL repositories on Diesel.
//! - **credentials**: Argon2id password hashing.
//! - **notifier**: log-backed verification delivery for development.
//!
//! Adapters translate between domain types and infrastructure
//! representations and carry no business rules.

pub mod credentials;
pub mod notifier;
pub mod persistence;

pub use credentials::Argon2CredentialStore;
pub use notifier::TracingVerificationNotifier;
