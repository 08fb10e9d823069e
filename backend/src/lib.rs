//! Marketplace core: account provisioning, email verification, and rating
//! consistency behind a hexagonal boundary.
//!
//! - [`domain`]: model, ports, and the three use-case services.
//! - [`outbound`]: Diesel repositories, Argon2 credentials, notifier.
//! - [`inbound`]: actix-web handlers.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
