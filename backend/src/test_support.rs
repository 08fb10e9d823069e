//! Test doubles shared by unit tests and the integration suites under
//! `tests/`. Compiled for `cfg(test)` and behind the `test-support` feature.

pub mod clock;
pub mod memory_store;

pub use clock::MutableClock;
pub use memory_store::InMemoryStore;
