//! Testing utilities and mock implementations
//!
//! Shared by unit tests and the integration tests under `tests/`.

pub mod mocks;
