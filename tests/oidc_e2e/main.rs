//! OIDC E2E test suite.
//!
//! Exercises result submission and lookup end-to-end with a mock OIDC
//! provider and an in-memory result store. No external services needed.
//!
//! Run with: cargo test --test oidc_e2e

mod test_helpers;

mod test_auth_invalid;
mod test_query;
mod test_submit;
