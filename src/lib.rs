//! authconsole — client library for an authorization service's token
//! dashboard and user-profile surfaces.
//!
//! Re-exports modules needed by the binary and by integration tests in `tests/`.

pub mod cli;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod models;
pub mod notice;
pub mod profile;
