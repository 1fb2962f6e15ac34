//! CLI command implementations.

pub mod account;
pub mod backends;
pub mod bell;
pub mod common;
pub mod fetch;
pub mod ghz;
pub mod grover;
pub mod status;
pub mod version;
