//! CLI command implementations.

pub mod describe;
pub mod hashes;
pub mod login;
pub mod progress;
