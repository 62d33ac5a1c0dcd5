//! CLI command implementations.

pub mod build;
pub mod demo;
pub mod watch;
