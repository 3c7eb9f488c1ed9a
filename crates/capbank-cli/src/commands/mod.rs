//! CLI command implementations

pub mod bank;
pub mod demo;
