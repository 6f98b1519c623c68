//! Small helpers shared across the workspace: environment lookups and the
//! configuration error type they report through.

pub mod config;
pub mod env;

pub use config::ConfigError;
