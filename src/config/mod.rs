//! # Configuration
//!
//! Startup configuration read once from the environment.

mod operator;

pub use operator::{ConfigError, LogFormat, OperatorConfig, ProviderCredentials};
