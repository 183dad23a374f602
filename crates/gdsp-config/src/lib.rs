//! Golden model configuration
//!
//! This crate provides configuration loading and parsing for a model run:
//! - TOML configuration file parsing
//! - Run configuration structures with defaults matching the reference flow

pub mod model_config;
pub mod toml_config;

pub use model_config::*;
pub use toml_config::*;
