//! Configuration module for the tumblr-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{ApiConfig, BlogConfig, Config, OptionsConfig, StateConfig};
pub use validation::validate_config;
