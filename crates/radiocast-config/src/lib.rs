//! Radiocast configuration management
//!
//! This crate provides configuration loading and parsing for the receiver:
//! - TOML configuration file parsing
//! - Receiver configuration structures

pub mod stack_config;
pub mod toml_config;

pub use stack_config::*;
pub use toml_config::*;
