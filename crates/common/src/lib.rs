//! Shared configuration and error handling for the kata solver
//!
//! This crate provides common functionality used across the workspace:
//! - Configuration management following 12-factor principles
//! - The error taxonomy shared by the domain and application crates

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{Error, Result};
