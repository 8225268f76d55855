//! # pecan-rs-core
//!
//! Core types, settings, logging, and error types for the pecan-rs framework.
//! This crate has no HTTP dependencies and provides the foundation for the
//! routing and application crates.
//!
//! ## Modules
//!
//! - [`error`] - The framework error enum and result alias
//! - [`settings`] - Application and server configuration
//! - [`settings_loader`] - Loading settings from TOML/JSON files and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Utility types (`MultiValueDict`)

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;

// Re-export the most commonly used types at the crate root.
pub use error::{PecanError, PecanResult};
pub use settings::Settings;
