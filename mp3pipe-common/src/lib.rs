//! # mp3pipe Common Library
//!
//! Shared code for the mp3pipe crates:
//! - Configuration file model and discovery
//! - Logging initialisation
//! - Common error type

pub mod config;
pub mod error;
pub mod logging;

pub use config::{ConfigOrigin, EncoderProfile, LoggingConfig, TomlConfig};
pub use error::{Error, Result};
