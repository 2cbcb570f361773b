//! Shared configuration and error handling for VFXTrack
//!
//! This crate provides common functionality used across the VFXTrack workspace:
//! - Configuration management following 12-factor principles
//! - Error types and handling

pub mod config;
pub mod error;

pub use config::{ApiProvider, Config};
pub use error::{Error, Result};
