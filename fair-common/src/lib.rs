//! # FAIR Common Library
//!
//! Shared code for the FAIR metrics services:
//! - Error type used across crates
//! - Immutable service settings and their resolution from CLI, environment,
//!   TOML and compiled defaults

pub mod config;
pub mod error;

pub use config::Settings;
pub use error::{Error, Result};
