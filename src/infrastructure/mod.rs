//! Infrastructure layer module
//!
//! Process-level concerns of the standalone binary:
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;
