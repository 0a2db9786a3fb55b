//! Shared utilities for finsense
//!
//! This crate provides common functionality used across the finsense workspace,
//! including logging setup and application-level configuration.

pub mod config;
pub mod logging;

pub use config::{AppConfig, Environment};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
