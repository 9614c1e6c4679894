//! Shared types, errors, and configuration for Siren.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy
//! - Configuration management
//! - JWT claims validation for the upstream-authenticated principal

pub mod config;
pub mod error;
pub mod jwt;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
