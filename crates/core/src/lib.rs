//! Core business logic for Siren.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, the transition policy, and validation
//! rules live here.
//!
//! # Modules
//!
//! - `workflow` - Bill lifecycle state machine and transition policy
//! - `assignment` - Operator/ambulance assignment reconciliation
//! - `auth` - Password hashing
//! - `storage` - Attachment file store (OpenDAL)

pub mod assignment;
pub mod auth;
pub mod storage;
pub mod workflow;
