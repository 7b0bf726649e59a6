//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into operator-level APIs.
//! - Keep CLI/presentation layers decoupled from SQL details.

pub mod user_service;
