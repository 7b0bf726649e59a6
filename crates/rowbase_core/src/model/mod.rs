//! Data shapes returned by stores.
//!
//! # Responsibility
//! - Define the untyped `Row` every table can decode into.
//! - Define the typed `users` schema used by the operator flows.

pub mod row;
pub mod user;
