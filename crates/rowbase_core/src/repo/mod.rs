//! Generic table access.
//!
//! # Responsibility
//! - Provide one CRUD facade usable for any table with an `id` primary key.
//! - Isolate SQL text construction from service/business orchestration.
//!
//! # Invariants
//! - Absence is returned as `None`/empty, never as an error.
//! - Identifiers reaching SQL text come from a shape's column type or a
//!   validated `Ident`.

pub mod record_store;
pub mod shape;
