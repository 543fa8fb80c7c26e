//! Domain model for event records.
//!
//! # Responsibility
//! - Define the event record shapes shared by the access layer and the board.
//! - Own field-level validation so every write path enforces it.
//!
//! # Invariants
//! - A persisted `Event` always carries an `EventId`; a draft never does.
//! - Stored documents never contain the `id` field.

pub mod event;
