//! Event use-case services.
//!
//! # Responsibility
//! - `event_service`: the record access layer over a document store.
//! - `event_board`: the in-memory mirror a list view is driven from.
//!
//! Both stay storage-agnostic; they only see [`crate::store::DocumentStore`].

pub mod event_board;
pub mod event_service;
