//! Core of EventDesk: event records, their document store access layer and
//! the in-memory board a list view is driven from.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod service;
pub mod store;

pub use config::{ConfigError, FirebaseSettings, Settings, StoreBackend};
pub use logging::{default_log_level, init_logging, init_logging_with, logging_status};
pub use model::event::{Event, EventDraft, EventId, EventPatch, EventValidationError, RequiredField};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier, RecordingNotifier};
pub use service::event_board::{EventBoard, MirrorPolicy};
pub use service::event_service::{
    EventService, EventServiceError, IdStrategy, ServiceResult, EVENTS_COLLECTION,
};
pub use store::{
    Document, DocumentStore, FirestoreConfig, FirestoreDocumentStore, MemoryDocumentStore,
    SqliteDocumentStore, StoreError, StoreResult, StoredDocument,
};

/// Minimal health-check API for smoke checks.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
