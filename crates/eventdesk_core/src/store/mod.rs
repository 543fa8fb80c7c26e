//! Document store contracts and backends.
//!
//! # Responsibility
//! - Define the five collection-scoped primitives the access layer needs.
//! - Keep backend transport details (SQL, HTTP) out of the service layer.
//!
//! # Invariants
//! - `set` replaces the whole document and creates it when missing.
//! - `merge` only touches supplied top-level fields and fails with
//!   `StoreError::NotFound` when the document does not exist.
//! - `delete` succeeds for identifiers that were never written.

use crate::db::DbError;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod firestore;
mod firestore_value;
pub mod memory;
pub mod sqlite;

pub use firestore::{FirestoreConfig, FirestoreDocumentStore};
pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Document body: a JSON object of top-level fields.
pub type Document = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// One document together with its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

/// Backend failure for document operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    Transport(reqwest::Error),
    /// Non-success HTTP response from a remote store.
    Http { status: u16, message: String },
    /// Backend refused the call without reaching storage.
    Unavailable(String),
    /// Backend could not be constructed from its configuration.
    InvalidConfig(String),
    NotFound { collection: String, id: String },
    InvalidData(String),
    Serialization(serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(_) => "db",
            Self::Transport(_) => "transport",
            Self::Http { .. } => "http",
            Self::Unavailable(_) => "unavailable",
            Self::InvalidConfig(_) => "invalid_config",
            Self::NotFound { .. } => "not_found",
            Self::InvalidData(_) => "invalid_data",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Http { status, message } => write!(f, "store returned HTTP {status}: {message}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
            Self::InvalidConfig(message) => write!(f, "invalid store configuration: {message}"),
            Self::NotFound { collection, id } => write!(f, "document not found: {collection}/{id}"),
            Self::InvalidData(message) => write!(f, "invalid stored document: {message}"),
            Self::Serialization(err) => write!(f, "document serialization failed: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Http { .. }
            | Self::Unavailable(_)
            | Self::InvalidConfig(_)
            | Self::NotFound { .. }
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Collection-scoped document CRUD.
pub trait DocumentStore {
    /// Returns every document in `collection`, in backend order.
    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>>;
    /// Returns `None` when the document does not exist.
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;
    /// Writes the full document, replacing any existing one.
    fn set(&self, collection: &str, id: &str, document: &Document) -> StoreResult<()>;
    /// Merges top-level `fields` into an existing document.
    fn merge(&self, collection: &str, id: &str, fields: &Document) -> StoreResult<()>;
    /// Removes the document if present.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        (**self).list(collection)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        (**self).get(collection, id)
    }

    fn set(&self, collection: &str, id: &str, document: &Document) -> StoreResult<()> {
        (**self).set(collection, id, document)
    }

    fn merge(&self, collection: &str, id: &str, fields: &Document) -> StoreResult<()> {
        (**self).merge(collection, id, fields)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        (**self).list(collection)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        (**self).get(collection, id)
    }

    fn set(&self, collection: &str, id: &str, document: &Document) -> StoreResult<()> {
        (**self).set(collection, id, document)
    }

    fn merge(&self, collection: &str, id: &str, fields: &Document) -> StoreResult<()> {
        (**self).merge(collection, id, fields)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        (**self).list(collection)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        (**self).get(collection, id)
    }

    fn set(&self, collection: &str, id: &str, document: &Document) -> StoreResult<()> {
        (**self).set(collection, id, document)
    }

    fn merge(&self, collection: &str, id: &str, fields: &Document) -> StoreResult<()> {
        (**self).merge(collection, id, fields)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id)
    }
}

/// Merges `fields` into `target`, overwriting top-level keys.
pub(crate) fn merge_fields(target: &mut Document, fields: &Document) {
    for (key, value) in fields {
        target.insert(key.clone(), value.clone());
    }
}
