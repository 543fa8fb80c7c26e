//! In-process document store.
//!
//! Backs tests and demos. Documents are kept per collection in first-write
//! order; overwriting keeps the original position.

use super::{merge_fields, Document, DocumentStore, StoreError, StoreResult, StoredDocument};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct State {
    collections: BTreeMap<String, Vec<StoredDocument>>,
    offline: bool,
}

/// Thread-safe in-memory implementation of [`DocumentStore`].
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<State>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, every operation fails with `StoreError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Number of documents in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.lock()
            .collections
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn online(&self) -> StoreResult<MutexGuard<'_, State>> {
        let state = self.lock();
        if state.offline {
            return Err(StoreError::Unavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(state)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let state = self.online()?;
        Ok(state
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let state = self.online()?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| doc.id == id))
            .map(|doc| doc.fields.clone()))
    }

    fn set(&self, collection: &str, id: &str, document: &Document) -> StoreResult<()> {
        let mut state = self.online()?;
        let docs = state.collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => existing.fields = document.clone(),
            None => docs.push(StoredDocument {
                id: id.to_string(),
                fields: document.clone(),
            }),
        }
        Ok(())
    }

    fn merge(&self, collection: &str, id: &str, fields: &Document) -> StoreResult<()> {
        let mut state = self.online()?;
        let existing = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        merge_fields(&mut existing.fields, fields);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut state = self.online()?;
        if let Some(docs) = state.collections.get_mut(collection) {
            docs.retain(|doc| doc.id != id);
        }
        Ok(())
    }
}
