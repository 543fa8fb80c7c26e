//! Event record access layer.
//!
//! # Responsibility
//! - Translate event records into exactly one document store call each.
//! - Validate every write before it reaches the store.
//! - Report each failure once through the notifier, then return it.
//!
//! # Invariants
//! - No caching, batching, retries or cross-call transactions.
//! - `create` never checks for an existing document; the store overwrites.
//! - `delete` of a missing identifier is a success.
//! - Stored document bodies never contain `id`.

use crate::model::event::{Event, EventDraft, EventId, EventPatch, EventValidationError};
use crate::notify::{LogNotifier, Notice, Notifier};
use crate::store::{Document, DocumentStore, StoreError};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Default collection holding event documents.
pub const EVENTS_COLLECTION: &str = "Events";

pub type ServiceResult<T> = Result<T, EventServiceError>;

/// How `create` picks the document identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdStrategy {
    /// Fresh UUID v4 per create. Titles stay ordinary mutable fields.
    #[default]
    Random,
    /// The draft title verbatim. Same-titled creates overwrite each other.
    Title,
}

impl IdStrategy {
    /// Parses `random` or `title` (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "random" | "uuid" => Some(Self::Random),
            "title" => Some(Self::Title),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Title => "title",
        }
    }

    fn assign(self, draft: &EventDraft) -> Result<EventId, EventValidationError> {
        match self {
            Self::Random => Ok(EventId::new(Uuid::new_v4().to_string())),
            Self::Title => {
                let title = draft.title.as_str();
                if title.contains('/') || title == "." || title == ".." {
                    return Err(EventValidationError::InvalidIdentifier(title.to_string()));
                }
                Ok(EventId::new(title))
            }
        }
    }
}

/// Access-layer failure.
#[derive(Debug)]
pub enum EventServiceError {
    /// Rejected before any store call.
    Invalid(EventValidationError),
    /// `list_all` or `get` failed.
    Fetch(StoreError),
    Create(StoreError),
    Update(StoreError),
    Delete(StoreError),
}

impl EventServiceError {
    /// Underlying store failure, when there is one.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Invalid(_) => None,
            Self::Fetch(err) | Self::Create(err) | Self::Update(err) | Self::Delete(err) => {
                Some(err)
            }
        }
    }

    /// Whether the store reported the target document as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self.store_error(), Some(StoreError::NotFound { .. }))
    }
}

impl Display for EventServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "invalid event: {err}"),
            Self::Fetch(err) => write!(f, "fetch failed: {err}"),
            Self::Create(err) => write!(f, "create failed: {err}"),
            Self::Update(err) => write!(f, "update failed: {err}"),
            Self::Delete(err) => write!(f, "delete failed: {err}"),
        }
    }
}

impl Error for EventServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Fetch(err) | Self::Create(err) | Self::Update(err) | Self::Delete(err) => {
                Some(err)
            }
        }
    }
}

impl From<EventValidationError> for EventServiceError {
    fn from(value: EventValidationError) -> Self {
        Self::Invalid(value)
    }
}

/// Stateless façade over an injected [`DocumentStore`].
pub struct EventService<S: DocumentStore, N: Notifier = LogNotifier> {
    store: S,
    notifier: N,
    collection: String,
    id_strategy: IdStrategy,
}

impl<S: DocumentStore> EventService<S> {
    /// Creates a service that reports failures to the log only.
    pub fn new(store: S) -> Self {
        Self::with_notifier(store, LogNotifier)
    }
}

impl<S: DocumentStore, N: Notifier> EventService<S, N> {
    pub fn with_notifier(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier,
            collection: EVENTS_COLLECTION.to_string(),
            id_strategy: IdStrategy::default(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    pub fn id_strategy(&self) -> IdStrategy {
        self.id_strategy
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetches every event in the collection, in store order.
    ///
    /// Documents that do not decode as event records are skipped with a
    /// warning; only a store failure fails the call.
    pub fn list_all(&self) -> ServiceResult<Vec<Event>> {
        let started_at = Instant::now();
        let documents = self.store.list(&self.collection).map_err(|err| {
            self.fail(
                "event_list",
                format!("Error fetching documents: {err}"),
                EventServiceError::Fetch(err),
                started_at,
            )
        })?;

        let total = documents.len();
        let events: Vec<Event> = documents
            .into_iter()
            .filter_map(|document| {
                let id = document.id.clone();
                match decode_event(document.id, document.fields) {
                    Ok(event) => Some(event),
                    Err(err) => {
                        warn!(
                            "event=event_list module=service status=skipped collection={} id={} error_code={} error={}",
                            self.collection,
                            id,
                            err.code(),
                            err
                        );
                        None
                    }
                }
            })
            .collect();
        if events.len() < total {
            warn!(
                "event=event_list module=service status=partial collection={} skipped={}",
                self.collection,
                total - events.len()
            );
        }

        info!(
            "event=event_list module=service status=ok collection={} count={} duration_ms={}",
            self.collection,
            events.len(),
            started_at.elapsed().as_millis()
        );
        Ok(events)
    }

    /// Fetches one event. A missing document is `Ok(None)`.
    pub fn get(&self, id: &EventId) -> ServiceResult<Option<Event>> {
        let started_at = Instant::now();
        let event = self.read_quiet(id).map_err(|err| {
            self.fail(
                "event_get",
                format!("Error fetching document with ID {id}: {err}"),
                EventServiceError::Fetch(err),
                started_at,
            )
        })?;

        info!(
            "event=event_get module=service status=ok id={} found={} duration_ms={}",
            id,
            event.is_some(),
            started_at.elapsed().as_millis()
        );
        Ok(event)
    }

    /// Reads one event without logging or notifying failures.
    pub(crate) fn read_quiet(&self, id: &EventId) -> Result<Option<Event>, StoreError> {
        self.store
            .get(&self.collection, id.as_str())?
            .map(|fields| decode_event(id.as_str().to_string(), fields))
            .transpose()
    }

    /// Persists a draft and returns the identifier it was written under.
    ///
    /// # Contract
    /// - The draft must pass `EventDraft::validate()`.
    /// - Any document already stored under the chosen identifier is replaced.
    pub fn create(&self, draft: &EventDraft) -> ServiceResult<EventId> {
        let started_at = Instant::now();
        let id = draft
            .validate()
            .and_then(|()| self.id_strategy.assign(draft))
            .map_err(|err| {
                self.fail(
                    "event_create",
                    format!("Error creating document: {err}"),
                    EventServiceError::Invalid(err),
                    started_at,
                )
            })?;

        to_document(draft)
            .and_then(|document| self.store.set(&self.collection, id.as_str(), &document))
            .map_err(|err| {
                self.fail(
                    "event_create",
                    format!("Error creating document: {err}"),
                    EventServiceError::Create(err),
                    started_at,
                )
            })?;

        info!(
            "event=event_create module=service status=ok id={} id_strategy={} duration_ms={}",
            id,
            self.id_strategy.as_str(),
            started_at.elapsed().as_millis()
        );
        Ok(id)
    }

    /// Merges the supplied fields into an existing event.
    ///
    /// Existence is not checked up front; the store's not-found failure is
    /// returned as `EventServiceError::Update`.
    pub fn update(&self, id: &EventId, patch: &EventPatch) -> ServiceResult<()> {
        let started_at = Instant::now();
        patch.validate().map_err(|err| {
            self.fail(
                "event_update",
                format!("Error updating document with ID {id}: {err}"),
                EventServiceError::Invalid(err),
                started_at,
            )
        })?;

        to_document(patch)
            .and_then(|fields| self.store.merge(&self.collection, id.as_str(), &fields))
            .map_err(|err| {
                self.fail(
                    "event_update",
                    format!("Error updating document with ID {id}: {err}"),
                    EventServiceError::Update(err),
                    started_at,
                )
            })?;

        info!(
            "event=event_update module=service status=ok id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    /// Removes an event. Removing a missing identifier succeeds.
    pub fn delete(&self, id: &EventId) -> ServiceResult<()> {
        let started_at = Instant::now();
        self.store
            .delete(&self.collection, id.as_str())
            .map_err(|err| {
                self.fail(
                    "event_delete",
                    format!("Error deleting document with ID {id}: {err}"),
                    EventServiceError::Delete(err),
                    started_at,
                )
            })?;

        info!(
            "event=event_delete module=service status=ok id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn fail(
        &self,
        event: &str,
        message: String,
        err: EventServiceError,
        started_at: Instant,
    ) -> EventServiceError {
        let error_code = err.store_error().map_or("invalid", StoreError::code);
        error!(
            "event={event} module=service status=error collection={} duration_ms={} error_code={error_code} error={err}",
            self.collection,
            started_at.elapsed().as_millis(),
        );
        self.notifier.notify(Notice::error(message));
        err
    }
}

fn to_document(value: &impl Serialize) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::InvalidData(format!(
            "event did not serialize to an object: {other}"
        ))),
    }
}

fn decode_event(id: String, fields: Document) -> Result<Event, StoreError> {
    let draft: EventDraft = serde_json::from_value(Value::Object(fields)).map_err(|err| {
        StoreError::InvalidData(format!("document `{id}` is not an event record: {err}"))
    })?;
    Ok(draft.into_event(EventId::new(id)))
}

#[cfg(test)]
mod tests {
    use super::IdStrategy;
    use crate::model::event::{EventDraft, EventValidationError};

    #[test]
    fn id_strategy_parses_known_values() {
        assert_eq!(IdStrategy::parse(" Title "), Some(IdStrategy::Title));
        assert_eq!(IdStrategy::parse("random"), Some(IdStrategy::Random));
        assert_eq!(IdStrategy::parse("serial"), None);
    }

    #[test]
    fn title_strategy_rejects_path_like_titles() {
        let draft = EventDraft::new("a/b", "social", "2024-06-01", "18:00");
        assert_eq!(
            IdStrategy::Title.assign(&draft).unwrap_err(),
            EventValidationError::InvalidIdentifier("a/b".to_string())
        );
    }

    #[test]
    fn random_strategy_ignores_title() {
        let draft = EventDraft::new("Meetup", "social", "2024-06-01", "18:00");
        let first = IdStrategy::Random.assign(&draft).unwrap();
        let second = IdStrategy::Random.assign(&draft).unwrap();
        assert_ne!(first, second);
        assert_ne!(first.as_str(), "Meetup");
    }
}
