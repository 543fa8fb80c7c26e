//! In-memory mirror of the event collection.
//!
//! # Responsibility
//! - Hold the ordered record list a list view renders.
//! - Apply create/update/delete locally only after the store call succeeds.
//!
//! # Invariants
//! - A failed access-layer call leaves the mirror untouched.
//! - Failures are not re-notified here; the access layer already did.
//! - New records are appended, so display order is hydrate order plus
//!   creation order.

use crate::model::event::{Event, EventDraft, EventId, EventPatch};
use crate::notify::{Notice, Notifier};
use crate::service::event_service::{EventService, ServiceResult};
use crate::store::DocumentStore;
use log::{debug, warn};

/// Where the mirror takes a written record from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MirrorPolicy {
    /// Reuse the submitted data. One round trip per write; the mirror can
    /// drift if the store rewrites data on write.
    #[default]
    Optimistic,
    /// Re-read the record after each successful write. Falls back to the
    /// submitted data, with a warning and no notice, when the re-read fails.
    Refetch,
}

/// Ordered, in-memory copy of the event collection.
#[derive(Debug, Default)]
pub struct EventBoard {
    events: Vec<Event>,
    policy: MirrorPolicy,
}

impl EventBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MirrorPolicy) -> Self {
        Self {
            events: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> MirrorPolicy {
        self.policy
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|event| &event.id == id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Replaces the mirror with the store's current contents.
    ///
    /// Returns the number of records loaded.
    pub fn hydrate<S: DocumentStore, N: Notifier>(
        &mut self,
        service: &EventService<S, N>,
    ) -> ServiceResult<usize> {
        self.events = service.list_all()?;
        Ok(self.events.len())
    }

    /// Creates a record and appends it to the mirror.
    pub fn create<S: DocumentStore, N: Notifier>(
        &mut self,
        service: &EventService<S, N>,
        draft: EventDraft,
    ) -> ServiceResult<EventId> {
        let id = service.create(&draft)?;
        let submitted = draft.into_event(id.clone());
        let event = self.confirmed(service, submitted);
        // Title-keyed creates may overwrite a record already on the board.
        self.events.retain(|existing| existing.id != id);
        self.events.push(event);
        service
            .notifier()
            .notify(Notice::success("Event created successfully"));
        Ok(id)
    }

    /// Updates a record and patches its mirrored copy.
    pub fn update<S: DocumentStore, N: Notifier>(
        &mut self,
        service: &EventService<S, N>,
        id: &EventId,
        patch: &EventPatch,
    ) -> ServiceResult<()> {
        service.update(id, patch)?;
        match self.events.iter().position(|event| &event.id == id) {
            Some(index) => {
                let mut submitted = self.events[index].clone();
                submitted.apply(patch);
                let event = self.confirmed(service, submitted);
                self.events[index] = event;
            }
            None => debug!(
                "event=board_update module=board status=skipped reason=not_mirrored id={id}"
            ),
        }
        service
            .notifier()
            .notify(Notice::success("Event updated successfully"));
        Ok(())
    }

    /// Deletes a record and drops it from the mirror.
    pub fn delete<S: DocumentStore, N: Notifier>(
        &mut self,
        service: &EventService<S, N>,
        id: &EventId,
    ) -> ServiceResult<()> {
        service.delete(id)?;
        self.events.retain(|event| &event.id != id);
        service
            .notifier()
            .notify(Notice::success("Event deleted successfully"));
        Ok(())
    }

    fn confirmed<S: DocumentStore, N: Notifier>(
        &self,
        service: &EventService<S, N>,
        submitted: Event,
    ) -> Event {
        if self.policy == MirrorPolicy::Optimistic {
            return submitted;
        }
        // The write already succeeded; a failed re-read is not a user-facing failure.
        match service.read_quiet(&submitted.id) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                warn!(
                    "event=board_refetch module=board status=missing id={}",
                    submitted.id
                );
                submitted
            }
            Err(err) => {
                warn!(
                    "event=board_refetch module=board status=error id={} error_code={} error={}",
                    submitted.id,
                    err.code(),
                    err
                );
                submitted
            }
        }
    }
}
