use eventdesk_core::{
    Document, DocumentStore, EventBoard, EventDraft, EventId, EventPatch, EventService,
    MemoryDocumentStore, MirrorPolicy, NoticeLevel, RecordingNotifier, StoreError, StoreResult,
    StoredDocument,
};
use serde_json::Value;

fn draft(title: &str) -> EventDraft {
    let mut draft = EventDraft::new(title, "social", "2024-06-01", "18:00");
    draft.body = format!("{title} body");
    draft
}

/// Trims and uppercases titles on write, like a store-side normalizer.
struct NormalizingStore<'a> {
    inner: &'a MemoryDocumentStore,
}

impl NormalizingStore<'_> {
    fn normalize(fields: &Document) -> Document {
        let mut fields = fields.clone();
        if let Some(Value::String(title)) = fields.get_mut("title") {
            *title = title.trim().to_uppercase();
        }
        fields
    }
}

impl DocumentStore for NormalizingStore<'_> {
    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        self.inner.list(collection)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.inner.get(collection, id)
    }

    fn set(&self, collection: &str, id: &str, document: &Document) -> StoreResult<()> {
        self.inner.set(collection, id, &Self::normalize(document))
    }

    fn merge(&self, collection: &str, id: &str, fields: &Document) -> StoreResult<()> {
        self.inner.merge(collection, id, &Self::normalize(fields))
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.inner.delete(collection, id)
    }
}

/// Accepts writes but fails every single-record read.
struct WriteOnlyStore<'a> {
    inner: &'a MemoryDocumentStore,
}

impl DocumentStore for WriteOnlyStore<'_> {
    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        self.inner.list(collection)
    }

    fn get(&self, _collection: &str, _id: &str) -> StoreResult<Option<Document>> {
        Err(StoreError::Unavailable("reads are down".to_string()))
    }

    fn set(&self, collection: &str, id: &str, document: &Document) -> StoreResult<()> {
        self.inner.set(collection, id, document)
    }

    fn merge(&self, collection: &str, id: &str, fields: &Document) -> StoreResult<()> {
        self.inner.merge(collection, id, fields)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.inner.delete(collection, id)
    }
}

#[test]
fn hydrate_loads_existing_records() {
    let store = MemoryDocumentStore::new();
    let service = EventService::with_notifier(&store, RecordingNotifier::new());
    service.create(&draft("First")).unwrap();
    service.create(&draft("Second")).unwrap();

    let mut board = EventBoard::new();
    assert!(board.is_empty());
    assert_eq!(board.hydrate(&service).unwrap(), 2);
    assert_eq!(board.len(), 2);
    assert_eq!(board.events()[0].title(), "First");
    assert_eq!(board.events()[1].title(), "Second");
}

#[test]
fn successful_writes_update_the_mirror_and_notify_success() {
    let store = MemoryDocumentStore::new();
    let service = EventService::with_notifier(&store, RecordingNotifier::new());
    let mut board = EventBoard::new();
    board.hydrate(&service).unwrap();

    let id = board.create(&service, draft("Picnic")).unwrap();
    assert_eq!(board.get(&id).unwrap().draft, draft("Picnic"));

    let patch = EventPatch {
        location: Some("Riverside".to_string()),
        ..EventPatch::default()
    };
    board.update(&service, &id, &patch).unwrap();
    assert_eq!(board.get(&id).unwrap().draft.location, "Riverside");

    board.delete(&service, &id).unwrap();
    assert!(board.get(&id).is_none());
    assert!(board.is_empty());

    let notices = service.notifier().notices();
    let messages: Vec<&str> = notices.iter().map(|notice| notice.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Event created successfully",
            "Event updated successfully",
            "Event deleted successfully",
        ]
    );
    assert!(notices.iter().all(|notice| notice.level == NoticeLevel::Success));
}

#[test]
fn failed_writes_leave_the_mirror_untouched_and_notify_once() {
    let store = MemoryDocumentStore::new();
    let service = EventService::with_notifier(&store, RecordingNotifier::new());
    let mut board = EventBoard::new();
    let id = board.create(&service, draft("Keep me")).unwrap();
    let before = board.events().to_vec();
    service.notifier().drain();

    store.set_offline(true);
    assert!(board.create(&service, draft("Lost")).is_err());
    let patch = EventPatch {
        title: Some("Renamed".to_string()),
        ..EventPatch::default()
    };
    assert!(board.update(&service, &id, &patch).is_err());
    assert!(board.delete(&service, &id).is_err());
    assert!(board.hydrate(&service).is_err());

    assert_eq!(board.events(), before.as_slice());
    let notices = service.notifier().notices();
    assert_eq!(notices.len(), 4);
    assert!(notices.iter().all(|notice| notice.level == NoticeLevel::Error));
}

#[test]
fn update_of_unmirrored_record_still_writes_through() {
    let store = MemoryDocumentStore::new();
    let service = EventService::with_notifier(&store, RecordingNotifier::new());
    let id = service.create(&draft("Elsewhere")).unwrap();

    let mut board = EventBoard::new();
    let patch = EventPatch {
        time: Some("20:00".to_string()),
        ..EventPatch::default()
    };
    board.update(&service, &id, &patch).unwrap();

    assert!(board.is_empty());
    assert_eq!(service.get(&id).unwrap().unwrap().draft.time, "20:00");
}

#[test]
fn optimistic_mirror_keeps_submitted_data_when_store_rewrites_it() {
    let memory = MemoryDocumentStore::new();
    let service = EventService::with_notifier(
        NormalizingStore { inner: &memory },
        RecordingNotifier::new(),
    );
    let mut board = EventBoard::new();

    let id = board.create(&service, draft(" quiz night ")).unwrap();

    assert_eq!(board.get(&id).unwrap().title(), " quiz night ");
    assert_eq!(service.get(&id).unwrap().unwrap().title(), "QUIZ NIGHT");
}

#[test]
fn refetch_mirror_follows_the_stored_record() {
    let memory = MemoryDocumentStore::new();
    let service = EventService::with_notifier(
        NormalizingStore { inner: &memory },
        RecordingNotifier::new(),
    );
    let mut board = EventBoard::with_policy(MirrorPolicy::Refetch);
    assert_eq!(board.policy(), MirrorPolicy::Refetch);

    let id = board.create(&service, draft(" quiz night ")).unwrap();
    assert_eq!(board.get(&id).unwrap().title(), "QUIZ NIGHT");

    let patch = EventPatch {
        title: Some("trivia".to_string()),
        ..EventPatch::default()
    };
    board.update(&service, &id, &patch).unwrap();
    assert_eq!(board.get(&id).unwrap().title(), "TRIVIA");
}

#[test]
fn title_keyed_overwrite_replaces_the_mirrored_record() {
    let store = MemoryDocumentStore::new();
    let service = EventService::with_notifier(&store, RecordingNotifier::new())
        .with_id_strategy(eventdesk_core::IdStrategy::Title);
    let mut board = EventBoard::new();

    board.create(&service, draft("Meetup")).unwrap();
    let mut second = draft("Meetup");
    second.location = "Cafe".to_string();
    board.create(&service, second).unwrap();

    assert_eq!(board.len(), 1);
    let mirrored = board.get(&EventId::new("Meetup")).unwrap();
    assert_eq!(mirrored.draft.location, "Cafe");
}

#[test]
fn refetch_failure_after_a_successful_write_only_reports_success() {
    let memory = MemoryDocumentStore::new();
    let service = EventService::with_notifier(
        WriteOnlyStore { inner: &memory },
        RecordingNotifier::new(),
    );
    let mut board = EventBoard::with_policy(MirrorPolicy::Refetch);

    let id = board.create(&service, draft("Offsite")).unwrap();
    assert_eq!(board.get(&id).unwrap().draft, draft("Offsite"));
    assert_eq!(memory.len("Events"), 1);

    let patch = EventPatch {
        location: Some("Harbour".to_string()),
        ..EventPatch::default()
    };
    board.update(&service, &id, &patch).unwrap();
    assert_eq!(board.get(&id).unwrap().draft.location, "Harbour");

    let notices = service.notifier().notices();
    assert!(service.notifier().errors().is_empty());
    let messages: Vec<&str> = notices.iter().map(|notice| notice.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["Event created successfully", "Event updated successfully"]
    );
}
