use eventdesk_core::{Event, EventDraft, EventId, EventPatch, EventValidationError, RequiredField};
use serde_json::json;

fn meetup() -> EventDraft {
    let mut draft = EventDraft::new("Meetup", "social", "2024-06-01", "18:00");
    draft.body = "Monthly community meetup".to_string();
    draft
}

#[test]
fn complete_draft_passes_validation() {
    assert_eq!(meetup().validate(), Ok(()));
}

#[test]
fn optional_fields_may_stay_empty() {
    let draft = meetup();
    assert!(draft.contact.is_empty());
    assert!(draft.location.is_empty());
    assert!(draft.image_url.is_empty());
    draft.validate().unwrap();
}

#[test]
fn blank_mandatory_fields_are_rejected_in_order() {
    let mut draft = meetup();
    draft.body = "   ".to_string();
    draft.time = String::new();
    assert_eq!(
        draft.validate(),
        Err(EventValidationError::MissingField(RequiredField::Body))
    );

    draft.body = "ok".to_string();
    assert_eq!(
        draft.validate(),
        Err(EventValidationError::MissingField(RequiredField::Time))
    );
}

#[test]
fn blank_tag_is_rejected() {
    let mut draft = meetup();
    draft.tag = vec!["social".to_string(), " ".to_string()];
    assert_eq!(
        draft.validate(),
        Err(EventValidationError::BlankTag { index: 1 })
    );
}

#[test]
fn tags_keep_order_and_duplicates() {
    let mut draft = meetup();
    assert!(draft.add_tag("  outdoor "));
    assert!(draft.add_tag("free"));
    assert!(draft.add_tag("outdoor"));
    assert!(!draft.add_tag("   "));
    assert_eq!(draft.tag, vec!["outdoor", "free", "outdoor"]);

    assert_eq!(draft.remove_tag("outdoor"), 2);
    assert_eq!(draft.remove_tag("missing"), 0);
    assert_eq!(draft.tag, vec!["free"]);
}

#[test]
fn draft_serializes_with_document_field_names() {
    let mut draft = meetup();
    draft.contact5 = "alt@example.com".to_string();
    draft.image_url = "https://example.com/cover.png".to_string();
    draft.tag = vec!["social".to_string()];

    let json = serde_json::to_value(&draft).unwrap();
    assert_eq!(json["imageUrl"], "https://example.com/cover.png");
    assert_eq!(json["contact5"], "alt@example.com");
    assert_eq!(json["tag"], json!(["social"]));
    assert!(json.get("id").is_none());
    assert!(json.get("image_url").is_none());
}

#[test]
fn persisted_event_flattens_id_next_to_fields() {
    let event = Event::new("abc", meetup());
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["id"], "abc");
    assert_eq!(json["title"], "Meetup");

    let decoded: Event = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn patch_serializes_only_supplied_fields() {
    let patch = EventPatch {
        location: Some("Hall B".to_string()),
        image_url: Some(String::new()),
        ..EventPatch::default()
    };
    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(json, json!({ "location": "Hall B", "imageUrl": "" }));
}

#[test]
fn patch_validation_only_checks_supplied_fields() {
    let patch = EventPatch {
        contact: Some(String::new()),
        ..EventPatch::default()
    };
    patch.validate().unwrap();

    let patch = EventPatch {
        title: Some("  ".to_string()),
        ..EventPatch::default()
    };
    assert_eq!(
        patch.validate(),
        Err(EventValidationError::MissingField(RequiredField::Title))
    );
}

#[test]
fn patch_apply_overwrites_exactly_supplied_fields() {
    let mut event = meetup().into_event(EventId::new("m1"));
    let patch = EventPatch {
        time: Some("19:30".to_string()),
        tag: Some(vec!["late".to_string()]),
        ..EventPatch::default()
    };
    event.apply(&patch);

    let mut expected = meetup();
    expected.time = "19:30".to_string();
    expected.tag = vec!["late".to_string()];
    assert_eq!(event.draft, expected);
    assert_eq!(event.id.as_str(), "m1");
}

#[test]
fn replace_all_patch_reproduces_the_draft() {
    let mut draft = meetup();
    draft.location = "Park".to_string();
    let patch = EventPatch::replace_all(draft.clone());
    assert!(!patch.is_empty());

    let mut target = EventDraft::default();
    patch.apply_to(&mut target);
    assert_eq!(target, draft);
}
