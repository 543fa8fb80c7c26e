//! Event record model.
//!
//! # Responsibility
//! - Define draft, persisted and partial-update shapes for event records.
//! - Keep the document wire names (`imageUrl`, `contact5`, `tag`) stable.
//!
//! # Invariants
//! - `title`, `body`, `category`, `date` and `time` are non-blank on every
//!   validated draft.
//! - `tag` keeps insertion order and allows duplicates.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Document identifier of a persisted event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Mandatory field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Title,
    Body,
    Category,
    Date,
    Time,
}

impl RequiredField {
    /// Wire name of the field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::Category => "category",
            Self::Date => "date",
            Self::Time => "time",
        }
    }
}

/// Validation error for event drafts and patches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventValidationError {
    /// A mandatory field is empty or whitespace only.
    MissingField(RequiredField),
    /// A tag is empty or whitespace only.
    BlankTag { index: usize },
    /// Value cannot be used as a document identifier.
    InvalidIdentifier(String),
}

impl Display for EventValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "required field `{}` is blank", field.as_str()),
            Self::BlankTag { index } => write!(f, "tag at index {index} is blank"),
            Self::InvalidIdentifier(value) => {
                write!(f, "`{value}` cannot be used as a document identifier")
            }
        }
    }
}

impl Error for EventValidationError {}

/// Event record that has not been persisted yet.
///
/// This is also the exact shape of a stored document body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDraft {
    pub title: String,
    pub body: String,
    pub category: String,
    pub contact: String,
    pub contact5: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub link: String,
    pub image_url: String,
    pub tag: Vec<String>,
}

impl EventDraft {
    /// Creates a draft with the scheduling fields set and everything else empty.
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            date: date.into(),
            time: time.into(),
            ..Self::default()
        }
    }

    /// Checks that all mandatory fields are present.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        let required = [
            (RequiredField::Title, &self.title),
            (RequiredField::Body, &self.body),
            (RequiredField::Category, &self.category),
            (RequiredField::Date, &self.date),
            (RequiredField::Time, &self.time),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(EventValidationError::MissingField(field));
            }
        }
        validate_tags(&self.tag)
    }

    /// Appends one tag. Input is trimmed; blank input is ignored.
    ///
    /// Returns whether a tag was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.tag.push(trimmed.to_string());
        true
    }

    /// Removes every tag equal to `tag`, returning how many were removed.
    pub fn remove_tag(&mut self, tag: &str) -> usize {
        let before = self.tag.len();
        self.tag.retain(|existing| existing != tag);
        before - self.tag.len()
    }

    /// Attaches a store identifier, producing a persisted record.
    pub fn into_event(self, id: EventId) -> Event {
        Event { id, draft: self }
    }
}

/// Persisted event record.
///
/// Serializes as `{ "id": ..., ...draft fields }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    #[serde(flatten)]
    pub draft: EventDraft,
}

impl Event {
    pub fn new(id: impl Into<EventId>, draft: EventDraft) -> Self {
        Self {
            id: id.into(),
            draft,
        }
    }

    pub fn title(&self) -> &str {
        self.draft.title.as_str()
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, patch: &EventPatch) {
        patch.apply_to(&mut self.draft);
    }
}

/// Partial update of an event record.
///
/// `None` fields are left untouched by the store merge. Only supplied fields
/// are serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Vec<String>>,
}

impl EventPatch {
    /// Builds a patch that overwrites every field, as the edit form does.
    pub fn replace_all(draft: EventDraft) -> Self {
        Self {
            title: Some(draft.title),
            body: Some(draft.body),
            category: Some(draft.category),
            contact: Some(draft.contact),
            contact5: Some(draft.contact5),
            date: Some(draft.date),
            time: Some(draft.time),
            location: Some(draft.location),
            link: Some(draft.link),
            image_url: Some(draft.image_url),
            tag: Some(draft.tag),
        }
    }

    /// Returns true when no field is supplied.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Checks supplied mandatory fields. Absent fields are not checked.
    pub fn validate(&self) -> Result<(), EventValidationError> {
        let required = [
            (RequiredField::Title, &self.title),
            (RequiredField::Body, &self.body),
            (RequiredField::Category, &self.category),
            (RequiredField::Date, &self.date),
            (RequiredField::Time, &self.time),
        ];
        for (field, value) in required {
            if matches!(value, Some(value) if value.trim().is_empty()) {
                return Err(EventValidationError::MissingField(field));
            }
        }
        match &self.tag {
            Some(tags) => validate_tags(tags),
            None => Ok(()),
        }
    }

    /// Overwrites the supplied fields of `draft`.
    pub fn apply_to(&self, draft: &mut EventDraft) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(value) = value {
                target.clone_from(value);
            }
        }

        set(&mut draft.title, &self.title);
        set(&mut draft.body, &self.body);
        set(&mut draft.category, &self.category);
        set(&mut draft.contact, &self.contact);
        set(&mut draft.contact5, &self.contact5);
        set(&mut draft.date, &self.date);
        set(&mut draft.time, &self.time);
        set(&mut draft.location, &self.location);
        set(&mut draft.link, &self.link);
        set(&mut draft.image_url, &self.image_url);
        if let Some(tags) = &self.tag {
            draft.tag.clone_from(tags);
        }
    }
}

fn validate_tags(tags: &[String]) -> Result<(), EventValidationError> {
    match tags.iter().position(|tag| tag.trim().is_empty()) {
        Some(index) => Err(EventValidationError::BlankTag { index }),
        None => Ok(()),
    }
}
