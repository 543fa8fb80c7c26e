//! Hosted Firestore document store over the REST v1 API.
//!
//! # Responsibility
//! - Map the five store primitives onto Firestore document endpoints.
//! - Translate HTTP failures into [`StoreError`] without retrying.
//!
//! # Invariants
//! - `set` is a mask-less PATCH: full replace, creating when missing.
//! - `merge` sends one `updateMask.fieldPaths` per supplied field and requires
//!   the document to exist.
//! - `list` follows page tokens until the collection is exhausted.

use super::firestore_value::{decode_fields, encode_fields};
use super::{Document, DocumentStore, StoreError, StoreResult, StoredDocument};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};

pub const DEFAULT_FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";
const LIST_PAGE_SIZE: u32 = 300;

/// Connection parameters for [`FirestoreDocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// Web API key appended as `key=`; omitted when `None`.
    pub api_key: Option<String>,
    pub database: String,
    /// Base URL up to and including the API version segment.
    pub endpoint: String,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: None,
            database: DEFAULT_DATABASE.to_string(),
            endpoint: DEFAULT_FIRESTORE_ENDPOINT.to_string(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Firestore implementation of [`DocumentStore`].
pub struct FirestoreDocumentStore {
    client: Client,
    base: Url,
    config: FirestoreConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

impl FirestoreDocumentStore {
    pub fn new(config: FirestoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("eventdesk/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(client, config)
    }

    /// Builds the store on a caller-configured HTTP client.
    pub fn with_client(client: Client, config: FirestoreConfig) -> StoreResult<Self> {
        if config.project_id.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "Firestore project id is empty".to_string(),
            ));
        }
        let base = Url::parse(config.endpoint.trim()).map_err(|err| {
            StoreError::InvalidConfig(format!(
                "invalid Firestore endpoint `{}`: {err}",
                config.endpoint
            ))
        })?;
        if base.cannot_be_a_base() {
            return Err(StoreError::InvalidConfig(format!(
                "Firestore endpoint `{}` cannot be a base URL",
                config.endpoint
            )));
        }
        Ok(Self {
            client,
            base,
            config,
        })
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    /// URL of a collection (`id = None`) or a single document.
    fn document_url(&self, collection: &str, id: Option<&str>) -> StoreResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                StoreError::InvalidConfig("Firestore endpoint cannot be a base URL".to_string())
            })?;
            segments.pop_if_empty().extend([
                "projects",
                self.config.project_id.as_str(),
                "databases",
                self.config.database.as_str(),
                "documents",
                collection,
            ]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        if let Some(api_key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("key", api_key);
        }
        Ok(url)
    }

    fn send(&self, method: &str, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send()?;
        debug!(
            "event=firestore_request module=store method={method} status={}",
            response.status().as_u16()
        );
        Ok(response)
    }
}

impl DocumentStore for FirestoreDocumentStore {
    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.document_url(collection, None)?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &LIST_PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
            }

            let response = ensure_success(self.send("GET", self.client.get(url))?)?;
            let page: ListResponse = response.json()?;
            for raw in page.documents {
                documents.push(StoredDocument {
                    id: document_id(&raw.name)?,
                    fields: decode_fields(&raw.fields)?,
                });
            }

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(documents)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let url = self.document_url(collection, Some(id))?;
        let response = self.send("GET", self.client.get(url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawDocument = ensure_success(response)?.json()?;
        decode_fields(&raw.fields).map(Some)
    }

    fn set(&self, collection: &str, id: &str, document: &Document) -> StoreResult<()> {
        let url = self.document_url(collection, Some(id))?;
        let body = json!({ "fields": encode_fields(document) });
        ensure_success(self.send("PATCH", self.client.patch(url).json(&body))?)?;
        Ok(())
    }

    fn merge(&self, collection: &str, id: &str, fields: &Document) -> StoreResult<()> {
        if fields.is_empty() {
            // A mask-less PATCH would wipe the document.
            return match self.get(collection, id)? {
                Some(_) => Ok(()),
                None => Err(StoreError::not_found(collection, id)),
            };
        }

        let mut url = self.document_url(collection, Some(id))?;
        {
            let mut query = url.query_pairs_mut();
            for key in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &field_path(key));
            }
            query.append_pair("currentDocument.exists", "true");
        }

        let body = json!({ "fields": encode_fields(fields) });
        let response = self.send("PATCH", self.client.patch(url).json(&body))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, id));
        }
        ensure_success(response)?;
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let url = self.document_url(collection, Some(id))?;
        let response = self.send("DELETE", self.client.delete(url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        ensure_success(response)?;
        Ok(())
    }
}

fn ensure_success(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(StoreError::Http {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if envelope.error.status.is_empty() => envelope.error.message,
        Ok(envelope) => format!("{}: {}", envelope.error.status, envelope.error.message),
        Err(_) => body.trim().to_string(),
    }
}

fn document_id(name: &str) -> StoreResult<String> {
    match name.rsplit('/').next() {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(StoreError::InvalidData(format!(
            "document name `{name}` has no identifier"
        ))),
    }
}

/// Quotes a top-level field name for `updateMask.fieldPaths`.
fn field_path(name: &str) -> String {
    let mut chars = name.chars();
    let simple = matches!(chars.next(), Some(first) if first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric());
    if simple {
        return name.to_string();
    }
    let escaped = name.replace('\\', "\\\\").replace('`', "\\`");
    format!("`{escaped}`")
}
