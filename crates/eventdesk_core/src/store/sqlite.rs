//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist documents as JSON text rows keyed by `(collection, doc_id)`.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - Only connections at the latest schema version are accepted.
//! - `list` returns documents in first-write order; overwrites keep their row.
//! - Read paths reject bodies that are not JSON objects.

use super::{merge_fields, Document, DocumentStore, StoreError, StoreResult, StoredDocument};
use crate::db::migrations::ensure_latest;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

/// SQLite implementation of [`DocumentStore`].
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_latest(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn list(&self, collection: &str) -> StoreResult<Vec<StoredDocument>> {
        let mut stmt = self.conn.prepare(
            "SELECT doc_id, body
             FROM documents
             WHERE collection = ?1
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([collection])?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            let id: String = row.get("doc_id")?;
            let body: String = row.get("body")?;
            let fields = parse_body(collection, &id, &body)?;
            documents.push(StoredDocument { id, fields });
        }

        Ok(documents)
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| parse_body(collection, id, &body))
            .transpose()
    }

    fn set(&self, collection: &str, id: &str, document: &Document) -> StoreResult<()> {
        let body = serde_json::to_string(document)?;
        self.conn.execute(
            "INSERT INTO documents (collection, doc_id, body)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (collection, doc_id) DO UPDATE SET
                body = excluded.body,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![collection, id, body],
        )?;
        Ok(())
    }

    fn merge(&self, collection: &str, id: &str, fields: &Document) -> StoreResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let body: Option<String> = tx
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(body) = body else {
            return Err(StoreError::not_found(collection, id));
        };

        let mut document = parse_body(collection, id, &body)?;
        merge_fields(&mut document, fields);
        tx.execute(
            "UPDATE documents
             SET
                body = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE collection = ?1 AND doc_id = ?2;",
            params![collection, id, serde_json::to_string(&document)?],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![collection, id],
        )?;
        Ok(())
    }
}

fn parse_body(collection: &str, id: &str, body: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(fields) => Ok(fields),
        other => Err(StoreError::InvalidData(format!(
            "document {collection}/{id} body is not an object: {other}"
        ))),
    }
}
