//! Smoke check for EventDesk core wiring.
//!
//! # Responsibility
//! - Load settings, start logging, open the configured store.
//! - Hydrate a board once and print a deterministic summary.
//!
//! An optional first argument names the `.env` file to load.

use anyhow::{Context, Result};
use eventdesk_core::db::open_db;
use eventdesk_core::{
    init_logging_with, DocumentStore, EventBoard, EventService, FirestoreDocumentStore,
    LogNotifier, MemoryDocumentStore, Settings, SqliteDocumentStore, StoreBackend,
};
use log::info;
use std::path::PathBuf;

fn main() -> Result<()> {
    let env_file = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::from_env(env_file.as_deref()).context("loading settings")?;

    if let Some(log_dir) = &settings.log_dir {
        let log_dir = log_dir
            .to_str()
            .context("LOG_DIR must be valid UTF-8")?;
        init_logging_with(&settings.log_level, log_dir, true)
            .map_err(anyhow::Error::msg)
            .context("initializing logging")?;
    }

    println!("eventdesk_core ping={}", eventdesk_core::ping());
    println!("eventdesk_core version={}", eventdesk_core::core_version());

    match settings.backend {
        StoreBackend::Memory => summarize(MemoryDocumentStore::new(), &settings),
        StoreBackend::Sqlite => {
            let path = settings.sqlite_path()?;
            let conn = open_db(path)
                .with_context(|| format!("opening sqlite store at {}", path.display()))?;
            summarize(SqliteDocumentStore::try_new(&conn)?, &settings)
        }
        StoreBackend::Firestore => {
            let store = FirestoreDocumentStore::new(settings.firestore_config()?)?;
            summarize(store, &settings)
        }
    }
}

fn summarize<S: DocumentStore>(store: S, settings: &Settings) -> Result<()> {
    let service = EventService::with_notifier(store, LogNotifier)
        .with_collection(settings.collection.clone())
        .with_id_strategy(settings.id_strategy);
    let mut board = EventBoard::new();
    let count = board.hydrate(&service)?;

    info!(
        "event=summary module=cli status=ok backend={:?} collection={} count={}",
        settings.backend, settings.collection, count
    );
    println!("eventdesk collection={} events={count}", settings.collection);
    for event in board.events() {
        println!("  {} {} {} {}", event.id, event.draft.date, event.draft.time, event.title());
    }
    Ok(())
}
