//! Runtime settings from the process environment.
//!
//! # Responsibility
//! - Collect store connection parameters and service options at startup.
//! - Optionally seed the environment from a `.env` file.
//!
//! # Invariants
//! - Firebase connection parameters are passed through unvalidated.
//! - Every key is also accepted with a `VITE_` prefix, for existing web
//!   deployments' `.env` files.

use crate::logging::default_log_level;
use crate::service::event_service::{IdStrategy, EVENTS_COLLECTION};
use crate::store::FirestoreConfig;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const VITE_PREFIX: &str = "VITE_";

/// Configuration loading failure.
#[derive(Debug)]
pub enum ConfigError {
    EnvFile(dotenvy::Error),
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
    Missing(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvFile(err) => write!(f, "failed to read env file: {err}"),
            Self::InvalidValue {
                key,
                value,
                expected,
            } => write!(f, "invalid {key} `{value}`; expected {expected}"),
            Self::Missing(key) => write!(f, "missing required setting {key}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EnvFile(err) => Some(err),
            Self::InvalidValue { .. } | Self::Missing(_) => None,
        }
    }
}

/// Which document store backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Firestore,
    Sqlite,
    Memory,
}

impl StoreBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "firestore" => Some(Self::Firestore),
            "sqlite" => Some(Self::Sqlite),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Firebase web-app parameters, kept opaque.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirebaseSettings {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub database_url: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub measurement_id: Option<String>,
}

/// Settings for one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub firebase: FirebaseSettings,
    pub backend: StoreBackend,
    /// SQLite database file for `StoreBackend::Sqlite`.
    pub store_path: Option<PathBuf>,
    /// Overrides the Firestore REST base URL (e.g. an emulator).
    pub firestore_endpoint: Option<String>,
    pub collection: String,
    pub id_strategy: IdStrategy,
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Settings {
    /// Loads settings from the process environment.
    ///
    /// With `env_file`, that file must exist and is loaded first. Without it,
    /// a `.env` in the working directory is loaded when present.
    /// Variables already set in the process win over file values.
    pub fn from_env(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(ConfigError::EnvFile)?;
            }
            None => match dotenvy::dotenv() {
                Ok(_) => {}
                Err(err) if err.not_found() => {}
                Err(err) => return Err(ConfigError::EnvFile(err)),
            },
        }
        Self::from_vars(std::env::vars())
    }

    /// Builds settings from explicit key/value pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        let lookup = |key: &str| -> Option<String> {
            vars.get(key)
                .or_else(|| vars.get(&format!("{VITE_PREFIX}{key}")))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let firebase = FirebaseSettings {
            api_key: lookup("API_KEY"),
            auth_domain: lookup("AUTH_DOMAIN"),
            database_url: lookup("DATABASE_URL"),
            project_id: lookup("PROJECT_ID"),
            storage_bucket: lookup("STORAGE_BUCKET"),
            messaging_sender_id: lookup("MESSAGING_SENDER_ID"),
            app_id: lookup("APP_ID"),
            measurement_id: lookup("MEASUREMENT_ID"),
        };

        let backend = match lookup("STORE_BACKEND") {
            Some(value) => StoreBackend::parse(&value).ok_or(ConfigError::InvalidValue {
                key: "STORE_BACKEND",
                value,
                expected: "firestore|sqlite|memory",
            })?,
            None => StoreBackend::default(),
        };

        let id_strategy = match lookup("EVENT_ID_STRATEGY") {
            Some(value) => IdStrategy::parse(&value).ok_or(ConfigError::InvalidValue {
                key: "EVENT_ID_STRATEGY",
                value,
                expected: "random|title",
            })?,
            None => IdStrategy::default(),
        };

        Ok(Self {
            firebase,
            backend,
            store_path: lookup("STORE_PATH").map(PathBuf::from),
            firestore_endpoint: lookup("FIRESTORE_ENDPOINT"),
            collection: lookup("EVENT_COLLECTION")
                .unwrap_or_else(|| EVENTS_COLLECTION.to_string()),
            id_strategy,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| default_log_level().to_string()),
            log_dir: lookup("LOG_DIR").map(PathBuf::from),
        })
    }

    /// Firestore connection built from the Firebase parameters.
    pub fn firestore_config(&self) -> Result<FirestoreConfig, ConfigError> {
        let project_id = self
            .firebase
            .project_id
            .clone()
            .ok_or(ConfigError::Missing("PROJECT_ID"))?;
        let mut config = FirestoreConfig::new(project_id);
        if let Some(api_key) = &self.firebase.api_key {
            config = config.with_api_key(api_key.clone());
        }
        if let Some(endpoint) = &self.firestore_endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        Ok(config)
    }

    /// SQLite file for the local backend.
    pub fn sqlite_path(&self) -> Result<&Path, ConfigError> {
        self.store_path
            .as_deref()
            .ok_or(ConfigError::Missing("STORE_PATH"))
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Settings, StoreBackend};
    use crate::service::event_service::IdStrategy;

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let settings = Settings::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(settings.backend, StoreBackend::Firestore);
        assert_eq!(settings.collection, "Events");
        assert_eq!(settings.id_strategy, IdStrategy::Random);
        assert!(settings.log_dir.is_none());
        assert!(matches!(
            settings.firestore_config().unwrap_err(),
            ConfigError::Missing("PROJECT_ID")
        ));
    }

    #[test]
    fn vite_prefixed_keys_are_accepted_and_plain_keys_win() {
        let settings = Settings::from_vars([
            ("VITE_PROJECT_ID", "from-vite"),
            ("VITE_API_KEY", "vite-key"),
            ("API_KEY", "plain-key"),
            ("VITE_MEASUREMENT_ID", "G-123"),
        ])
        .unwrap();
        assert_eq!(settings.firebase.project_id.as_deref(), Some("from-vite"));
        assert_eq!(settings.firebase.api_key.as_deref(), Some("plain-key"));
        assert_eq!(settings.firebase.measurement_id.as_deref(), Some("G-123"));

        let firestore = settings.firestore_config().unwrap();
        assert_eq!(firestore.project_id, "from-vite");
        assert_eq!(firestore.api_key.as_deref(), Some("plain-key"));
    }

    #[test]
    fn backend_and_strategy_are_parsed() {
        let settings = Settings::from_vars([
            ("STORE_BACKEND", "SQLite"),
            ("STORE_PATH", "/tmp/events.db"),
            ("EVENT_ID_STRATEGY", "title"),
            ("EVENT_COLLECTION", "Meetups"),
        ])
        .unwrap();
        assert_eq!(settings.backend, StoreBackend::Sqlite);
        assert_eq!(settings.sqlite_path().unwrap().to_str(), Some("/tmp/events.db"));
        assert_eq!(settings.id_strategy, IdStrategy::Title);
        assert_eq!(settings.collection, "Meetups");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = Settings::from_vars([("STORE_BACKEND", "postgres")]).unwrap_err();
        assert!(err.to_string().contains("firestore|sqlite|memory"));
    }
}
