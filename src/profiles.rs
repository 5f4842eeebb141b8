//! Durable profile metadata store.
//!
//! A single JSON document maps profile identifiers to records carrying at
//! least `profile_id`, `created_at` and `updated_at` (ISO-8601 local time)
//! plus arbitrary caller fields. Every write rewrites the whole file through
//! a temp-file + rename so readers never observe a torn document. The store
//! owns its backing file exclusively; concurrent writers from separate
//! processes are last-write-wins.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::{Map, Value};

use crate::attributes::{user_agent_pool, window_size_pool, window_size_string};
use crate::error::Result;

pub const PROFILES_FILE: &str = "profiles.json";

fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

pub struct ProfileStore {
    path: PathBuf,
    records: Map<String, Value>,
}

impl ProfileStore {
    /// Open (or create) the store backed by `<base_dir>/profiles.json`.
    /// The mapping is always loaded fresh from disk; independent store
    /// instances do not share caches.
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let path = base_dir.as_ref().join(PROFILES_FILE);
        let mut store = ProfileStore {
            path,
            records: Map::new(),
        };
        if !store.path.is_file() {
            store.persist()?;
        }
        let content = fs::read_to_string(&store.path)?;
        store.records = serde_json::from_str(&content)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.records.get(key)
    }

    pub fn records(&self) -> &Map<String, Value> {
        &self.records
    }

    /// Store `value` under `key`, merging in `profile_id = key`. The stored
    /// `created_at` survives rewrites; `updated_at` is refreshed on every
    /// write. Persists synchronously.
    pub fn set(&mut self, key: &str, value: Map<String, Value>) -> Result<()> {
        let now = timestamp();
        let mut record = value;
        record.insert("profile_id".to_string(), Value::String(key.to_string()));

        let created_at = self
            .records
            .get(key)
            .and_then(|existing| existing.get("created_at"))
            .cloned()
            .or_else(|| record.get("created_at").cloned())
            .unwrap_or_else(|| Value::String(now.clone()));
        record.insert("created_at".to_string(), created_at);
        record.insert("updated_at".to_string(), Value::String(now));

        self.records.insert(key.to_string(), Value::Object(record));
        self.persist()
    }

    /// Delete the entry if present; persists.
    pub fn remove(&mut self, key: &str) -> Result<()> {
        if self.records.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    /// Delete the backing file, reset the in-memory mapping and recreate an
    /// empty file.
    pub fn clear(&mut self) -> Result<()> {
        if self.path.is_file() {
            fs::remove_file(&self.path)?;
        }
        self.records = Map::new();
        self.persist()
    }

    /// Create (or refresh) a profile record pinned to its hashed user agent
    /// and window size, so the fingerprint a resolution derives for this
    /// profile is also recorded durably.
    pub fn create_profile(&mut self, name: &str) -> Result<Value> {
        let user_agents = user_agent_pool()?;
        let window_sizes = window_size_pool()?;

        let mut record = Map::new();
        record.insert(
            "user_agent".to_string(),
            Value::String(user_agents.hashed(Some(name)).clone()),
        );
        record.insert(
            "window_size".to_string(),
            Value::String(window_size_string(*window_sizes.hashed(Some(name)))),
        );
        self.set(name, record)?;
        Ok(self.records.get(name).cloned().unwrap_or(Value::Null))
    }

    fn persist(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&Value::Object(self.records.clone()))?;
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}
