//! Local persistence shim
//!
//! A minimal key-value store standing in for browser local storage. All
//! failures are swallowed and logged - callers must treat a missing value and
//! a failed read identically. Writes are read-modify-write over a single JSON
//! file and are not transactional; concurrent writers from separate processes
//! are not guarded against.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

/// Storage key holding the encrypted session blob.
pub const SESSION_KEY: &str = "session";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    /// Removes every key, not just the session. See DESIGN.md.
    fn clear_all(&self);
}

/// File-backed store: one JSON object in a single file under the platform
/// data directory.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    const FILE_NAME: &'static str = "okto-store.json";

    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(Self::FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("okto-connector")
    }

    pub fn open_default() -> Self {
        Self::new(&Self::default_dir())
    }

    fn read_map(&self) -> HashMap<String, String> {
        if !self.path.exists() {
            return HashMap::new();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                warn!("storage file {:?} is corrupt, treating as empty: {e}", self.path);
                HashMap::new()
            }),
            Err(e) => {
                warn!("failed to read storage file {:?}: {e}", self.path);
                HashMap::new()
            }
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("failed to create storage dir {parent:?}: {e}");
                return;
            }
        }

        let json = match serde_json::to_string_pretty(map) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize storage map: {e}");
                return;
            }
        };

        if let Err(e) = write_restricted(&self.path, json.as_bytes()) {
            warn!("failed to write storage file {:?}: {e}", self.path);
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        self.read_map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut map = self.read_map();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map);
    }

    fn remove(&self, key: &str) {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map);
        }
    }

    fn clear_all(&self) {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("failed to clear storage file {:?}: {e}", self.path);
            }
        }
    }
}

#[cfg(unix)]
fn write_restricted(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_restricted(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

/// In-memory store for tests and embedding hosts with their own persistence.
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);
    }

    fn clear_all(&self) {
        self.map.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }
}
