use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

// Durable key-value storage behind the auth cache. Reads degrade to
// "absent"; writes are best-effort and never fail an intent.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }
}

// One JSON file under the user data dir, rewritten on every set/remove.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl FileStorage {
    pub fn open(path: PathBuf) -> FileStorage {
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        FileStorage { path, values }
    }

    pub fn open_default() -> FileStorage {
        let dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        FileStorage::open(dir.join("taskboard-sync").join("session.json"))
    }

    fn flush(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!(error = %err, "could not create storage directory");
                return;
            }
        }
        match serde_json::to_string_pretty(&self.values) {
            Ok(text) => {
                if let Err(err) = fs::write(&self.path, text) {
                    warn!(error = %err, "could not persist session storage");
                }
            }
            Err(err) => warn!(error = %err, "could not serialize session storage"),
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
        self.flush();
    }
}
