use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Top-left corner of a floating element, in window coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Simple key -> string map that outlives the process.
pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), String>;
}

#[derive(Default)]
pub struct MemoryLocalStorage {
    items: Mutex<BTreeMap<String, String>>,
}

impl LocalStorage for MemoryLocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| "local storage lock poisoned".to_string())?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `local_storage.json`, rewritten on every `set_item`.
pub struct FileLocalStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileLocalStorage {
    pub fn open(path: &Path) -> Self {
        let items = fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            items: Mutex::new(items),
        }
    }
}

impl LocalStorage for FileLocalStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| "local storage lock poisoned".to_string())?;
        items.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create storage dir: {}", e))?;
        }
        let json = serde_json::to_string(&*items)
            .map_err(|e| format!("Failed to serialize local storage: {}", e))?;
        fs::write(&self.path, json).map_err(|e| format!("Failed to write local storage: {}", e))
    }
}

pub fn local_storage_path() -> Result<PathBuf, String> {
    Ok(crate::config::data_dir()?.join("local_storage.json"))
}

/// Storage key for a widget's saved position.
pub fn position_key(widget_id: &str) -> String {
    format!("{}-position", widget_id)
}

#[derive(Clone)]
pub struct PositionStore {
    storage: Arc<dyn LocalStorage>,
}

impl PositionStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Saved position for `key`, or `default` if there is none or it does not parse.
    pub fn load(&self, key: &str, default: Position) -> Position {
        self.storage
            .get_item(key)
            .and_then(|raw| serde_json::from_str::<Position>(&raw).ok())
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .unwrap_or(default)
    }

    pub fn save(&self, key: &str, position: Position) -> Result<(), String> {
        let json = serde_json::to_string(&position)
            .map_err(|e| format!("Failed to serialize position: {}", e))?;
        self.storage.set_item(key, &json)
    }
}
