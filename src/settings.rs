use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Plugin settings as stored in the host's extension settings area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub is_enabled: bool,
    pub api_url: String,
    pub api_key: String,
}

impl Settings {
    /// True when there is an endpoint to call.
    pub fn is_configured(&self) -> bool {
        !self.api_url.trim().is_empty()
    }

    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.is_enabled {
            self.is_enabled = v;
        }
        if let Some(v) = &patch.api_url {
            self.api_url = v.clone();
        }
        if let Some(v) = &patch.api_key {
            self.api_key = v.clone();
        }
    }

    /// Field by field, so one null or mistyped field does not discard the
    /// others.
    fn from_stored(value: Value) -> Self {
        let mut settings = Self::default();
        let Value::Object(fields) = value else {
            return settings;
        };
        if let Some(v) = fields.get("isEnabled").and_then(Value::as_bool) {
            settings.is_enabled = v;
        }
        if let Some(v) = fields.get("apiUrl").and_then(Value::as_str) {
            settings.api_url = v.to_string();
        }
        if let Some(v) = fields.get("apiKey").and_then(Value::as_str) {
            settings.api_key = v.to_string();
        }
        settings
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_enabled: true,
            api_url: String::new(),
            api_key: String::new(),
        }
    }
}

/// A partial update. `None` fields are left untouched by `SettingsStore::update`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub is_enabled: Option<bool>,
    pub api_url: Option<String>,
    pub api_key: Option<String>,
}

impl SettingsPatch {
    pub fn enabled(v: bool) -> Self {
        Self {
            is_enabled: Some(v),
            ..Self::default()
        }
    }

    pub fn api_url(v: impl Into<String>) -> Self {
        Self {
            api_url: Some(v.into()),
            ..Self::default()
        }
    }

    pub fn api_key(v: impl Into<String>) -> Self {
        Self {
            api_key: Some(v.into()),
            ..Self::default()
        }
    }
}

/// The host's extension settings area: one JSON value per namespace.
///
/// `read`/`write` act on the host's live copy; `persist` makes it durable.
pub trait SettingsArea: Send + Sync {
    fn read(&self, namespace: &str) -> Result<Option<Value>, String>;
    fn write(&self, namespace: &str, value: Value) -> Result<(), String>;
    fn persist(&self) -> Result<(), String>;
}

/// Session-only area, used when nothing durable is available.
#[derive(Default)]
pub struct MemorySettingsArea {
    values: Mutex<Map<String, Value>>,
}

impl SettingsArea for MemorySettingsArea {
    fn read(&self, namespace: &str) -> Result<Option<Value>, String> {
        let values = self
            .values
            .lock()
            .map_err(|_| "settings area lock poisoned".to_string())?;
        Ok(values.get(namespace).cloned())
    }

    fn write(&self, namespace: &str, value: Value) -> Result<(), String> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| "settings area lock poisoned".to_string())?;
        values.insert(namespace.to_string(), value);
        Ok(())
    }

    fn persist(&self) -> Result<(), String> {
        Ok(())
    }
}

/// `extension_settings.json`: every namespace of the host's settings in one file.
pub struct JsonSettingsFile {
    path: PathBuf,
    values: Mutex<Map<String, Value>>,
}

impl JsonSettingsFile {
    pub fn open(path: &Path) -> Self {
        let values = match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    app_warn!(
                        "[settings] {} is not a settings object, starting empty",
                        path.display()
                    );
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        Self {
            path: path.to_path_buf(),
            values: Mutex::new(values),
        }
    }
}

impl SettingsArea for JsonSettingsFile {
    fn read(&self, namespace: &str) -> Result<Option<Value>, String> {
        let values = self
            .values
            .lock()
            .map_err(|_| "settings area lock poisoned".to_string())?;
        Ok(values.get(namespace).cloned())
    }

    fn write(&self, namespace: &str, value: Value) -> Result<(), String> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| "settings area lock poisoned".to_string())?;
        values.insert(namespace.to_string(), value);
        Ok(())
    }

    fn persist(&self) -> Result<(), String> {
        let json = {
            let values = self
                .values
                .lock()
                .map_err(|_| "settings area lock poisoned".to_string())?;
            serde_json::to_string_pretty(&*values)
                .map_err(|e| format!("Failed to serialize settings: {}", e))?
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings dir: {}", e))?;
        }
        fs::write(&self.path, json).map_err(|e| format!("Failed to write settings: {}", e))
    }
}

pub fn settings_path() -> Result<PathBuf, String> {
    Ok(crate::config::data_dir()?.join("extension_settings.json"))
}

/// Debounce timer for the durable write. Every `schedule` pushes the
/// deadline out again, so a burst of changes ends in a single write.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    delay: Duration,
    due: Option<Instant>,
}

impl PendingWrite {
    pub fn new(delay: Duration) -> Self {
        Self { delay, due: None }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.due = Some(now + self.delay);
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.due.is_some_and(|due| now >= due)
    }

    fn clear(&mut self) {
        self.due = None;
    }
}

struct StoreInner {
    /// Last merged value; the only copy once the area has failed.
    local: Settings,
    degraded: bool,
    pending: PendingWrite,
}

/// Single source of truth for the plugin settings.
///
/// Reads always go through the host area; merges happen under one lock so
/// `get` never observes a half-applied update.
pub struct SettingsStore {
    area: Arc<dyn SettingsArea>,
    namespace: String,
    inner: Mutex<StoreInner>,
}

impl SettingsStore {
    pub fn new(area: Arc<dyn SettingsArea>, namespace: &str, debounce: Duration) -> Self {
        let store = Self {
            area,
            namespace: namespace.to_string(),
            inner: Mutex::new(StoreInner {
                local: Settings::default(),
                degraded: false,
                pending: PendingWrite::new(debounce),
            }),
        };
        if let Ok(mut inner) = store.inner.lock() {
            let current = store.read_locked(&mut inner);
            inner.local = current;
        }
        store
    }

    pub fn get(&self) -> Settings {
        match self.inner.lock() {
            Ok(mut inner) => self.read_locked(&mut inner),
            Err(poisoned) => poisoned.into_inner().local.clone(),
        }
    }

    /// Merge `patch` into the stored settings and schedule a durable write.
    pub fn update(&self, patch: SettingsPatch) -> Settings {
        self.update_at(patch, Instant::now())
    }

    pub fn update_at(&self, patch: SettingsPatch, now: Instant) -> Settings {
        let mut inner = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut merged = self.read_locked(&mut inner);
        merged.apply(&patch);

        if !inner.degraded {
            match serde_json::to_value(&merged) {
                Ok(value) => {
                    if let Err(e) = self.area.write(&self.namespace, value) {
                        Self::degrade(&mut inner, &e);
                    }
                }
                Err(e) => Self::degrade(&mut inner, &format!("serialize failed: {}", e)),
            }
        }
        inner.local = merged.clone();
        if !inner.degraded {
            inner.pending.schedule(now);
        }
        merged
    }

    #[cfg(test)]
    pub fn has_pending_write(&self) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.pending.is_pending())
            .unwrap_or(false)
    }

    /// Flush if the debounce period has elapsed. Returns true when a write happened.
    pub fn tick(&self, now: Instant) -> bool {
        let due = self
            .inner
            .lock()
            .map(|inner| inner.pending.is_due(now))
            .unwrap_or(false);
        due && self.flush()
    }

    /// Write any pending change now. Returns true when a write happened.
    pub fn flush(&self) -> bool {
        let mut inner = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !inner.pending.is_pending() {
            return false;
        }
        inner.pending.clear();
        if inner.degraded {
            return false;
        }
        match self.area.persist() {
            Ok(()) => {
                log::debug!("[settings] flushed namespace {}", self.namespace);
                true
            }
            Err(e) => {
                Self::degrade(&mut inner, &e);
                false
            }
        }
    }

    /// True once the host area has failed; changes then live only in memory.
    pub fn is_degraded(&self) -> bool {
        self.inner.lock().map(|i| i.degraded).unwrap_or(true)
    }

    fn read_locked(&self, inner: &mut StoreInner) -> Settings {
        if inner.degraded {
            return inner.local.clone();
        }
        match self.area.read(&self.namespace) {
            Ok(Some(value)) => Settings::from_stored(value),
            Ok(None) => Settings::default(),
            Err(e) => {
                Self::degrade(inner, &e);
                inner.local.clone()
            }
        }
    }

    fn degrade(inner: &mut StoreInner, reason: &str) {
        if !inner.degraded {
            app_warn!(
                "[settings] host settings unavailable, keeping changes for this session only: {}",
                reason
            );
        }
        inner.degraded = true;
        inner.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const NS: &str = "mood_manager";

    #[derive(Default)]
    struct CountingArea {
        inner: MemorySettingsArea,
        persists: AtomicUsize,
    }

    impl SettingsArea for CountingArea {
        fn read(&self, namespace: &str) -> Result<Option<Value>, String> {
            self.inner.read(namespace)
        }
        fn write(&self, namespace: &str, value: Value) -> Result<(), String> {
            self.inner.write(namespace, value)
        }
        fn persist(&self) -> Result<(), String> {
            self.persists.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct BrokenArea;

    impl SettingsArea for BrokenArea {
        fn read(&self, _namespace: &str) -> Result<Option<Value>, String> {
            Err("storage offline".into())
        }
        fn write(&self, _namespace: &str, _value: Value) -> Result<(), String> {
            Err("storage offline".into())
        }
        fn persist(&self) -> Result<(), String> {
            Err("storage offline".into())
        }
    }

    fn store_with(area: Arc<dyn SettingsArea>) -> SettingsStore {
        SettingsStore::new(area, NS, Duration::from_millis(500))
    }

    #[test]
    fn first_load_returns_defaults() {
        let store = store_with(Arc::new(MemorySettingsArea::default()));
        let s = store.get();
        assert!(s.is_enabled);
        assert_eq!(s.api_url, "");
        assert_eq!(s.api_key, "");
        assert!(!s.is_configured());
    }

    #[test]
    fn sequential_updates_merge_field_by_field() {
        let store = store_with(Arc::new(MemorySettingsArea::default()));
        store.update(SettingsPatch {
            api_url: Some("http://a".into()),
            api_key: Some("k1".into()),
            ..SettingsPatch::default()
        });
        store.update(SettingsPatch {
            api_key: Some("k2".into()),
            is_enabled: Some(false),
            ..SettingsPatch::default()
        });

        assert_eq!(
            store.get(),
            Settings {
                is_enabled: false,
                api_url: "http://a".into(),
                api_key: "k2".into(),
            }
        );
    }

    #[test]
    fn stored_object_missing_fields_gets_defaults() {
        let area = Arc::new(MemorySettingsArea::default());
        area.write(NS, json!({ "apiUrl": "http://mood.local/analyze" }))
            .unwrap();
        let store = store_with(area);

        let s = store.get();
        assert!(s.is_enabled);
        assert_eq!(s.api_url, "http://mood.local/analyze");
        assert_eq!(s.api_key, "");
    }

    #[test]
    fn invalid_stored_field_keeps_the_valid_ones() {
        let area = Arc::new(MemorySettingsArea::default());
        area.write(NS, json!({ "apiUrl": "http://x", "apiKey": null }))
            .unwrap();
        let store = store_with(area.clone());
        let s = store.get();
        assert_eq!(s.api_url, "http://x");
        assert_eq!(s.api_key, "");
        assert!(s.is_enabled);

        area.write(NS, json!({ "apiUrl": "http://x", "isEnabled": "true", "apiKey": 7 }))
            .unwrap();
        let s = store.get();
        assert_eq!(s.api_url, "http://x");
        assert!(s.is_enabled);
        assert_eq!(s.api_key, "");

        // A later partial update must not wipe the recovered URL.
        let merged = store.update(SettingsPatch::api_key("k"));
        assert_eq!(merged.api_url, "http://x");
        assert_eq!(
            area.read(NS).unwrap(),
            Some(json!({ "isEnabled": true, "apiUrl": "http://x", "apiKey": "k" }))
        );
    }

    #[test]
    fn non_object_stored_value_yields_defaults() {
        let area = Arc::new(MemorySettingsArea::default());
        area.write(NS, json!("garbage")).unwrap();
        let store = store_with(area);
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn update_writes_host_field_names() {
        let area = Arc::new(MemorySettingsArea::default());
        let store = store_with(area.clone());
        store.update(SettingsPatch::api_url("http://x"));

        let stored = area.read(NS).unwrap().unwrap();
        assert_eq!(stored["apiUrl"], "http://x");
        assert_eq!(stored["isEnabled"], true);
        assert_eq!(stored["apiKey"], "");
    }

    #[test]
    fn reads_through_external_changes() {
        let area = Arc::new(MemorySettingsArea::default());
        let store = store_with(area.clone());
        store.update(SettingsPatch::api_key("mine"));

        area.write(NS, json!({ "apiKey": "theirs", "apiUrl": "http://y" }))
            .unwrap();
        assert_eq!(store.get().api_key, "theirs");

        store.update(SettingsPatch::enabled(false));
        let s = store.get();
        assert_eq!(s.api_key, "theirs");
        assert_eq!(s.api_url, "http://y");
        assert!(!s.is_enabled);
    }

    #[test]
    fn rapid_updates_coalesce_into_one_write() {
        let area = Arc::new(CountingArea::default());
        let store = store_with(area.clone());
        let t0 = Instant::now();

        for (i, url) in ["h", "ht", "htt", "http"].iter().enumerate() {
            store.update_at(
                SettingsPatch::api_url(*url),
                t0 + Duration::from_millis(100 * i as u64),
            );
        }

        // Last keystroke at t0+300ms; quiet period ends at t0+800ms.
        assert!(!store.tick(t0 + Duration::from_millis(700)));
        assert_eq!(area.persists.load(Ordering::SeqCst), 0);
        assert!(store.tick(t0 + Duration::from_millis(800)));
        assert!(!store.tick(t0 + Duration::from_millis(2000)));
        assert_eq!(area.persists.load(Ordering::SeqCst), 1);
        assert_eq!(store.get().api_url, "http");
    }

    #[test]
    fn flush_forces_pending_write() {
        let area = Arc::new(CountingArea::default());
        let store = store_with(area.clone());
        assert!(!store.flush());

        store.update(SettingsPatch::api_key("k"));
        assert!(store.has_pending_write());
        assert!(store.flush());
        assert!(!store.has_pending_write());
        assert_eq!(area.persists.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn broken_area_degrades_to_memory() {
        let store = store_with(Arc::new(BrokenArea));
        assert_eq!(store.get(), Settings::default());
        assert!(store.is_degraded());

        store.update(SettingsPatch::api_url("http://z"));
        store.update(SettingsPatch::api_key("k"));

        let s = store.get();
        assert_eq!(s.api_url, "http://z");
        assert_eq!(s.api_key, "k");
        assert!(!store.flush());
    }

    #[test]
    fn json_file_keeps_foreign_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extension_settings.json");
        fs::write(&path, r#"{"other_plugin": {"x": 1}}"#).unwrap();

        let area = Arc::new(JsonSettingsFile::open(&path));
        let store = store_with(area);
        store.update(SettingsPatch::api_url("http://file"));
        assert!(store.flush());

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["other_plugin"]["x"], 1);
        assert_eq!(saved["mood_manager"]["apiUrl"], "http://file");

        let reopened = store_with(Arc::new(JsonSettingsFile::open(&path)));
        assert_eq!(reopened.get().api_url, "http://file");
    }
}
