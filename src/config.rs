use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PRODUCT_NAME: &str = "Mood Manager";

/// Tunables for the widget itself. The user-facing plugin settings live in
/// the host's extension settings (see `settings.rs`), not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Quiet period before a settings change is written to disk.
    #[serde(default = "default_settings_debounce_ms")]
    pub settings_debounce_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long a toast stays on screen.
    #[serde(default = "default_notification_secs")]
    pub notification_secs: u64,
    #[serde(default = "default_settings_namespace")]
    pub settings_namespace: String,
    /// WebSocket URL of the host chat bridge. Empty disables the bridge.
    #[serde(default)]
    pub host_bridge_url: String,
    /// Extra headers the host requires on outbound requests.
    #[serde(default)]
    pub host_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub logging: LogConfig,
}

/// Session log and crash report layout under the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir_name: String,
    /// Active log is `<stem>.log`; older sessions are `<stem>.<n>.log`.
    pub file_stem: String,
    pub keep_sessions: usize,
    pub keep_crashes: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir_name: "logs".into(),
            file_stem: "mood-manager".into(),
            keep_sessions: 5,
            keep_crashes: 5,
        }
    }
}

impl AppConfig {
    pub fn settings_debounce(&self) -> Duration {
        Duration::from_millis(self.settings_debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.clamp(1, 300))
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_secs.clamp(1, 60))
    }

    /// Lines added to crash reports so a report says which host setup crashed.
    pub fn crash_context(&self) -> String {
        let bridge = if self.host_bridge_url.trim().is_empty() {
            "(none)"
        } else {
            self.host_bridge_url.as_str()
        };
        format!(
            "settings namespace: {}\nhost bridge: {}\nhost headers: {}",
            self.settings_namespace,
            bridge,
            self.host_headers.keys().cloned().collect::<Vec<_>>().join(", ")
        )
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            settings_debounce_ms: default_settings_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            notification_secs: default_notification_secs(),
            settings_namespace: default_settings_namespace(),
            host_bridge_url: String::new(),
            host_headers: BTreeMap::new(),
            logging: LogConfig::default(),
        }
    }
}

fn default_settings_debounce_ms() -> u64 {
    1000
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_notification_secs() -> u64 {
    4
}
fn default_settings_namespace() -> String {
    "mood_manager".into()
}

/// Root directory for everything the widget writes.
pub fn data_dir() -> Result<PathBuf, String> {
    if let Some(dir) = dirs::data_local_dir() {
        return Ok(dir.join("MoodManager"));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".mood-manager"));
    }
    Err("Failed to resolve data directory".into())
}

pub fn config_path() -> Result<PathBuf, String> {
    Ok(data_dir()?.join("config.json"))
}

pub fn load() -> AppConfig {
    match config_path() {
        Ok(path) => load_from(&path),
        Err(_) => AppConfig::default(),
    }
}

pub fn load_from(path: &Path) -> AppConfig {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(_) => return AppConfig::default(),
    };
    match serde_json::from_str(&text) {
        Ok(config) => config,
        Err(e) => {
            app_warn!("[config] ignoring malformed {}: {}", path.display(), e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("config.json"));
        assert_eq!(config.settings_debounce_ms, 1000);
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.settings_namespace, "mood_manager");
        assert!(config.host_bridge_url.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"request_timeout_secs": 5, "host_headers": {"X-CSRF-Token": "abc"}}"#,
        )
        .unwrap();

        let config = load_from(&path);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.settings_debounce(), Duration::from_millis(1000));
        assert_eq!(
            config.host_headers.get("X-CSRF-Token").map(String::as_str),
            Some("abc")
        );
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(load_from(&path).notification_secs, 4);
    }

    #[test]
    fn logging_section_merges_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"logging": {"keep_sessions": 2}}"#).unwrap();

        let logging = load_from(&path).logging;
        assert_eq!(logging.keep_sessions, 2);
        assert_eq!(logging.file_stem, "mood-manager");
        assert_eq!(logging.dir_name, "logs");
    }

    #[test]
    fn crash_context_names_bridge_and_header_keys_only() {
        let mut config = AppConfig::default();
        assert!(config.crash_context().contains("host bridge: (none)"));

        config.host_bridge_url = "ws://127.0.0.1:5001/mood".into();
        config.host_headers.insert("X-CSRF-Token".into(), "secret".into());
        let context = config.crash_context();
        assert!(context.contains("settings namespace: mood_manager"));
        assert!(context.contains("host bridge: ws://127.0.0.1:5001/mood"));
        assert!(context.contains("X-CSRF-Token"));
        assert!(!context.contains("secret"));
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
