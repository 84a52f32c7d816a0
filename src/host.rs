use crate::settings::SettingsArea;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite};

pub type MessageHandler = Box<dyn Fn() + Send + Sync>;

/// The chat application the widget is attached to.
pub trait HostRuntime: Send + Sync {
    /// Register a callback fired whenever the latest chat message changes.
    fn on_message_update(&self, handler: MessageHandler);
    fn latest_message(&self) -> Option<ChatMessage>;
    fn settings_area(&self) -> Arc<dyn SettingsArea>;
    /// Headers the host requires on every outbound request.
    fn request_headers(&self) -> Vec<(String, String)>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "mes")]
    pub text: String,
    #[serde(default)]
    pub is_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Frames pushed by the host bridge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    MessageUpdated {
        #[serde(default)]
        message_id: Option<usize>,
        message: ChatMessage,
    },
    ChatChanged {
        #[serde(default)]
        chat: Vec<ChatMessage>,
    },
}

pub fn parse_host_event(text: &str) -> Result<HostEvent, String> {
    serde_json::from_str(text).map_err(|e| format!("Failed to parse host frame: {}", e))
}

pub struct DesktopHost {
    chat: Mutex<Vec<ChatMessage>>,
    handlers: Mutex<Vec<MessageHandler>>,
    settings_area: Arc<dyn SettingsArea>,
    headers: Vec<(String, String)>,
}

impl DesktopHost {
    pub fn new(settings_area: Arc<dyn SettingsArea>, headers: Vec<(String, String)>) -> Self {
        Self {
            chat: Mutex::new(Vec::new()),
            handlers: Mutex::new(Vec::new()),
            settings_area,
            headers,
        }
    }

    pub fn apply_event(&self, event: HostEvent) {
        if let Ok(mut chat) = self.chat.lock() {
            match event {
                HostEvent::MessageUpdated {
                    message_id,
                    message,
                } => match message_id {
                    Some(idx) if idx < chat.len() => chat[idx] = message,
                    _ => chat.push(message),
                },
                HostEvent::ChatChanged { chat: replacement } => *chat = replacement,
            }
        }
        self.notify_handlers();
    }

    pub fn handle_frame(&self, text: &str) -> Result<(), String> {
        let event = parse_host_event(text)?;
        self.apply_event(event);
        Ok(())
    }

    fn notify_handlers(&self) {
        if let Ok(handlers) = self.handlers.lock() {
            for handler in handlers.iter() {
                handler();
            }
        }
    }
}

impl HostRuntime for DesktopHost {
    fn on_message_update(&self, handler: MessageHandler) {
        if let Ok(mut handlers) = self.handlers.lock() {
            handlers.push(handler);
        }
    }

    fn latest_message(&self) -> Option<ChatMessage> {
        self.chat.lock().ok()?.last().cloned()
    }

    fn settings_area(&self) -> Arc<dyn SettingsArea> {
        self.settings_area.clone()
    }

    fn request_headers(&self) -> Vec<(String, String)> {
        self.headers.clone()
    }
}

const RECONNECT_BASE_MS: u64 = 800;
const RECONNECT_MAX_MS: u64 = 30_000;

fn reconnect_delay_ms(attempt: u32) -> u64 {
    let exp = attempt.saturating_sub(1).min(10);
    let factor = 1u64 << exp;
    (RECONNECT_BASE_MS.saturating_mul(factor)).min(RECONNECT_MAX_MS)
}

/// Listen to the host bridge on the runtime until the process exits.
pub fn spawn_bridge(host: Arc<DesktopHost>, runtime: &tokio::runtime::Runtime, url: String) {
    if url.trim().is_empty() {
        app_log!("[host] no bridge url configured, waiting for manual tests only");
        return;
    }
    runtime.spawn(run_bridge(host, url));
}

async fn run_bridge(host: Arc<DesktopHost>, url: String) {
    let mut attempt: u32 = 0;
    loop {
        match connect_async(url.as_str()).await {
            Ok((mut stream, _)) => {
                attempt = 0;
                app_log!("[host] bridge connected: {}", url);
                while let Some(frame) = stream.next().await {
                    match frame {
                        Ok(tungstenite::Message::Text(text)) => {
                            if let Err(e) = host.handle_frame(&text) {
                                app_warn!("[host] skipping frame: {}", e);
                            }
                        }
                        Ok(tungstenite::Message::Close(_)) => break,
                        Ok(_) => {}
                        Err(e) => {
                            app_err!("[host] bridge read error: {}", e);
                            break;
                        }
                    }
                }
                app_log!("[host] bridge disconnected");
            }
            Err(e) => {
                app_warn!("[host] bridge connect failed: {}", e);
            }
        }
        attempt = attempt.saturating_add(1);
        let delay = reconnect_delay_ms(attempt);
        log::debug!("[host] reconnecting in {}ms (attempt {})", delay, attempt);
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::settings::MemorySettingsArea;

    /// In-memory host for tests. Messages are handed to the cycle directly,
    /// so it never has a latest message.
    pub struct FakeHost {
        pub area: Arc<MemorySettingsArea>,
        pub headers: Vec<(String, String)>,
    }

    impl FakeHost {
        pub fn new(headers: Vec<(String, String)>) -> Self {
            Self {
                area: Arc::new(MemorySettingsArea::default()),
                headers,
            }
        }
    }

    impl HostRuntime for FakeHost {
        fn on_message_update(&self, _handler: MessageHandler) {}

        fn latest_message(&self) -> Option<ChatMessage> {
            None
        }

        fn settings_area(&self) -> Arc<dyn SettingsArea> {
            self.area.clone()
        }

        fn request_headers(&self) -> Vec<(String, String)> {
            self.headers.clone()
        }
    }
}
