use crate::host::{ChatMessage, HostRuntime};
use crate::indicator::IndicatorState;
use crate::notify::{Notification, Severity};
use crate::settings::{Settings, SettingsStore};
use crate::state::{AppEvent, Speaker};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::sync::mpsc::Sender as EventSender;
use std::sync::Arc;
use std::time::Duration;

const TEST_TEXT: &str = "test";

#[derive(Debug, thiserror::Error)]
pub enum MoodError {
    #[error("no API URL configured")]
    ConfigurationIncomplete,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("API returned HTTP {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct MoodRequest<'a> {
    text: &'a str,
    is_user: bool,
}

pub struct MoodClient {
    http: reqwest::Client,
}

impl MoodClient {
    pub fn new(timeout: Duration) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("http client error: {e}"))?;
        Ok(Self { http })
    }

    /// POST `{ text, is_user }` to the configured endpoint and return its `mood`.
    pub async fn analyze(
        &self,
        settings: &Settings,
        host_headers: &[(String, String)],
        text: &str,
        is_user: bool,
    ) -> Result<String, MoodError> {
        if !settings.is_configured() {
            return Err(MoodError::ConfigurationIncomplete);
        }
        let headers = build_headers(host_headers, &settings.api_key)?;
        let response = self
            .http
            .post(settings.api_url.trim())
            .headers(headers)
            .json(&MoodRequest { text, is_user })
            .send()
            .await
            .map_err(|e| MoodError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MoodError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| MoodError::Transport(e.to_string()))?;
        parse_mood(&body)
    }
}

/// Host headers first; our own headers replace any host header of the same name.
fn build_headers(host_headers: &[(String, String)], api_key: &str) -> Result<HeaderMap, MoodError> {
    let mut headers = HeaderMap::new();
    for (name, value) in host_headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(n), Ok(v)) => {
                headers.insert(n, v);
            }
            _ => app_warn!("[mood] skipping invalid host header {:?}", name),
        }
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let key = api_key.trim();
    if !key.is_empty() {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|_| MoodError::Transport("API key is not a valid header value".into()))?;
        headers.insert(AUTHORIZATION, bearer);
    }
    Ok(headers)
}

pub fn parse_mood(body: &str) -> Result<String, MoodError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| MoodError::MalformedResponse(e.to_string()))?;
    match value.get("mood") {
        Some(Value::String(mood)) => Ok(mood.clone()),
        Some(other) => Err(MoodError::MalformedResponse(format!(
            "`mood` is not a string: {}",
            other
        ))),
        None => Err(MoodError::MalformedResponse("missing `mood` field".into())),
    }
}

/// Turns chat messages into mood updates and drives the indicator.
///
/// Results never leave this type as errors: every outcome becomes
/// `AppEvent`s for the UI thread.
pub struct MoodRequestCycle {
    settings: Arc<SettingsStore>,
    host: Arc<dyn HostRuntime>,
    client: MoodClient,
    events: EventSender<AppEvent>,
}

impl MoodRequestCycle {
    pub fn new(
        settings: Arc<SettingsStore>,
        host: Arc<dyn HostRuntime>,
        client: MoodClient,
        events: EventSender<AppEvent>,
    ) -> Self {
        Self {
            settings,
            host,
            client,
            events,
        }
    }

    pub async fn on_message(&self, message: ChatMessage) {
        let settings = self.settings.get();
        if !settings.is_enabled || !settings.is_configured() {
            log::debug!("[mood] skipping message: plugin disabled or no API URL");
            return;
        }

        let speaker = Speaker::from_is_user(message.is_user);
        let headers = self.host.request_headers();
        match self
            .client
            .analyze(&settings, &headers, &message.text, message.is_user)
            .await
        {
            Ok(mood) => {
                app_log!("[mood] {:?} mood: {}", speaker, mood);
                self.emit(AppEvent::MoodUpdated { speaker, mood });
                self.emit_indicator(IndicatorState::Ok, None);
            }
            Err(e) => {
                app_err!("[mood] analysis failed for {:?} message: {}", speaker, e);
                self.emit_indicator(IndicatorState::Error, Some(e.to_string()));
                self.emit(AppEvent::Notify(Notification::new(
                    Severity::Error,
                    "Could not get mood data from the analysis API.",
                )));
            }
        }
    }

    /// Manual check with a fixed payload; the returned mood is discarded.
    pub async fn test_connection(&self) {
        let settings = self.settings.get();
        if !settings.is_configured() {
            self.emit_indicator(IndicatorState::Unconfigured, None);
            self.emit(AppEvent::Notify(Notification::new(
                Severity::Warning,
                "Enter an API URL before testing the connection.",
            )));
            return;
        }

        self.emit_indicator(IndicatorState::Testing, None);
        let headers = self.host.request_headers();
        match self
            .client
            .analyze(&settings, &headers, TEST_TEXT, true)
            .await
        {
            Ok(_) => {
                app_log!("[mood] connection test ok: {}", settings.api_url);
                self.emit_indicator(IndicatorState::Ok, None);
                self.emit(AppEvent::Notify(Notification::new(
                    Severity::Success,
                    "Connected to the mood API.",
                )));
            }
            Err(e) => {
                app_err!("[mood] connection test failed: {}", e);
                self.emit_indicator(IndicatorState::Error, Some(e.to_string()));
                self.emit(AppEvent::Notify(Notification::new(
                    Severity::Error,
                    format!("Mood API connection failed: {}", e),
                )));
            }
        }
    }

    fn emit_indicator(&self, state: IndicatorState, detail: Option<String>) {
        self.emit(AppEvent::Indicator { state, detail });
    }

    fn emit(&self, event: AppEvent) {
        let _ = self.events.send(event);
    }
}
