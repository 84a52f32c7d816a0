use crate::indicator::{ConnectivityIndicator, IndicatorState};
use crate::notify::{Notification, NotificationQueue};
use std::time::Instant;

pub const MOOD_UNKNOWN: &str = "N/A";

/// Events sent from background tasks (and the tray thread) to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The host announced a new or edited chat message.
    MessageUpdated,
    MoodUpdated { speaker: Speaker, mood: String },
    Indicator { state: IndicatorState, detail: Option<String> },
    Notify(Notification),
    ShowPanel,
    TestConnection,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Character,
}

impl Speaker {
    pub fn from_is_user(is_user: bool) -> Self {
        if is_user {
            Self::User
        } else {
            Self::Character
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodState {
    pub user: String,
    pub character: String,
}

impl Default for MoodState {
    fn default() -> Self {
        Self {
            user: MOOD_UNKNOWN.into(),
            character: MOOD_UNKNOWN.into(),
        }
    }
}

impl MoodState {
    pub fn set(&mut self, speaker: Speaker, mood: String) {
        match speaker {
            Speaker::User => self.user = mood,
            Speaker::Character => self.character = mood,
        }
    }
}

/// Everything the panel displays. Owned by the UI thread; background work
/// reaches it only through `AppEvent`s.
pub struct WidgetState {
    pub mood: MoodState,
    pub indicator: ConnectivityIndicator,
    pub notifications: NotificationQueue,
}

impl WidgetState {
    pub fn new(indicator: ConnectivityIndicator, notifications: NotificationQueue) -> Self {
        Self {
            mood: MoodState::default(),
            indicator,
            notifications,
        }
    }

    /// Apply a state event. Returns false for events the widget state does not own.
    pub fn apply(&mut self, event: AppEvent, now: Instant) -> bool {
        match event {
            AppEvent::MoodUpdated { speaker, mood } => self.mood.set(speaker, mood),
            AppEvent::Indicator { state, detail } => match detail {
                Some(d) => self.indicator.set_state_with_detail(state, d),
                None => self.indicator.set_state(state),
            },
            AppEvent::Notify(n) => {
                self.notifications.push(n, now);
            }
            AppEvent::MessageUpdated
            | AppEvent::ShowPanel
            | AppEvent::TestConnection
            | AppEvent::Quit => return false,
        }
        true
    }
}
