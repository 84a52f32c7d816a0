use crate::settings::Settings;

/// Connectivity as of the most recent network attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    Unconfigured,
    Idle,
    Testing,
    Ok,
    Error,
}

impl IndicatorState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unconfigured => "Not configured",
            Self::Idle => "Idle",
            Self::Testing => "Testing\u{2026}",
            Self::Ok => "Connected",
            Self::Error => "Error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConnectivityIndicator {
    state: IndicatorState,
    detail: Option<String>,
}

impl ConnectivityIndicator {
    pub fn for_settings(settings: &Settings) -> Self {
        Self {
            state: if settings.is_configured() {
                IndicatorState::Idle
            } else {
                IndicatorState::Unconfigured
            },
            detail: None,
        }
    }

    pub fn state(&self) -> IndicatorState {
        self.state
    }

    /// Optional text shown next to the marker, e.g. the last error.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn set_state(&mut self, state: IndicatorState) {
        self.state = state;
        self.detail = None;
    }

    pub fn set_state_with_detail(&mut self, state: IndicatorState, detail: impl Into<String>) {
        self.state = state;
        self.detail = Some(detail.into());
    }

    /// Track the endpoint being cleared or filled in from the settings form.
    pub fn sync_configured(&mut self, settings: &Settings) {
        match (settings.is_configured(), self.state) {
            (false, _) => self.set_state(IndicatorState::Unconfigured),
            (true, IndicatorState::Unconfigured) => self.set_state(IndicatorState::Idle),
            _ => {}
        }
    }
}
