use crate::settings::{Settings, SettingsPatch};

/// Edit buffers for the settings drawer.
pub struct FormState {
    pub api_url: String,
    pub api_key: String,
    pub is_enabled: bool,
}

impl FormState {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone(),
            is_enabled: settings.is_enabled,
        }
    }

    /// Fields the user changed relative to `current`, or `None` if nothing did.
    pub fn diff(&self, current: &Settings) -> Option<SettingsPatch> {
        let patch = SettingsPatch {
            is_enabled: (self.is_enabled != current.is_enabled).then_some(self.is_enabled),
            api_url: (self.api_url != current.api_url).then(|| self.api_url.clone()),
            api_key: (self.api_key != current.api_key).then(|| self.api_key.clone()),
        };
        (patch != SettingsPatch::default()).then_some(patch)
    }
}
