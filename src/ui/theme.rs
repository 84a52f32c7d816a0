use crate::indicator::IndicatorState;
use crate::notify::Severity;
use eframe::egui::Color32;

pub const TEXT_COLOR: Color32 = Color32::from_rgb(0xe6, 0xe6, 0xe6);
pub const TEXT_MUTED: Color32 = Color32::from_rgb(0x9c, 0xa3, 0xaf);
pub const BTN_BG: Color32 = Color32::from_rgb(0x25, 0x28, 0x30);
pub const BTN_BORDER: Color32 = Color32::from_rgb(0x2c, 0x2f, 0x36);
pub const PANEL_BG: Color32 = Color32::from_rgb(0x1c, 0x1f, 0x2a);
pub const HEADER_BG: Color32 = Color32::from_rgb(0x24, 0x28, 0x36);
pub const ACCENT: Color32 = Color32::from_rgb(0x9d, 0x6e, 0xc0);
pub const ACCENT_HOVER: Color32 = Color32::from_rgb(0x8a, 0x5a, 0xad);

pub const GRAY: Color32 = Color32::from_rgb(0x6b, 0x72, 0x80);
pub const YELLOW: Color32 = Color32::from_rgb(0xea, 0xb3, 0x08);
pub const GREEN: Color32 = Color32::from_rgb(0x22, 0xc5, 0x5e);
pub const RED: Color32 = Color32::from_rgb(0xef, 0x44, 0x44);
pub const BLUE: Color32 = Color32::from_rgb(0x3b, 0x82, 0xf6);

pub fn indicator_color(state: IndicatorState) -> Color32 {
    match state {
        IndicatorState::Unconfigured | IndicatorState::Idle => GRAY,
        IndicatorState::Testing => YELLOW,
        IndicatorState::Ok => GREEN,
        IndicatorState::Error => RED,
    }
}

pub fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Info => BLUE,
        Severity::Success => GREEN,
        Severity::Warning => YELLOW,
        Severity::Error => RED,
    }
}
