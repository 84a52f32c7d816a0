use crate::indicator::IndicatorState;
use crate::notify::Toast;
use eframe::egui;
use egui::{vec2, Color32, CursorIcon, FontId, Sense, Stroke};

use super::theme::*;

pub const BALL_SIZE: f32 = 44.0;
pub const PANEL_WIDTH: f32 = 280.0;
const HEADER_HEIGHT: f32 = 26.0;

/// The round "M" launcher. The small dot on its rim mirrors the indicator.
pub fn floating_ball(
    ui: &mut egui::Ui,
    dragging: bool,
    indicator: IndicatorState,
) -> egui::Response {
    let (rect, response) =
        ui.allocate_exact_size(vec2(BALL_SIZE, BALL_SIZE), Sense::click_and_drag());

    if ui.is_rect_visible(rect) {
        let center = rect.center();
        let radius = BALL_SIZE / 2.0;
        let fill = if response.hovered() || dragging {
            ACCENT_HOVER
        } else {
            ACCENT
        };
        ui.painter()
            .circle_stroke(center, radius - 0.5, Stroke::new(1.5, Color32::WHITE));
        ui.painter().circle_filled(center, radius - 2.5, fill);
        ui.painter().text(
            center,
            egui::Align2::CENTER_CENTER,
            "M",
            FontId::proportional(18.0),
            Color32::WHITE,
        );
        let dot = center + vec2(radius * 0.7, radius * 0.7);
        ui.painter().circle_filled(dot, 5.0, indicator_color(indicator));
        ui.painter()
            .circle_stroke(dot, 5.0, Stroke::new(1.0, PANEL_BG));
    }

    response.on_hover_cursor(if dragging {
        CursorIcon::Grabbing
    } else {
        CursorIcon::Grab
    })
}

/// Title bar of the status panel; doubles as its drag handle.
pub fn panel_header(ui: &mut egui::Ui, title: &str, dragging: bool) -> egui::Response {
    let (rect, response) =
        ui.allocate_exact_size(vec2(ui.available_width(), HEADER_HEIGHT), Sense::drag());
    if ui.is_rect_visible(rect) {
        ui.painter().rect_filled(rect, 4.0, HEADER_BG);
        ui.painter().text(
            rect.left_center() + vec2(8.0, 0.0),
            egui::Align2::LEFT_CENTER,
            title,
            FontId::proportional(13.0),
            TEXT_COLOR,
        );
    }
    response.on_hover_cursor(if dragging {
        CursorIcon::Grabbing
    } else {
        CursorIcon::Grab
    })
}

pub fn indicator_row(ui: &mut egui::Ui, state: IndicatorState, detail: Option<&str>) {
    ui.horizontal(|ui| {
        let (rect, _) = ui.allocate_exact_size(vec2(12.0, 12.0), Sense::hover());
        ui.painter()
            .circle_filled(rect.center(), 5.0, indicator_color(state));
        ui.label(
            egui::RichText::new(state.label())
                .size(12.0)
                .color(TEXT_COLOR),
        );
        if let Some(detail) = detail {
            ui.label(egui::RichText::new(detail).size(11.0).color(TEXT_MUTED));
        }
    });
}

pub fn degraded_hint(ui: &mut egui::Ui) {
    ui.label(
        egui::RichText::new("Settings can't be saved; changes last until restart.")
            .size(11.0)
            .color(YELLOW),
    );
}

pub fn mood_row(ui: &mut egui::Ui, label: &str, mood: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(label).size(12.0).color(TEXT_MUTED));
        ui.label(egui::RichText::new(mood).size(13.0).strong().color(TEXT_COLOR));
    });
}

pub fn field_label(ui: &mut egui::Ui, text: &str) {
    ui.label(egui::RichText::new(text).size(11.0).color(TEXT_MUTED));
}

pub fn accent_button(ui: &mut egui::Ui, label: &str, enabled: bool) -> egui::Response {
    let button = egui::Button::new(
        egui::RichText::new(label)
            .size(12.0)
            .strong()
            .color(Color32::WHITE),
    )
    .fill(if enabled { ACCENT } else { BTN_BG })
    .stroke(Stroke::new(1.0, BTN_BORDER))
    .rounding(4.0)
    .min_size(vec2(120.0, 24.0));
    ui.add_enabled(enabled, button)
}

/// One toast; returns the click response so the caller can dismiss it.
pub fn toast(ui: &mut egui::Ui, toast: &Toast) -> egui::Response {
    let color = severity_color(toast.notification.severity);
    egui::Frame::none()
        .fill(PANEL_BG)
        .stroke(Stroke::new(1.0, color))
        .rounding(6.0)
        .inner_margin(egui::Margin::symmetric(10.0, 6.0))
        .show(ui, |ui| {
            ui.set_max_width(260.0);
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(vec2(4.0, 16.0), Sense::hover());
                ui.painter().rect_filled(rect, 2.0, color);
                ui.label(
                    egui::RichText::new(&toast.notification.message)
                        .size(12.0)
                        .color(TEXT_COLOR),
                );
            });
        })
        .response
        .interact(Sense::click())
        .on_hover_cursor(CursorIcon::PointingHand)
}
