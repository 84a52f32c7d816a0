pub mod form_state;
pub mod theme;
pub mod tray;
pub mod widgets;

use crate::drag::Draggable;
use crate::host::HostRuntime;
use crate::indicator::ConnectivityIndicator;
use crate::mood::MoodRequestCycle;
use crate::notify::NotificationQueue;
use crate::position::{Position, PositionStore};
use crate::settings::{Settings, SettingsStore};
use crate::state::{AppEvent, WidgetState};
use eframe::egui;
use egui::{pos2, Pos2, Stroke, ViewportCommand};
use std::sync::mpsc::{Receiver as EventReceiver, Sender as EventSender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use form_state::FormState;
use theme::*;
use tray::*;
use widgets::*;

pub const BALL_ID: &str = "mood-manager-ball";
pub const PANEL_ID: &str = "mood-manager-panel";

fn to_position(p: Pos2) -> Position {
    Position::new(p.x, p.y)
}

pub struct MoodManagerApp {
    pub event_rx: EventReceiver<AppEvent>,
    pub runtime: Arc<tokio::runtime::Runtime>,
    pub host: Arc<dyn HostRuntime>,
    pub settings: Arc<SettingsStore>,
    pub cycle: Arc<MoodRequestCycle>,
    pub positions: PositionStore,
    pub widget: WidgetState,
    pub form: FormState,
    /// Settings the form buffers were last synced against.
    pub form_baseline: Settings,

    // Floating elements; placed on the first frame once the viewport size is known.
    pub ball: Option<Draggable>,
    pub panel: Option<Draggable>,
    pub panel_visible: bool,

    pub should_quit: bool,

    // Tray icon (must stay alive or the icon disappears)
    pub _tray_icon: Option<tray_icon::TrayIcon>,
}

impl MoodManagerApp {
    pub fn new(
        event_tx: EventSender<AppEvent>,
        event_rx: EventReceiver<AppEvent>,
        runtime: Arc<tokio::runtime::Runtime>,
        host: Arc<dyn HostRuntime>,
        settings: Arc<SettingsStore>,
        cycle: Arc<MoodRequestCycle>,
        positions: PositionStore,
        notification_ttl: Duration,
    ) -> Self {
        let current = settings.get();
        let tray_icon = setup_tray(ACCENT);
        println!("[tray] icon created: {}", tray_icon.is_some());
        spawn_menu_listener(event_tx);

        Self {
            event_rx,
            runtime,
            host,
            settings,
            cycle,
            positions,
            widget: WidgetState::new(
                ConnectivityIndicator::for_settings(&current),
                NotificationQueue::new(notification_ttl),
            ),
            form: FormState::from_settings(&current),
            form_baseline: current,
            ball: None,
            panel: None,
            panel_visible: false,
            should_quit: false,
            _tray_icon: tray_icon,
        }
    }

    fn start_mood_cycle(&self) {
        let Some(message) = self.host.latest_message() else {
            return;
        };
        let cycle = self.cycle.clone();
        self.runtime.spawn(async move {
            cycle.on_message(message).await;
        });
    }

    fn start_connection_test(&self) {
        let cycle = self.cycle.clone();
        self.runtime.spawn(async move {
            cycle.test_connection().await;
        });
    }

    fn process_events(&mut self, now: Instant) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::MessageUpdated => self.start_mood_cycle(),
                AppEvent::ShowPanel => self.panel_visible = true,
                AppEvent::TestConnection => self.start_connection_test(),
                AppEvent::Quit => self.should_quit = true,
                other => {
                    self.widget.apply(other, now);
                }
            }
        }
    }

    fn ensure_placed(&mut self, ctx: &egui::Context) {
        let width = ctx.screen_rect().width();
        if self.ball.is_none() {
            self.ball = Some(Draggable::attach(
                BALL_ID,
                &self.positions,
                Position::new(width - 100.0, 100.0),
            ));
        }
        if self.panel.is_none() {
            self.panel = Some(Draggable::attach(
                PANEL_ID,
                &self.positions,
                Position::new(width - 400.0, 100.0),
            ));
        }
    }

    /// Pointer moves and releases count anywhere in the window, not only over
    /// the element that started the drag.
    fn track_drags(&mut self, ctx: &egui::Context) {
        let (pointer, released) =
            ctx.input(|i| (i.pointer.latest_pos(), i.pointer.primary_released()));
        let mut any_dragging = false;
        for drag in [self.ball.as_mut(), self.panel.as_mut()].into_iter().flatten() {
            if let Some(p) = pointer {
                drag.pointer_move(to_position(p));
            }
            if released {
                drag.pointer_up(&self.positions);
            }
            any_dragging |= drag.is_dragging();
        }
        if any_dragging {
            ctx.set_cursor_icon(egui::CursorIcon::Grabbing);
        }
    }

    fn press_started_on(ctx: &egui::Context, response: &egui::Response) -> Option<Position> {
        let pressed = ctx.input(|i| i.pointer.primary_pressed());
        if !(pressed && response.is_pointer_button_down_on()) {
            return None;
        }
        ctx.input(|i| i.pointer.interact_pos()).map(to_position)
    }

    fn render_ball(&mut self, ctx: &egui::Context) {
        let Some(ball) = self.ball.as_ref() else {
            return;
        };
        let pos = ball.position();
        let dragging = ball.is_dragging();
        let indicator = self.widget.indicator.state();

        let response = egui::Area::new(egui::Id::new(BALL_ID))
            .order(egui::Order::Foreground)
            .constrain(false)
            .fixed_pos(pos2(pos.x, pos.y))
            .show(ctx, |ui| floating_ball(ui, dragging, indicator))
            .inner;

        if let Some(pointer) = Self::press_started_on(ctx, &response) {
            if let Some(ball) = self.ball.as_mut() {
                ball.pointer_down(pointer);
            }
        }
        if response.clicked() {
            self.panel_visible = !self.panel_visible;
        }
    }

    fn render_panel(&mut self, ctx: &egui::Context) {
        let Some(panel) = self.panel.as_ref() else {
            return;
        };
        let pos = panel.position();
        let dragging = panel.is_dragging();

        let header = egui::Area::new(egui::Id::new(PANEL_ID))
            .order(egui::Order::Middle)
            .constrain(false)
            .fixed_pos(pos2(pos.x, pos.y))
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(PANEL_BG)
                    .stroke(Stroke::new(1.0, BTN_BORDER))
                    .rounding(6.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ui.set_width(PANEL_WIDTH);
                        let header = panel_header(ui, crate::config::PRODUCT_NAME, dragging);
                        ui.add_space(6.0);
                        self.render_panel_body(ui);
                        header
                    })
                    .inner
            })
            .inner;

        if let Some(pointer) = Self::press_started_on(ctx, &header) {
            if let Some(panel) = self.panel.as_mut() {
                panel.pointer_down(pointer);
            }
        }
    }

    fn render_panel_body(&mut self, ui: &mut egui::Ui) {
        self.refresh_form();
        ui.spacing_mut().item_spacing.y = 4.0;
        mood_row(ui, "User mood:", &self.widget.mood.user);
        mood_row(ui, "Character mood:", &self.widget.mood.character);
        ui.add_space(4.0);
        indicator_row(
            ui,
            self.widget.indicator.state(),
            self.widget.indicator.detail(),
        );
        if self.settings.is_degraded() {
            degraded_hint(ui);
        }
        ui.add_space(4.0);

        egui::CollapsingHeader::new(
            egui::RichText::new("Settings").size(12.0).color(TEXT_COLOR),
        )
        .id_salt("mood_settings_drawer")
        .default_open(false)
        .show(ui, |ui| {
            field_label(ui, "API URL");
            ui.add(
                egui::TextEdit::singleline(&mut self.form.api_url)
                    .hint_text("https://example.com/analyze")
                    .desired_width(f32::INFINITY),
            );
            field_label(ui, "API Key");
            ui.add(
                egui::TextEdit::singleline(&mut self.form.api_key)
                    .password(true)
                    .desired_width(f32::INFINITY),
            );
            ui.checkbox(&mut self.form.is_enabled, "Enable plugin");
            ui.add_space(4.0);
            if accent_button(ui, "Test connection", true).clicked() {
                self.start_connection_test();
            }
        });

        self.commit_form_changes();
    }

    /// Pick up changes made to the host settings outside this form, unless
    /// the user has unsaved edits.
    fn refresh_form(&mut self) {
        let current = self.settings.get();
        if current == self.form_baseline || self.form.diff(&self.form_baseline).is_some() {
            return;
        }
        self.form = FormState::from_settings(&current);
        self.widget.indicator.sync_configured(&current);
        self.form_baseline = current;
    }

    fn commit_form_changes(&mut self) {
        let Some(patch) = self.form.diff(&self.form_baseline) else {
            return;
        };
        let merged = self.settings.update(patch);
        self.widget.indicator.sync_configured(&merged);
        self.form = FormState::from_settings(&merged);
        self.form_baseline = merged;
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        if self.widget.notifications.is_empty() {
            return;
        }
        let mut dismissed = Vec::new();
        egui::Area::new(egui::Id::new("mood_toasts"))
            .order(egui::Order::Tooltip)
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                ui.spacing_mut().item_spacing.y = 6.0;
                for t in self.widget.notifications.toasts() {
                    if toast(ui, t).clicked() {
                        dismissed.push(t.id);
                    }
                }
            });
        for id in dismissed {
            self.widget.notifications.dismiss(id);
        }
    }
}

impl eframe::App for MoodManagerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.process_events(now);
        self.settings.tick(now);
        self.widget.notifications.expire(now);

        self.ensure_placed(ctx);
        self.track_drags(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(0x12, 0x14, 0x1b)))
            .show(ctx, |_ui| {});
        if self.panel_visible {
            self.render_panel(ctx);
        }
        self.render_ball(ctx);
        self.render_toasts(ctx);

        if ctx.input(|i| i.viewport().close_requested()) {
            self.settings.flush();
        }
        if self.should_quit {
            self.settings.flush();
            ctx.send_viewport_cmd(ViewportCommand::Close);
        }

        // Repaint rate
        let dragging = self.ball.as_ref().is_some_and(Draggable::is_dragging)
            || self.panel.as_ref().is_some_and(Draggable::is_dragging);
        if dragging {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(Duration::from_millis(33));
        }
    }
}
