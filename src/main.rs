#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[macro_use]
mod diagnostics;
mod config;
mod drag;
mod host;
mod indicator;
mod mood;
mod notify;
mod position;
mod settings;
mod state;
mod ui;

use eframe::egui;
use egui::{vec2, ViewportBuilder};
use host::{DesktopHost, HostRuntime};
use mood::{MoodClient, MoodRequestCycle};
use position::{FileLocalStorage, LocalStorage, MemoryLocalStorage, PositionStore};
use settings::{JsonSettingsFile, MemorySettingsArea, SettingsArea, SettingsStore};
use state::AppEvent;
use std::sync::Arc;

fn main() {
    env_logger::init();

    let config = config::load();
    match diagnostics::LogLayout::from_config(&config.logging) {
        Ok(layout) => {
            match diagnostics::init_session_logging(&layout) {
                Ok(path) => println!("[mood-manager] logging to {}", path.display()),
                Err(e) => eprintln!("[mood-manager] session log unavailable: {}", e),
            }
            diagnostics::install_panic_hook(layout, config.crash_context());
        }
        Err(e) => eprintln!("[mood-manager] session log unavailable: {}", e),
    }

    let (event_tx, event_rx) = std::sync::mpsc::channel::<AppEvent>();
    let runtime = Arc::new(
        tokio::runtime::Runtime::new().expect("Failed to create tokio runtime"),
    );

    let settings_area: Arc<dyn SettingsArea> = match settings::settings_path() {
        Ok(path) => Arc::new(JsonSettingsFile::open(&path)),
        Err(e) => {
            app_warn!("[settings] {}; settings will not survive a restart", e);
            Arc::new(MemorySettingsArea::default())
        }
    };
    let host_headers = config
        .host_headers
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    let host = Arc::new(DesktopHost::new(settings_area, host_headers));
    {
        let tx = event_tx.clone();
        host.on_message_update(Box::new(move || {
            let _ = tx.send(AppEvent::MessageUpdated);
        }));
    }
    host::spawn_bridge(host.clone(), &runtime, config.host_bridge_url.clone());

    let settings = Arc::new(SettingsStore::new(
        host.settings_area(),
        &config.settings_namespace,
        config.settings_debounce(),
    ));
    let client = match MoodClient::new(config.request_timeout()) {
        Ok(c) => c,
        Err(e) => {
            app_err!("[mood-manager] {}", e);
            return;
        }
    };
    let cycle = Arc::new(MoodRequestCycle::new(
        settings.clone(),
        host.clone(),
        client,
        event_tx.clone(),
    ));

    let storage: Arc<dyn LocalStorage> = match position::local_storage_path() {
        Ok(path) => Arc::new(FileLocalStorage::open(&path)),
        Err(e) => {
            app_warn!("[position] {}; positions will reset on restart", e);
            Arc::new(MemoryLocalStorage::default())
        }
    };
    let positions = PositionStore::new(storage);

    let vp = ViewportBuilder::default()
        .with_title(config::PRODUCT_NAME)
        .with_inner_size(vec2(1100.0, 720.0))
        .with_always_on_top()
        .with_resizable(true);

    let native_options = eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    };

    let notification_ttl = config.notification_ttl();
    eframe::run_native(
        config::PRODUCT_NAME,
        native_options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            app_log!("[mood-manager] initialized");
            Ok(Box::new(ui::MoodManagerApp::new(
                event_tx,
                event_rx,
                runtime,
                host,
                settings,
                cycle,
                positions,
                notification_ttl,
            )))
        }),
    )
    .expect("Failed to start eframe");
}
