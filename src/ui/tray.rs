use crate::state::AppEvent;
use eframe::egui::Color32;
use std::sync::mpsc::Sender as EventSender;

pub fn setup_tray(color: Color32) -> Option<tray_icon::TrayIcon> {
    use tray_icon::menu::{Menu, MenuItem, PredefinedMenuItem};
    use tray_icon::TrayIconBuilder;

    let menu = Menu::new();
    let show = MenuItem::with_id("show", "Show mood panel", true, None);
    let test = MenuItem::with_id("test", "Test connection", true, None);
    let quit = MenuItem::with_id("quit", "Quit", true, None);

    let _ = menu.append(&show);
    let _ = menu.append(&test);
    let _ = menu.append(&PredefinedMenuItem::separator());
    let _ = menu.append(&quit);

    let icon = make_tray_icon(color)?;

    match TrayIconBuilder::new()
        .with_menu(Box::new(menu))
        .with_tooltip(crate::config::PRODUCT_NAME)
        .with_icon(icon)
        .build()
    {
        Ok(tray) => {
            println!("[tray] built successfully");
            Some(tray)
        }
        Err(e) => {
            eprintln!("[tray] build error: {}", e);
            None
        }
    }
}

/// Forward tray menu clicks to the UI thread.
pub fn spawn_menu_listener(event_tx: EventSender<AppEvent>) {
    std::thread::spawn(move || {
        while let Ok(event) = tray_icon::menu::MenuEvent::receiver().recv() {
            let Some(app_event) = menu_event(event.id.0.as_str()) else {
                continue;
            };
            if event_tx.send(app_event).is_err() {
                break;
            }
        }
    });
}

fn menu_event(id: &str) -> Option<AppEvent> {
    match id {
        "show" => Some(AppEvent::ShowPanel),
        "test" => Some(AppEvent::TestConnection),
        "quit" => Some(AppEvent::Quit),
        _ => None,
    }
}

fn make_tray_icon(color: Color32) -> Option<tray_icon::Icon> {
    let mut icon_data = vec![0u8; 16 * 16 * 4];
    for (i, pixel) in icon_data.chunks_exact_mut(4).enumerate() {
        let (x, y) = ((i % 16) as f32 - 7.5, (i / 16) as f32 - 7.5);
        let inside = x * x + y * y <= 64.0;
        pixel[0] = color.r();
        pixel[1] = color.g();
        pixel[2] = color.b();
        pixel[3] = if inside { 0xFF } else { 0x00 };
    }
    match tray_icon::Icon::from_rgba(icon_data, 16, 16) {
        Ok(i) => Some(i),
        Err(e) => {
            eprintln!("[tray] icon error: {}", e);
            None
        }
    }
}
