use crate::config::{self, LogConfig, PRODUCT_NAME};
use chrono::Local;
use std::backtrace::Backtrace;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::SystemTime;

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();

/// Where session logs and crash reports go, and how many of each survive.
#[derive(Debug, Clone)]
pub struct LogLayout {
    pub dir: PathBuf,
    pub stem: String,
    pub keep_sessions: usize,
    pub keep_crashes: usize,
}

impl LogLayout {
    pub fn from_config(config: &LogConfig) -> Result<Self, String> {
        Ok(Self::in_dir(config::data_dir()?.join(&config.dir_name), config))
    }

    fn in_dir(dir: PathBuf, config: &LogConfig) -> Self {
        Self {
            dir,
            stem: config.file_stem.clone(),
            keep_sessions: config.keep_sessions.max(1),
            keep_crashes: config.keep_crashes,
        }
    }

    pub fn active(&self) -> PathBuf {
        self.generation(0)
    }

    /// Generation 0 is the running session.
    fn generation(&self, n: usize) -> PathBuf {
        if n == 0 {
            self.dir.join(format!("{}.log", self.stem))
        } else {
            self.dir.join(format!("{}.{}.log", self.stem, n))
        }
    }

    fn is_crash_report(name: &str) -> bool {
        name.starts_with("crash-") && name.ends_with(".log")
    }
}

pub fn init_session_logging(layout: &LogLayout) -> Result<PathBuf, String> {
    fs::create_dir_all(&layout.dir).map_err(|e| format!("Failed to create logs dir: {}", e))?;
    rotate_logs(layout)?;
    prune_crash_logs(layout)?;
    let active = layout.active();
    let file = File::options()
        .create(true)
        .append(true)
        .open(&active)
        .map_err(|e| format!("Failed to open session log: {}", e))?;
    let _ = LOG_FILE.set(Mutex::new(file));
    append_line(
        "INFO",
        &format!(
            "session_start product=\"{}\" version={}",
            PRODUCT_NAME,
            env!("CARGO_PKG_VERSION")
        ),
    );
    Ok(active)
}

/// Shift every kept session back one generation, dropping the oldest.
fn rotate_logs(layout: &LogLayout) -> Result<(), String> {
    let _ = fs::remove_file(layout.generation(layout.keep_sessions));
    for n in (0..layout.keep_sessions).rev() {
        let from = layout.generation(n);
        if from.exists() {
            fs::rename(&from, layout.generation(n + 1))
                .map_err(|e| format!("Failed to rotate {}: {}", from.display(), e))?;
        }
    }
    Ok(())
}

fn prune_crash_logs(layout: &LogLayout) -> Result<(), String> {
    let mut reports: Vec<(SystemTime, PathBuf)> = fs::read_dir(&layout.dir)
        .map_err(|e| format!("Failed to read logs dir: {}", e))?
        .filter_map(Result::ok)
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(LogLayout::is_crash_report)
        })
        .map(|entry| {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, entry.path())
        })
        .collect();
    reports.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, path) in reports.into_iter().skip(layout.keep_crashes) {
        let _ = fs::remove_file(path);
    }
    Ok(())
}

/// Append one line to the session log. A no-op until `init_session_logging` succeeds.
pub fn append_line(level: &str, msg: &str) {
    let ts = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let line = format!("[{}] [{}] {}\n", ts, level, msg);
    if let Some(lock) = LOG_FILE.get() {
        if let Ok(mut f) = lock.lock() {
            let _ = f.write_all(line.as_bytes());
            let _ = f.flush();
        }
    }
}

/// `context` is appended to every crash report, see `AppConfig::crash_context`.
pub fn install_panic_hook(layout: LogLayout, context: String) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let panic_msg = info.to_string();
        let bt = Backtrace::force_capture().to_string();
        append_line("PANIC", &panic_msg);
        append_line("PANIC", &format!("backtrace:\n{}", bt));
        let path = layout
            .dir
            .join(format!("crash-{}.log", Local::now().format("%Y%m%d-%H%M%S")));
        let written = fs::create_dir_all(&layout.dir)
            .and_then(|_| fs::write(&path, crash_report(&panic_msg, &bt, &context)));
        if let Err(e) = written {
            eprintln!("[diagnostics] Failed to write crash report: {}", e);
        }
        previous(info);
    }));
}

fn crash_report(message: &str, backtrace: &str, context: &str) -> String {
    format!(
        "{} crash report\nversion: {}\ntime: {}\n{}\n\nmessage:\n{}\n\nbacktrace:\n{}\n",
        PRODUCT_NAME,
        env!("CARGO_PKG_VERSION"),
        Local::now().to_rfc3339(),
        context,
        message,
        backtrace
    )
}

#[macro_export]
macro_rules! app_log {
    ($($arg:tt)*) => {{
        ::std::println!($($arg)*);
        $crate::diagnostics::append_line("INFO", &format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! app_warn {
    ($($arg:tt)*) => {{
        ::std::eprintln!($($arg)*);
        $crate::diagnostics::append_line("WARN", &format!($($arg)*));
    }};
}

#[macro_export]
macro_rules! app_err {
    ($($arg:tt)*) => {{
        ::std::eprintln!($($arg)*);
        $crate::diagnostics::append_line("ERROR", &format!($($arg)*));
    }};
}
