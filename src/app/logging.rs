//! Tracing subscriber setup and the log line format.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

// Custom time formatter for logs: "YYYY-MM-DD HH:MM:SS" (local time)
pub struct LocalTimeFormatter;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

// Custom event formatter for logs: "YYYY-MM-DD HH:MM:SS [LEVEL] message"
pub struct CustomEventFormat {
    pub ansi: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for CustomEventFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        use tracing_subscriber::fmt::time::FormatTime;

        LocalTimeFormatter.format_time(&mut writer)?;
        write!(writer, " ")?;

        let level = event.metadata().level();
        if self.ansi {
            let level_color = match *level {
                tracing::Level::TRACE => "\x1b[2m",  // Dim/gray
                tracing::Level::DEBUG => "\x1b[34m", // Blue
                tracing::Level::INFO => "\x1b[32m",  // Green
                tracing::Level::WARN => "\x1b[33m",  // Yellow
                tracing::Level::ERROR => "\x1b[31m", // Red
            };
            write!(writer, "{}[{}]\x1b[0m ", level_color, level)?;
        } else {
            write!(writer, "[{}] ", level)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Map a user-facing level name to a tracing filter directive.
/// CRITICAL has no tracing equivalent and maps to ERROR.
pub fn level_filter(level: &str) -> Option<&'static str> {
    match level.to_lowercase().as_str() {
        "critical" | "error" => Some("error"),
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        _ => None,
    }
}

/// Priority: 1. --log-level flag, 2. LOG_LEVEL env, 3. config file, 4. info
pub fn resolve_filter(flag: Option<&str>, env: Option<&str>, config_level: &str) -> &'static str {
    for candidate in [flag, env, Some(config_level)].into_iter().flatten() {
        match level_filter(candidate) {
            Some(filter) => return filter,
            None => eprintln!(
                "Invalid log level '{}'. Valid levels: TRACE, DEBUG, INFO, WARN, ERROR, CRITICAL",
                candidate
            ),
        }
    }
    "info"
}

/// Path of this invocation's log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(chrono::Local::now().format("%Y%m%d-%H%M%S.log").to_string())
}

/// Initialize the tracing subscriber: stderr always, plus a plain-text file
/// when `log_file` is given. Stdout is left alone for console relay output.
pub fn init_tracing(filter: &str, log_file: Option<&Path>) -> Result<()> {
    use tracing_subscriber::prelude::*;

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {:?}", parent))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false)
                    .event_format(CustomEventFormat { ansi: false }),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .event_format(CustomEventFormat { ansi: true }),
        )
        .with(file_layer)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_maps_to_error() {
        assert_eq!(level_filter("CRITICAL"), Some("error"));
        assert_eq!(level_filter("Debug"), Some("debug"));
        assert_eq!(level_filter("loud"), None);
    }

    #[test]
    fn flag_beats_env_beats_config() {
        assert_eq!(resolve_filter(Some("trace"), Some("warn"), "ERROR"), "trace");
        assert_eq!(resolve_filter(None, Some("warn"), "ERROR"), "warn");
        assert_eq!(resolve_filter(None, None, "ERROR"), "error");
        assert_eq!(resolve_filter(Some("bogus"), None, "DEBUG"), "debug");
        assert_eq!(resolve_filter(None, None, "bogus"), "info");
    }

    #[test]
    fn log_file_is_timestamped() {
        let path = log_file_path(Path::new("/srv/minecraft/backups/logs"));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with(".log"));
        assert_eq!(name.len(), "20230101-120000.log".len());
    }
}
