use std::io::IsTerminal;

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogLevel, Resolved, Source};

/// Env var naming a log file. When set, logs go there instead of stderr.
pub const LOG_FILE_ENV: &str = "REMEXEC_LOG_FILE";

/// Initialize tracing at the resolved verbosity.
///
/// Logs go to stderr so they never mix with the remote command's stdout.
///
/// Log files are created with unique names so concurrent invocations don't
/// clobber each other: `{path}.{timestamp}.{pid}`
pub fn init_tracing(level: &Resolved<LogLevel>) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::new(filter_directives(level, rust_log.as_deref()));

    let log_path = std::env::var(LOG_FILE_ENV).ok().filter(|p| !p.is_empty());
    let Some(log_path) = log_path else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .with_timer(UtcTime::rfc_3339())
            .with_target(false);
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init();
        return;
    };

    let pid = std::process::id();
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let unique_path = format!("{}.{}.{}", log_path, timestamp, pid);

    let Ok(file) = std::fs::File::create(&unique_path) else {
        eprintln!("Warning: Failed to create log file: {}", unique_path);
        return;
    };

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();
}

/// `RUST_LOG` is only consulted when no level was given anywhere.
fn filter_directives(level: &Resolved<LogLevel>, rust_log: Option<&str>) -> String {
    match rust_log {
        Some(directives) if level.source == Source::Default && !directives.trim().is_empty() => {
            directives.to_string()
        }
        _ => level.value.as_str().to_string(),
    }
}
