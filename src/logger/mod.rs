//! Logger module
//!
//! Server lifecycle logging, access logging with multiple formats, and
//! error/warning logging, to stdout/stderr or configured files. Messages
//! below the configured `logging.level` are suppressed.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::OnceLock;

/// Log severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum LogLevel {
    Error,
    Warn,
    Info,
}

impl LogLevel {
    /// Parse a configured level name; unknown names mean everything is logged
    fn parse(level: &str) -> Self {
        match level.to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            _ => Self::Info,
        }
    }
}

/// Level configured at startup
static LOG_LEVEL: OnceLock<LogLevel> = OnceLock::new();

fn enabled(level: LogLevel) -> bool {
    level <= *LOG_LEVEL.get().unwrap_or(&LogLevel::Info)
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let _ = LOG_LEVEL.set(LogLevel::parse(&config.logging.level));
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    if !enabled(LogLevel::Info) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Document file: {}", config.storage.data_file));
    write_info(&format!(
        "Static root: {} (fallback: {})",
        config.static_files.root_dir, config.static_files.fallback_file
    ));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(
        LogLevel::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_error(message: &str) {
    write_error(LogLevel::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(LogLevel::Warn, &format!("[WARN] {message}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_info(&entry.format(format));
}

pub fn log_api_request(method: &str, path: &str, status: u16) {
    write_info(&format!("[API] {method} {path} - {status}"));
}

pub fn log_storage_initialized(path: &Path) {
    write_info(&format!(
        "[Storage] Created default document at {}",
        path.display()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::parse("error"), LogLevel::Error);
        assert_eq!(LogLevel::parse("WARN"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("warning"), LogLevel::Warn);
        assert_eq!(LogLevel::parse("info"), LogLevel::Info);
        assert_eq!(LogLevel::parse("qualquer"), LogLevel::Info);
    }

    #[test]
    fn test_severity_ordering_gates_messages() {
        // At level "warn", errors and warnings pass, info does not
        let configured = LogLevel::parse("warn");
        assert!(LogLevel::Error <= configured);
        assert!(LogLevel::Warn <= configured);
        assert!(LogLevel::Info > configured);
    }
}
