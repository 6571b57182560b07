//! Logging collaborator handed to sources at construction.

use std::sync::Arc;

/// Sink for the pipeline's leveled messages. Never fails.
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Forwards to the `log` facade. This is the default collaborator.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl Logger for LogFacade {
    fn info(&self, message: &str) {
        log::info!(target: "reqwest_proxy_supply", "{}", message);
    }

    fn warn(&self, message: &str) {
        log::warn!(target: "reqwest_proxy_supply", "{}", message);
    }
}

/// Writes `[INFO] ...` / `[WARN] ...` lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger;

impl ConsoleLogger {
    fn line(level: &str, message: &str) -> String {
        format!("[{}] {}", level, message)
    }
}

impl Logger for ConsoleLogger {
    fn info(&self, message: &str) {
        eprintln!("{}", Self::line("INFO", message));
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", Self::line("WARN", message));
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}
}

pub(crate) fn default_logger() -> Arc<dyn Logger> {
    Arc::new(LogFacade)
}
