//! Logging sink consumed by every filter.
//!
//! The core only depends on [`Logger`]; it never assumes a backend. The
//! default is [`NoOpLogger`]. [`TracingLogger`] forwards to `tracing` so an
//! application with a subscriber installed sees filter lifecycle events.
use std::fmt;
use std::sync::Arc;

pub trait Logger: fmt::Debug + Send + Sync {
    fn log(&self, message: &str);

    fn error(&self, message: &str) {
        self.log(&format!("ERROR: {message}"));
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _message: &str) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::debug!(target: "kbloom", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "kbloom", "{message}");
    }
}

pub(crate) fn default_logger() -> Arc<dyn Logger> {
    Arc::new(NoOpLogger)
}
