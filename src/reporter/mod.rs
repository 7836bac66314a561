//! Logging capability handed to every staging operation.
//!
//! Operations never log through ambient state directly; they receive a
//! `&dyn Reporter`. The binary passes a [`TracingReporter`], tests pass a
//! [`MemoryReporter`] and assert on what was reported.

use std::sync::Mutex;
use tracing::{error, info, warn};

/// Severity of a reported line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLevel {
    Info,
    Warn,
    Error,
}

pub trait Reporter: Send + Sync {
    fn report(&self, level: ReportLevel, message: &str);

    fn info(&self, message: &str) {
        self.report(ReportLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.report(ReportLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.report(ReportLevel::Error, message);
    }
}

/// Forwards reports to `tracing` under a fixed step label
#[derive(Debug, Clone)]
pub struct TracingReporter {
    step: String,
}

impl TracingReporter {
    pub fn new(step: impl Into<String>) -> Self {
        Self { step: step.into() }
    }
}

impl Reporter for TracingReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        match level {
            ReportLevel::Info => info!(step = %self.step, "{}", message),
            ReportLevel::Warn => warn!(step = %self.step, "{}", message),
            ReportLevel::Error => error!(step = %self.step, "{}", message),
        }
    }
}

/// Keeps every report in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    lines: Mutex<Vec<(ReportLevel, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(ReportLevel, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Messages reported at the given level
    pub fn messages(&self, level: ReportLevel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }

    /// Whether any line at `level` contains `needle`
    pub fn contains(&self, level: ReportLevel, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, level: ReportLevel, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push((level, message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_records_levels() {
        let reporter = MemoryReporter::new();
        reporter.info("copied a.csv");
        reporter.warn("missing b.csv");
        reporter.error("failed c.csv");

        assert_eq!(reporter.lines().len(), 3);
        assert_eq!(reporter.messages(ReportLevel::Warn), vec!["missing b.csv"]);
        assert!(reporter.contains(ReportLevel::Error, "c.csv"));
        assert!(!reporter.contains(ReportLevel::Info, "b.csv"));
    }

    #[test]
    fn test_reporter_is_object_safe() {
        let reporter: Box<dyn Reporter> = Box::new(TracingReporter::new("stage"));
        reporter.info("hello");
    }
}
