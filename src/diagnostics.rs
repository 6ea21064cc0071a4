//! Per-pass diagnostic log.
//!
//! Lines are buffered during a pass and emitted through the `log` facade in
//! a fixed order when the pass commits:
//!
//! ```text
//! Version: 0.1.0
//! Config: {...}
//! Warning: ...        (zero or more)
//! Page count: 3
//! Total time: 1.234ms
//! ```
//!
//! A superseded or failed pass drops its buffer without emitting anything.

use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    version: Option<String>,
    config: Option<String>,
    warnings: Vec<String>,
    page_count: Option<usize>,
    total_time: Option<Duration>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&mut self, version: &str) {
        self.version = Some(version.to_string());
    }

    /// Effective configuration, as JSON.
    pub fn config(&mut self, json: &str) {
        self.config = Some(json.to_string());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn page_count(&mut self, count: usize) {
        self.page_count = Some(count);
    }

    pub fn total_time(&mut self, elapsed: Duration) {
        self.total_time = Some(elapsed);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The log lines in emission order. Unset entries are left out, except
    /// that a page count and a total time are always present.
    pub fn lines(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.warnings.len() + 4);
        if let Some(v) = &self.version {
            out.push(format!("Version: {v}"));
        }
        if let Some(c) = &self.config {
            out.push(format!("Config: {c}"));
        }
        out.extend(self.warnings.iter().map(|w| format!("Warning: {w}")));
        out.push(format!("Page count: {}", self.page_count.unwrap_or(0)));
        let ms = self.total_time.unwrap_or_default().as_secs_f64() * 1000.0;
        out.push(format!("Total time: {ms:.3}ms"));
        out
    }

    /// Emit every line and return them.
    pub fn flush(self) -> Vec<String> {
        let lines = self.lines();
        for line in &lines {
            if line.starts_with("Warning: ") {
                log::warn!("{line}");
            } else {
                log::info!("{line}");
            }
        }
        lines
    }
}
