//! Diagnostic trace sink.
//!
//! Engine code reports user-visible diagnostics through [`Trace`]. Every
//! implementation here also forwards to `tracing`, so the log files see the
//! same records. Trace calls cannot fail.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TraceLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TraceLevel::Debug => "DEBUG",
            TraceLevel::Info => "INFO",
            TraceLevel::Warn => "WARN",
            TraceLevel::Error => "ERROR",
        })
    }
}

pub trait Trace: Send + Sync {
    fn record(
        &self,
        level: TraceLevel,
        category: &str,
        message: &str,
        error: Option<&(dyn StdError + 'static)>,
    );

    fn debug(&self, category: &str, message: &str) {
        self.record(TraceLevel::Debug, category, message, None);
    }

    fn info(&self, category: &str, message: &str) {
        self.record(TraceLevel::Info, category, message, None);
    }

    fn warn(&self, category: &str, message: &str) {
        self.record(TraceLevel::Warn, category, message, None);
    }

    fn error(&self, category: &str, message: &str, error: Option<&(dyn StdError + 'static)>) {
        self.record(TraceLevel::Error, category, message, error);
    }
}

/// Render an error and its sources as `outer: inner: root`.
pub fn error_chain(error: &(dyn StdError + 'static)) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn forward(level: TraceLevel, category: &str, message: &str, error: Option<&str>) {
    match (level, error) {
        (TraceLevel::Debug, _) => tracing::debug!(category, "{message}"),
        (TraceLevel::Info, _) => tracing::info!(category, "{message}"),
        (TraceLevel::Warn, None) => tracing::warn!(category, "{message}"),
        (TraceLevel::Warn, Some(e)) => tracing::warn!(category, error = e, "{message}"),
        (TraceLevel::Error, None) => tracing::error!(category, "{message}"),
        (TraceLevel::Error, Some(e)) => tracing::error!(category, error = e, "{message}"),
    }
}

/// Trace that only forwards to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTrace;

impl Trace for TracingTrace {
    fn record(
        &self,
        level: TraceLevel,
        category: &str,
        message: &str,
        error: Option<&(dyn StdError + 'static)>,
    ) {
        let chain = error.map(error_chain);
        forward(level, category, message, chain.as_deref());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub at: DateTime<Utc>,
    pub level: TraceLevel,
    pub category: String,
    pub message: String,
    pub error: Option<String>,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<5} [{}] {}",
            self.at.format("%H:%M:%S%.3f"),
            self.level,
            self.category,
            self.message
        )?;
        if let Some(e) = &self.error {
            write!(f, ": {e}")?;
        }
        Ok(())
    }
}

/// Keeps the most recent records in memory for an on-screen console.
#[derive(Debug)]
pub struct BufferedTrace {
    capacity: usize,
    records: Mutex<VecDeque<TraceRecord>>,
}

impl BufferedTrace {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn records_at_least(&self, level: TraceLevel) -> Vec<TraceRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level >= level)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Trace for BufferedTrace {
    fn record(
        &self,
        level: TraceLevel,
        category: &str,
        message: &str,
        error: Option<&(dyn StdError + 'static)>,
    ) {
        let chain = error.map(error_chain);
        forward(level, category, message, chain.as_deref());

        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(TraceRecord {
            at: Utc::now(),
            level,
            category: category.to_string(),
            message: message.to_string(),
            error: chain,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("plugin 'tile' failed")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn buffer_keeps_the_latest_records() {
        let trace = BufferedTrace::new(2);
        trace.info("a", "one");
        trace.warn("b", "two");
        trace.debug("c", "three");

        let messages: Vec<_> = trace.records().into_iter().map(|r| r.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert_eq!(trace.records_at_least(TraceLevel::Warn).len(), 1);
    }

    #[test]
    fn errors_are_rendered_with_their_sources() {
        let trace = BufferedTrace::new(8);
        let err = Outer(std::io::Error::other("disk gone"));
        trace.error("runner", "Error running game", Some(&err));

        let rec = &trace.records()[0];
        assert_eq!(rec.level, TraceLevel::Error);
        assert_eq!(
            rec.error.as_deref(),
            Some("plugin 'tile' failed: disk gone")
        );
        assert!(rec.to_string().contains("[runner] Error running game: plugin 'tile' failed"));
    }

    #[test]
    fn zero_capacity_still_keeps_one_record() {
        let trace = BufferedTrace::new(0);
        trace.info("a", "x");
        trace.info("a", "y");
        assert_eq!(trace.capacity(), 1);
        assert_eq!(trace.records()[0].message, "y");
    }
}
