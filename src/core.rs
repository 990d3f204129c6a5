//! Core alert types: the captured failure and the per-alert context.

use chrono::{DateTime, Local};
use std::backtrace::Backtrace;
use std::error::Error;

/// Character budget for the captured trace. Traces are tail-truncated to
/// this length because the most relevant frame sits at the end.
pub const TRACE_BUDGET: usize = 2800;

/// A snapshot of a failed operation: the error's type name, its display
/// message, and a trace combining the source chain with a backtrace.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
    pub trace: String,
}

impl ErrorReport {
    /// Captures a report from an error value at the point of failure.
    ///
    /// The trace holds a backtrace of the capture site followed by the
    /// error's source chain, already truncated to [`TRACE_BUDGET`]
    /// characters. The chain comes last so tail-truncation keeps it.
    pub fn capture<E: Error>(err: &E) -> Self {
        let mut trace = Backtrace::force_capture().to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push_str("caused by: ");
            trace.push_str(&cause.to_string());
            trace.push('\n');
            source = cause.source();
        }

        Self {
            kind: std::any::type_name::<E>().to_string(),
            message: err.to_string(),
            trace: tail_chars(&trace, TRACE_BUDGET).to_string(),
        }
    }
}

/// Everything the formatter needs to render one alert. Built fresh per
/// failure and discarded after formatting.
#[derive(Debug, Clone)]
pub struct AlertContext {
    pub environment: String,
    pub service: String,
    pub timestamp: DateTime<Local>,
    pub report: ErrorReport,
    /// Cloud-log pointer, already composed with the host suffix if any.
    pub cloudwatch: Option<String>,
    /// Caller-supplied key/value context, in insertion order.
    pub custom_fields: Vec<(String, String)>,
}

/// Returns the trailing `budget` characters of `s`, on a char boundary.
pub fn tail_chars(s: &str, budget: usize) -> &str {
    let total = s.chars().count();
    if total <= budget {
        return s;
    }
    let (idx, _) = s
        .char_indices()
        .nth(total - budget)
        .expect("index within bounds");
    &s[idx..]
}
