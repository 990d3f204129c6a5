//! Renders alert contexts into Slack mrkdwn text.
//!
//! Pure functions: every input, including the timestamp, is passed in
//! explicitly so rendering is deterministic under test.

use crate::core::{tail_chars, AlertContext, TRACE_BUDGET};
use chrono::{DateTime, Local};

/// Timestamp layout used in every alert, e.g. `07/08/2025, 21:03:52`.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y, %H:%M:%S";

/// Escapes the characters Slack treats as markup control in mrkdwn text.
///
/// Applied to user-controlled substrings (error messages, traces, custom
/// fields) so a hostile or unlucky payload cannot spoof message structure.
pub fn escape_mrkdwn(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Renders the full error alert: Time / Environment / Service / Stack Trace,
/// plus a Cloudwatch section when a log pointer is present and a Custom
/// Fields section when any fields were attached.
pub fn render_error(ctx: &AlertContext) -> String {
    let trace = escape_mrkdwn(tail_chars(&ctx.report.trace, TRACE_BUDGET));
    let mut out = format!(
        "*Time*: `{}`\n*Environment*: `{}`\n*Service*: `{}`\n*Stack Trace*: ```Type: {}\nTraceback: {}\nError: {}\n```",
        ctx.timestamp.format(TIMESTAMP_FORMAT),
        ctx.environment,
        ctx.service,
        escape_mrkdwn(&ctx.report.kind),
        trace,
        escape_mrkdwn(&ctx.report.message),
    );

    if let Some(cloudwatch) = &ctx.cloudwatch {
        out.push_str(&format!("\n*Cloudwatch*: {cloudwatch}\n"));
    }

    if !ctx.custom_fields.is_empty() {
        out.push_str("\n*Custom Fields*:\n```");
        for (key, value) in &ctx.custom_fields {
            out.push_str(&format!(
                "{}: {}\n",
                escape_mrkdwn(key),
                escape_mrkdwn(value)
            ));
        }
        out.push_str("```");
    }

    out
}

/// Renders a generic, non-error message with the same header sections.
pub fn render_generic(
    message: &str,
    environment: &str,
    service: &str,
    timestamp: DateTime<Local>,
) -> String {
    format!(
        "*Time*: `{}`\n*Environment*: `{}`\n*Service*: `{}`\n*Message*: ```{}\n```",
        timestamp.format(TIMESTAMP_FORMAT),
        environment,
        service,
        escape_mrkdwn(message),
    )
}
