// src/avatar/resolver.rs
//! Turns one talk-status body into a [`PollOutcome`].

use serde_json::Value;

/// Status values the service uses for a talk that will never finish.
const FAILURE_STATUSES: &[&str] = &["error", "failed"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not finished yet, or the body could not be understood.
    Pending,
    /// The video is available at this (non-empty) URL.
    Ready(String),
    /// The service reported a terminal failure.
    Failed(String),
    /// The attempt budget ran out while the talk was still pending.
    TimedOut,
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::Pending)
    }
}

/// Classify a status body.
///
/// A non-empty `result_url` wins over whatever `status` says, even `"error"`.
/// Anything that is neither a URL nor a known failure status counts as
/// pending, including bodies that are empty or not objects at all.
pub fn resolve(body: &Value) -> PollOutcome {
    if let Some(url) = body
        .get("result_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
    {
        return PollOutcome::Ready(url.to_string());
    }

    match body.get("status").and_then(Value::as_str) {
        Some(status) if FAILURE_STATUSES.contains(&status) => {
            PollOutcome::Failed(failure_details(body))
        }
        _ => PollOutcome::Pending,
    }
}

fn failure_details(body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(error @ Value::Object(_)) => error
            .get("description")
            .or_else(|| error.get("kind"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        _ => body.to_string(),
    }
}
