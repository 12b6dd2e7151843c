//! Request-cycle errors.
//!
//! The `Display` text of a [`PanelError`] is what ends up in `RunState::Failed`.

use reqwest::StatusCode;
use std::error::Error as _;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    /// The service answered with a non-2xx status.
    #[error("{}", status_line(.code, .reason))]
    Status { code: u16, reason: String },

    /// The request never produced a response (connect, timeout, body read).
    #[error("{0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The async side that executes requests has shut down.
    #[error("request dispatcher is not running")]
    DispatcherClosed,

    /// The task executing the request panicked or was cancelled.
    #[error("request task failed: {0}")]
    TaskFailed(String),
}

impl PanelError {
    pub fn status(status: StatusCode) -> Self {
        Self::Status {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// Flatten a reqwest error and its sources into one message.
    pub fn transport(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            if !message.contains(&cause_text) {
                message.push_str(": ");
                message.push_str(&cause_text);
            }
            source = cause.source();
        }
        if err.is_timeout() && !message.contains("timed out") {
            message.push_str(" (timed out)");
        }
        Self::Transport(message)
    }
}

fn status_line(code: &u16, reason: &str) -> String {
    if reason.is_empty() {
        code.to_string()
    } else {
        format!("{code} {reason}")
    }
}
