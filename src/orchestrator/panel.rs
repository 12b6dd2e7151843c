//! Request lifecycle state machine.
//!
//! `PanelController` is synchronous and owned by exactly one place (the UI thread or the
//! one-shot runner). It never performs I/O itself: `submit` hands back a [`Ticket`] that the
//! dispatcher executes, and the outcome comes back through [`PanelController::complete`].

use crate::error::PanelError;
use crate::model::{PanelRequest, PanelResult, RunState, EXAMPLE_NEWS};
use tracing::{debug, info};

/// One issued request, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub seq: u64,
    pub request: PanelRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// A later submit or a clear happened after this request was issued.
    Stale,
}

#[derive(Debug, Clone)]
pub struct PanelController {
    text: String,
    state: RunState,
    max_output_tokens: u32,
    issued: u64,
    /// Sequence number whose completion may still change `state`.
    awaiting: Option<u64>,
}

impl PanelController {
    pub fn new(max_output_tokens: u32) -> Self {
        Self {
            text: String::new(),
            state: RunState::Idle,
            max_output_tokens,
            issued: 0,
            awaiting: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn result(&self) -> Option<&PanelResult> {
        match &self.state {
            RunState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.state.is_running() && !self.text.trim().is_empty()
    }

    /// Start a request for the current text. `None` when submission is not allowed.
    pub fn submit(&mut self) -> Option<Ticket> {
        if self.state.is_running() {
            debug!("submit ignored: a request is already running");
            return None;
        }
        if self.text.trim().is_empty() {
            debug!("submit ignored: input is blank");
            return None;
        }

        self.issued += 1;
        let seq = self.issued;
        self.awaiting = Some(seq);
        self.state = RunState::Running;
        info!(seq, chars = self.text.chars().count(), "submitting news for analysis");

        Some(Ticket {
            seq,
            request: PanelRequest::new(self.text.clone(), self.max_output_tokens),
        })
    }

    /// Apply the outcome of request `seq`, unless a later action superseded it.
    pub fn complete(&mut self, seq: u64, outcome: Result<PanelResult, PanelError>) -> Completion {
        if self.awaiting != Some(seq) {
            debug!(seq, latest = self.issued, "discarding stale completion");
            return Completion::Stale;
        }
        self.awaiting = None;
        self.state = match outcome {
            Ok(result) => {
                info!(
                    seq,
                    reactions = result.reactions.len(),
                    errors = result.per_item_errors.len(),
                    "analysis completed"
                );
                RunState::Succeeded(result)
            }
            Err(err) => {
                info!(seq, error = %err, "analysis failed");
                RunState::Failed(err.to_string())
            }
        };
        Completion::Applied
    }

    /// Empty the input and return to `Idle`. Any in-flight completion becomes stale.
    pub fn clear(&mut self) {
        self.text.clear();
        self.state = RunState::Idle;
        self.awaiting = None;
    }

    pub fn reset_to_example(&mut self) {
        self.text = EXAMPLE_NEWS.to_string();
    }
}
