//! Application-level orchestration.
//!
//! `panel` holds the request lifecycle state machine; `controller` runs the async side
//! that executes the requests it issues. UI and CLI layers drive both.

mod controller;
mod panel;

pub(crate) use controller::{execute, run_dispatcher, UiCommand};
pub(crate) use panel::{Completion, PanelController, Ticket};
