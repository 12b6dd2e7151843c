//! Request dispatcher.
//!
//! Runs on the tokio runtime, executes tickets issued by the UI-owned `PanelController`
//! and reports completions back as [`PanelEvent`]s.

use super::panel::Ticket;
use crate::engine::PanelTransport;
use crate::error::PanelError;
use crate::model::PanelEvent;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Submit(Ticket),
    Quit,
}

/// Execute one ticket and wrap the outcome in a completion event.
pub(crate) async fn execute(transport: &dyn PanelTransport, ticket: Ticket) -> PanelEvent {
    let Ticket { seq, request } = ticket;
    debug!(seq, max_tokens = request.max_output_tokens, "dispatching request");
    let started = std::time::Instant::now();
    let outcome = transport.full_pipeline(&request).await;
    info!(
        seq,
        ok = outcome.is_ok(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request finished"
    );
    PanelEvent::Completed { seq, outcome }
}

/// Serve UI commands until `Quit` or the command channel closes.
///
/// Requests run concurrently; there is no cancellation, so a superseded request still
/// finishes and its completion is discarded by the controller's sequence check.
pub(crate) async fn run_dispatcher(
    transport: Arc<dyn PanelTransport>,
    event_tx: UnboundedSender<PanelEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) {
    let mut in_flight: JoinSet<PanelEvent> = JoinSet::new();
    // Task id to ticket seq, so a task that dies still completes its request.
    let mut seqs: HashMap<Id, u64> = HashMap::new();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Submit(ticket)) => {
                        let seq = ticket.seq;
                        let transport = transport.clone();
                        let handle = in_flight
                            .spawn(async move { execute(transport.as_ref(), ticket).await });
                        seqs.insert(handle.id(), seq);
                    }
                    Some(UiCommand::Quit) | None => break,
                }
            }
            Some(joined) = in_flight.join_next_with_id(), if !in_flight.is_empty() => {
                let event = match joined {
                    Ok((id, event)) => {
                        seqs.remove(&id);
                        event
                    }
                    Err(err) => {
                        warn!(error = %err, "request task failed to join");
                        let Some(seq) = seqs.remove(&err.id()) else {
                            continue;
                        };
                        PanelEvent::Completed {
                            seq,
                            outcome: Err(PanelError::TaskFailed(err.to_string())),
                        }
                    }
                };
                if event_tx.send(event).is_err() {
                    debug!("event receiver dropped; stopping dispatcher");
                    break;
                }
            }
        }
    }

    // Pending requests are abandoned on exit.
    in_flight.abort_all();
}
