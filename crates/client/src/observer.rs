//! Run reporting.
//!
//! The orchestrator never writes logs itself; it reports [`RunEvent`]s to an
//! [`Observer`] handed in by whoever builds it. [`LogObserver`] turns them
//! into log lines.

use std::fmt;

use log::{debug, error, info, warn};

/// Where the orchestrator was when something happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Batching,
    Dispatch,
    Drain,
    Poll,
    Query,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Batching => "batching",
            Phase::Dispatch => "dispatch",
            Phase::Drain => "drain",
            Phase::Poll => "poll",
            Phase::Query => "query",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Connected { addr: String },
    ConnectFailed { addr: String, error: String },
    BatchSent { count: usize, weight: usize },
    BatchAccepted { count: usize },
    BatchRejected { count: usize, rejected: usize },
    BatchUnexpectedReply { count: usize, reply: String },
    EndAcknowledged { reply: String },
    PollPending { attempt: u32 },
    ResultsReady { attempts: u32 },
    Winners { count: usize },
    Interrupted { phase: Phase },
    ShutdownRequested { signal: i32, first: bool },
}

pub trait Observer: Send + Sync {
    fn on_event(&self, event: &RunEvent);
}

/// Writes events through the `log` facade.
pub struct LogObserver {
    agency: String,
}

impl LogObserver {
    pub fn new(agency: impl Into<String>) -> Self {
        Self {
            agency: agency.into(),
        }
    }
}

impl Observer for LogObserver {
    fn on_event(&self, event: &RunEvent) {
        let id = &self.agency;
        match event {
            RunEvent::Connected { addr } => {
                debug!("action: connect | result: success | client_id: {id} | address: {addr}")
            }
            RunEvent::ConnectFailed { addr, error } => error!(
                "action: connect | result: fail | client_id: {id} | error: {error} | address: {addr}"
            ),
            RunEvent::BatchSent { count, weight } => debug!(
                "action: batch_send | result: in_progress | client_id: {id} | batch_size: {count} | bytes: {weight}"
            ),
            RunEvent::BatchAccepted { count } => {
                info!("action: batch_send | result: success | client_id: {id} | batch_size: {count}")
            }
            RunEvent::BatchRejected { count, rejected } => warn!(
                "action: batch_send | result: fail | client_id: {id} | batch_size: {count} | rejected: {rejected}"
            ),
            RunEvent::BatchUnexpectedReply { count, reply } => warn!(
                "action: batch_send | result: fail | client_id: {id} | batch_size: {count} | reply: {reply:?}"
            ),
            RunEvent::EndAcknowledged { reply } => {
                debug!("action: end_send | result: success | client_id: {id} | reply: {reply:?}")
            }
            RunEvent::PollPending { attempt } => debug!(
                "action: ask_winners | result: pending | client_id: {id} | attempt: {attempt}"
            ),
            RunEvent::ResultsReady { attempts } => info!(
                "action: ask_winners | result: success | client_id: {id} | attempts: {attempts}"
            ),
            RunEvent::Winners { count } => {
                info!("action: consulta_ganadores | result: success | client_id: {id} | cant_ganadores: {count}")
            }
            RunEvent::Interrupted { phase } => {
                info!("action: run | result: interrupted | client_id: {id} | phase: {phase}")
            }
            RunEvent::ShutdownRequested { signal, first } => {
                if *first {
                    warn!("action: shutdown | result: in_progress | client_id: {id} | signal: {signal}")
                } else {
                    debug!("action: shutdown | result: ignored | client_id: {id} | signal: {signal}")
                }
            }
        }
    }
}
