//! Session input events
//!
//! Everything the session reacts to arrives as a [`SessionEvent`], in order,
//! through a single queue. [`SessionHandle`] lets other tasks feed that queue.

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::process::ProcessEvent;

/// One input to the session state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A line was submitted
    Line(String),
    /// The user pressed `^C`
    Interrupt,
    /// The input stream ended (`^D`)
    EndOfInput,
    /// The delegated process exited
    Process(ProcessEvent),
    /// The confirm-exit window elapsed
    ConfirmTimeout,
    /// Close was requested from outside a handler
    Close,
}

/// Cloneable sender for feeding events into a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Submit a line as if it had been typed
    pub fn submit_line(&self, line: impl Into<String>) -> Result<()> {
        self.send(SessionEvent::Line(line.into()))
    }

    /// Deliver an interrupt
    pub fn interrupt(&self) -> Result<()> {
        self.send(SessionEvent::Interrupt)
    }

    /// Ask the session to close
    pub fn close(&self) -> Result<()> {
        self.send(SessionEvent::Close)
    }

    pub fn send(&self, event: SessionEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| Error::SessionClosed)
    }
}
