//! Handler execution context
//!
//! Handlers never see the [`Session`](super::Session) itself. They receive a
//! [`CommandContext`] that borrows the parts they may use for the duration of
//! one dispatch.

use crate::commands::CommandRegistry;
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::process::{ProcessDelegate, ProcessHandle};
use crate::terminal::{Notification, NotificationSink};

/// Capabilities available to a running handler
pub struct CommandContext<'a> {
    command: &'a str,
    registry: &'a CommandRegistry,
    history: &'a HistoryStore,
    delegate: &'a mut ProcessDelegate,
    sink: &'a dyn NotificationSink,
    close_requested: bool,
    spawn_failure_reported: bool,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        command: &'a str,
        registry: &'a CommandRegistry,
        history: &'a HistoryStore,
        delegate: &'a mut ProcessDelegate,
        sink: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            command,
            registry,
            history,
            delegate,
            sink,
            close_requested: false,
            spawn_failure_reported: false,
        }
    }

    /// Name of the command being dispatched (first token for the line handler)
    pub fn command(&self) -> &str {
        self.command
    }

    pub fn registry(&self) -> &CommandRegistry {
        self.registry
    }

    pub fn history(&self) -> &HistoryStore {
        self.history
    }

    /// Start a delegated foreground process.
    ///
    /// Returns immediately. The session enters the process-active state once
    /// the handler returns and leaves it when the process exits. A spawn
    /// failure is reported to the user here; the error is still returned so
    /// the handler can react.
    pub fn spawn<I, S>(&mut self, program: &str, args: I) -> Result<ProcessHandle>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        match self.delegate.spawn(program, &args) {
            Err(Error::SpawnFailed { program, reason }) => {
                self.sink.notify(&Notification::SpawnFailed {
                    program: program.clone(),
                    reason: reason.clone(),
                });
                self.spawn_failure_reported = true;
                Err(Error::SpawnFailed { program, reason })
            }
            other => other,
        }
    }

    pub fn is_process_active(&self) -> bool {
        self.delegate.is_active()
    }

    /// Close the session once this handler returns
    pub fn close(&mut self) {
        self.close_requested = true;
    }

    /// Write a line of handler output
    pub fn print(&self, text: &str) {
        self.sink.output(text);
    }

    pub(crate) fn close_requested(&self) -> bool {
        self.close_requested
    }

    pub(crate) fn spawn_failure_reported(&self) -> bool {
        self.spawn_failure_reported
    }
}
