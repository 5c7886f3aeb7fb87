//! User-facing notifications
//!
//! The session never writes to the terminal directly. Everything it wants
//! the user to see goes through a [`NotificationSink`], which keeps the
//! controller testable without a terminal.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use crate::process::ExitOutcome;

/// Non-fatal events reported to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A line named no registered command
    UnrecognizedCommand { name: String },
    /// A handler returned an error or panicked
    HandlerFault { command: String, reason: String },
    /// A delegated program could not be started
    SpawnFailed { program: String, reason: String },
    /// First interrupt from idle; another one within `timeout` exits
    ConfirmExit { timeout: Duration },
    /// The delegated process ended
    ProcessFinished {
        program: String,
        outcome: ExitOutcome,
    },
    /// The interrupt could not be forwarded to the delegated process
    InterruptFailed { reason: String },
    /// A line typed while a process was running was discarded
    InputDropped { line: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::UnrecognizedCommand { name } => {
                write!(f, "Unrecognized command: {}", name)
            }
            Notification::HandlerFault { command, reason } => {
                write!(f, "Command '{}' failed: {}", command, reason)
            }
            Notification::SpawnFailed { program, reason } => {
                write!(f, "Failed to start '{}': {}", program, reason)
            }
            Notification::ConfirmExit { timeout } => write!(
                f,
                "(To exit, press ^C again within {:.1}s)",
                timeout.as_secs_f64()
            ),
            Notification::ProcessFinished { program, outcome } => {
                write!(f, "{} {}", program, outcome)
            }
            Notification::InterruptFailed { reason } => {
                write!(f, "Could not interrupt process: {}", reason)
            }
            Notification::InputDropped { line } => {
                write!(f, "Ignored input while process was running: {}", line)
            }
        }
    }
}

/// Destination for notifications and handler output
pub trait NotificationSink: Send + Sync {
    /// Report a notification
    fn notify(&self, notification: &Notification);

    /// Write one line of handler output
    fn output(&self, text: &str) {
        println!("{}", text);
    }
}

/// Writes notifications to stderr and output to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, notification: &Notification) {
        // A clean exit needs no comment; the child's own output says enough
        if let Notification::ProcessFinished { outcome, .. } = notification {
            if outcome.is_success() {
                return;
            }
        }

        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", notification);
    }
}
