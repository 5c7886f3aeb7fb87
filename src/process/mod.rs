//! Foreground process delegation
//!
//! The [`ProcessDelegate`] owns at most one external program at a time. The
//! program inherits the terminal's standard streams, so it behaves as if it
//! had been launched from a shell, while a waiter task reports its exit back
//! to the session as a [`ProcessEvent`].
//!
//! On unix the program leads its own process group. Interrupts and kills are
//! delivered to that whole group, so anything the program started goes down
//! with it, and the terminal is handed to the group while it runs.

pub mod foreground;
pub mod model;
pub mod signals;

pub use foreground::TerminalOwner;
pub use model::{DelegatedProcess, ExitOutcome, ProcessStatus};
pub use signals::{platform_signals, InterruptListener, Signal, SignalOps};

use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Exit notification sent by a waiter task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEvent {
    /// Identifier of the [`DelegatedProcess`] that ended
    pub id: Uuid,
    pub outcome: ExitOutcome,
}

/// Returned to the handler that started a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessHandle {
    pub id: Uuid,
    pub pid: Option<u32>,
}

struct ActiveProcess {
    record: DelegatedProcess,
    /// Process group led by the child, if it has one
    group: Option<u32>,
    /// Asks the waiter task to kill the child; consumed on first use
    kill: Option<oneshot::Sender<()>>,
    /// Interrupts forwarded so far
    interrupts: u32,
}

impl ActiveProcess {
    /// Kill the whole process group, then have the waiter reap the child.
    ///
    /// Returns `false` if a kill was already requested.
    fn force_kill(&mut self, signals: &dyn SignalOps) -> bool {
        if let Some(group) = self.group {
            match signals.send_group(group, Signal::Kill) {
                Ok(()) => debug!("Sent SIGKILL to process group {}", group),
                // The waiter still kills the child itself
                Err(e) => debug!("Could not kill process group {}: {}", group, e),
            }
        }

        match self.kill.take() {
            Some(kill) => kill.send(()).is_ok(),
            None => false,
        }
    }
}

/// Owner of the single foreground process
pub struct ProcessDelegate {
    events: mpsc::UnboundedSender<ProcessEvent>,
    active: Option<ActiveProcess>,
    last: Option<DelegatedProcess>,
    signals: Box<dyn SignalOps>,
    terminal: TerminalOwner,
}

impl ProcessDelegate {
    /// Create a delegate that reports exits on `events`
    pub fn new(events: mpsc::UnboundedSender<ProcessEvent>) -> Self {
        Self::with_signals(events, platform_signals())
    }

    pub fn with_signals(
        events: mpsc::UnboundedSender<ProcessEvent>,
        signals: Box<dyn SignalOps>,
    ) -> Self {
        Self {
            events,
            active: None,
            last: None,
            signals,
            terminal: TerminalOwner::new(),
        }
    }

    /// Start `program` with inherited stdio in a new process group.
    ///
    /// Fails with `AlreadyActive` while another process runs and with
    /// `SpawnFailed` if the OS refuses to start the program. Never blocks on
    /// the child; its exit arrives later as a [`ProcessEvent`]. Must be called
    /// from within a tokio runtime.
    pub fn spawn(&mut self, program: &str, args: &[String]) -> Result<ProcessHandle> {
        if let Some(active) = &self.active {
            warn!(
                "Refusing to start '{}': '{}' is still running",
                program,
                active.record.command_line()
            );
            return Err(Error::AlreadyActive {
                program: active.record.program.clone(),
            });
        }

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(unix)]
        command.process_group(0);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!("Failed to start '{}': {}", program, e);
                self.last = Some(DelegatedProcess::spawn_failed(
                    program,
                    args.to_vec(),
                    e.to_string(),
                ));
                return Err(Error::SpawnFailed {
                    program: program.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let record = DelegatedProcess::started(program, args.to_vec(), child.id());
        let handle = ProcessHandle {
            id: record.id,
            pid: record.pid,
        };
        info!("Started delegated process {}", record);

        // The child's pid doubles as its process group id
        let group = if cfg!(unix) { record.pid } else { None };
        if let Some(group) = group {
            self.terminal.hand_to(group);
        }

        let (kill_tx, mut kill_rx) = oneshot::channel::<()>();
        let events = self.events.clone();
        let id = record.id;

        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => Some(status),
                Ok(()) = &mut kill_rx => None,
            };

            let status = match status {
                Some(status) => status,
                None => {
                    debug!("Killing delegated process {}", id);
                    if let Err(e) = child.start_kill() {
                        warn!("Failed to kill delegated process {}: {}", id, e);
                    }
                    child.wait().await
                }
            };

            let outcome = match status {
                Ok(status) => ExitOutcome::from_status(status),
                Err(e) => ExitOutcome::WaitFailed(e.to_string()),
            };

            // The session may already be gone
            let _ = events.send(ProcessEvent { id, outcome });
        });

        self.active = Some(ActiveProcess {
            record,
            group,
            kill: Some(kill_tx),
            interrupts: 0,
        });

        Ok(handle)
    }

    /// Forward an interrupt to the active process group.
    ///
    /// Returns `Ok(false)` when nothing is running. A repeated interrupt, or
    /// a platform without signals, kills the group outright. The session
    /// state only changes once the exit event arrives.
    pub fn interrupt(&mut self) -> Result<bool> {
        let signals = self.signals.as_ref();
        let Some(active) = self.active.as_mut() else {
            return Ok(false);
        };

        active.interrupts += 1;
        if active.interrupts > 1 {
            info!(
                "Repeated interrupt, killing '{}'",
                active.record.command_line()
            );
            return Ok(active.force_kill(signals));
        }

        let Some(group) = active.group else {
            return Ok(active.force_kill(signals));
        };

        match signals.send_interrupt(group) {
            Ok(()) => {
                debug!("Sent SIGINT to process group {}", group);
                Ok(true)
            }
            Err(Error::SignalNotSupported { .. }) => Ok(active.force_kill(signals)),
            Err(e) => {
                if signals.is_process_running(group) {
                    Err(e)
                } else {
                    // Already gone; its exit event is on the way
                    Ok(true)
                }
            }
        }
    }

    /// Kill the active process group without waiting for the exit event,
    /// and take the terminal back. Returns `false` when nothing was running.
    pub fn terminate(&mut self) -> bool {
        let killed = match self.active.as_mut() {
            Some(active) => {
                info!("Terminating '{}'", active.record.command_line());
                active.force_kill(self.signals.as_ref())
            }
            None => false,
        };
        self.terminal.reclaim();
        killed
    }

    /// Apply an exit event, returning the finished record.
    ///
    /// Events for processes other than the active one are ignored.
    pub fn on_exit(&mut self, event: &ProcessEvent) -> Option<DelegatedProcess> {
        if self.active.as_ref().map(|a| a.record.id) != Some(event.id) {
            debug!("Ignoring exit event for stale process {}", event.id);
            return None;
        }

        let mut record = self.active.take()?.record;
        self.terminal.reclaim();
        record.mark_finished(event.outcome.clone());
        info!("Delegated process finished: {}", record);
        self.last = Some(record.clone());
        Some(record)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The running process, if any
    pub fn active(&self) -> Option<&DelegatedProcess> {
        self.active.as_ref().map(|a| &a.record)
    }

    /// Most recent process that finished or failed to start
    pub fn last_finished(&self) -> Option<&DelegatedProcess> {
        self.last.as_ref()
    }
}

impl std::fmt::Debug for ProcessDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessDelegate")
            .field("active", &self.active())
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}
