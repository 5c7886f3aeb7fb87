//! Delegated Process Model
//!
//! Lifecycle record of one external program started on behalf of a command.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// How a delegated process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exited normally with a status code
    Exited(i32),
    /// Terminated by a signal (Unix signal number)
    Signaled(i32),
    /// The process could not be awaited
    WaitFailed(String),
}

impl ExitOutcome {
    /// Build from a standard exit status
    pub fn from_status(status: std::process::ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::Signaled(signal);
            }
        }

        ExitOutcome::WaitFailed(format!("unrecognized exit status: {}", status))
    }

    /// Exit code 0
    pub fn is_success(&self) -> bool {
        matches!(self, ExitOutcome::Exited(0))
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exited with code {}", code),
            ExitOutcome::Signaled(signal) => write!(f, "terminated by signal {}", signal),
            ExitOutcome::WaitFailed(reason) => write!(f, "could not be awaited: {}", reason),
        }
    }
}

/// Completion status of a delegated process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Finished(ExitOutcome),
    SpawnFailed(String),
}

/// One external program started by a command handler
#[derive(Debug, Clone)]
pub struct DelegatedProcess {
    /// Identifier used to match exit events to this process
    pub id: Uuid,

    /// Program that was started
    pub program: String,

    /// Arguments passed to the program
    pub args: Vec<String>,

    /// OS process identifier
    pub pid: Option<u32>,

    pub status: ProcessStatus,

    pub start_time: DateTime<Utc>,

    pub end_time: Option<DateTime<Utc>>,
}

impl DelegatedProcess {
    /// Record for a process that just started
    pub fn started(program: impl Into<String>, args: Vec<String>, pid: Option<u32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            program: program.into(),
            args,
            pid,
            status: ProcessStatus::Running,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Record for a process that never started
    pub fn spawn_failed(program: impl Into<String>, args: Vec<String>, reason: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            program: program.into(),
            args,
            pid: None,
            status: ProcessStatus::SpawnFailed(reason),
            start_time: now,
            end_time: Some(now),
        }
    }

    pub fn mark_finished(&mut self, outcome: ExitOutcome) {
        self.status = ProcessStatus::Finished(outcome);
        self.end_time = Some(Utc::now());
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, ProcessStatus::Running)
    }

    pub fn outcome(&self) -> Option<&ExitOutcome> {
        match &self.status {
            ProcessStatus::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn execution_duration(&self) -> Option<std::time::Duration> {
        let end = self.end_time?;
        end.signed_duration_since(self.start_time).to_std().ok()
    }

    /// Program and arguments as typed
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

impl fmt::Display for DelegatedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pid = self.pid.map_or("N/A".to_string(), |pid| pid.to_string());
        let status = match &self.status {
            ProcessStatus::Running => "running".to_string(),
            ProcessStatus::Finished(outcome) => outcome.to_string(),
            ProcessStatus::SpawnFailed(reason) => format!("failed to start: {}", reason),
        };
        write!(f, "{} [{}] {}", self.command_line(), pid, status)
    }
}
