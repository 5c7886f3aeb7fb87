//! Configuration management for rli
//!
//! [`SessionConfig`] holds every knob the session controller reads: duplicate
//! command policy, the confirm-exit window, the history bound, what to do with
//! lines that arrive while a delegated process owns the terminal, and the
//! prompt. Files are located and parsed by [`loader::ConfigLoader`].

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// Default confirm-exit window
pub const DEFAULT_CONFIRM_EXIT_TIMEOUT_MS: u64 = 3000;

/// Upper bound accepted for the confirm-exit window
pub const MAX_CONFIRM_EXIT_TIMEOUT_MS: u64 = 60_000;

/// Default number of history entries kept in memory
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Default prompt shown by the line editor
pub const DEFAULT_PROMPT: &str = "> ";

/// What happens when a command is registered under a name that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Silently replace the earlier command, keeping its position
    #[default]
    Replace,
    /// Fail the registration with `DuplicateCommand`
    Reject,
}

/// What happens to lines submitted while a delegated process is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BusyInputPolicy {
    /// Queue the line and parse it once the session is idle again
    #[default]
    Buffer,
    /// Discard the line
    Drop,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Registration policy for duplicate command names
    pub on_duplicate_command: DuplicatePolicy,

    /// How long a first `^C` waits for a second one, in milliseconds
    pub confirm_exit_timeout_ms: u64,

    /// Maximum history entries; 0 keeps every entry
    pub history_limit: usize,

    /// Policy for lines arriving while a process is active
    pub busy_input: BusyInputPolicy,

    /// Prompt passed to the line editor
    pub prompt: String,

    /// When set, only lines starting with this prefix are parsed as commands
    pub command_prefix: Option<String>,

    /// Register the built-in `help` command
    pub builtin_help: bool,

    /// History persistence file used by the binary
    pub history_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            on_duplicate_command: DuplicatePolicy::Replace,
            confirm_exit_timeout_ms: DEFAULT_CONFIRM_EXIT_TIMEOUT_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            busy_input: BusyInputPolicy::Buffer,
            prompt: DEFAULT_PROMPT.to_string(),
            command_prefix: None,
            builtin_help: true,
            history_file: None,
        }
    }
}

impl SessionConfig {
    /// Confirm-exit window as a `Duration`
    pub fn confirm_exit_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_exit_timeout_ms)
    }

    /// History bound, `None` when unbounded
    pub fn history_bound(&self) -> Option<usize> {
        match self.history_limit {
            0 => None,
            limit => Some(limit),
        }
    }

    /// Command prefix with the empty string treated as absent
    pub fn command_prefix(&self) -> Option<&str> {
        self.command_prefix.as_deref().filter(|p| !p.is_empty())
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.on_duplicate_command = policy;
        self
    }

    pub fn with_confirm_exit_timeout(mut self, timeout: Duration) -> Self {
        // Out-of-range values saturate and are rejected by `validate`
        self.confirm_exit_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_busy_input(mut self, policy: BusyInputPolicy) -> Self {
        self.busy_input = policy;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = Some(prefix.into());
        self
    }

    pub fn without_builtin_help(mut self) -> Self {
        self.builtin_help = false;
        self
    }

    /// Check value ranges
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        if self.confirm_exit_timeout_ms == 0
            || self.confirm_exit_timeout_ms > MAX_CONFIRM_EXIT_TIMEOUT_MS
        {
            return Err(ConfigValidationError::ConfirmExitTimeout {
                value: self.confirm_exit_timeout_ms,
                max: MAX_CONFIRM_EXIT_TIMEOUT_MS,
            });
        }

        if self.prompt.is_empty() {
            return Err(ConfigValidationError::EmptyPrompt);
        }

        if let Some(prefix) = &self.command_prefix {
            if prefix.chars().any(char::is_whitespace) {
                return Err(ConfigValidationError::InvalidPrefix(prefix.clone()));
            }
        }

        Ok(())
    }
}

/// Reasons a [`SessionConfig`] is rejected
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("must be between 1 and {max} milliseconds, got {value}")]
    ConfirmExitTimeout { value: u64, max: u64 },

    #[error("prompt must not be empty")]
    EmptyPrompt,

    #[error("command prefix '{0}' must not contain whitespace")]
    InvalidPrefix(String),
}

impl ConfigValidationError {
    /// Name of the offending configuration field
    pub fn field(&self) -> &'static str {
        match self {
            ConfigValidationError::ConfirmExitTimeout { .. } => "confirm_exit_timeout_ms",
            ConfigValidationError::EmptyPrompt => "prompt",
            ConfigValidationError::InvalidPrefix(_) => "command_prefix",
        }
    }
}

impl From<ConfigValidationError> for Error {
    fn from(err: ConfigValidationError) -> Self {
        Error::ConfigValidationFailed {
            field: err.field().to_string(),
            reason: err.to_string(),
        }
    }
}
