//! Error types and Result aliases for rli

use std::fmt;
use std::path::PathBuf;

/// Result type alias for rli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rli
#[derive(Debug)]
pub enum Error {
    // === Command registry errors ===
    /// No command registered under this name
    CommandNotFound {
        name: String,
    },

    /// Registration rejected because the name is taken (strict mode only)
    DuplicateCommand {
        name: String,
    },

    /// Command name is empty or contains whitespace
    InvalidCommandName {
        name: String,
        reason: String,
    },

    // === Process delegate errors ===
    /// A delegated process is already running
    AlreadyActive {
        program: String,
    },

    /// The external program could not be started
    SpawnFailed {
        program: String,
        reason: String,
    },

    /// Failed to deliver a signal to the delegated process
    SignalSendFailed {
        signal: String,
        reason: String,
    },

    /// Signal delivery is not available on this platform
    SignalNotSupported {
        signal: String,
        platform: String,
    },

    // === Session errors ===
    /// The session has been closed and no longer accepts events
    SessionClosed,

    /// The line editor failed irrecoverably
    EditorFailed {
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to parse configuration
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    /// Failed to serialize configuration
    ConfigSerializationFailed {
        format: String,
        reason: String,
    },

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// JSON errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Generic errors
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Registry errors
            Error::CommandNotFound { name } => {
                write!(f, "Unrecognized command '{}'", name)
            }
            Error::DuplicateCommand { name } => {
                write!(f, "Command '{}' is already registered", name)
            }
            Error::InvalidCommandName { name, reason } => {
                write!(f, "Invalid command name '{}': {}", name, reason)
            }

            // Process errors
            Error::AlreadyActive { program } => {
                write!(f, "A delegated process is already running ('{}')", program)
            }
            Error::SpawnFailed { program, reason } => {
                write!(f, "Failed to start '{}': {}", program, reason)
            }
            Error::SignalSendFailed { signal, reason } => {
                write!(f, "Failed to send signal '{}': {}", signal, reason)
            }
            Error::SignalNotSupported { signal, platform } => {
                write!(f, "Signal '{}' not supported on {}", signal, platform)
            }

            // Session errors
            Error::SessionClosed => write!(f, "Session is closed"),
            Error::EditorFailed { reason } => write!(f, "Line editor failed: {}", reason),

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }
            Error::ConfigSerializationFailed { format, reason } => {
                write!(f, "Failed to serialize config as {}: {}", format, reason)
            }
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }

            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Serde(err) => Some(err),
            Error::Toml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(format!("{:#}", err))
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
