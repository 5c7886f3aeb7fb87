//! rli - an interactive command-line session with foreground process delegation
//!
//! This library provides a line-oriented command session: it reads lines
//! from the terminal, dispatches them to registered command handlers, and
//! lets a handler hand the terminal to an external program as a foreground
//! task. While that program runs, the session keeps listening for `^C` and
//! forwards it to the child's process group instead of dying with it.
//!
//! ## Module Organization
//!
//! - [`session`] - The session controller and its state machine
//! - [`commands`] - Command definitions and the registry
//! - [`history`] - Duplicate-free input history
//! - [`completion`] - Command name completion
//! - [`process`] - Delegated process supervision and signal delivery
//! - [`terminal`] - Line editor thread, rustyline integration, notifications
//! - [`config`] - Session configuration and file loading
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use rli::{Command, ReadlineEditor, Session, SessionConfig};
//!
//! # async fn demo() -> rli::Result<()> {
//! let mut session = Session::new(SessionConfig::default())?;
//! session.register_command(
//!     Command::new("sleep", "Sleep for a few seconds.", |ctx, args| {
//!         ctx.spawn("sleep", args.iter().cloned())?;
//!         Ok(())
//!     })
//!     .with_args(["<seconds>"]),
//! )?;
//! session.on_line(|ctx, line| {
//!     ctx.print(&format!("You said: {}", line));
//!     Ok(())
//! });
//!
//! session.run(ReadlineEditor::new()?).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **Main task:** Runs the session state machine on a tokio runtime
//! - **Editor thread:** Blocks in the line editor, one read per request
//! - **Waiter task:** One per delegated process, reports its exit
//!
//! Communication between them happens via `tokio::mpsc` channels.

#[macro_use]
extern crate tracing;

pub mod commands;
pub mod completion;
pub mod config;
pub mod error;
pub mod history;
pub mod process;
pub mod session;
pub mod terminal;

// Re-exports for core functionality
pub use commands::{Command, CommandRegistry, HandlerResult};
pub use completion::{Completion, CompletionProvider};
pub use config::loader::ConfigLoader;
pub use config::{BusyInputPolicy, DuplicatePolicy, SessionConfig};
pub use error::{Error, Result};
pub use history::HistoryStore;
pub use process::{DelegatedProcess, ExitOutcome, ProcessHandle};
pub use session::{CommandContext, Session, SessionEvent, SessionHandle, SessionState};
pub use terminal::{ConsoleSink, LineEditor, Notification, NotificationSink, ReadlineEditor};

/// The current version of rli from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
