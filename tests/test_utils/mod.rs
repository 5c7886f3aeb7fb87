//! Test Utilities
//!
//! Recording sink, scripted line editor, session fixtures and process
//! helpers shared by the integration tests.

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;
#[cfg(unix)]
pub mod processes;
pub mod recording_sink;
pub mod scripted_editor;

// Re-exports for convenience
pub use fixtures::{recording_command, step, test_session, test_session_with, CallLog};
pub use recording_sink::RecordingSink;
pub use scripted_editor::ScriptedEditor;
