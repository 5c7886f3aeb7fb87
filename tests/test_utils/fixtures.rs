//! Session fixtures

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rli::{Command, Session, SessionConfig, SessionState};

use super::RecordingSink;

/// Arguments seen by a recording command, one entry per invocation
pub type CallLog = Arc<Mutex<Vec<Vec<String>>>>;

/// Session with default configuration and a recording sink
pub fn test_session() -> (Session, Arc<RecordingSink>) {
    test_session_with(SessionConfig::default())
}

pub fn test_session_with(config: SessionConfig) -> (Session, Arc<RecordingSink>) {
    let sink = RecordingSink::new();
    let session = Session::new(config)
        .expect("valid config")
        .with_sink(sink.clone());
    (session, sink)
}

/// Command that logs its arguments and succeeds
pub fn recording_command(name: &str) -> (Command, CallLog) {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let log = calls.clone();
    let command = Command::new(name, format!("Record calls to {}", name), move |_ctx, args| {
        log.lock().unwrap().push(args.to_vec());
        Ok(())
    });
    (command, calls)
}

/// Process the next queued or timed event, failing the test if none arrives
pub async fn step(session: &mut Session) -> SessionState {
    tokio::time::timeout(Duration::from_secs(10), session.step())
        .await
        .expect("no session event within 10s")
        .expect("session closed")
}
