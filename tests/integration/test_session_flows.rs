//! Integration Tests for Session Flows
//!
//! These tests drive a session through line events, handler dispatch and
//! delegated processes, checking state, history and notifications.

#[path = "../test_utils/mod.rs"]
mod test_utils;

use std::sync::{Arc, Mutex};

use rli::terminal::EditorResult;
use rli::{
    BusyInputPolicy, Command, DuplicatePolicy, Error, ExitOutcome, Notification, SessionConfig,
    SessionEvent, SessionState,
};
use test_utils::{recording_command, step, test_session, test_session_with, ScriptedEditor};

fn line(text: &str) -> SessionEvent {
    SessionEvent::Line(text.to_string())
}

#[tokio::test]
async fn test_echo_records_once_and_returns_to_idle() {
    let (mut session, sink) = test_session();
    let (echo, calls) = recording_command("echo");
    session.register_command(echo).unwrap();

    let state = session.handle_event(line("echo hello")).await;

    assert_eq!(state, SessionState::Idle);
    assert_eq!(*calls.lock().unwrap(), vec![vec!["hello".to_string()]]);
    assert_eq!(session.history().entries().collect::<Vec<_>>(), vec!["echo hello"]);
    assert!(!session.delegate().is_active());
    assert!(sink.notifications().is_empty());
}

#[tokio::test]
async fn test_arguments_are_split_on_whitespace() {
    let (mut session, _sink) = test_session();
    let (echo, calls) = recording_command("echo");
    session.register_command(echo).unwrap();

    session.handle_event(line("  echo   a  b\tc  ")).await;
    session.handle_event(line("echo")).await;

    let calls = calls.lock().unwrap();
    assert_eq!(calls[0], vec!["a", "b", "c"]);
    assert!(calls[1].is_empty());
}

#[tokio::test]
async fn test_repeated_line_is_promoted_not_duplicated() {
    let (mut session, _sink) = test_session();
    let (echo, _calls) = recording_command("echo");
    session.register_command(echo).unwrap();

    session.handle_event(line("echo one")).await;
    session.handle_event(line("echo two")).await;
    session.handle_event(line("echo one")).await;

    assert_eq!(
        session.history().entries().collect::<Vec<_>>(),
        vec!["echo one", "echo two"]
    );
}

#[tokio::test]
async fn test_unrecognized_command_is_reported_and_recorded() {
    let (mut session, sink) = test_session();

    let state = session.handle_event(line("frobnicate now")).await;

    assert_eq!(state, SessionState::Idle);
    assert_eq!(
        sink.notifications(),
        vec![Notification::UnrecognizedCommand {
            name: "frobnicate".to_string()
        }]
    );
    assert!(session.history().contains("frobnicate now"));
}

#[tokio::test]
async fn test_default_line_handler_receives_full_line() {
    let (mut session, sink) = test_session();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    session.on_line(move |ctx, line| {
        log.lock().unwrap().push((ctx.command().to_string(), line.to_string()));
        ctx.print(&format!("Thank you for your input: {}", line));
        Ok(())
    });

    let state = session.handle_event(line("hello there")).await;

    assert_eq!(state, SessionState::Idle);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![("hello".to_string(), "hello there".to_string())]
    );
    assert_eq!(sink.output(), vec!["Thank you for your input: hello there"]);
    assert!(sink.notifications().is_empty());
}

#[tokio::test]
async fn test_failing_handler_produces_one_notification() {
    let (mut session, sink) = test_session();
    session
        .register_command(Command::new("broken", "Always fails.", |_ctx, _args| {
            anyhow::bail!("disk on fire")
        }))
        .unwrap();

    let state = session.handle_event(line("broken")).await;

    assert_eq!(state, SessionState::Idle);
    assert_eq!(
        sink.notifications(),
        vec![Notification::HandlerFault {
            command: "broken".to_string(),
            reason: "disk on fire".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_panicking_handler_does_not_close_session() {
    let (mut session, sink) = test_session();
    session
        .register_command(Command::new("panic", "Panics.", |_ctx, _args| {
            panic!("handler exploded")
        }))
        .unwrap();

    let state = session.handle_event(line("panic")).await;

    assert_eq!(state, SessionState::Idle);
    assert_eq!(
        sink.count(|n| matches!(n, Notification::HandlerFault { reason, .. } if reason.contains("handler exploded"))),
        1
    );

    // Still usable afterwards
    let (echo, calls) = recording_command("echo");
    session.register_command(echo).unwrap();
    session.handle_event(line("echo ok")).await;
    assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_help_lists_commands_in_registration_order() {
    let (mut session, sink) = test_session();
    session
        .register_command(
            Command::new("echo", "Write <string> to the standard output.", |_ctx, _args| Ok(()))
                .with_args(["<string>"]),
        )
        .unwrap();
    session
        .register_command(Command::new("exit", "Terminate.", |_ctx, _args| Ok(())))
        .unwrap();

    session.handle_event(line("help")).await;

    let output = sink.output();
    assert_eq!(output.len(), 3);
    assert!(output[0].contains("help"));
    assert!(output[1].contains("echo <string>"));
    assert!(output[1].contains("Write <string> to the standard output."));
    assert!(output[2].contains("exit"));
}

#[tokio::test]
async fn test_duplicate_registration_policies() {
    let (mut session, _sink) = test_session();
    let (first, first_calls) = recording_command("run");
    let (second, second_calls) = recording_command("run");
    session.register_command(first).unwrap();
    session.register_command(second).unwrap();
    session.handle_event(line("run")).await;
    assert!(first_calls.lock().unwrap().is_empty());
    assert_eq!(second_calls.lock().unwrap().len(), 1);

    let config = SessionConfig::default().with_duplicate_policy(DuplicatePolicy::Reject);
    let (mut strict, _sink) = test_session_with(config);
    strict.register_command(recording_command("run").0).unwrap();
    assert!(matches!(
        strict.register_command(recording_command("run").0),
        Err(Error::DuplicateCommand { .. })
    ));
}

#[tokio::test]
async fn test_command_prefix_routing() {
    let config = SessionConfig::default().with_command_prefix(".");
    let (mut session, sink) = test_session_with(config);
    let (echo, calls) = recording_command("echo");
    session.register_command(echo).unwrap();
    let plain = Arc::new(Mutex::new(Vec::new()));
    let log = plain.clone();
    session.on_line(move |_ctx, line| {
        log.lock().unwrap().push(line.to_string());
        Ok(())
    });

    session.handle_event(line(".echo hi")).await;
    session.handle_event(line("echo hi")).await;
    session.handle_event(line(".nope")).await;

    assert_eq!(*calls.lock().unwrap(), vec![vec!["hi".to_string()]]);
    assert_eq!(*plain.lock().unwrap(), vec!["echo hi".to_string()]);
    assert_eq!(
        sink.notifications(),
        vec![Notification::UnrecognizedCommand {
            name: "nope".to_string()
        }]
    );
    assert_eq!(session.completer().complete(".e").candidates(), [".echo"]);
}

#[cfg(unix)]
mod delegated {
    use super::*;

    fn spawn_command(name: &str, program: &'static str, args: &'static [&'static str]) -> Command {
        Command::new(name, "Run a program in the foreground.", move |ctx, _args| {
            ctx.spawn(program, args.iter().copied())?;
            Ok(())
        })
    }

    #[tokio::test]
    async fn test_spawn_enters_process_active_until_exit() {
        let (mut session, sink) = test_session();
        session
            .register_command(spawn_command("fail3", "sh", &["-c", "exit 3"]))
            .unwrap();

        let state = session.handle_event(line("fail3")).await;
        assert_eq!(state, SessionState::ProcessActive);
        assert!(session.delegate().is_active());

        let state = step(&mut session).await;
        assert_eq!(state, SessionState::Idle);
        assert!(!session.delegate().is_active());
        assert_eq!(
            sink.notifications(),
            vec![Notification::ProcessFinished {
                program: "sh".to_string(),
                outcome: ExitOutcome::Exited(3),
            }]
        );
    }

    #[tokio::test]
    async fn test_second_spawn_is_rejected_and_first_keeps_running() {
        let (mut session, _sink) = test_session();
        let rejected = Arc::new(Mutex::new(None));
        let slot = rejected.clone();
        session
            .register_command(Command::new("twice", "Spawn twice.", move |ctx, _args| {
                ctx.spawn("sleep", ["5"])?;
                let second = ctx.spawn("true", Vec::<String>::new());
                *slot.lock().unwrap() = Some(matches!(second, Err(Error::AlreadyActive { .. })));
                Ok(())
            }))
            .unwrap();

        let state = session.handle_event(line("twice")).await;

        assert_eq!(state, SessionState::ProcessActive);
        assert_eq!(*rejected.lock().unwrap(), Some(true));
        assert_eq!(session.delegate().active().unwrap().program, "sleep");

        session.close();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_spawn_failure_is_reported_once() {
        let (mut session, sink) = test_session();
        session
            .register_command(spawn_command("ghost", "/nonexistent/rli-ghost", &[]))
            .unwrap();

        let state = session.handle_event(line("ghost")).await;

        assert_eq!(state, SessionState::Idle);
        assert_eq!(sink.notifications().len(), 1);
        assert!(matches!(
            &sink.notifications()[0],
            Notification::SpawnFailed { program, .. } if program == "/nonexistent/rli-ghost"
        ));
    }

    #[tokio::test]
    async fn test_lines_are_buffered_while_process_runs() {
        let (mut session, _sink) = test_session();
        let (echo, calls) = recording_command("echo");
        session.register_command(echo).unwrap();
        session
            .register_command(spawn_command("nap", "sleep", &["0.2"]))
            .unwrap();

        session.handle_event(line("nap")).await;
        let state = session.handle_event(line("echo later")).await;
        assert_eq!(state, SessionState::ProcessActive);
        assert_eq!(session.pending_lines(), 1);
        assert!(calls.lock().unwrap().is_empty());

        let state = step(&mut session).await;
        assert_eq!(state, SessionState::Idle);
        assert_eq!(session.pending_lines(), 0);
        assert_eq!(*calls.lock().unwrap(), vec![vec!["later".to_string()]]);
    }

    #[tokio::test]
    async fn test_lines_are_dropped_under_drop_policy() {
        let config = SessionConfig::default().with_busy_input(BusyInputPolicy::Drop);
        let (mut session, sink) = test_session_with(config);
        session
            .register_command(spawn_command("nap", "sleep", &["5"]))
            .unwrap();

        session.handle_event(line("nap")).await;
        session.handle_event(line("echo ignored")).await;

        assert_eq!(session.pending_lines(), 0);
        assert_eq!(
            sink.count(|n| matches!(n, Notification::InputDropped { .. })),
            1
        );
        session.close();
    }

    #[tokio::test]
    async fn test_close_while_process_active() {
        let (mut session, _sink) = test_session();
        session
            .register_command(spawn_command("nap", "sleep", &["5"]))
            .unwrap();
        session.handle_event(line("nap")).await;

        let handle = session.handle();
        handle.close().unwrap();
        let state = step(&mut session).await;

        assert_eq!(state, SessionState::Closed);
        assert!(session.is_closed());
    }

    #[tokio::test]
    async fn test_close_leaves_no_descendants() {
        use test_utils::processes::{read_pid, script_with_grandchild, wait_until_gone};

        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("grandchild.pid").to_string_lossy().into_owned();
        let (mut session, _sink) = test_session();
        session
            .register_command(Command::new("nest", "Start a nested sleep.", move |ctx, _args| {
                let script = script_with_grandchild("");
                ctx.spawn("sh", ["-c", script.as_str(), "sh", pid_file.as_str()])?;
                Ok(())
            }))
            .unwrap();

        session.handle_event(line("nest")).await;
        assert_eq!(session.state(), SessionState::ProcessActive);
        let grandchild = read_pid(&dir.path().join("grandchild.pid")).await;

        session.close();

        assert!(session.is_closed());
        assert!(
            wait_until_gone(grandchild).await,
            "grandchild {} outlived the session",
            grandchild
        );
    }

    #[tokio::test]
    async fn test_run_only_reads_while_idle() {
        let (mut session, sink) = test_session();
        let (echo, calls) = recording_command("echo");
        session.register_command(echo).unwrap();
        session
            .register_command(spawn_command("nap", "sleep", &["0.2"]))
            .unwrap();

        let (editor, requests) = ScriptedEditor::new(vec![
            EditorResult::Line("nap".into()),
            EditorResult::Line("echo after".into()),
            EditorResult::Eof,
        ]);

        tokio::time::timeout(std::time::Duration::from_secs(10), session.run(editor))
            .await
            .expect("session did not finish")
            .unwrap();

        assert!(session.is_closed());
        assert_eq!(*calls.lock().unwrap(), vec![vec!["after".to_string()]]);
        assert!(sink
            .notifications()
            .iter()
            .all(|n| !matches!(n, Notification::HandlerFault { .. })));

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].history, vec!["nap".to_string()]);
        assert_eq!(
            requests[2].history,
            vec!["nap".to_string(), "echo after".to_string()]
        );
        assert_eq!(
            requests[0].completer.complete("e").candidates(),
            ["echo"]
        );
    }
}

#[tokio::test]
async fn test_run_stops_on_editor_failure() {
    let (mut session, _sink) = test_session();
    let (editor, _requests) = ScriptedEditor::new(vec![EditorResult::Failed("tty gone".into())]);

    let result = session.run(editor).await;

    assert!(matches!(result, Err(Error::EditorFailed { reason }) if reason == "tty gone"));
    assert!(session.is_closed());
}

/// Blocks until its gate is dropped, like a terminal nobody types into
struct StalledEditor(std::sync::mpsc::Receiver<()>);

impl rli::LineEditor for StalledEditor {
    fn read_line(&mut self, _request: &rli::terminal::ReadRequest) -> EditorResult {
        let _ = self.0.recv();
        EditorResult::Eof
    }
}

#[tokio::test]
async fn test_close_during_read_does_not_wait_for_editor() {
    let (mut session, _sink) = test_session();
    let (gate, stalled) = std::sync::mpsc::channel::<()>();

    session.handle().close().unwrap();
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        session.run(StalledEditor(stalled)),
    )
    .await
    .expect("run waited for the blocked read");

    assert!(result.is_ok());
    assert!(session.is_closed());
    drop(gate);
}

#[tokio::test]
async fn test_submitted_lines_via_handle() {
    let (mut session, _sink) = test_session();
    let (echo, calls) = recording_command("echo");
    session.register_command(echo).unwrap();

    let handle = session.handle();
    handle.submit_line("echo one").unwrap();
    handle.submit_line("echo two").unwrap();

    step(&mut session).await;
    step(&mut session).await;

    assert_eq!(calls.lock().unwrap().len(), 2);
    tokio_test::assert_ok!(handle.close());
}
