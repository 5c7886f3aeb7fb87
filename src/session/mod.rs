//! Session controller
//!
//! The [`Session`] owns the command registry, the history, and the process
//! delegate, and it advances a single state machine one [`SessionEvent`] at a
//! time:
//!
//! - A submitted line is parsed and dispatched from `Idle`. It is buffered
//!   (or dropped) while a delegated process runs.
//! - `^C` from `Idle` enters `ConfirmExit`. A second `^C` inside the window
//!   closes the session; a line or the window elapsing returns to `Idle`.
//! - `^C` while a process runs is forwarded to the process group. Its exit
//!   event returns the session to `Idle`.
//!
//! Handler failures and panics are caught at the dispatch boundary and
//! reported through the [`NotificationSink`]; only `close` and the
//! double-interrupt sequence end a session.

pub mod context;
pub mod events;
pub mod state;

pub use context::CommandContext;
pub use events::{SessionEvent, SessionHandle};
pub use state::SessionState;

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::commands::{help_command, Command, CommandRegistry, HandlerResult, LineHandler};
use crate::completion::CompletionProvider;
use crate::config::{BusyInputPolicy, SessionConfig};
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::process::{InterruptListener, ProcessDelegate, ProcessEvent};
use crate::terminal::{
    ConsoleSink, EditorResult, EditorThread, LineEditor, Notification, NotificationSink,
    ReadRequest, TerminalModes,
};

/// Interactive command session
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    registry: CommandRegistry,
    history: HistoryStore,
    delegate: ProcessDelegate,
    default_handler: Option<LineHandler>,
    sink: Arc<dyn NotificationSink>,
    /// End of the confirm-exit window, set only in `ConfirmExit`
    confirm_deadline: Option<Instant>,
    /// Lines submitted while a process was active
    pending_lines: VecDeque<String>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    process_rx: mpsc::UnboundedReceiver<ProcessEvent>,
}

impl Session {
    /// Create a session, validating `config`
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (process_tx, process_rx) = mpsc::unbounded_channel();

        let mut registry = CommandRegistry::new(config.on_duplicate_command);
        if config.builtin_help {
            registry.register(help_command())?;
        }

        Ok(Self {
            history: HistoryStore::with_limit(config.history_bound()),
            registry,
            delegate: ProcessDelegate::new(process_tx),
            default_handler: None,
            sink: Arc::new(ConsoleSink),
            state: SessionState::Idle,
            confirm_deadline: None,
            pending_lines: VecDeque::new(),
            events_tx,
            events_rx,
            process_rx,
            config,
        })
    }

    /// Route notifications and handler output somewhere other than the console
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn register_command(&mut self, command: Command) -> Result<()> {
        self.registry.register(command)
    }

    pub fn register_commands<I>(&mut self, commands: I) -> Result<()>
    where
        I: IntoIterator<Item = Command>,
    {
        self.registry.register_all(commands)
    }

    pub fn unregister_command(&mut self, name: &str) -> Option<Command> {
        self.registry.unregister(name)
    }

    /// Handle lines that match no command
    pub fn on_line<F>(&mut self, handler: F)
    where
        F: Fn(&mut CommandContext<'_>, &str) -> HandlerResult + Send + Sync + 'static,
    {
        self.default_handler = Some(Arc::new(handler));
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    /// A first interrupt is waiting for its confirmation
    pub fn pending_exit_confirmation(&self) -> bool {
        self.state == SessionState::ConfirmExit
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn delegate(&self) -> &ProcessDelegate {
        &self.delegate
    }

    /// Lines waiting for the active process to finish
    pub fn pending_lines(&self) -> usize {
        self.pending_lines.len()
    }

    /// Completion snapshot of the current registry
    pub fn completer(&self) -> CompletionProvider {
        CompletionProvider::from_registry(&self.registry, self.config.command_prefix())
    }

    /// What the line editor needs for its next read
    pub fn read_request(&self) -> ReadRequest {
        ReadRequest {
            prompt: self.config.prompt.clone(),
            history: self.history.oldest_first().map(str::to_string).collect(),
            completer: self.completer(),
        }
    }

    /// Sender for feeding events from other tasks
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.events_tx.clone())
    }

    /// Close immediately, killing any active process
    pub fn close(&mut self) {
        if self.is_closed() {
            return;
        }
        if self.delegate.terminate() {
            debug!("Killed active process on close");
        }
        self.confirm_deadline = None;
        self.pending_lines.clear();
        self.set_state(SessionState::Closed);
        info!("Session closed");
    }

    /// Wait for the next event and apply it.
    ///
    /// Events come from [`SessionHandle`]s, process exits, and the
    /// confirm-exit timer, in arrival order.
    pub async fn step(&mut self) -> Result<SessionState> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        let event = self.next_event().await;
        Ok(self.handle_event(event).await)
    }

    /// Drive the session from a line editor until it closes.
    ///
    /// A session closed from outside while the editor is mid-read returns
    /// without waiting for that read. The terminal modes seen at start are
    /// restored, but the editor thread stays blocked until input arrives or
    /// the process exits.
    pub async fn run<E>(&mut self, editor: E) -> Result<()>
    where
        E: LineEditor + Send + 'static,
    {
        let modes = TerminalModes::capture();
        let mut editor = EditorThread::spawn(editor)?;
        let mut interrupts = InterruptListener::new()?;
        let mut reading = false;

        info!("Session started");
        while !self.is_closed() {
            if !reading && self.state.accepts_input() {
                editor.request(self.read_request())?;
                reading = true;
            }

            let event = tokio::select! {
                result = editor.recv(), if reading => {
                    reading = false;
                    match result {
                        Some(EditorResult::Line(line)) => SessionEvent::Line(line),
                        Some(EditorResult::Interrupted) => SessionEvent::Interrupt,
                        Some(EditorResult::Eof) => SessionEvent::EndOfInput,
                        Some(EditorResult::Failed(reason)) => {
                            self.close();
                            return Err(Error::EditorFailed { reason });
                        }
                        None => {
                            self.close();
                            return Err(Error::EditorFailed {
                                reason: "editor thread exited".to_string(),
                            });
                        }
                    }
                }
                Some(()) = interrupts.recv() => SessionEvent::Interrupt,
                event = self.next_event() => event,
            };

            self.handle_event(event).await;
        }

        if reading {
            debug!("Closed with a read outstanding");
            modes.restore();
        }
        editor.shutdown();
        Ok(())
    }

    /// Apply one event and return the resulting state
    pub async fn handle_event(&mut self, event: SessionEvent) -> SessionState {
        if self.is_closed() {
            debug!("Ignoring {:?} on closed session", event);
            return self.state;
        }

        match event {
            SessionEvent::Line(line) => self.on_line_submitted(line),
            SessionEvent::Interrupt => self.on_interrupt(),
            SessionEvent::EndOfInput => {
                debug!("End of input");
                self.close();
            }
            SessionEvent::Process(event) => self.on_process_exit(event),
            SessionEvent::ConfirmTimeout => self.on_confirm_timeout(),
            SessionEvent::Close => self.close(),
        }

        self.drain_pending();
        self.state
    }

    async fn next_event(&mut self) -> SessionEvent {
        let deadline = self.confirm_deadline;
        tokio::select! {
            Some(event) = self.process_rx.recv() => SessionEvent::Process(event),
            Some(event) = self.events_rx.recv() => event,
            _ = sleep_until(deadline) => SessionEvent::ConfirmTimeout,
        }
    }

    fn on_line_submitted(&mut self, line: String) {
        match self.state {
            SessionState::Idle => self.process_line(&line),
            SessionState::ConfirmExit => {
                debug!("Input received, exit confirmation discarded");
                self.confirm_deadline = None;
                self.set_state(SessionState::Idle);
                self.process_line(&line);
            }
            _ => match self.config.busy_input {
                BusyInputPolicy::Buffer => {
                    debug!("Buffering line while {}", self.state);
                    self.pending_lines.push_back(line);
                }
                BusyInputPolicy::Drop => {
                    self.sink.notify(&Notification::InputDropped { line });
                }
            },
        }
    }

    fn on_interrupt(&mut self) {
        match self.state {
            SessionState::Idle => self.begin_exit_confirmation(),
            SessionState::ConfirmExit => {
                let expired = self
                    .confirm_deadline
                    .map_or(true, |deadline| Instant::now() >= deadline);
                if expired {
                    // The timer event lost the race; this counts as a new first interrupt
                    self.begin_exit_confirmation();
                } else {
                    info!("Exit confirmed");
                    self.close();
                }
            }
            SessionState::ProcessActive => {
                if let Err(e) = self.delegate.interrupt() {
                    warn!("Failed to interrupt delegated process: {}", e);
                    self.sink.notify(&Notification::InterruptFailed {
                        reason: e.to_string(),
                    });
                }
            }
            _ => debug!("Ignoring interrupt while {}", self.state),
        }
    }

    fn begin_exit_confirmation(&mut self) {
        let timeout = self.config.confirm_exit_timeout();
        self.confirm_deadline = Some(Instant::now() + timeout);
        self.set_state(SessionState::ConfirmExit);
        self.sink.notify(&Notification::ConfirmExit { timeout });
    }

    fn on_confirm_timeout(&mut self) {
        if self.state != SessionState::ConfirmExit {
            return;
        }
        let expired = self
            .confirm_deadline
            .map_or(true, |deadline| Instant::now() >= deadline);
        if expired {
            debug!("Exit confirmation timed out");
            self.confirm_deadline = None;
            self.set_state(SessionState::Idle);
        }
    }

    fn on_process_exit(&mut self, event: ProcessEvent) {
        let Some(finished) = self.delegate.on_exit(&event) else {
            return;
        };

        if let Some(outcome) = finished.outcome() {
            self.sink.notify(&Notification::ProcessFinished {
                program: finished.program.clone(),
                outcome: outcome.clone(),
            });
        }

        if self.state == SessionState::ProcessActive {
            self.set_state(SessionState::Idle);
        }
    }

    fn drain_pending(&mut self) {
        while self.state == SessionState::Idle {
            let Some(line) = self.pending_lines.pop_front() else {
                break;
            };
            self.process_line(&line);
        }
    }

    fn process_line(&mut self, line: &str) {
        self.set_state(SessionState::Parsing);

        let line = line.trim();
        if line.is_empty() {
            self.set_state(SessionState::Idle);
            return;
        }

        self.history.record(line);

        let mut tokens = line.split_whitespace();
        let first = tokens.next().unwrap_or_default();
        let args: Vec<String> = tokens.map(str::to_string).collect();

        let name = match self.config.command_prefix() {
            Some(prefix) => first.strip_prefix(prefix),
            None => Some(first),
        };

        if let Some(command) = name.and_then(|name| self.registry.get(name)) {
            let command_name = command.name().to_string();
            let handler = command.handler().clone();
            self.dispatch(&command_name, |ctx| handler(ctx, &args));
            return;
        }

        let prefixed = self.config.command_prefix().is_some();
        match name {
            // A prefixed line always names a command
            Some(name) if prefixed => self.report_unrecognized(name),
            _ => match self.default_handler.clone() {
                Some(handler) => self.dispatch(first, |ctx| handler(ctx, line)),
                None => self.report_unrecognized(first),
            },
        }
    }

    fn report_unrecognized(&mut self, name: &str) {
        debug!("Unrecognized command '{}'", name);
        self.sink.notify(&Notification::UnrecognizedCommand {
            name: name.to_string(),
        });
        self.set_state(SessionState::Idle);
    }

    /// Run a handler with faults contained
    fn dispatch<F>(&mut self, command: &str, invoke: F)
    where
        F: FnOnce(&mut CommandContext<'_>) -> HandlerResult,
    {
        self.set_state(SessionState::Dispatching);

        let mut ctx = CommandContext::new(
            command,
            &self.registry,
            &self.history,
            &mut self.delegate,
            self.sink.as_ref(),
        );

        let fault = match panic::catch_unwind(AssertUnwindSafe(|| invoke(&mut ctx))) {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                let already_reported = ctx.spawn_failure_reported()
                    && matches!(e.downcast_ref::<Error>(), Some(Error::SpawnFailed { .. }));
                (!already_reported).then(|| format!("{:#}", e))
            }
            Err(payload) => Some(panic_message(payload.as_ref())),
        };
        let close_requested = ctx.close_requested();

        if let Some(reason) = fault {
            warn!("Command '{}' failed: {}", command, reason);
            self.sink.notify(&Notification::HandlerFault {
                command: command.to_string(),
                reason,
            });
        }

        if close_requested {
            self.close();
        } else if self.delegate.is_active() {
            self.set_state(SessionState::ProcessActive);
        } else {
            self.set_state(SessionState::Idle);
        }
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition_to(next) {
            warn!("Unexpected session transition {} -> {}", self.state, next);
        }
        trace!("Session {} -> {}", self.state, next);
        self.state = next;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.delegate.terminate();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("commands", &self.registry.len())
            .field("history", &self.history.len())
            .field("delegate", &self.delegate)
            .finish_non_exhaustive()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
