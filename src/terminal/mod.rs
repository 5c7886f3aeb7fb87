//! Terminal frontend
//!
//! Line editing is a blocking operation, so the editor lives on its own
//! thread and is driven by explicit read requests. The session only asks for
//! a line when it is ready to parse one, which keeps the editor off the
//! terminal while a delegated process owns it.

pub mod modes;
pub mod output;
pub mod readline;

pub use modes::TerminalModes;
pub use output::{ConsoleSink, Notification, NotificationSink};
pub use readline::ReadlineEditor;

use std::sync::mpsc as std_mpsc;
use std::thread;

use tokio::sync::mpsc;

use crate::completion::CompletionProvider;
use crate::error::{Error, Result};

/// Everything the editor needs to read one line
#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub prompt: String,
    /// History entries, oldest first
    pub history: Vec<String>,
    pub completer: CompletionProvider,
}

/// Outcome of one read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorResult {
    Line(String),
    /// `^C` at the prompt
    Interrupted,
    /// `^D` on an empty line, or the input stream closed
    Eof,
    Failed(String),
}

/// A blocking line-editing primitive
pub trait LineEditor {
    fn read_line(&mut self, request: &ReadRequest) -> EditorResult;
}

/// Runs a [`LineEditor`] on a dedicated thread
pub struct EditorThread {
    requests: Option<std_mpsc::Sender<ReadRequest>>,
    results: mpsc::UnboundedReceiver<EditorResult>,
}

impl EditorThread {
    pub fn spawn<E>(mut editor: E) -> Result<Self>
    where
        E: LineEditor + Send + 'static,
    {
        let (request_tx, request_rx) = std_mpsc::channel::<ReadRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel();

        thread::Builder::new()
            .name("rli-editor".to_string())
            .spawn(move || {
                while let Ok(request) = request_rx.recv() {
                    let result = editor.read_line(&request);
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
                debug!("Editor thread exiting");
            })?;

        Ok(Self {
            requests: Some(request_tx),
            results: result_rx,
        })
    }

    /// Ask for the next line
    pub fn request(&self, request: ReadRequest) -> Result<()> {
        self.requests
            .as_ref()
            .ok_or(Error::SessionClosed)?
            .send(request)
            .map_err(|_| Error::EditorFailed {
                reason: "editor thread stopped".to_string(),
            })
    }

    /// Wait for the result of the outstanding request
    pub async fn recv(&mut self) -> Option<EditorResult> {
        self.results.recv().await
    }

    /// Stop accepting requests.
    ///
    /// The thread exits once its current read, if any, returns. A blocking
    /// read cannot be cancelled.
    pub fn shutdown(&mut self) {
        self.requests = None;
    }
}
