//! Line editor that replays a fixed script

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rli::terminal::{EditorResult, LineEditor, ReadRequest};

/// Replays results in order, then reports end of input.
///
/// Every request is logged so tests can check when the session asked for a
/// line and what history/completion it offered.
pub struct ScriptedEditor {
    script: VecDeque<EditorResult>,
    requests: Arc<Mutex<Vec<ReadRequest>>>,
}

impl ScriptedEditor {
    pub fn new<I>(script: I) -> (Self, Arc<Mutex<Vec<ReadRequest>>>)
    where
        I: IntoIterator<Item = EditorResult>,
    {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let editor = Self {
            script: script.into_iter().collect(),
            requests: requests.clone(),
        };
        (editor, requests)
    }

    /// Script made only of submitted lines
    pub fn lines<I, S>(lines: I) -> (Self, Arc<Mutex<Vec<ReadRequest>>>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(|l| EditorResult::Line(l.into())))
    }
}

impl LineEditor for ScriptedEditor {
    fn read_line(&mut self, request: &ReadRequest) -> EditorResult {
        self.requests.lock().unwrap().push(request.clone());
        self.script.pop_front().unwrap_or(EditorResult::Eof)
    }
}
