//! rustyline-backed line editor

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::{DefaultHistory, History};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{CompletionType, Config, Context, Editor, Helper};

use super::{EditorResult, LineEditor, ReadRequest};
use crate::completion::CompletionProvider;
use crate::error::{Error, Result};

/// Interactive editor with history recall and tab completion
pub struct ReadlineEditor {
    editor: Editor<SessionHelper, DefaultHistory>,
}

impl ReadlineEditor {
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .auto_add_history(false)
            .build();

        let mut editor = Editor::<SessionHelper, DefaultHistory>::with_config(config)
            .map_err(|e| Error::EditorFailed {
                reason: e.to_string(),
            })?;
        editor.set_helper(Some(SessionHelper::default()));

        Ok(Self { editor })
    }

    /// Replace the editor's history and completion sources with the
    /// session's current view
    fn sync(&mut self, request: &ReadRequest) {
        let history = self.editor.history_mut();
        if let Err(e) = history.clear() {
            warn!("Failed to reset editor history: {}", e);
        }
        for entry in &request.history {
            if let Err(e) = history.add(entry) {
                warn!("Failed to add history entry: {}", e);
                break;
            }
        }

        if let Some(helper) = self.editor.helper_mut() {
            helper.completer = request.completer.clone();
        }
    }
}

impl LineEditor for ReadlineEditor {
    fn read_line(&mut self, request: &ReadRequest) -> EditorResult {
        self.sync(request);

        match self.editor.readline(&request.prompt) {
            Ok(line) => EditorResult::Line(line),
            Err(ReadlineError::Interrupted) => EditorResult::Interrupted,
            Err(ReadlineError::Eof) => EditorResult::Eof,
            Err(e) => EditorResult::Failed(e.to_string()),
        }
    }
}

#[derive(Default)]
struct SessionHelper {
    completer: CompletionProvider,
}

impl Helper for SessionHelper {}

impl Completer for SessionHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _: &Context<'_>,
    ) -> std::result::Result<(usize, Vec<Pair>), ReadlineError> {
        let partial = &line[..pos];
        let candidates = self
            .completer
            .complete(partial)
            .into_candidates()
            .into_iter()
            .map(|name| Pair {
                display: name.clone(),
                replacement: name,
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for SessionHelper {
    type Hint = String;

    fn hint(&self, _: &str, _: usize, _: &Context<'_>) -> Option<Self::Hint> {
        None
    }
}

impl Highlighter for SessionHelper {}

impl Validator for SessionHelper {
    fn validate(
        &self,
        _: &mut ValidationContext<'_>,
    ) -> std::result::Result<ValidationResult, ReadlineError> {
        Ok(ValidationResult::Valid(None))
    }
}
