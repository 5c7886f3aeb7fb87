//! Command name completion
//!
//! Computes the candidate set for a partially typed command name. Presenting
//! the candidates is the line editor's job.

use crate::commands::CommandRegistry;

/// Completion source built from a snapshot of registered command names
#[derive(Debug, Clone, Default)]
pub struct CompletionProvider {
    /// Command names in registration order
    names: Vec<String>,
    /// Prefix that marks a line as a command (e.g. ".")
    prefix: Option<String>,
}

/// How a completion request resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// Nothing matched
    None,
    /// Exactly one candidate; the editor replaces the partial input
    Unique,
    /// Several candidates; the editor lists them
    Ambiguous,
}

/// Candidates for a partial input
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    candidates: Vec<String>,
}

impl Completion {
    /// Candidate command names in registration order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn into_candidates(self) -> Vec<String> {
        self.candidates
    }

    pub fn kind(&self) -> CompletionKind {
        match self.candidates.len() {
            0 => CompletionKind::None,
            1 => CompletionKind::Unique,
            _ => CompletionKind::Ambiguous,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Longest prefix shared by every candidate
    pub fn common_prefix(&self) -> Option<&str> {
        let first = self.candidates.first()?;
        let mut end = first.len();
        for candidate in &self.candidates[1..] {
            end = first
                .char_indices()
                .zip(candidate.chars())
                .take_while(|((_, a), b)| a == b)
                .map(|((i, a), _)| i + a.len_utf8())
                .last()
                .unwrap_or(0)
                .min(end);
        }
        Some(&first[..end])
    }
}

impl CompletionProvider {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            prefix: None,
        }
    }

    /// Snapshot the registry's names
    pub fn from_registry(registry: &CommandRegistry, prefix: Option<&str>) -> Self {
        Self {
            names: registry.names().map(str::to_string).collect(),
            prefix: prefix.map(str::to_string),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into()).filter(|p: &String| !p.is_empty());
        self
    }

    /// Names whose start matches `partial`, case-sensitive, registration order.
    ///
    /// Only the first token completes: input that already contains whitespace
    /// yields no candidates.
    pub fn complete(&self, partial: &str) -> Completion {
        if partial.chars().any(char::is_whitespace) {
            return Completion::default();
        }

        let (stem, prefix) = match &self.prefix {
            Some(prefix) => match partial.strip_prefix(prefix.as_str()) {
                Some(stem) => (stem, prefix.as_str()),
                None => return Completion::default(),
            },
            None => (partial, ""),
        };

        let candidates = self
            .names
            .iter()
            .filter(|name| name.starts_with(stem))
            .map(|name| format!("{}{}", prefix, name))
            .collect();

        Completion { candidates }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
