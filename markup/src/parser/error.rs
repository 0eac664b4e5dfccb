use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// A recoverable oddity in the source, with its byte span.
///
/// The compiler never stops on these; it applies a lenient reading and
/// reports what it did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub message: String,
    pub span: Range<usize>,
    pub notes: Vec<String>,
}

impl ParseWarning {
    pub fn new(message: impl Into<String>, span: Range<usize>) -> Self {
        ParseWarning {
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        Diagnostic::warning()
            .with_message(&self.message)
            .with_labels(vec![Label::primary(file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
