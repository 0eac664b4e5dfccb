use thiserror::Error;

/// Caller misuse of the compiler. Malformed markup never produces one of
/// these; it degrades to plain text instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// A heading or code listing asked for its number before any
    /// `set_section` call established a numbering context.
    #[error("{what} numbered outside of a section (call set_section first)")]
    NoSection { what: &'static str },
}
