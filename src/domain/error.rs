//! Errors raised while reading grammar source text.

/// A grammar that could not be parsed. Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("{line}:{column}: unexpected character {found:?}")]
    UnexpectedChar { line: usize, column: usize, found: char },
    #[error("{line}:{column}: unterminated {what}")]
    Unterminated {
        line: usize,
        column: usize,
        what: &'static str,
    },
    #[error("{line}:{column}: invalid number {text:?}")]
    InvalidNumber { line: usize, column: usize, text: String },
    #[error("{line}:{column}: expected {expected}, found {found}")]
    Unexpected {
        line: usize,
        column: usize,
        expected: String,
        found: String,
    },
    #[error("empty grammar: expected a pattern or a pattern declaration")]
    EmptyGrammar,
}

impl ParseError {
    /// Source position, when the error has one.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            ParseError::UnexpectedChar { line, column, .. }
            | ParseError::Unterminated { line, column, .. }
            | ParseError::InvalidNumber { line, column, .. }
            | ParseError::Unexpected { line, column, .. } => Some((*line, *column)),
            ParseError::EmptyGrammar => None,
        }
    }
}
