use thiserror::Error;

/// Scanner failure, carrying the byte offset of the offending character.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("Unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("Unterminated block comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },
    #[error("Invalid number literal '{text}' at offset {offset}")]
    InvalidNumber { text: String, offset: usize },
    #[error("Expected identifier after '$' at offset {offset}")]
    EmptyParameter { offset: usize },
}

impl LexError {
    pub fn offset(&self) -> usize {
        match self {
            LexError::UnexpectedChar { offset, .. }
            | LexError::UnterminatedString { offset }
            | LexError::UnterminatedComment { offset }
            | LexError::InvalidNumber { offset, .. }
            | LexError::EmptyParameter { offset } => *offset,
        }
    }
}

/// Parser failure with the offending token's position and what was expected
/// instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("{0}")]
    Lex(#[from] LexError),
    #[error("Expected {expected}, found {found} at offset {offset}")]
    UnexpectedToken {
        expected: String,
        found: String,
        offset: usize,
    },
    #[error("Unexpected trailing input: {found} at offset {offset}")]
    TrailingInput { found: String, offset: usize },
    #[error("Variable '{name}' is bound more than once in the same scope (offset {offset})")]
    DuplicateVariable { name: String, offset: usize },
    #[error("Only one procedure call is allowed per query (offset {offset})")]
    MultipleProcedureCalls { offset: usize },
}

impl ParseError {
    pub fn offset(&self) -> usize {
        match self {
            ParseError::Lex(err) => err.offset(),
            ParseError::UnexpectedToken { offset, .. }
            | ParseError::TrailingInput { offset, .. }
            | ParseError::DuplicateVariable { offset, .. }
            | ParseError::MultipleProcedureCalls { offset } => *offset,
        }
    }
}
