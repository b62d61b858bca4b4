//! Error types for tree building and scope analysis.
//!
//! # Error Handling Strategy
//!
//! This crate uses three complementary patterns:
//!
//! - [`ParseError`]: the SQL document could not be tokenized. Returned as
//!   `Result<T, ParseError>` from [`crate::tree::SqlTree::parse`]; nothing can be
//!   analyzed.
//!
//! - [`NotApplicable`]: the cursor is not inside a CTE-bearing query, or the
//!   scope defines no CTEs. These are outcomes, not failures, and callers are
//!   expected to do nothing when they see one.
//!
//! - [`crate::types::Issue`]: non-fatal diagnostics (duplicate CTE names,
//!   forward references) returned alongside a successful extraction.
//!
//! Missing sub-structure inside an otherwise valid CTE (no parentheses, no
//! `WITH` keyword, no separator comma) never produces an error: the builder
//! substitutes a fallback span or text.

use crate::types::Dialect;
use std::fmt;
use thiserror::Error;

/// Error encountered while tokenizing a SQL document.
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Human-readable error message.
    pub message: String,
    /// Position where the error occurred, if available.
    pub position: Option<Position>,
    /// The SQL dialect being tokenized when the error occurred.
    pub dialect: Option<Dialect>,
    /// The specific category of parse error.
    pub kind: ParseErrorKind,
}

/// Position information for a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
}

/// Category of parse error for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseErrorKind {
    /// Lexer/tokenization error.
    #[default]
    LexerError,
    /// Input exceeds the accepted document size.
    InputTooLarge,
}

impl ParseError {
    /// Creates a new parse error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
            dialect: None,
            kind: ParseErrorKind::LexerError,
        }
    }

    /// Creates a parse error with position information.
    pub fn with_position(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            position: Some(Position { line, column }),
            ..Self::new(message)
        }
    }

    /// Adds dialect context to the error.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Sets the error kind.
    pub fn with_kind(mut self, kind: ParseErrorKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Parse error")?;

        if let Some(dialect) = self.dialect {
            write!(f, " ({dialect:?})")?;
        }

        if let Some(pos) = self.position {
            write!(f, " at line {}, column {}", pos.line, pos.column)?;
        }

        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for ParseError {}

impl From<sqlparser::tokenizer::TokenizerError> for ParseError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        let position = if err.location.line > 0 && err.location.column > 0 {
            Some(Position {
                line: err.location.line as usize,
                column: err.location.column as usize,
            })
        } else {
            None
        };

        Self {
            message: err.message,
            position,
            dialect: None,
            kind: ParseErrorKind::LexerError,
        }
    }
}

/// Why a cursor position has nothing to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotApplicable {
    /// No `WITH` clause encloses the cursor.
    #[error("cursor is not inside a WITH clause")]
    NoScope,
    /// The enclosing `WITH` clause defines no CTEs.
    #[error("WITH clause defines no common table expressions")]
    NoCtes,
}

impl NotApplicable {
    /// Machine-readable issue code for this outcome.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoScope => crate::types::issue_codes::NO_SCOPE,
            Self::NoCtes => crate::types::issue_codes::NO_CTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::tokenizer::Tokenizer;

    #[test]
    fn test_display_with_position() {
        let err = ParseError::with_position("Unterminated string literal", 10, 5);
        assert_eq!(
            err.to_string(),
            "Parse error at line 10, column 5: Unterminated string literal"
        );
    }

    #[test]
    fn test_display_with_dialect() {
        let err = ParseError::new("Bad syntax").with_dialect(Dialect::Postgres);
        assert_eq!(err.to_string(), "Parse error (Postgres): Bad syntax");
    }

    #[test]
    fn test_from_tokenizer_error_keeps_location() {
        let dialect = Dialect::Generic.to_sqlparser_dialect();
        let err = Tokenizer::new(dialect.as_ref(), "SELECT 'open")
            .tokenize_with_location()
            .unwrap_err();

        let parse_error = ParseError::from(err);
        assert_eq!(parse_error.kind, ParseErrorKind::LexerError);
        assert!(parse_error.position.is_some());
        assert_eq!(parse_error.position.unwrap().line, 1);
    }

    #[test]
    fn test_with_kind_builder() {
        let err = ParseError::new("Error").with_kind(ParseErrorKind::InputTooLarge);
        assert_eq!(err.kind, ParseErrorKind::InputTooLarge);
    }

    #[test]
    fn test_not_applicable_codes() {
        assert_eq!(NotApplicable::NoScope.code(), "NO_SCOPE");
        assert_eq!(NotApplicable::NoCtes.code(), "NO_CTES");
        assert_eq!(
            NotApplicable::NoCtes.to_string(),
            "WITH clause defines no common table expressions"
        );
    }
}
