//! Tokens produced by the grammar engine's lexer
//!
//!     A token is the kind tag of the terminal that matched, the literal text, and where
//!     it came from. Positions are 1-based (line and column), the span is the byte range
//!     in the source. Synthetic tokens (block markers, end of input) take their position
//!     from a neighbouring real token.

use serde::Serialize;
use std::fmt;
use std::ops::Range as ByteRange;

/// Kind used for the synthetic token reported when input ends unexpectedly.
pub const END_KIND: &str = "$END";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "value")]
    pub text: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip)]
    pub span: ByteRange<usize>,
}

impl Token {
    pub fn new(
        kind: impl Into<String>,
        text: impl Into<String>,
        line: usize,
        column: usize,
        span: ByteRange<usize>,
    ) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            line,
            column,
            span,
        }
    }

    /// Build a token of another kind that reuses this token's position.
    pub fn borrow_position(&self, kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            line: self.line,
            column: self.column,
            span: self.span.clone(),
        }
    }

    /// Build a token of another kind positioned where the text after this token starts.
    /// After a newline token that is the first significant column of the next line.
    pub fn following(&self, kind: impl Into<String>, text: impl Into<String>) -> Self {
        let (line, column) = position_after(self);
        Self {
            kind: kind.into(),
            text: text.into(),
            line,
            column,
            span: self.span.end..self.span.end,
        }
    }

    /// The end-of-input token, positioned right after `last` (or at 1:1 for empty input).
    pub fn end_of_input(last: Option<&Token>) -> Self {
        match last {
            Some(last) => last.following(END_KIND, ""),
            None => Token::new(END_KIND, "", 1, 1, 0..0),
        }
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Filtered tokens never reach parse trees.
    pub fn is_filtered(&self) -> bool {
        self.kind.starts_with('_')
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?}) at {}:{}", self.kind, self.text, self.line, self.column)
    }
}

fn position_after(token: &Token) -> (usize, usize) {
    match token.text.rfind('\n') {
        Some(idx) => (
            token.line + token.text.matches('\n').count(),
            token.text[idx + 1..].chars().count() + 1,
        ),
        None => (token.line, token.column + token.text.chars().count()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_of_input_follows_last_token() {
        let last = Token::new("NAME", "alpine", 3, 5, 20..26);
        let end = Token::end_of_input(Some(&last));
        assert_eq!(end.kind, END_KIND);
        assert_eq!((end.line, end.column), (3, 11));
        assert_eq!(end.span, 26..26);
    }

    #[test]
    fn test_end_of_input_after_newline() {
        let last = Token::new("_NL", "\n    ", 1, 6, 5..10);
        let end = Token::end_of_input(Some(&last));
        assert_eq!((end.line, end.column), (2, 5));
    }

    #[test]
    fn test_following_a_newline_lands_on_the_next_line() {
        let newline = Token::new("_NL", "\n\n  ", 4, 9, 30..33);
        let marker = newline.following("_INDENT", "");
        assert_eq!((marker.line, marker.column), (6, 3));
        assert_eq!(marker.span, 33..33);
        assert!(marker.text.is_empty());
    }

    #[test]
    fn test_end_of_empty_input() {
        let end = Token::end_of_input(None);
        assert_eq!((end.line, end.column), (1, 1));
    }

    #[test]
    fn test_filtered_kinds() {
        assert!(Token::new("_NL", "\n", 1, 1, 0..1).is_filtered());
        assert!(!Token::new("NAME", "x", 1, 1, 0..1).is_filtered());
    }
}
