//! Human readable failure messages
//!
//!     A [`StoryError`] ties a failure classification to the token or tree it happened
//!     at. Rendering is total: every error renders, whatever it points to.
//!
//!         Failed reading story because of unexpected "<text>" at line L, column C
//!
//!     Trees have no column, their message stops at the line. Messages are always one
//!     line: synthetic tokens render as their kind, line breaks render escaped. When the
//!     classification is known its reason is appended as `. Reason: <reason>`.

use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

use crate::story::token::Token;
use crate::story::tree::Tree;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorKind {
    #[default]
    Unknown,
    UnexpectedToken,
    UnexpectedCharacters,
    Indentation,
    InvalidNumber,
    InvalidTemplate,
}

impl ErrorKind {
    pub fn reason(&self) -> &'static str {
        match self {
            ErrorKind::Unknown => "unknown",
            ErrorKind::UnexpectedToken => "this token cannot appear here",
            ErrorKind::UnexpectedCharacters => "no token starts with these characters",
            ErrorKind::Indentation => "the indentation matches no enclosing block",
            ErrorKind::InvalidNumber => "the number cannot be represented",
            ErrorKind::InvalidTemplate => "the string template is malformed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Token(Token),
    Tree(Tree),
}

impl From<Token> for Item {
    fn from(token: Token) -> Self {
        Item::Token(token)
    }
}

impl From<Tree> for Item {
    fn from(tree: Tree) -> Self {
        Item::Tree(tree)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.kind, .item))]
pub struct StoryError {
    pub kind: ErrorKind,
    pub item: Item,
}

impl StoryError {
    pub fn new(kind: ErrorKind, item: impl Into<Item>) -> Self {
        Self {
            kind,
            item: item.into(),
        }
    }

    pub fn reason(&self) -> &'static str {
        self.kind.reason()
    }

    pub fn token_message(value: &str, line: usize, column: usize) -> String {
        format!(
            "Failed reading story because of unexpected \"{}\" at line {}, column {}",
            value, line, column
        )
    }

    pub fn tree_message(value: &str, line: usize) -> String {
        format!(
            "Failed reading story because of unexpected \"{}\" at line {}",
            value, line
        )
    }

    pub fn message(&self) -> String {
        message(&self.item)
    }

    pub fn pretty(&self) -> String {
        render(&self.kind, &self.item)
    }
}

fn message(item: &Item) -> String {
    match item {
        Item::Token(token) => {
            let value = if token.text.is_empty() {
                Cow::Borrowed(token.kind.as_str())
            } else {
                single_line(&token.text)
            };
            StoryError::token_message(&value, token.line, token.column)
        }
        Item::Tree(tree) => StoryError::tree_message(
            &single_line(&tree.text()),
            tree.line().unwrap_or_default(),
        ),
    }
}

fn render(kind: &ErrorKind, item: &Item) -> String {
    match kind {
        ErrorKind::Unknown => message(item),
        _ => format!("{}. Reason: {}", message(item), kind.reason()),
    }
}

fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\n', '\r']) {
        Cow::Owned(text.escape_debug().to_string())
    } else {
        Cow::Borrowed(text)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::tree::Child;

    fn value_token() -> Token {
        Token::new("NAME", "value", 1, 2, 1..6)
    }

    #[test]
    fn test_unknown_reason() {
        let error = StoryError::new(ErrorKind::Unknown, value_token());
        assert_eq!(error.reason(), "unknown");
    }

    #[test]
    fn test_token_message() {
        assert_eq!(
            StoryError::token_message("value", 1, 2),
            "Failed reading story because of unexpected \"value\" at line 1, column 2"
        );
    }

    #[test]
    fn test_tree_message() {
        assert_eq!(
            StoryError::tree_message("value", 1),
            "Failed reading story because of unexpected \"value\" at line 1"
        );
    }

    #[test]
    fn test_pretty_token_without_reason() {
        let error = StoryError::new(ErrorKind::Unknown, value_token());
        assert_eq!(
            error.to_string(),
            "Failed reading story because of unexpected \"value\" at line 1, column 2"
        );
    }

    #[test]
    fn test_pretty_tree() {
        let tree = Tree::new("path", vec![Child::Token(Token::new("NAME", "value", 3, 1, 0..5))]);
        let error = StoryError::new(ErrorKind::Unknown, tree);
        assert_eq!(
            error.pretty(),
            "Failed reading story because of unexpected \"value\" at line 3"
        );
    }

    #[test]
    fn test_pretty_appends_reason() {
        let error = StoryError::new(ErrorKind::UnexpectedToken, value_token());
        assert_eq!(
            error.pretty(),
            format!(
                "{}. Reason: {}",
                StoryError::token_message("value", 1, 2),
                ErrorKind::UnexpectedToken.reason()
            )
        );
        assert_eq!(error.to_string(), error.pretty());
    }

    #[test]
    fn test_newline_token_renders_on_one_line() {
        let token = Token::new("_NL", "\n  ", 1, 4, 3..6);
        let error = StoryError::new(ErrorKind::UnexpectedToken, token);
        assert!(!error.pretty().contains('\n'));
        assert!(error.message().starts_with(r#"Failed reading story because of unexpected "\n  " at line 1"#));
    }

    #[test]
    fn test_synthetic_token_uses_kind() {
        let token = Token::new("_DEDENT", "", 4, 1, 10..10);
        let error = StoryError::new(ErrorKind::Unknown, token);
        assert!(error.message().contains("\"_DEDENT\""));
    }
}
