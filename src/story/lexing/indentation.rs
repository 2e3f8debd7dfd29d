//! Indentation to block markers
//!
//!     Stories nest blocks by indentation. The grammar cannot count spaces, so this pass
//!     rewrites the token stream: every change of indentation becomes explicit `_INDENT`
//!     and `_DEDENT` tokens, which the grammar treats like opening and closing braces.
//!
//!     The newline terminal absorbs the whitespace that starts the next line (and any
//!     blank or comment-only lines in between), so a newline token's text ends with
//!     exactly the indentation of the next significant line. That is the only thing
//!     measured here.
//!
//! Algorithm
//!
//!     A stack of widths starts with a sentinel 0. For each newline outside brackets:
//!         1. Emit the newline.
//!         2. Measure the text after its last `\n` (space = 1, tab = `tab_len`).
//!         3. Wider than the top: push it and emit one `_INDENT`.
//!         4. Narrower: pop and emit one `_DEDENT` while the top is wider. The top must
//!            then equal the width, otherwise the dedent lands between two levels and
//!            the pass fails.
//!     At the end of the stream one `_DEDENT` is emitted per remaining frame.
//!
//!     Newlines inside `[ ]` and `{ }` are dropped, so lists and objects may span lines.
//!     Block markers and indentation failures are positioned on the line whose
//!     indentation caused them, at its first significant column.

use crate::story::engine::{EngineError, PostLex};
use crate::story::token::Token;

pub const DEFAULT_TAB_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentationPreprocessor {
    pub newline: String,
    pub indent: String,
    pub dedent: String,
    pub open: Vec<String>,
    pub close: Vec<String>,
    pub tab_len: usize,
}

impl Default for IndentationPreprocessor {
    fn default() -> Self {
        Self {
            newline: "_NL".to_string(),
            indent: "_INDENT".to_string(),
            dedent: "_DEDENT".to_string(),
            open: vec!["_OSB".to_string(), "_OCB".to_string()],
            close: vec!["_CSB".to_string(), "_CCB".to_string()],
            tab_len: DEFAULT_TAB_LEN,
        }
    }
}

impl IndentationPreprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tab_len(mut self, tab_len: usize) -> Self {
        self.tab_len = tab_len;
        self
    }

    /// Width of the indentation that ends `newline`'s text.
    pub fn measure(&self, newline: &str) -> usize {
        let tail = match newline.rfind('\n') {
            Some(idx) => &newline[idx + 1..],
            None => newline,
        };
        tail.chars()
            .map(|c| match c {
                ' ' => 1,
                '\t' => self.tab_len,
                _ => 0,
            })
            .sum()
    }

    fn handle_newline(
        &self,
        token: Token,
        levels: &mut Vec<usize>,
        out: &mut Vec<Token>,
    ) -> Result<(), EngineError> {
        let width = self.measure(&token.text);
        out.push(token.clone());

        if width > levels.last().copied().unwrap_or(0) {
            levels.push(width);
            out.push(token.following(self.indent.as_str(), ""));
            return Ok(());
        }

        while levels.last().is_some_and(|&top| top > width) {
            levels.pop();
            out.push(token.following(self.dedent.as_str(), ""));
        }
        if levels.last().copied().unwrap_or(0) != width {
            return Err(EngineError::Indentation {
                token: token.following(self.dedent.as_str(), ""),
                width,
            });
        }
        Ok(())
    }
}

impl PostLex for IndentationPreprocessor {
    fn produces(&self) -> Vec<String> {
        vec![self.indent.clone(), self.dedent.clone()]
    }

    fn process(&self, tokens: Vec<Token>) -> Result<Vec<Token>, EngineError> {
        let mut out = Vec::with_capacity(tokens.len());
        let mut levels = vec![0];
        let mut depth = 0usize;

        for token in tokens {
            if token.kind == self.newline {
                if depth == 0 {
                    self.handle_newline(token, &mut levels, &mut out)?;
                }
                continue;
            }
            if self.open.contains(&token.kind) {
                depth += 1;
            } else if self.close.contains(&token.kind) {
                depth = depth.saturating_sub(1);
            }
            out.push(token);
        }

        if let Some(last) = out.last().cloned() {
            while levels.len() > 1 {
                levels.pop();
                out.push(last.following(self.dedent.as_str(), ""));
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: &str, text: &str, line: usize) -> Token {
        Token::new(kind, text, line, 1, 0..text.len())
    }

    fn kinds(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.kind.as_str()).collect()
    }

    #[test]
    fn test_measure_counts_tabs() {
        let pre = IndentationPreprocessor::new();
        assert_eq!(pre.measure("\n    "), 4);
        assert_eq!(pre.measure("\n\n\t "), 9);
        assert_eq!(pre.with_tab_len(4).measure("\n\t"), 4);
    }

    #[test]
    fn test_indent_and_dedent() {
        let tokens = vec![
            tok("NAME", "a", 1),
            tok("_NL", "\n  ", 1),
            tok("NAME", "b", 2),
            tok("_NL", "\n", 2),
            tok("NAME", "c", 3),
            tok("_NL", "\n", 3),
        ];
        let out = IndentationPreprocessor::new().process(tokens).unwrap();
        assert_eq!(
            kinds(&out),
            vec!["NAME", "_NL", "_INDENT", "NAME", "_NL", "_DEDENT", "NAME", "_NL"]
        );
    }

    #[test]
    fn test_dedent_to_unknown_level_fails() {
        let tokens = vec![
            tok("NAME", "a", 1),
            tok("_NL", "\n    ", 1),
            tok("NAME", "b", 2),
            tok("_NL", "\n  ", 2),
            tok("NAME", "c", 3),
        ];
        let error = IndentationPreprocessor::new().process(tokens).unwrap_err();
        match error {
            EngineError::Indentation { token, width } => {
                assert_eq!(width, 2);
                assert_eq!((token.line, token.column), (3, 3));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_block_markers_sit_on_the_indented_line() {
        let tokens = vec![
            Token::new("NAME", "a", 1, 1, 0..1),
            Token::new("_NL", "\n    ", 1, 2, 1..6),
            Token::new("NAME", "b", 2, 5, 6..7),
            Token::new("_NL", "\n", 2, 6, 7..8),
            Token::new("NAME", "c", 3, 1, 8..9),
        ];
        let out = IndentationPreprocessor::new().process(tokens).unwrap();
        let indent = out.iter().find(|t| t.is("_INDENT")).unwrap();
        assert_eq!((indent.line, indent.column), (2, 5));
        let dedent = out.iter().find(|t| t.is("_DEDENT")).unwrap();
        assert_eq!((dedent.line, dedent.column), (3, 1));
    }

    #[test]
    fn test_newlines_inside_brackets_are_dropped() {
        let tokens = vec![
            tok("_OSB", "[", 1),
            tok("_NL", "\n    ", 1),
            tok("INT", "1", 2),
            tok("_NL", "\n", 2),
            tok("_CSB", "]", 3),
            tok("_NL", "\n", 3),
        ];
        let out = IndentationPreprocessor::new().process(tokens).unwrap();
        assert_eq!(kinds(&out), vec!["_OSB", "INT", "_CSB", "_NL"]);
    }

    #[test]
    fn test_open_blocks_close_at_end() {
        let tokens = vec![
            tok("NAME", "a", 1),
            tok("_NL", "\n  ", 1),
            tok("NAME", "b", 2),
            tok("_NL", "\n    ", 2),
            tok("NAME", "c", 3),
        ];
        let out = IndentationPreprocessor::new().process(tokens).unwrap();
        assert_eq!(
            kinds(&out),
            vec!["NAME", "_NL", "_INDENT", "NAME", "_NL", "_INDENT", "NAME", "_DEDENT", "_DEDENT"]
        );
    }

    #[test]
    fn test_produces_block_markers() {
        assert_eq!(
            IndentationPreprocessor::new().produces(),
            vec!["_INDENT".to_string(), "_DEDENT".to_string()]
        );
    }
}
