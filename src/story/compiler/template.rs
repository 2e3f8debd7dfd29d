//! String templates
//!
//!     `"hello {{user.name}}"` compiles to the text `"hello {}"` plus the list of paths
//!     that fill the holes, in order. The string is split in one pass by a small logos
//!     lexer; placeholders may not nest and must be closed. A lone `{` or `}` outside a
//!     placeholder is literal text.
//!
//!     Once a string has holes its text is a format string: literal braces are doubled
//!     (`{` as `{{`, `}` as `}}`), so `{}` always marks a hole. Strings without holes
//!     keep their text verbatim.

use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// What a placeholder is replaced with in the compiled text.
pub const HOLE: &str = "{}";

static SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    #[token("{{")]
    Open,
    #[token("}}")]
    Close,
    #[regex(r"[^{}]+")]
    Text,
    #[token("{")]
    #[token("}")]
    Brace,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("placeholder opened at offset {0} is never closed")]
    Unterminated(usize),
    #[error("placeholder opened at offset {0} inside another placeholder")]
    Nested(usize),
    #[error("empty placeholder at offset {0}")]
    Empty(usize),
    #[error("`{0}` is not a path")]
    InvalidPath(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub text: String,
    pub paths: Vec<Vec<String>>,
}

impl Template {
    pub fn is_plain(&self) -> bool {
        self.paths.is_empty()
    }
}

pub fn split(source: &str) -> Result<Template, TemplateError> {
    // Verbatim text, and the same text with literal braces doubled
    let mut plain = String::with_capacity(source.len());
    let mut escaped = String::with_capacity(source.len());
    let mut paths = Vec::new();
    // Offset and content of the open placeholder
    let mut open: Option<(usize, String)> = None;

    for (piece, span) in Piece::lexer(source).spanned() {
        let slice = &source[span.clone()];
        match piece {
            Ok(Piece::Open) => {
                if open.is_some() {
                    return Err(TemplateError::Nested(span.start));
                }
                open = Some((span.start, String::new()));
            }
            Ok(Piece::Close) if open.is_some() => {
                if let Some((start, content)) = open.take() {
                    paths.push(path(start, &content)?);
                    escaped.push_str(HOLE);
                }
            }
            _ => match open.as_mut() {
                Some((_, content)) => content.push_str(slice),
                None => {
                    plain.push_str(slice);
                    escaped.push_str(&slice.replace('{', "{{").replace('}', "}}"));
                }
            },
        }
    }

    if let Some((start, _)) = open {
        return Err(TemplateError::Unterminated(start));
    }
    let text = if paths.is_empty() { plain } else { escaped };
    Ok(Template { text, paths })
}

fn path(start: usize, content: &str) -> Result<Vec<String>, TemplateError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(TemplateError::Empty(start));
    }
    let segments: Vec<String> = content.split('.').map(|s| s.trim().to_string()).collect();
    if segments.iter().all(|s| SEGMENT.is_match(s)) {
        Ok(segments)
    } else {
        Err(TemplateError::InvalidPath(content.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_plain_text() {
        let template = split("just text").unwrap();
        assert!(template.is_plain());
        assert_eq!(template.text, "just text");
    }

    #[test]
    fn test_placeholders_become_holes() {
        let template = split("hi {{ user.name }}, it is {{time}}").unwrap();
        assert_eq!(template.text, "hi {}, it is {}");
        assert_eq!(
            template.paths,
            vec![
                vec!["user".to_string(), "name".to_string()],
                vec!["time".to_string()]
            ]
        );
    }

    #[test]
    fn test_single_braces_are_literal() {
        let template = split("{a} }").unwrap();
        assert_eq!(template.text, "{a} }");
        assert!(template.is_plain());
    }

    #[test]
    fn test_literal_braces_are_doubled_next_to_holes() {
        let template = split("a {} {{b}}").unwrap();
        assert_eq!(template.text, "a {{}} {}");
        assert_eq!(template.paths, vec![vec!["b".to_string()]]);
    }

    #[rstest]
    #[case("{{a", TemplateError::Unterminated(0))]
    #[case("x {{a {{b}} }}", TemplateError::Nested(6))]
    #[case("{{ }}", TemplateError::Empty(0))]
    #[case("{{a b}}", TemplateError::InvalidPath("a b".to_string()))]
    #[case("{{a..b}}", TemplateError::InvalidPath("a..b".to_string()))]
    fn test_rejects(#[case] source: &str, #[case] expected: TemplateError) {
        assert_eq!(split(source).unwrap_err(), expected);
    }
}
