//! Lexing
//!
//!     Tokenization itself belongs to the [engine](crate::story::engine): the story
//!     grammar's terminals drive it. What is story specific is the post-lex pass that
//!     makes indentation visible to a context-free grammar. See
//!     [indentation](indentation).
//!
//!     The indentation pass reacts to newline tokens only, so the source must end with
//!     one for the last line to be closed. [`ensure_source_ends_with_newline`] runs
//!     before every parse.

pub mod indentation;

pub use indentation::IndentationPreprocessor;

/// Appends a newline to non-empty sources that lack one.
pub fn ensure_source_ends_with_newline(source: &str) -> String {
    if !source.is_empty() && !source.ends_with('\n') {
        format!("{}\n", source)
    } else {
        source.to_string()
    }
}
