//! Tokenizer driven by the compiled terminal table
//!
//!     At each offset every terminal is tried. The match with the highest priority wins,
//!     ties go to the longest match, remaining ties to the terminal declared first.
//!     Empty matches never count. Ignored terminals are consumed but not emitted.

use super::compile::{CompiledGrammar, CompiledTerminal};
use super::EngineError;
use crate::story::token::Token;

/// Kind of the token reported when no terminal matches.
pub const UNMATCHED_KIND: &str = "$UNMATCHED";

pub fn lex(grammar: &CompiledGrammar, text: &str) -> Result<Vec<Token>, EngineError> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    let mut line = 1;
    let mut column = 1;

    while offset < text.len() {
        let rest = &text[offset..];
        let Some((terminal, len)) = longest_match(&grammar.terminals, rest) else {
            let text = rest.chars().next().map(String::from).unwrap_or_default();
            let span = offset..offset + text.len();
            return Err(EngineError::UnexpectedCharacters {
                token: Token::new(UNMATCHED_KIND, text, line, column, span),
            });
        };

        let slice = &rest[..len];
        if !grammar.ignore.contains(&terminal.name) {
            tokens.push(Token::new(
                terminal.name.clone(),
                slice,
                line,
                column,
                offset..offset + len,
            ));
        }

        match slice.rfind('\n') {
            Some(idx) => {
                line += slice.matches('\n').count();
                column = slice[idx + 1..].chars().count() + 1;
            }
            None => column += slice.chars().count(),
        }
        offset += len;
    }

    Ok(tokens)
}

fn longest_match<'g>(
    terminals: &'g [CompiledTerminal],
    rest: &str,
) -> Option<(&'g CompiledTerminal, usize)> {
    let mut best: Option<(&CompiledTerminal, usize)> = None;
    for terminal in terminals {
        let Some(found) = terminal.regex.find(rest) else {
            continue;
        };
        let len = found.end();
        if len == 0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((current, current_len)) => {
                terminal.priority > current.priority
                    || (terminal.priority == current.priority && len > current_len)
            }
        };
        if better {
            best = Some((terminal, len));
        }
    }
    best
}
