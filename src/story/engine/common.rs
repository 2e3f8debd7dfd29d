//! The `common` terminal library available through `%import common.NAME`

use once_cell::sync::Lazy;

use super::meta::{self, GrammarDefinition};

const COMMON: &str = r#"
DIGIT: /[0-9]/
HEXDIGIT: /[a-fA-F0-9]/
INT: DIGIT+
SIGNED_INT: ["+" | "-"] INT
DECIMAL: INT "." INT? | "." INT
_EXP: ("e" | "E") SIGNED_INT
FLOAT: INT _EXP | DECIMAL _EXP?
SIGNED_FLOAT: ["+" | "-"] FLOAT
NUMBER: FLOAT | INT
SIGNED_NUMBER: ["+" | "-"] NUMBER
ESCAPED_STRING: /"(?:[^"\\]|\\.)*"/
LETTER: /[a-zA-Z]/
WORD: LETTER+
CNAME: ("_" | LETTER) ("_" | LETTER | DIGIT)*
WS_INLINE: (" " | /\t/)+
WS: /[ \t\f\r\n]/+
CR: /\r/
LF: /\n/
NEWLINE: (CR? LF)+
SH_COMMENT: /#[^\n]*/
CPP_COMMENT: /\/\/[^\n]*/
"#;

static LIBRARY: Lazy<GrammarDefinition> =
    Lazy::new(|| meta::read(COMMON).expect("the common library is a valid grammar"));

/// Terminal definitions importable from `library`, if it exists.
pub fn library(name: &str) -> Option<&'static GrammarDefinition> {
    match name {
        "common" => Some(&*LIBRARY),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_library_reads() {
        let common = library("common").unwrap();
        assert!(common.terminals.iter().any(|t| t.name == "WS_INLINE"));
        assert!(common.terminals.iter().any(|t| t.name == "_EXP"));
    }

    #[test]
    fn test_unknown_library() {
        assert!(library("missing").is_none());
    }
}
