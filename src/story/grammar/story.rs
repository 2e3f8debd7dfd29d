//! Declarations of the story language
//!
//!     A story is a sequence of lines. A line is either empty, a simple statement
//!     (assignment, command, next) or a block (if, for) whose body is an indented run of
//!     lines. Indentation is made explicit by the post-lex filter, which inserts `_INDENT`
//!     and `_DEDENT` around bodies; the grammar only sees those markers.
//!
//!     Keywords are declared with a higher priority than `NAME` and anchored on a word
//!     boundary, so `iffy` is still a name. `_NL` swallows blank lines and comments.

use super::GrammarBuilder;

pub fn story_grammar() -> GrammarBuilder {
    let mut grammar = GrammarBuilder::new();
    lines(&mut grammar);
    blocks(&mut grammar);
    values(&mut grammar);
    terminals(&mut grammar);
    grammar.load("common.WS_INLINE").ignore("WS_INLINE");
    grammar
}

fn lines(grammar: &mut GrammarBuilder) {
    grammar
        .rule("line", &["_NL", "statement _NL", "block"])
        .rule("?statement", &["assignments", "next", "command"])
        .rule("assignments", &["path EQUALS values"])
        .rule("command", &["NAME values* output?"])
        .rule("output", &["AS NAME (_COMMA NAME)*"])
        .rule("next", &["NEXT FILEPATH"]);
}

fn blocks(grammar: &mut GrammarBuilder) {
    grammar
        .rule("?block", &["if_block", "for_block"])
        .rule("if_block", &["if_statement _NL nested_block"])
        .rule("if_statement", &["IF (boolean | path) _COLON?"])
        .rule("for_block", &["for_statement _NL nested_block"])
        .rule("for_statement", &["FOR NAME IN path _COLON?"])
        .rule("nested_block", &["_INDENT line+ _DEDENT"]);
}

fn values(grammar: &mut GrammarBuilder) {
    grammar
        .rule(
            "values",
            &["string", "number", "boolean", "list", "objects", "file", "path"],
        )
        .rule("path", &["NAME (_DOT NAME)*"])
        .rule("string", &["DOUBLE_QUOTED", "SINGLE_QUOTED"])
        .rule("number", &["FLOAT", "INT"])
        .rule("boolean", &["TRUE", "FALSE"])
        .rule("file", &["FILEPATH"])
        .rule("list", &["_OSB (values (_COMMA values)*)? _CSB"])
        .rule("objects", &["_OCB (key_value (_COMMA key_value)*)? _CCB"])
        .rule("key_value", &["(string | path) _COLON values"]);
}

fn terminals(grammar: &mut GrammarBuilder) {
    for keyword in ["if", "for", "in", "next", "as", "true", "false"] {
        grammar.terminal(keyword, &format!("/{}\\b/", keyword), Some(2), false);
    }
    grammar
        .terminal("_nl", r"/(\r?\n[\t ]*|#[^\n]*)+/", None, false)
        .terminal("name", r"/[a-zA-Z_][a-zA-Z0-9_]*/", None, false)
        .terminal("float", r"/-?[0-9]+\.[0-9]+/", None, false)
        .terminal("int", r"/-?[0-9]+/", None, false)
        .terminal("double_quoted", r#"/"(?:[^"\\]|\\.)*"/"#, None, false)
        .terminal("single_quoted", r"/'(?:[^'\\]|\\.)*'/", None, false)
        .terminal("filepath", r"/`[^`]*`/", None, false)
        .terminal("equals", "\"=\"", None, false)
        .terminal("_dot", "\".\"", None, false)
        .terminal("_comma", "\",\"", None, false)
        .terminal("_colon", "\":\"", None, false)
        .terminal("_osb", "\"[\"", None, false)
        .terminal("_csb", "\"]\"", None, false)
        .terminal("_ocb", "\"{\"", None, false)
        .terminal("_ccb", "\"}\"", None, false);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_grammar_starts_with_lines() {
        let rendered = story_grammar().build().render();
        assert!(rendered.starts_with("start: line+\nline: _NL|statement _NL|block\n"));
    }

    #[test]
    fn test_keywords_outrank_names() {
        let spec = story_grammar().build();
        let keyword = spec
            .terminals()
            .iter()
            .find(|t| t.name == "if")
            .map(ToString::to_string);
        assert_eq!(keyword.as_deref(), Some("IF.2: /if\\b/"));
    }

    #[test]
    fn test_whitespace_is_imported_and_ignored() {
        let rendered = story_grammar().build().render();
        assert!(rendered.ends_with("%ignore WS_INLINE\n%import common.WS_INLINE"));
    }
}
