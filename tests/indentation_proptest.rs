//! Property-based tests for the indentation pass
//!
//! Stories whose indentation only grows open one block per line and close all of
//! them at the end, whatever the widths and whether tabs or spaces are used.

use proptest::prelude::*;
use storyscript::story::engine::PostLex;
use storyscript::story::lexing::IndentationPreprocessor;
use storyscript::story::token::Token;
use storyscript::Parser;

/// Strictly increasing widths starting at 0
fn widths_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..6, 0..8).prop_map(|steps| {
        let mut widths = vec![0];
        for step in steps {
            let last = widths[widths.len() - 1];
            widths.push(last + step);
        }
        widths
    })
}

fn count(tokens: &[Token], kind: &str) -> usize {
    tokens.iter().filter(|t| t.is(kind)).count()
}

proptest! {
    #[test]
    fn test_increasing_widths_balance(widths in widths_strategy()) {
        let mut tokens = vec![Token::new("NAME", "a", 1, 1, 0..1)];
        for (idx, width) in widths.iter().enumerate().skip(1) {
            let text = format!("\n{}", " ".repeat(*width));
            tokens.push(Token::new("_NL", text, idx, 2, 0..0));
            tokens.push(Token::new("NAME", "a", idx + 1, width + 1, 0..0));
        }

        let out = IndentationPreprocessor::new().process(tokens).unwrap();
        let blocks = widths.len() - 1;
        prop_assert_eq!(count(&out, "_INDENT"), blocks);
        prop_assert_eq!(count(&out, "_DEDENT"), blocks);
        prop_assert!(out[out.len() - blocks..].iter().all(|t| t.is("_DEDENT")));
    }

    #[test]
    fn test_story_lines_balance(widths in widths_strategy()) {
        let source: String = widths
            .iter()
            .map(|w| format!("{}alpine\n", " ".repeat(*w)))
            .collect();
        let tokens = Parser::new().lex(&source).unwrap();
        let blocks = widths.len() - 1;
        prop_assert_eq!(count(&tokens, "_INDENT"), blocks);
        prop_assert_eq!(count(&tokens, "_DEDENT"), blocks);
    }

    #[test]
    fn test_tabs_and_spaces_agree(depth in 1usize..5) {
        let tabs: String = (0..=depth).map(|d| format!("{}alpine\n", "\t".repeat(d))).collect();
        let spaces: String = (0..=depth).map(|d| format!("{}alpine\n", " ".repeat(8 * d))).collect();
        let kinds = |source: &str| -> Vec<String> {
            Parser::new().lex(source).unwrap().into_iter().map(|t| t.kind).collect()
        };
        prop_assert_eq!(kinds(&tabs), kinds(&spaces));
    }
}
