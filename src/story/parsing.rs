//! Parsing
//!
//!     [`Parser`] ties the pipeline together: it renders the grammar, compiles an
//!     [`Engine`] with the indentation pass as post-lex filter, parses and hands the
//!     concrete tree to the [`Transformer`].
//!
//!     Every call builds its own grammar and engine, nothing is shared between calls.
//!
//! Failures
//!
//!     Input the grammar does not accept (unexpected tokens or characters) is an expected
//!     outcome: [`Parser::parse`] returns `Ok(None)`. Everything else (a broken grammar,
//!     inconsistent indentation) is an error. [`Parser::try_parse`] keeps the engine
//!     failure so callers can render a diagnostic with [`ParseError::diagnostic`].

use thiserror::Error;
use tracing::{debug, trace};

use crate::story::config::ParserConfig;
use crate::story::diagnostics::{ErrorKind, StoryError};
use crate::story::engine::{Algorithm, Engine, EngineError, GrammarError};
use crate::story::grammar::{story_grammar, GrammarBuilder};
use crate::story::lexing::{ensure_source_ends_with_newline, IndentationPreprocessor};
use crate::story::token::Token;
use crate::story::transform::Transformer;
use crate::story::tree::Tree;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid grammar: {0}")]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("cannot serialize tree: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ParseError {
    /// The diagnostic for failures caused by the story text.
    pub fn diagnostic(&self) -> Option<StoryError> {
        let ParseError::Engine(error) = self else {
            return None;
        };
        let kind = match error {
            EngineError::UnexpectedToken { .. } => ErrorKind::UnexpectedToken,
            EngineError::UnexpectedCharacters { .. } => ErrorKind::UnexpectedCharacters,
            EngineError::Indentation { .. } => ErrorKind::Indentation,
        };
        Some(StoryError::new(kind, error.token().clone()))
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    grammar: GrammarBuilder,
    algorithm: Algorithm,
    indenter: IndentationPreprocessor,
    transformer: Transformer,
}

impl Default for Parser {
    fn default() -> Self {
        Self {
            grammar: story_grammar(),
            algorithm: Algorithm::default(),
            indenter: IndentationPreprocessor::default(),
            transformer: Transformer::default(),
        }
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new()
            .with_algorithm(config.algorithm)
            .with_tab_len(config.tab_len)
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_tab_len(mut self, tab_len: usize) -> Self {
        self.indenter = self.indenter.with_tab_len(tab_len);
        self
    }

    /// Replace the story grammar, e.g. to parse a single statement kind.
    pub fn with_grammar(mut self, grammar: GrammarBuilder) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn indenter(&self) -> &IndentationPreprocessor {
        &self.indenter
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    /// The rendered grammar description.
    pub fn grammar(&self) -> String {
        self.grammar.build().render()
    }

    pub fn engine(&self) -> Result<Engine, GrammarError> {
        Engine::new(
            &self.grammar(),
            self.algorithm,
            Some(Box::new(self.indenter.clone())),
        )
    }

    /// Tokens as the grammar sees them, block markers included.
    pub fn lex(&self, source: &str) -> Result<Vec<Token>, ParseError> {
        let source = ensure_source_ends_with_newline(source);
        let tokens = self.engine()?.lex(&source)?;
        trace!(tokens = tokens.len(), "lexed story");
        Ok(tokens)
    }

    pub fn try_parse(&self, source: &str) -> Result<Tree, ParseError> {
        let source = ensure_source_ends_with_newline(source);
        let engine = self.engine()?;
        let concrete = engine.parse(&source)?;
        debug!(algorithm = %self.algorithm, "parsed story");
        Ok(self.transformer.transform(concrete))
    }

    /// Parse a story; `None` when the text does not match the grammar.
    pub fn parse(&self, source: &str) -> Result<Option<Tree>, ParseError> {
        match self.try_parse(source) {
            Ok(tree) => Ok(Some(tree)),
            Err(ParseError::Engine(error)) if error.is_unexpected() => {
                debug!(%error, "story rejected");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    pub fn parse_json(&self, source: &str) -> Result<Option<serde_json::Value>, ParseError> {
        match self.parse(source)? {
            Some(tree) => Ok(Some(serde_json::to_value(tree)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let parser = Parser::new();
        assert_eq!(parser.algorithm(), Algorithm::Packrat);
        assert_eq!(parser.indenter().tab_len, 8);
        assert!(parser.grammar().starts_with("start: line+\n"));
    }

    #[test]
    fn test_from_config() {
        let config = ParserConfig {
            algorithm: Algorithm::Backtracking,
            tab_len: 4,
        };
        let parser = Parser::from_config(&config);
        assert_eq!(parser.algorithm(), Algorithm::Backtracking);
        assert_eq!(parser.indenter().tab_len, 4);
    }

    #[test]
    fn test_story_grammar_compiles() {
        assert!(Parser::new().engine().is_ok());
    }

    #[test]
    fn test_parse_assignment() {
        let tree = Parser::new().parse("x = 1").unwrap().unwrap();
        assert_eq!(tree.data, "start");
        assert!(tree.node("assignments").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Parser::new().parse("malformed @@@ garbage").unwrap().is_none());
    }

    #[test]
    fn test_try_parse_keeps_failure() {
        let error = Parser::new().try_parse("x = = 1").unwrap_err();
        let diagnostic = error.diagnostic().unwrap();
        assert_eq!(diagnostic.kind, ErrorKind::UnexpectedToken);
        assert!(diagnostic
            .message()
            .starts_with("Failed reading story because of unexpected \"=\" at line 1, column 5"));
    }

    #[test]
    fn test_broken_grammar_is_an_error() {
        let mut grammar = GrammarBuilder::new();
        grammar.rule("line", &["missing"]);
        let result = Parser::new().with_grammar(grammar).parse("x");
        assert!(matches!(result, Err(ParseError::Grammar(_))));
    }

    #[test]
    fn test_lex_emits_block_markers() {
        let tokens = Parser::new().lex("if true\n    x = 1\n").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["IF", "TRUE", "_NL", "_INDENT", "NAME", "EQUALS", "INT", "_NL", "_DEDENT"]
        );
    }
}
