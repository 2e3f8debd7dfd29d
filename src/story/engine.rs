//! Grammar engine
//!
//!     Given a grammar description and a text, produce a concrete parse tree or a
//!     structured failure. The engine is the part of the pipeline that knows nothing about
//!     stories: it reads the description ([meta]), compiles it into lexing and parsing
//!     tables ([compile]), tokenizes ([lexer]) and parses ([parser]).
//!
//! Pipeline
//!
//!     text -> lexer -> post-lex filter (optional) -> parser -> [`ConcreteTree`]
//!
//!     The post-lex filter is the extension point that lets a context-free grammar
//!     describe indentation: it rewrites the token stream before parsing and declares the
//!     synthetic terminals it produces, so the grammar may reference them.
//!
//! Algorithms
//!
//!     Both algorithms are ordered-choice recursive descent. [`Algorithm::Packrat`]
//!     memoizes every (rule, position) result and runs in linear time;
//!     [`Algorithm::Backtracking`] keeps no table.

pub mod common;
pub mod compile;
pub mod lexer;
pub mod meta;
pub mod parser;
pub mod tree;

pub use self::tree::{ConcreteChild, ConcreteTree};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tracing::debug;

use self::compile::CompiledGrammar;
use crate::story::token::Token;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar syntax error at line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("rule `{0}` is defined more than once")]
    DuplicateRule(String),
    #[error("terminal `{0}` is defined more than once")]
    DuplicateTerminal(String),
    #[error("undefined rule `{name}` used in `{from}`")]
    UndefinedRule { name: String, from: String },
    #[error("undefined terminal `{name}` used in `{from}`")]
    UndefinedTerminal { name: String, from: String },
    #[error("terminal `{terminal}` cannot reference rule `{rule}`")]
    RuleInTerminal { terminal: String, rule: String },
    #[error("terminal `{0}` is defined in terms of itself")]
    RecursiveTerminal(String),
    #[error("cannot import `{library}.{name}`")]
    UnknownImport { library: String, name: String },
    #[error("invalid pattern for terminal `{name}`: {message}")]
    InvalidPattern { name: String, message: String },
    #[error("rule `{0}` is left-recursive")]
    LeftRecursion(String),
    #[error("grammar has no `start` rule")]
    MissingStart,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("no terminal matches input at line {}, column {}", .token.line, .token.column)]
    UnexpectedCharacters { token: Token },
    #[error("unexpected token {token}, expected one of: {}", join(.expected))]
    UnexpectedToken {
        token: Token,
        expected: BTreeSet<String>,
    },
    #[error("dedent to width {width} matches no enclosing block at line {}", .token.line)]
    Indentation { token: Token, width: usize },
}

fn join(kinds: &BTreeSet<String>) -> String {
    kinds.iter().cloned().collect::<Vec<_>>().join(", ")
}

impl EngineError {
    /// The token the failure is attributed to.
    pub fn token(&self) -> &Token {
        match self {
            EngineError::UnexpectedCharacters { token }
            | EngineError::UnexpectedToken { token, .. }
            | EngineError::Indentation { token, .. } => token,
        }
    }

    /// Whether the input, not its layout, is at fault.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            EngineError::UnexpectedCharacters { .. } | EngineError::UnexpectedToken { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Packrat,
    Backtracking,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Packrat => write!(f, "packrat"),
            Algorithm::Backtracking => write!(f, "backtracking"),
        }
    }
}

/// A token stream rewrite applied between lexing and parsing.
pub trait PostLex: fmt::Debug + Send + Sync {
    /// Terminals this filter emits that the lexer never produces.
    fn produces(&self) -> Vec<String>;

    fn process(&self, tokens: Vec<Token>) -> Result<Vec<Token>, EngineError>;
}

#[derive(Debug)]
pub struct Engine {
    grammar: CompiledGrammar,
    algorithm: Algorithm,
    postlex: Option<Box<dyn PostLex>>,
}

impl Engine {
    pub fn new(
        description: &str,
        algorithm: Algorithm,
        postlex: Option<Box<dyn PostLex>>,
    ) -> Result<Self, GrammarError> {
        let definition = meta::read(description)?;
        let declared = postlex.as_ref().map(|p| p.produces()).unwrap_or_default();
        let declared: Vec<&str> = declared.iter().map(String::as_str).collect();
        let grammar = compile::compile(&definition, &declared)?;
        debug!(
            rules = grammar.rules.len(),
            terminals = grammar.terminals.len(),
            %algorithm,
            "compiled grammar"
        );
        Ok(Self {
            grammar,
            algorithm,
            postlex,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Tokenize `text` and run the post-lex filter over the result.
    pub fn lex(&self, text: &str) -> Result<Vec<Token>, EngineError> {
        let tokens = lexer::lex(&self.grammar, text)?;
        match &self.postlex {
            Some(postlex) => postlex.process(tokens),
            None => Ok(tokens),
        }
    }

    pub fn parse(&self, text: &str) -> Result<ConcreteTree, EngineError> {
        let tokens = self.lex(text)?;
        parser::parse(&self.grammar, &tokens, self.algorithm)
    }
}
