//! Tree to IR compilation
//!
//!     The compiler walks the `line` children of a story tree (or of a block body) and
//!     turns each statement into one [`Instruction`] keyed by its line. Statement rules
//!     are dispatched through [`StatementKind`]; the per-statement logic lives in
//!     [statements](statements), value compilation in [values](values).
//!
//!     Block bodies are compiled recursively and merged into the same [`Script`]; a line
//!     that would hold two instructions is an internal error, never an overwrite.

pub mod statements;
pub mod template;
pub mod values;

pub use template::TemplateError;

use thiserror::Error;
use tracing::{debug, trace};

use crate::story::diagnostics::{ErrorKind, StoryError};
use crate::story::ir::{CompiledStory, Line, Script};
use crate::story::token::Token;
use crate::story::tree::Tree;

/// Version stamped on every compiled story.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("no statement compiles from rule `{0}`")]
    UnknownStatement(String),
    #[error("no value compiles from rule `{0}`")]
    UnknownValue(String),
    #[error("line {0} already holds an instruction")]
    DuplicateLine(Line),
    #[error("`{parent}` has no `{expected}`")]
    MissingNode { parent: String, expected: String },
    #[error("`{0}` has no tokens to take a line from")]
    MissingLine(String),
    #[error("invalid number {}", .token.text)]
    InvalidNumber { token: Token },
    #[error("invalid template in {}: {source}", .token.text)]
    Template { token: Token, source: TemplateError },
}

impl CompileError {
    pub fn missing(parent: &Tree, expected: &str) -> Self {
        CompileError::MissingNode {
            parent: parent.data.clone(),
            expected: expected.to_string(),
        }
    }

    /// The diagnostic for failures caused by the story text.
    pub fn diagnostic(&self) -> Option<StoryError> {
        match self {
            CompileError::InvalidNumber { token } => {
                Some(StoryError::new(ErrorKind::InvalidNumber, token.clone()))
            }
            CompileError::Template { token, .. } => {
                Some(StoryError::new(ErrorKind::InvalidTemplate, token.clone()))
            }
            _ => None,
        }
    }
}

/// Rules that compile to an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Assignment,
    Command,
    Next,
    IfBlock,
    ForBlock,
}

impl StatementKind {
    pub fn from_rule(rule: &str) -> Option<Self> {
        match rule {
            "assignments" => Some(StatementKind::Assignment),
            "command" => Some(StatementKind::Command),
            "next" => Some(StatementKind::Next),
            "if_block" => Some(StatementKind::IfBlock),
            "for_block" => Some(StatementKind::ForBlock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, tree: &Tree) -> Result<CompiledStory, CompileError> {
        let script = self.parse_tree(tree)?;
        debug!(instructions = script.len(), "compiled story");
        Ok(CompiledStory {
            script,
            version: VERSION.to_string(),
        })
    }

    /// Compile every line below a story or block body.
    pub fn parse_tree(&self, tree: &Tree) -> Result<Script, CompileError> {
        let mut script = Script::new();
        for line in tree.trees().filter(|t| t.data == "line") {
            for statement in line.trees() {
                script
                    .merge(self.parse_subtree(statement)?)
                    .map_err(CompileError::DuplicateLine)?;
            }
        }
        Ok(script)
    }

    pub fn parse_subtree(&self, tree: &Tree) -> Result<Script, CompileError> {
        let kind = StatementKind::from_rule(&tree.data)
            .ok_or_else(|| CompileError::UnknownStatement(tree.data.clone()))?;
        trace!(rule = %tree.data, line = ?tree.line(), "compiling statement");
        match kind {
            StatementKind::Assignment => statements::assignments(self, tree),
            StatementKind::Command => statements::command(self, tree),
            StatementKind::Next => statements::next(self, tree),
            StatementKind::IfBlock => statements::if_block(self, tree),
            StatementKind::ForBlock => statements::for_block(self, tree),
        }
    }

    pub fn line(&self, tree: &Tree) -> Result<Line, CompileError> {
        tree.line()
            .map(Line)
            .ok_or_else(|| CompileError::MissingLine(tree.data.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::tree::Child;

    fn name(text: &str, line: usize) -> Child {
        Child::Token(Token::new("NAME", text, line, 1, 0..text.len()))
    }

    #[test]
    fn test_statement_kinds() {
        assert_eq!(StatementKind::from_rule("command"), Some(StatementKind::Command));
        assert_eq!(StatementKind::from_rule("for_block"), Some(StatementKind::ForBlock));
        assert_eq!(StatementKind::from_rule("values"), None);
    }

    #[test]
    fn test_unknown_statement_is_an_error() {
        let tree = Tree::new("mystery", vec![name("x", 1)]);
        assert_eq!(
            Compiler::new().parse_subtree(&tree),
            Err(CompileError::UnknownStatement("mystery".into()))
        );
    }

    #[test]
    fn test_line_comes_from_first_token() {
        let tree = Tree::new("outer", vec![Child::Tree(Tree::new("path", vec![name("word", 7)]))]);
        assert_eq!(Compiler::new().line(&tree), Ok(Line(7)));
        assert!(Compiler::new().line(&Tree::new("empty", vec![])).is_err());
    }

    #[test]
    fn test_parse_tree_collects_lines() {
        let command = |line| {
            Child::Tree(Tree::new(
                "line",
                vec![Child::Tree(Tree::new("command", vec![name("alpine", line)]))],
            ))
        };
        let blank = Child::Tree(Tree::new("line", vec![]));
        let tree = Tree::new("start", vec![command(1), blank, command(3)]);
        let script = Compiler::new().parse_tree(&tree).unwrap();
        assert_eq!(script.len(), 2);
        assert!(script.get(3).is_some());
    }

    #[test]
    fn test_colliding_lines_are_an_error() {
        let command = Child::Tree(Tree::new(
            "line",
            vec![Child::Tree(Tree::new("command", vec![name("alpine", 1)]))],
        ));
        let tree = Tree::new("start", vec![command.clone(), command]);
        assert_eq!(
            Compiler::new().parse_tree(&tree),
            Err(CompileError::DuplicateLine(Line(1)))
        );
    }

    #[test]
    fn test_compile_stamps_version() {
        let story = Compiler::new().compile(&Tree::new("start", vec![])).unwrap();
        assert!(story.script.is_empty());
        assert_eq!(story.version, VERSION);
    }
}
