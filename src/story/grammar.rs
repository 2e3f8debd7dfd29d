//! Grammar assembly
//!
//!     The story grammar is not a static file: it is declared piece by piece through a
//!     [`GrammarBuilder`] and rendered into a single grammar description that the
//!     [engine](crate::story::engine) compiles. The builder accumulates four ordered lists
//!     (rules, terminals, ignores and imports) and [`GrammarBuilder::build`] freezes them
//!     into an immutable [`GrammarSpec`].
//!
//! Rendering
//!
//!     The description always starts with the start rule, which wraps the designated top
//!     rule in a one-or-more repetition (`start: line+`). Then come all rules, all
//!     terminals, all ignore directives and all import directives, in declaration order.
//!     Terminal names are upper-cased on render. Nothing is validated here; referencing an
//!     undeclared symbol is reported by the engine when it compiles the description.
//!
//!     See [story](story) for the declarations of the story language itself.

pub mod story;

pub use self::story::story_grammar;

use std::fmt;

/// Rule wrapped by the start rule unless [`GrammarBuilder::with_start`] says otherwise.
pub const DEFAULT_START: &str = "line";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalDecl {
    pub name: String,
    pub pattern: String,
    pub priority: Option<i32>,
    pub case_insensitive: bool,
}

impl fmt::Display for TerminalDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.priority {
            Some(priority) if priority != 0 => write!(f, "{}.{}: {}", self.name.to_uppercase(), priority, self.pattern)?,
            _ => write!(f, "{}: {}", self.name.to_uppercase(), self.pattern)?,
        }
        if self.case_insensitive {
            write!(f, "i")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDecl {
    pub name: String,
    pub definitions: Vec<String>,
}

impl fmt::Display for RuleDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.definitions.join("|"))
    }
}

/// Accumulates grammar declarations.
///
/// Each builder owns its state; two parsers never share a builder.
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    start: Option<String>,
    terminals: Vec<TerminalDecl>,
    rules: Vec<RuleDecl>,
    ignores: Vec<String>,
    imports: Vec<String>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `rule` instead of [`DEFAULT_START`] in the start rule.
    pub fn with_start(mut self, rule: impl Into<String>) -> Self {
        self.start = Some(rule.into());
        self
    }

    /// Declare a terminal. `pattern` is a literal (`"="`) or a regex (`/[0-9]+/`).
    pub fn terminal(
        &mut self,
        name: &str,
        pattern: &str,
        priority: Option<i32>,
        case_insensitive: bool,
    ) -> &mut Self {
        self.terminals.push(TerminalDecl {
            name: name.to_string(),
            pattern: pattern.to_string(),
            priority,
            case_insensitive,
        });
        self
    }

    /// Declare a rule; the definitions become its alternatives.
    pub fn rule(&mut self, name: &str, definitions: &[&str]) -> &mut Self {
        self.rules.push(RuleDecl {
            name: name.to_string(),
            definitions: definitions.iter().map(|d| d.to_string()).collect(),
        });
        self
    }

    pub fn ignore(&mut self, terminal: &str) -> &mut Self {
        self.ignores.push(format!("%ignore {}", terminal));
        self
    }

    pub fn load(&mut self, module: &str) -> &mut Self {
        self.imports.push(format!("%import {}", module));
        self
    }

    /// Freeze the accumulated declarations. Calling it twice yields equal specs.
    pub fn build(&self) -> GrammarSpec {
        GrammarSpec {
            start: self
                .start
                .clone()
                .unwrap_or_else(|| DEFAULT_START.to_string()),
            terminals: self.terminals.clone(),
            rules: self.rules.clone(),
            ignores: self.ignores.clone(),
            imports: self.imports.clone(),
        }
    }
}

/// An immutable, fully declared grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarSpec {
    start: String,
    terminals: Vec<TerminalDecl>,
    rules: Vec<RuleDecl>,
    ignores: Vec<String>,
    imports: Vec<String>,
}

impl GrammarSpec {
    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn terminals(&self) -> &[TerminalDecl] {
        &self.terminals
    }

    pub fn rules(&self) -> &[RuleDecl] {
        &self.rules
    }

    /// The grammar description handed to the engine.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GrammarSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |items: Vec<String>| items.join("\n");
        write!(
            f,
            "start: {}+\n{}\n{}\n{}\n{}",
            self.start,
            join(self.rules.iter().map(ToString::to_string).collect()),
            join(self.terminals.iter().map(ToString::to_string).collect()),
            self.ignores.join("\n"),
            self.imports.join("\n"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_is_upper_cased() {
        let mut builder = GrammarBuilder::new();
        builder.terminal("name", "/[a-z]+/", None, false);
        assert_eq!(builder.build().terminals()[0].to_string(), "NAME: /[a-z]+/");
    }

    #[test]
    fn test_terminal_priority() {
        let mut builder = GrammarBuilder::new();
        builder.terminal("if", "/if\\b/", Some(2), false);
        assert_eq!(builder.build().terminals()[0].to_string(), "IF.2: /if\\b/");
    }

    #[test]
    fn test_zero_priority_is_not_rendered() {
        let mut builder = GrammarBuilder::new();
        builder.terminal("int", "/[0-9]+/", Some(0), false);
        assert_eq!(builder.build().terminals()[0].to_string(), "INT: /[0-9]+/");
    }

    #[test]
    fn test_terminal_case_insensitive() {
        let mut builder = GrammarBuilder::new();
        builder.terminal("true", "\"true\"", Some(2), true);
        assert_eq!(
            builder.build().terminals()[0].to_string(),
            "TRUE.2: \"true\"i"
        );
    }

    #[test]
    fn test_rule_joins_definitions() {
        let mut builder = GrammarBuilder::new();
        builder.rule("number", &["FLOAT", "INT"]);
        assert_eq!(builder.build().rules()[0].to_string(), "number: FLOAT|INT");
    }

    #[test]
    fn test_build_renders_in_fixed_order() {
        let mut builder = GrammarBuilder::new();
        builder
            .load("common.WS_INLINE")
            .ignore("WS_INLINE")
            .terminal("int", "/[0-9]+/", None, false)
            .rule("line", &["INT"]);
        insta::assert_snapshot!(builder.build().render(), @r"
        start: line+
        line: INT
        INT: /[0-9]+/
        %ignore WS_INLINE
        %import common.WS_INLINE
        ");
    }

    #[test]
    fn test_empty_builder_renders_start_only() {
        let spec = GrammarBuilder::new().build();
        assert_eq!(spec.render(), "start: line+\n\n\n\n");
    }

    #[test]
    fn test_custom_start() {
        let spec = GrammarBuilder::new().with_start("statement").build();
        assert!(spec.render().starts_with("start: statement+\n"));
        assert_eq!(spec.start(), "statement");
    }

    #[test]
    fn test_build_is_idempotent() {
        let mut builder = GrammarBuilder::new();
        builder.rule("line", &["INT"]).terminal("int", "/[0-9]+/", None, false);
        assert_eq!(builder.build().render(), builder.build().render());
    }
}
