//! Grammar compilation
//!
//!     Turns a [`GrammarDefinition`] into the tables the lexer and the parser run on:
//!
//!         1. Terminals are resolved into single anchored regexes. References to other
//!            terminals are inlined, imports are resolved against their library.
//!         2. Anonymous literals and patterns used inside rules become terminals. A literal
//!            that spells exactly the same regex as a named terminal reuses that terminal.
//!         3. Rules become a graph of [`Node`]s indexed by rule number.
//!         4. The result is checked: every referenced symbol exists, `start` exists, and no
//!            rule is left-recursive (the parser is a recursive descent and would not stop).
//!
//!     Terminals that only the post-lex filter produces are passed in as `declared`; they
//!     can be referenced by rules but are never lexed.

use regex::Regex;
use std::collections::{HashMap, HashSet};

use super::common;
use super::meta::{Alternatives, Expr, GrammarDefinition, IgnoreTarget, Inline, TerminalDef};
use super::GrammarError;

/// Name of the rule parsing starts from.
pub const START: &str = "start";

#[derive(Debug, Clone)]
pub enum Node {
    Terminal { kind: String, keep: bool },
    Rule(usize),
    Sequence(Vec<Node>),
    Choice(Vec<Node>),
    Optional(Box<Node>),
    Repeat { node: Box<Node>, min: usize },
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub inline: Inline,
    pub body: Node,
}

#[derive(Debug, Clone)]
pub struct CompiledTerminal {
    pub name: String,
    pub priority: i32,
    pub regex: Regex,
}

#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    pub rules: Vec<CompiledRule>,
    pub start: usize,
    pub terminals: Vec<CompiledTerminal>,
    pub ignore: HashSet<String>,
}

struct PendingTerminal {
    name: String,
    priority: i32,
    source: String,
}

struct Compiler<'d> {
    definition: &'d GrammarDefinition,
    declared: HashSet<String>,
    terminals: Vec<PendingTerminal>,
    by_source: HashMap<String, String>,
    rule_index: HashMap<String, usize>,
    anonymous: usize,
}

pub fn compile(
    definition: &GrammarDefinition,
    declared: &[&str],
) -> Result<CompiledGrammar, GrammarError> {
    let mut compiler = Compiler {
        definition,
        declared: declared.iter().map(|d| d.to_string()).collect(),
        terminals: Vec::new(),
        by_source: HashMap::new(),
        rule_index: HashMap::new(),
        anonymous: 0,
    };
    compiler.named_terminals()?;
    compiler.imported_terminals()?;

    for (idx, rule) in definition.rules.iter().enumerate() {
        if compiler.rule_index.insert(rule.name.clone(), idx).is_some() {
            return Err(GrammarError::DuplicateRule(rule.name.clone()));
        }
    }
    let start = *compiler
        .rule_index
        .get(START)
        .ok_or(GrammarError::MissingStart)?;

    let mut rules = Vec::with_capacity(definition.rules.len());
    for rule in &definition.rules {
        let body = compiler.alternatives(&rule.name, &rule.expansion)?;
        rules.push(CompiledRule {
            name: rule.name.clone(),
            inline: rule.inline,
            body,
        });
    }

    let mut ignore = HashSet::new();
    for target in &definition.ignores {
        let name = match target {
            IgnoreTarget::Terminal(name) => {
                if !compiler.terminals.iter().any(|t| &t.name == name) {
                    return Err(GrammarError::UndefinedTerminal {
                        name: name.clone(),
                        from: "%ignore".to_string(),
                    });
                }
                name.clone()
            }
            IgnoreTarget::Anonymous(expr) => compiler.anonymous_terminal("%ignore", expr)?,
        };
        ignore.insert(name);
    }

    check_left_recursion(&rules)?;

    let terminals = compiler
        .terminals
        .into_iter()
        .map(|pending| {
            Regex::new(&format!(r"\A(?:{})", pending.source))
                .map(|regex| CompiledTerminal {
                    name: pending.name.clone(),
                    priority: pending.priority,
                    regex,
                })
                .map_err(|e| GrammarError::InvalidPattern {
                    name: pending.name,
                    message: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompiledGrammar {
        rules,
        start,
        terminals,
        ignore,
    })
}

impl<'d> Compiler<'d> {
    fn named_terminals(&mut self) -> Result<(), GrammarError> {
        let table: HashMap<&str, &TerminalDef> = self
            .definition
            .terminals
            .iter()
            .map(|t| (t.name.as_str(), t))
            .collect();
        for terminal in &self.definition.terminals {
            let source = terminal_source(&terminal.name, &table, &mut Vec::new())?;
            self.add_terminal(&terminal.name, terminal.priority, source)?;
        }
        Ok(())
    }

    fn imported_terminals(&mut self) -> Result<(), GrammarError> {
        for import in &self.definition.imports {
            let unknown = || GrammarError::UnknownImport {
                library: import.library.clone(),
                name: import.name.clone(),
            };
            let library = common::library(&import.library).ok_or_else(unknown)?;
            let table: HashMap<&str, &TerminalDef> = library
                .terminals
                .iter()
                .map(|t| (t.name.as_str(), t))
                .collect();
            let terminal = table.get(import.name.as_str()).ok_or_else(unknown)?;
            let source = terminal_source(&import.name, &table, &mut Vec::new())?;
            self.add_terminal(&import.name, terminal.priority, source)?;
        }
        Ok(())
    }

    fn add_terminal(&mut self, name: &str, priority: i32, source: String) -> Result<(), GrammarError> {
        if self.terminals.iter().any(|t| t.name == name) {
            return Err(GrammarError::DuplicateTerminal(name.to_string()));
        }
        self.by_source
            .entry(source.clone())
            .or_insert_with(|| name.to_string());
        self.terminals.push(PendingTerminal {
            name: name.to_string(),
            priority,
            source,
        });
        Ok(())
    }

    /// Name of the terminal lexing `expr`, creating one when no terminal spells it.
    fn anonymous_terminal(&mut self, from: &str, expr: &Expr) -> Result<String, GrammarError> {
        let source = expr_source(from, expr, &HashMap::new(), &mut Vec::new())?;
        if let Some(name) = self.by_source.get(&source) {
            return Ok(name.clone());
        }
        let name = format!("__ANON_{}", self.anonymous);
        self.anonymous += 1;
        self.add_terminal(&name, 0, source)?;
        Ok(name)
    }

    fn alternatives(&mut self, rule: &str, alternatives: &Alternatives) -> Result<Node, GrammarError> {
        let mut choices = Vec::with_capacity(alternatives.0.len());
        for sequence in &alternatives.0 {
            let mut nodes = Vec::with_capacity(sequence.len());
            for expr in sequence {
                nodes.push(self.expr(rule, expr)?);
            }
            choices.push(if nodes.len() == 1 {
                nodes.remove(0)
            } else {
                Node::Sequence(nodes)
            });
        }
        Ok(if choices.len() == 1 {
            choices.remove(0)
        } else {
            Node::Choice(choices)
        })
    }

    fn expr(&mut self, rule: &str, expr: &Expr) -> Result<Node, GrammarError> {
        Ok(match expr {
            Expr::Rule(name) => match self.rule_index.get(name.trim_start_matches('_')) {
                Some(idx) => Node::Rule(*idx),
                None => {
                    return Err(GrammarError::UndefinedRule {
                        name: name.clone(),
                        from: rule.to_string(),
                    })
                }
            },
            Expr::Terminal(name) => {
                let lexed = self.terminals.iter().any(|t| &t.name == name);
                if !lexed && !self.declared.contains(name) {
                    return Err(GrammarError::UndefinedTerminal {
                        name: name.clone(),
                        from: rule.to_string(),
                    });
                }
                Node::Terminal {
                    kind: name.clone(),
                    keep: !name.starts_with('_'),
                }
            }
            Expr::Literal { .. } | Expr::Pattern { .. } => Node::Terminal {
                kind: self.anonymous_terminal(rule, expr)?,
                keep: false,
            },
            Expr::Group(alternatives) => self.alternatives(rule, alternatives)?,
            Expr::Optional(inner) => Node::Optional(Box::new(self.expr(rule, inner)?)),
            Expr::Repeat { expr, min } => Node::Repeat {
                node: Box::new(self.expr(rule, expr)?),
                min: *min,
            },
        })
    }
}

/// Regex source of a named terminal, with referenced terminals inlined.
fn terminal_source(
    name: &str,
    table: &HashMap<&str, &TerminalDef>,
    visiting: &mut Vec<String>,
) -> Result<String, GrammarError> {
    if visiting.iter().any(|v| v == name) {
        return Err(GrammarError::RecursiveTerminal(name.to_string()));
    }
    let terminal = table.get(name).ok_or_else(|| GrammarError::UndefinedTerminal {
        name: name.to_string(),
        from: visiting.last().cloned().unwrap_or_default(),
    })?;
    visiting.push(name.to_string());
    let source = alternatives_source(name, &terminal.expansion, table, visiting);
    visiting.pop();
    source
}

fn alternatives_source(
    from: &str,
    alternatives: &Alternatives,
    table: &HashMap<&str, &TerminalDef>,
    visiting: &mut Vec<String>,
) -> Result<String, GrammarError> {
    let mut branches = Vec::with_capacity(alternatives.0.len());
    for sequence in &alternatives.0 {
        let mut branch = String::new();
        for expr in sequence {
            branch.push_str(&expr_source(from, expr, table, visiting)?);
        }
        branches.push(branch);
    }
    Ok(if branches.len() == 1 {
        branches.remove(0)
    } else {
        format!("(?:{})", branches.join("|"))
    })
}

fn expr_source(
    from: &str,
    expr: &Expr,
    table: &HashMap<&str, &TerminalDef>,
    visiting: &mut Vec<String>,
) -> Result<String, GrammarError> {
    Ok(match expr {
        Expr::Literal { text, insensitive } => {
            let escaped = regex::escape(text);
            if *insensitive {
                format!("(?i:{})", escaped)
            } else {
                escaped
            }
        }
        Expr::Pattern { pattern, flags } => format!("(?{}:{})", flags, pattern),
        Expr::Terminal(name) => format!("(?:{})", terminal_source(name, table, visiting)?),
        Expr::Rule(rule) => {
            return Err(GrammarError::RuleInTerminal {
                terminal: from.to_string(),
                rule: rule.clone(),
            })
        }
        Expr::Group(alternatives) => {
            format!("(?:{})", alternatives_source(from, alternatives, table, visiting)?)
        }
        Expr::Optional(inner) => format!("(?:{})?", expr_source(from, inner, table, visiting)?),
        Expr::Repeat { expr, min } => {
            let op = if *min == 0 { "*" } else { "+" };
            format!("(?:{}){}", expr_source(from, expr, table, visiting)?, op)
        }
    })
}

fn nullable(node: &Node, rules: &[bool]) -> bool {
    match node {
        Node::Terminal { .. } => false,
        Node::Rule(idx) => rules[*idx],
        Node::Sequence(nodes) => nodes.iter().all(|n| nullable(n, rules)),
        Node::Choice(nodes) => nodes.iter().any(|n| nullable(n, rules)),
        Node::Optional(_) => true,
        Node::Repeat { node, min } => *min == 0 || nullable(node, rules),
    }
}

/// Rules reachable from `node` without consuming a token.
fn leftmost(node: &Node, rules: &[bool], out: &mut Vec<usize>) {
    match node {
        Node::Terminal { .. } => {}
        Node::Rule(idx) => out.push(*idx),
        Node::Sequence(nodes) => {
            for n in nodes {
                leftmost(n, rules, out);
                if !nullable(n, rules) {
                    break;
                }
            }
        }
        Node::Choice(nodes) => nodes.iter().for_each(|n| leftmost(n, rules, out)),
        Node::Optional(node) | Node::Repeat { node, .. } => leftmost(node, rules, out),
    }
}

fn check_left_recursion(rules: &[CompiledRule]) -> Result<(), GrammarError> {
    let mut nullable_rules = vec![false; rules.len()];
    loop {
        let mut changed = false;
        for (idx, rule) in rules.iter().enumerate() {
            if !nullable_rules[idx] && nullable(&rule.body, &nullable_rules) {
                nullable_rules[idx] = true;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let edges: Vec<Vec<usize>> = rules
        .iter()
        .map(|rule| {
            let mut out = Vec::new();
            leftmost(&rule.body, &nullable_rules, &mut out);
            out
        })
        .collect();

    for (idx, rule) in rules.iter().enumerate() {
        let mut seen = vec![false; rules.len()];
        let mut stack = edges[idx].clone();
        while let Some(next) = stack.pop() {
            if next == idx {
                return Err(GrammarError::LeftRecursion(rule.name.clone()));
            }
            if !seen[next] {
                seen[next] = true;
                stack.extend(edges[next].iter().copied());
            }
        }
    }
    Ok(())
}
