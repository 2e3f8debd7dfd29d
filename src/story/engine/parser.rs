//! Ordered-choice recursive descent over tokens
//!
//!     Alternatives are tried in declaration order and the first that matches wins.
//!     Repetitions are greedy. A failed branch truncates whatever it appended, so the
//!     output vector always holds exactly the children of the branches that matched.
//!
//!     Failures are not reported where they happen: the parser records the farthest
//!     position at which a terminal was expected and the kinds expected there. When the
//!     start rule fails (or stops short of the end) that position is the error.

use std::collections::{BTreeSet, HashMap};

use super::compile::{CompiledGrammar, Node};
use super::meta::Inline;
use super::tree::{ConcreteChild, ConcreteTree};
use super::{Algorithm, EngineError};
use crate::story::token::{Token, END_KIND};

type Memo = HashMap<(usize, usize), Option<(usize, Vec<ConcreteChild>)>>;

struct State<'g, 't> {
    grammar: &'g CompiledGrammar,
    tokens: &'t [Token],
    memo: Option<Memo>,
    farthest: usize,
    expected: BTreeSet<String>,
}

pub fn parse(
    grammar: &CompiledGrammar,
    tokens: &[Token],
    algorithm: Algorithm,
) -> Result<ConcreteTree, EngineError> {
    let mut state = State {
        grammar,
        tokens,
        memo: match algorithm {
            Algorithm::Packrat => Some(HashMap::new()),
            Algorithm::Backtracking => None,
        },
        farthest: 0,
        expected: BTreeSet::new(),
    };

    match state.rule(grammar.start, 0) {
        Some((end, mut children)) if end == tokens.len() => {
            if let [ConcreteChild::Tree(_)] = children.as_slice() {
                if let Some(ConcreteChild::Tree(tree)) = children.pop() {
                    return Ok(tree);
                }
            }
            Ok(ConcreteTree::new(grammar.rules[grammar.start].name.clone(), children))
        }
        Some((end, _)) => {
            state.expect(end, END_KIND);
            Err(state.failure())
        }
        None => Err(state.failure()),
    }
}

impl<'g, 't> State<'g, 't> {
    fn expect(&mut self, pos: usize, kind: &str) {
        if pos > self.farthest {
            self.farthest = pos;
            self.expected.clear();
        }
        if pos == self.farthest {
            self.expected.insert(kind.to_string());
        }
    }

    fn failure(self) -> EngineError {
        let token = self
            .tokens
            .get(self.farthest)
            .cloned()
            .unwrap_or_else(|| Token::end_of_input(self.tokens.last()));
        EngineError::UnexpectedToken {
            token,
            expected: self.expected,
        }
    }

    /// Match rule `idx` at `pos`; yields the end position and the shaped children to
    /// splice into the caller.
    fn rule(&mut self, idx: usize, pos: usize) -> Option<(usize, Vec<ConcreteChild>)> {
        if let Some(hit) = self.memo.as_ref().and_then(|memo| memo.get(&(idx, pos))) {
            return hit.clone();
        }

        let grammar = self.grammar;
        let rule = &grammar.rules[idx];
        let mut children = Vec::new();
        let result = self.node(&rule.body, pos, &mut children).map(|end| {
            let shaped = match rule.inline {
                Inline::Always => children,
                Inline::SingleChild if children.len() == 1 => children,
                _ => vec![ConcreteChild::Tree(ConcreteTree::new(
                    rule.name.clone(),
                    children,
                ))],
            };
            (end, shaped)
        });

        if let Some(memo) = self.memo.as_mut() {
            memo.insert((idx, pos), result.clone());
        }
        result
    }

    fn node(&mut self, node: &Node, pos: usize, out: &mut Vec<ConcreteChild>) -> Option<usize> {
        match node {
            Node::Terminal { kind, keep } => match self.tokens.get(pos) {
                Some(token) if &token.kind == kind => {
                    if *keep {
                        out.push(ConcreteChild::Token(token.clone()));
                    }
                    Some(pos + 1)
                }
                _ => {
                    self.expect(pos, kind);
                    None
                }
            },
            Node::Rule(idx) => {
                let (end, children) = self.rule(*idx, pos)?;
                out.extend(children);
                Some(end)
            }
            Node::Sequence(nodes) => {
                let mark = out.len();
                let mut at = pos;
                for node in nodes {
                    match self.node(node, at, out) {
                        Some(end) => at = end,
                        None => {
                            out.truncate(mark);
                            return None;
                        }
                    }
                }
                Some(at)
            }
            Node::Choice(nodes) => {
                let mark = out.len();
                for node in nodes {
                    if let Some(end) = self.node(node, pos, out) {
                        return Some(end);
                    }
                    out.truncate(mark);
                }
                None
            }
            Node::Optional(node) => {
                let mark = out.len();
                match self.node(node, pos, out) {
                    Some(end) => Some(end),
                    None => {
                        out.truncate(mark);
                        Some(pos)
                    }
                }
            }
            Node::Repeat { node, min } => {
                let start = out.len();
                let mut at = pos;
                let mut count = 0;
                loop {
                    let mark = out.len();
                    match self.node(node, at, out) {
                        Some(end) if end > at => {
                            at = end;
                            count += 1;
                        }
                        // Empty match: counts once, then stop
                        Some(_) => {
                            count += 1;
                            break;
                        }
                        None => {
                            out.truncate(mark);
                            break;
                        }
                    }
                }
                if count >= *min {
                    Some(at)
                } else {
                    out.truncate(start);
                    None
                }
            }
        }
    }
}
