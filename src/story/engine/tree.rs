use serde::Serialize;

use crate::story::token::Token;

/// The parser's output: rule names and kept tokens, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConcreteTree {
    pub rule: String,
    pub children: Vec<ConcreteChild>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConcreteChild {
    Token(Token),
    Tree(ConcreteTree),
}

impl ConcreteTree {
    pub fn new(rule: impl Into<String>, children: Vec<ConcreteChild>) -> Self {
        Self {
            rule: rule.into(),
            children,
        }
    }

    /// All tokens below this tree, depth first.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        collect(self, &mut out);
        out
    }
}

fn collect<'t>(tree: &'t ConcreteTree, out: &mut Vec<&'t Token>) {
    for child in &tree.children {
        match child {
            ConcreteChild::Token(token) => out.push(token),
            ConcreteChild::Tree(tree) => collect(tree, out),
        }
    }
}
