//! Abstract story tree
//!
//!     The engine's concrete trees are turned into [`Tree`]s by the
//!     [transformer](crate::story::transform). The shape is the same (rule name plus
//!     ordered children) with one addition: block statements carry their nested lines in
//!     an explicit `body` instead of a trailing child.
//!
//!     Navigation helpers never fail; they return `None` when nothing matches.

use serde::Serialize;

use crate::story::token::Token;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tree {
    pub data: String,
    pub children: Vec<Child>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Box<Tree>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Child {
    Tree(Tree),
    Token(Token),
}

impl Child {
    pub fn as_tree(&self) -> Option<&Tree> {
        match self {
            Child::Tree(tree) => Some(tree),
            Child::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&Token> {
        match self {
            Child::Token(token) => Some(token),
            Child::Tree(_) => None,
        }
    }
}

impl Tree {
    pub fn new(data: impl Into<String>, children: Vec<Child>) -> Self {
        Self {
            data: data.into(),
            children,
            body: None,
        }
    }

    pub fn with_body(mut self, body: Tree) -> Self {
        self.body = Some(Box::new(body));
        self
    }

    /// First tree named `data` below this one, depth first, body last.
    pub fn node(&self, data: &str) -> Option<&Tree> {
        for tree in self.children.iter().filter_map(Child::as_tree) {
            if tree.data == data {
                return Some(tree);
            }
            if let Some(found) = tree.node(data) {
                return Some(found);
            }
        }
        let body = self.body.as_deref()?;
        if body.data == data {
            return Some(body);
        }
        body.node(data)
    }

    /// Direct child tree named `data`.
    pub fn subtree(&self, data: &str) -> Option<&Tree> {
        self.children
            .iter()
            .filter_map(Child::as_tree)
            .find(|tree| tree.data == data)
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    /// Child trees, skipping tokens.
    pub fn trees(&self) -> impl Iterator<Item = &Tree> {
        self.children.iter().filter_map(Child::as_tree)
    }

    /// First token of `kind` among the children, depth first.
    pub fn token(&self, kind: &str) -> Option<&Token> {
        self.children.iter().find_map(|child| match child {
            Child::Token(token) if token.is(kind) => Some(token),
            Child::Token(_) => None,
            Child::Tree(tree) => tree.token(kind),
        })
    }

    /// Every token below this tree in source order, body included.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'t>(&'t self, out: &mut Vec<&'t Token>) {
        for child in &self.children {
            match child {
                Child::Token(token) => out.push(token),
                Child::Tree(tree) => tree.collect(out),
            }
        }
        if let Some(body) = &self.body {
            body.collect(out);
        }
    }

    pub fn first_token(&self) -> Option<&Token> {
        self.children
            .iter()
            .find_map(|child| match child {
                Child::Token(token) => Some(token),
                Child::Tree(tree) => tree.first_token(),
            })
            .or_else(|| self.body.as_deref().and_then(Tree::first_token))
    }

    /// Line of the first token.
    pub fn line(&self) -> Option<usize> {
        self.first_token().map(|token| token.line)
    }

    /// Source text of the tokens, joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens()
            .iter()
            .map(|token| token.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
