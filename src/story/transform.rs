//! Concrete to abstract tree conversion
//!
//!     Rule names and child order are preserved. For block statements the nested block
//!     child is moved into [`Tree::body`]. The conversion is total: it performs no
//!     semantic checks and cannot fail.

use crate::story::engine::{ConcreteChild, ConcreteTree};
use crate::story::tree::{Child, Tree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformer {
    pub body_rule: String,
    pub block_rules: Vec<String>,
}

impl Default for Transformer {
    fn default() -> Self {
        Self {
            body_rule: "nested_block".to_string(),
            block_rules: vec!["if_block".to_string(), "for_block".to_string()],
        }
    }
}

impl Transformer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transform(&self, tree: ConcreteTree) -> Tree {
        let is_block = self.block_rules.contains(&tree.rule);
        let mut body = None;
        let mut children = Vec::with_capacity(tree.children.len());

        for child in tree.children {
            match child {
                ConcreteChild::Token(token) => children.push(Child::Token(token)),
                ConcreteChild::Tree(sub) => {
                    let sub = self.transform(sub);
                    if is_block && body.is_none() && sub.data == self.body_rule {
                        body = Some(sub);
                    } else {
                        children.push(Child::Tree(sub));
                    }
                }
            }
        }

        let transformed = Tree::new(tree.rule, children);
        match body {
            Some(body) => transformed.with_body(body),
            None => transformed,
        }
    }
}
