//! Value compilation
//!
//!     Numbers and booleans compile to plain JSON scalars; everything else to an
//!     [`Envelope`]. Strings are unquoted, unescaped and split into a template when they
//!     hold `{{path}}` placeholders.

use super::template;
use super::CompileError;
use crate::story::ir::{Envelope, Number, Value};
use crate::story::token::Token;
use crate::story::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    List,
    Objects,
    File,
    Path,
}

impl ValueKind {
    pub fn from_rule(rule: &str) -> Option<Self> {
        match rule {
            "string" => Some(ValueKind::String),
            "number" => Some(ValueKind::Number),
            "boolean" => Some(ValueKind::Boolean),
            "list" => Some(ValueKind::List),
            "objects" => Some(ValueKind::Objects),
            "file" => Some(ValueKind::File),
            "path" => Some(ValueKind::Path),
            _ => None,
        }
    }
}

/// Compile a `values` tree, the wrapper around any single value.
pub fn values(tree: &Tree) -> Result<Value, CompileError> {
    let inner = tree
        .trees()
        .next()
        .ok_or_else(|| CompileError::missing(tree, "value"))?;
    value(inner)
}

pub fn value(tree: &Tree) -> Result<Value, CompileError> {
    let kind = ValueKind::from_rule(&tree.data)
        .ok_or_else(|| CompileError::UnknownValue(tree.data.clone()))?;
    match kind {
        ValueKind::String => string(tree),
        ValueKind::Number => number(tree),
        ValueKind::Boolean => boolean(tree),
        ValueKind::List => list(tree),
        ValueKind::Objects => objects(tree),
        ValueKind::File => tree
            .token("FILEPATH")
            .map(file)
            .ok_or_else(|| CompileError::missing(tree, "FILEPATH")),
        ValueKind::Path => Ok(path(tree)),
    }
}

pub fn path(tree: &Tree) -> Value {
    Value::path(
        tree.tokens()
            .into_iter()
            .filter(|token| token.is("NAME"))
            .map(|token| token.text.clone()),
    )
}

pub fn number(tree: &Tree) -> Result<Value, CompileError> {
    if let Some(token) = tree.token("FLOAT") {
        return token
            .text
            .parse::<f64>()
            .map(|n| Value::Number(Number::Float(n)))
            .map_err(|_| CompileError::InvalidNumber {
                token: token.clone(),
            });
    }
    let token = tree
        .token("INT")
        .ok_or_else(|| CompileError::missing(tree, "INT"))?;
    token
        .text
        .parse::<i64>()
        .map(|n| Value::Number(Number::Int(n)))
        .map_err(|_| CompileError::InvalidNumber {
            token: token.clone(),
        })
}

pub fn boolean(tree: &Tree) -> Result<Value, CompileError> {
    if tree.token("TRUE").is_some() {
        Ok(Value::Boolean(true))
    } else if tree.token("FALSE").is_some() {
        Ok(Value::Boolean(false))
    } else {
        Err(CompileError::missing(tree, "TRUE"))
    }
}

pub fn string(tree: &Tree) -> Result<Value, CompileError> {
    let token = tree
        .token("DOUBLE_QUOTED")
        .or_else(|| tree.token("SINGLE_QUOTED"))
        .ok_or_else(|| CompileError::missing(tree, "DOUBLE_QUOTED"))?;
    let text = unescape(unquote(&token.text));
    let template = template::split(&text).map_err(|source| CompileError::Template {
        token: token.clone(),
        source,
    })?;

    if template.is_plain() {
        return Ok(Value::string(template.text));
    }
    Ok(Value::Envelope(Envelope::String {
        string: template.text,
        values: Some(template.paths.into_iter().map(Value::path).collect()),
    }))
}

pub fn file(token: &Token) -> Value {
    Value::Envelope(Envelope::File {
        string: token.text.trim_matches('`').to_string(),
    })
}

pub fn list(tree: &Tree) -> Result<Value, CompileError> {
    let items = tree
        .trees()
        .filter(|t| t.data == "values")
        .map(values)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Envelope(Envelope::List { items }))
}

pub fn objects(tree: &Tree) -> Result<Value, CompileError> {
    let mut items = Vec::new();
    for pair in tree.trees().filter(|t| t.data == "key_value") {
        let key = pair
            .trees()
            .next()
            .ok_or_else(|| CompileError::missing(pair, "string"))?;
        let item = pair
            .subtree("values")
            .ok_or_else(|| CompileError::missing(pair, "values"))?;
        items.push((value(key)?, values(item)?));
    }
    Ok(Value::Envelope(Envelope::Dict { items }))
}

fn unquote(text: &str) -> &str {
    let mut chars = text.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'')), Some(close)) if open == close => &text[1..text.len() - 1],
        _ => text,
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other @ ('"' | '\'' | '\\')) => out.push(other),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
