//! Grammar description reader
//!
//!     Grammar descriptions are tokenized with logos and parsed with chumsky into a
//!     [`GrammarDefinition`]: plain data describing rules, terminals and directives. No
//!     symbol resolution happens here; see [compile](super::compile).
//!
//! Syntax
//!
//!     rule:        `?name: expansion | expansion`
//!     terminal:    `NAME.priority: expansion`
//!     directives:  `%ignore NAME`, `%import library.NAME`
//!     expansion:   rule and terminal references, `"literal"i`, `/regex/flags`,
//!                  `( ... )`, `[ ... ]` and the `?`, `*`, `+` postfix operators
//!
//!     Alternatives may continue on the following lines when those lines start with `|`.
//!     `//` starts a comment.

use chumsky::prelude::*;
use logos::Logos;
use std::ops::Range;

use super::GrammarError;

#[derive(Logos, Debug, Clone, PartialEq, Eq, Hash)]
#[logos(skip r"([ \t\r\f]+|//[^\n]*)")]
pub enum MetaToken {
    #[regex(r"_?[a-z][a-z0-9_]*", |lex| lex.slice().to_owned())]
    RuleName(String),

    #[regex(r"_*[A-Z][A-Z0-9_]*", |lex| lex.slice().to_owned())]
    TerminalName(String),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)+", |lex| lex.slice().to_owned())]
    DottedName(String),

    #[regex(r"\.-?[0-9]+", |lex| lex.slice()[1..].parse::<i32>().ok())]
    Priority(i32),

    #[regex(r#""([^"\\\n]|\\.)*"i?"#, |lex| lex.slice().to_owned())]
    Literal(String),

    #[regex(r"/([^/\\\n]|\\.)+/[imsx]*", |lex| lex.slice().to_owned())]
    Pattern(String),

    #[token("%ignore")]
    Ignore,

    #[token("%import")]
    Import,

    #[token(":")]
    Colon,

    #[token("|")]
    Pipe,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("?")]
    Question,

    #[token("*")]
    Star,

    #[token("+")]
    Plus,

    #[token("\n")]
    Newline,
}

/// Whether a rule's node is kept, dropped in favour of its children, or dropped only
/// when it has a single child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline {
    Never,
    Always,
    SingleChild,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Rule(String),
    Terminal(String),
    Literal { text: String, insensitive: bool },
    Pattern { pattern: String, flags: String },
    Group(Alternatives),
    Optional(Box<Expr>),
    Repeat { expr: Box<Expr>, min: usize },
}

/// Alternatives, each a sequence of expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternatives(pub Vec<Vec<Expr>>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDef {
    pub name: String,
    pub inline: Inline,
    pub expansion: Alternatives,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalDef {
    pub name: String,
    pub priority: i32,
    pub expansion: Alternatives,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreTarget {
    Terminal(String),
    Anonymous(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDef {
    pub library: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrammarDefinition {
    pub rules: Vec<RuleDef>,
    pub terminals: Vec<TerminalDef>,
    pub ignores: Vec<IgnoreTarget>,
    pub imports: Vec<ImportDef>,
}

enum Item {
    Rule(RuleDef),
    Terminal(TerminalDef),
    Ignore(IgnoreTarget),
    Import(ImportDef),
}

#[derive(Clone)]
enum Postfix {
    Optional,
    Star,
    Plus,
}

type Spanned = (MetaToken, Range<usize>);
type MetaError = Simple<Spanned>;

/// Read a grammar description.
pub fn read(description: &str) -> Result<GrammarDefinition, GrammarError> {
    let mut tokens = Vec::new();
    for (token, span) in MetaToken::lexer(description).spanned() {
        match token {
            Ok(token) => tokens.push((token, span)),
            Err(()) => {
                return Err(GrammarError::Syntax {
                    line: line_of(description, span.start),
                    message: format!("unrecognized input {:?}", &description[span]),
                })
            }
        }
    }

    let items = grammar().parse(tokens).map_err(|errors| {
        let (offset, message) = match errors.first().and_then(|e| e.found()) {
            Some((token, span)) => (span.start, format!("unexpected {:?}", token)),
            None => (description.len(), "unexpected end of grammar".to_string()),
        };
        GrammarError::Syntax {
            line: line_of(description, offset),
            message,
        }
    })?;

    let mut definition = GrammarDefinition::default();
    for item in items {
        match item {
            Item::Rule(rule) => definition.rules.push(rule),
            Item::Terminal(terminal) => definition.terminals.push(terminal),
            Item::Ignore(target) => definition.ignores.push(target),
            Item::Import(import) => definition.imports.push(import),
        }
    }
    Ok(definition)
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())].matches('\n').count() + 1
}

/// Helper: match a specific token, ignoring its span
fn token(t: MetaToken) -> impl Parser<Spanned, (), Error = MetaError> + Clone {
    filter(move |(tok, _): &Spanned| tok == &t).ignored()
}

fn rule_name() -> impl Parser<Spanned, String, Error = MetaError> + Clone {
    filter_map(|span, (tok, _): Spanned| match tok {
        MetaToken::RuleName(name) => Ok(name),
        _ => Err(Simple::custom(span, "expected a rule name")),
    })
}

fn terminal_name() -> impl Parser<Spanned, String, Error = MetaError> + Clone {
    filter_map(|span, (tok, _): Spanned| match tok {
        MetaToken::TerminalName(name) => Ok(name),
        _ => Err(Simple::custom(span, "expected a terminal name")),
    })
}

fn priority() -> impl Parser<Spanned, i32, Error = MetaError> + Clone {
    filter_map(|span, (tok, _): Spanned| match tok {
        MetaToken::Priority(priority) => Ok(priority),
        _ => Err(Simple::custom(span, "expected a priority")),
    })
}

/// Literal strings and regex patterns, the atoms that carry their own text.
fn anonymous() -> impl Parser<Spanned, Expr, Error = MetaError> + Clone {
    filter_map(|span, (tok, _): Spanned| match tok {
        MetaToken::Literal(raw) => Ok(literal(&raw)),
        MetaToken::Pattern(raw) => Ok(pattern(&raw)),
        _ => Err(Simple::custom(span, "expected a literal or a pattern")),
    })
}

fn literal(raw: &str) -> Expr {
    let insensitive = raw.ends_with('i');
    let quoted = if insensitive { &raw[..raw.len() - 1] } else { raw };
    Expr::Literal {
        text: unescape(&quoted[1..quoted.len() - 1]),
        insensitive,
    }
}

fn pattern(raw: &str) -> Expr {
    let close = raw.rfind('/').unwrap_or(raw.len());
    Expr::Pattern {
        pattern: raw[1..close].replace("\\/", "/"),
        flags: raw[close + 1..].to_string(),
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
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn expansion() -> impl Parser<Spanned, Alternatives, Error = MetaError> + Clone {
    recursive(|expansion| {
        let atom = choice((
            rule_name().map(Expr::Rule),
            terminal_name().map(Expr::Terminal),
            anonymous(),
            expansion
                .clone()
                .delimited_by(token(MetaToken::LParen), token(MetaToken::RParen))
                .map(Expr::Group),
            expansion
                .delimited_by(token(MetaToken::LBracket), token(MetaToken::RBracket))
                .map(|alternatives| Expr::Optional(Box::new(Expr::Group(alternatives)))),
        ));

        let postfix = choice((
            token(MetaToken::Question).to(Postfix::Optional),
            token(MetaToken::Star).to(Postfix::Star),
            token(MetaToken::Plus).to(Postfix::Plus),
        ));

        let item = atom.then(postfix.or_not()).map(|(expr, op)| match op {
            None => expr,
            Some(Postfix::Optional) => Expr::Optional(Box::new(expr)),
            Some(Postfix::Star) => Expr::Repeat {
                expr: Box::new(expr),
                min: 0,
            },
            Some(Postfix::Plus) => Expr::Repeat {
                expr: Box::new(expr),
                min: 1,
            },
        });

        // A `|` may start a continuation line
        let separator = token(MetaToken::Newline)
            .repeated()
            .then(token(MetaToken::Pipe));

        item.repeated()
            .at_least(1)
            .separated_by(separator)
            .at_least(1)
            .map(Alternatives)
    })
}

fn grammar() -> impl Parser<Spanned, Vec<Item>, Error = MetaError> {
    let rule = token(MetaToken::Question)
        .or_not()
        .then(rule_name())
        .then_ignore(token(MetaToken::Colon))
        .then(expansion())
        .map(|((question, name), expansion)| {
            let inline = if question.is_some() {
                Inline::SingleChild
            } else if name.starts_with('_') {
                Inline::Always
            } else {
                Inline::Never
            };
            Item::Rule(RuleDef {
                name: name.trim_start_matches('_').to_string(),
                inline,
                expansion,
            })
        });

    let terminal = terminal_name()
        .then(priority().or_not())
        .then_ignore(token(MetaToken::Colon))
        .then(expansion())
        .map(|((name, priority), expansion)| {
            Item::Terminal(TerminalDef {
                name,
                priority: priority.unwrap_or(0),
                expansion,
            })
        });

    let ignore = token(MetaToken::Ignore).ignore_then(choice((
        terminal_name().map(IgnoreTarget::Terminal),
        anonymous().map(IgnoreTarget::Anonymous),
    )));

    let import = token(MetaToken::Import).ignore_then(filter_map(
        |span, (tok, _): Spanned| match tok {
            MetaToken::DottedName(path) => match path.split_once('.') {
                Some((library, name)) => Ok(ImportDef {
                    library: library.to_string(),
                    name: name.to_string(),
                }),
                None => Err(Simple::custom(span, "expected library.NAME")),
            },
            _ => Err(Simple::custom(span, "expected library.NAME")),
        },
    ));

    let item = choice((
        rule,
        terminal,
        ignore.map(Item::Ignore),
        import.map(Item::Import),
    ));

    token(MetaToken::Newline)
        .repeated()
        .ignore_then(
            item.separated_by(token(MetaToken::Newline).repeated().at_least(1))
                .allow_trailing(),
        )
        .then_ignore(end())
}
