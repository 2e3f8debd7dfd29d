//! Intermediate representation
//!
//!     A compiled story is a flat map from source line to [`Instruction`]. Blocks are
//!     not nested in the output: their body lines sit in the same map and the block's
//!     instruction points at them with `enter` (first body line) and `exit` (one past the
//!     last body line).
//!
//!     Values that are not plain JSON scalars serialize as envelopes:
//!
//!         {"type": "path", "segments": ["a", "b"]}
//!         {"type": "string", "string": "hi {}", "values": [<path>]}
//!         {"type": "file", "string": "story.story"}
//!         {"type": "list", "items": [...]}
//!         {"type": "dict", "items": [[<key>, <value>], ...]}

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A source line, serialized as a string key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Line(pub usize);

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Line {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Set,
    Run,
    Next,
    If,
    For,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub method: Method,
    #[serde(rename = "ln")]
    pub line: Line,
    pub output: Option<Vec<String>>,
    pub container: Option<String>,
    pub args: Option<Vec<Argument>>,
    pub enter: Option<Line>,
    pub exit: Option<Line>,
}

impl Instruction {
    pub fn new(method: Method, line: Line) -> Self {
        Self {
            method,
            line,
            output: None,
            container: None,
            args: None,
            enter: None,
            exit: None,
        }
    }

    pub fn with_args(mut self, args: Vec<Argument>) -> Self {
        self.args = Some(args);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Argument {
    /// A bare identifier, such as a loop variable.
    Name(String),
    Value(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(Number),
    Boolean(bool),
    Envelope(Envelope),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Envelope {
    Path {
        segments: Vec<String>,
    },
    String {
        string: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        values: Option<Vec<Value>>,
    },
    File {
        string: String,
    },
    List {
        items: Vec<Value>,
    },
    Dict {
        items: Vec<(Value, Value)>,
    },
}

impl Value {
    pub fn path<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Value::Envelope(Envelope::Path {
            segments: segments.into_iter().map(Into::into).collect(),
        })
    }

    pub fn string(string: impl Into<String>) -> Self {
        Value::Envelope(Envelope::String {
            string: string.into(),
            values: None,
        })
    }
}

/// Line-keyed instructions in line order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Script(BTreeMap<Line, Instruction>);

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an instruction under its line. Fails with the line when it is taken.
    pub fn insert(&mut self, instruction: Instruction) -> Result<(), Line> {
        let line = instruction.line;
        if self.0.contains_key(&line) {
            return Err(line);
        }
        self.0.insert(line, instruction);
        Ok(())
    }

    pub fn merge(&mut self, other: Script) -> Result<(), Line> {
        for (_, instruction) in other.0 {
            self.insert(instruction)?;
        }
        Ok(())
    }

    pub fn get(&self, line: usize) -> Option<&Instruction> {
        self.0.get(&Line(line))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first_line(&self) -> Option<Line> {
        self.0.keys().next().copied()
    }

    pub fn last_line(&self) -> Option<Line> {
        self.0.keys().next_back().copied()
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.0.values()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledStory {
    pub script: Script,
    pub version: String,
}
