//! Main module for the story language front end
//!
//!     source -> [parsing] (grammar + engine + indentation) -> [tree] -> [compiler] -> [ir]
//!
//!     Failures caused by the story text render through [diagnostics].

pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod grammar;
pub mod ir;
pub mod lexing;
pub mod parsing;
pub mod token;
pub mod transform;
pub mod tree;
