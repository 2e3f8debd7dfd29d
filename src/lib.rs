//! # storyscript
//!
//! Front end of the story language: grammar assembly, indentation-aware parsing and
//! compilation of story trees into a line-keyed intermediate representation.
//!
//! ```text
//! if let Some(tree) = Parser::new().parse("x = \"red\"")? {
//!     let story = Compiler::new().compile(&tree)?;
//! }
//! ```

pub mod story;

pub use story::compiler::{CompileError, Compiler};
pub use story::diagnostics::{ErrorKind, StoryError};
pub use story::ir::CompiledStory;
pub use story::parsing::{ParseError, Parser};
pub use story::tree::Tree;
