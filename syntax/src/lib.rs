//! The core OSQL syntax implementation.
//!
//! Commands are parsed with a grammar into a concrete parse tree, which is then
//! translated into a typed abstract syntax tree of expressions. Commands that
//! have no dedicated structure are kept as an opaque sequence of translated
//! tokens, left for the execution layer to interpret.

pub mod ast;
pub mod error;
mod grammar;
mod parser;
pub mod source;
pub mod translate;
pub mod tree;

pub use parser::{parse, parse_expression, Parser};
