//! AST types and pretty-printing for bash scripts.

pub mod printer;
pub mod types;

pub use types::*;
