//! bash-ast - parsing and printing of Bash source
//!
//! This library reads Bash (4+) source text and produces a structured,
//! faithful AST covering the command, word, and expansion grammar, for
//! tools that analyze, transform, or re-emit shell scripts.
//!
//! # Parsing
//!
//! ```
//! use bash_ast::{parse, AndOr, Pipeline};
//!
//! let list = parse("example.sh", "echo hello | tr a-z A-Z").unwrap();
//! let AndOr::Last(Pipeline::Commands(cmds)) = &list.0[0].and_or else {
//!     unreachable!()
//! };
//! assert_eq!(cmds.len(), 2);
//! ```
//!
//! Every AST node implements `Display`, printing source text that parses
//! back to an equal AST (whitespace and comments are not preserved).
//!
//! # Word expansions
//!
//! The lexical expansions that need no shell state are available as pure
//! functions over parsed words:
//!
//! ```
//! use bash_ast::{brace_expand, unquote, Word};
//!
//! let word = Word::from_string("{01..03}");
//! let expanded: Vec<String> = brace_expand(&word).iter().map(unquote).collect();
//! assert_eq!(expanded, ["01", "02", "03"]);
//! ```

pub mod ast;
pub mod expansion;
pub mod parser;

pub use ast::types::*;
pub use expansion::{brace_expand, split_word, unquote};
pub use parser::{parse, ParseError};
