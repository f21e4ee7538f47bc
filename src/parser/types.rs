//! Parser Types and Constants
//!
//! The parse error type and the shared word tables used across parser
//! modules.

use lazy_static::lazy_static;
use std::collections::HashSet;
use thiserror::Error;

// Parser limits to prevent hangs and resource exhaustion
pub const MAX_INPUT_SIZE: usize = 10_000_000; // 10MB max input
pub const MAX_PARSER_DEPTH: usize = 200; // Max recursion depth for nested constructs

/// Error produced when parsing fails. Carries the source name and the
/// 1-based position of the token that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_name}:{line}:{column}: {message}")]
pub struct ParseError {
    pub source_name: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(
        source_name: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

lazy_static! {
    /// Reserved words, recognized only for unquoted words at command position
    pub static ref RESERVED_WORDS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        for w in [
            "!", "{", "}", "if", "then", "else", "elif", "fi", "case", "esac", "for",
            "select", "while", "until", "do", "done", "in", "function", "time", "coproc",
            "[[", "]]",
        ] {
            s.insert(w);
        }
        s
    };

    /// Commands whose arguments may themselves be assignments
    pub static ref ASSIGN_BUILTINS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        for w in ["declare", "typeset", "export", "readonly", "local"] {
            s.insert(w);
        }
        s
    };
}

/// Check if a string is a valid variable name
pub fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Check if a character can start a variable name
pub fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue a variable name
pub fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Characters that end an unquoted word in command position
pub const WORD_DELIMITERS: &str = " \t\n|&;()<>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("foo"));
        assert!(is_valid_name("_foo1"));
        assert!(!is_valid_name("1foo"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a-b"));
    }

    #[test]
    fn test_reserved_words() {
        assert!(RESERVED_WORDS.contains("fi"));
        assert!(RESERVED_WORDS.contains("[["));
        assert!(!RESERVED_WORDS.contains("echo"));
    }

    #[test]
    fn test_parse_error_display() {
        let e = ParseError::new("script.sh", 3, 7, "expected 'fi'");
        assert_eq!(e.to_string(), "script.sh:3:7: expected 'fi'");
    }
}
