//! Operator Lexer
//!
//! Longest-match lexing over static operator tables. The scan descends one
//! character at a time, keeping the subset of operators still matchable,
//! and accepts the longest fully-matched entry. Tables are sorted data,
//! not hard-coded branching.

use crate::ast::types::RedirOp;
use crate::parser::input::Cursor;
use crate::parser::types::ParseError;

/// Redirection operators, sorted. Here-document operators are recognized
/// separately so that `<<` is never consumed as a prefix of `<<<` here.
pub const REDIR_OPS: &[(&str, RedirOp)] = &[
    ("&>", RedirOp::AndGreat),
    ("&>>", RedirOp::AndDGreat),
    ("<", RedirOp::Less),
    ("<&", RedirOp::LessAnd),
    ("<<<", RedirOp::TLess),
    ("<>", RedirOp::LessGreat),
    (">", RedirOp::Great),
    (">&", RedirOp::GreatAnd),
    (">>", RedirOp::DGreat),
    (">|", RedirOp::Clobber),
];

/// Operators recognized between words inside [[ ... ]].
pub const COND_OPS: &[(&str, &str)] = &[
    ("!", "!"),
    ("&&", "&&"),
    ("(", "("),
    (")", ")"),
    ("<", "<"),
    (">", ">"),
    ("||", "||"),
];

/// Match the longest operator from `table` at the cursor and consume it.
/// Fails without consuming anything when no table entry is a prefix of the
/// remaining input.
pub fn longest_match<T: Copy>(
    cur: &mut Cursor,
    table: &[(&'static str, T)],
) -> Result<(T, &'static str), ParseError> {
    let mut best: Option<(T, &'static str)> = None;
    let mut candidates: Vec<&(&'static str, T)> = table.iter().collect();
    let mut depth = 0;

    while !candidates.is_empty() {
        let next = match cur.peek(depth) {
            Some(c) => c,
            None => break,
        };
        candidates.retain(|(s, t)| {
            let mut it = s.chars();
            match it.nth(depth) {
                Some(c) if c == next => {
                    if it.next().is_none() {
                        best = Some((*t, *s));
                    }
                    true
                }
                _ => false,
            }
        });
        depth += 1;
    }

    match best {
        Some((t, s)) => {
            for _ in s.chars() {
                cur.advance();
            }
            Ok((t, s))
        }
        None => Err(cur.error("expected operator")),
    }
}
