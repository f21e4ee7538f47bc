//! Brace Expansion
//!
//! Expands alternations `{a,b,c}` and sequences `{x..y}` / `{x..y..inc}`
//! over unexpanded words. Only unquoted braces and commas participate;
//! quoted spans and substitutions ride along opaquely. The expansion is
//! total: a brace group that is neither a valid alternation nor a valid
//! sequence stays literal, and a word with no brace structure expands to
//! itself.

use lazy_static::lazy_static;
use regex_lite::Regex;

use crate::ast::types::{Span, Word};

/// Cap on generated sequence items to prevent pathological ranges
const MAX_SEQUENCE_ITEMS: usize = 10_000;

lazy_static! {
    static ref NUMERIC_SEQ: Regex =
        Regex::new(r"^(-?[0-9]+)\.\.(-?[0-9]+)(?:\.\.(-?[0-9]+))?$").unwrap();
    static ref ALPHA_SEQ: Regex =
        Regex::new(r"^([A-Za-z])\.\.([A-Za-z])(?:\.\.(-?[0-9]+))?$").unwrap();
}

/// Expand all brace groups in `word`, left to right. The result is never
/// empty; with no expandable group it is the input word alone.
pub fn brace_expand(word: &Word) -> Vec<Word> {
    expand_spans(&word.spans)
}

fn expand_spans(spans: &[Span]) -> Vec<Word> {
    let mut search_from = 0;
    while let Some(open) = find_open_brace(spans, search_from) {
        if let Some(close) = find_close_brace(spans, open) {
            let inner = &spans[open + 1..close];

            if let Some(parts) = split_top_level_commas(inner) {
                return compose(
                    &spans[..open],
                    &spans[close + 1..],
                    parts.into_iter().flat_map(|p| expand_spans(p)).collect(),
                );
            }

            if let Some(items) = try_sequence(inner) {
                let words = items.iter().map(|s| Word::from_string(s)).collect();
                return compose(&spans[..open], &spans[close + 1..], words);
            }
        }
        // Not expandable at this brace; try the next one
        search_from = open + 1;
    }
    vec![Word::new(spans.to_vec())]
}

/// Build prefix × alternatives × (recursively expanded) suffix.
fn compose(prefix: &[Span], suffix: &[Span], alternatives: Vec<Word>) -> Vec<Word> {
    let suffixes = expand_spans(suffix);
    let mut out = Vec::with_capacity(alternatives.len() * suffixes.len());
    for alt in &alternatives {
        for suf in &suffixes {
            let mut spans = prefix.to_vec();
            spans.extend(alt.spans.iter().cloned());
            spans.extend(suf.spans.iter().cloned());
            out.push(Word::new(spans));
        }
    }
    out
}

fn find_open_brace(spans: &[Span], from: usize) -> Option<usize> {
    spans[from..]
        .iter()
        .position(|s| *s == Span::Char('{'))
        .map(|i| from + i)
}

/// Index of the `}` matching the `{` at `open`, counting nested unquoted
/// braces.
fn find_close_brace(spans: &[Span], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, span) in spans.iter().enumerate().skip(open + 1) {
        match span {
            Span::Char('{') => depth += 1,
            Span::Char('}') => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Split on unquoted commas at brace depth zero. `None` unless there are at
/// least two parts (an alternation needs a top-level comma).
fn split_top_level_commas(inner: &[Span]) -> Option<Vec<&[Span]>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut part_start = 0;
    for (i, span) in inner.iter().enumerate() {
        match span {
            Span::Char('{') => depth += 1,
            Span::Char('}') => depth = depth.saturating_sub(1),
            Span::Char(',') if depth == 0 => {
                parts.push(&inner[part_start..i]);
                part_start = i + 1;
            }
            _ => {}
        }
    }
    if parts.is_empty() {
        return None;
    }
    parts.push(&inner[part_start..]);
    Some(parts)
}

/// Parse `x..y` / `x..y..inc` with all-plain-character content.
fn try_sequence(inner: &[Span]) -> Option<Vec<String>> {
    let mut text = String::new();
    for span in inner {
        match span {
            Span::Char(c) => text.push(*c),
            _ => return None,
        }
    }

    if let Some(caps) = NUMERIC_SEQ.captures(&text) {
        let start_lex = caps.get(1).unwrap().as_str();
        let end_lex = caps.get(2).unwrap().as_str();
        let start: i64 = start_lex.parse().ok()?;
        let end: i64 = end_lex.parse().ok()?;
        let step = match caps.get(3) {
            Some(m) => m.as_str().parse::<i64>().ok()?,
            None => 1,
        };
        return Some(numeric_sequence(start, end, step, start_lex, end_lex));
    }

    if let Some(caps) = ALPHA_SEQ.captures(&text) {
        let start = caps.get(1).unwrap().as_str().chars().next()?;
        let end = caps.get(2).unwrap().as_str().chars().next()?;
        let step = match caps.get(3) {
            Some(m) => m.as_str().parse::<i64>().ok()?,
            None => 1,
        };
        // Mixed-case endpoints do not expand
        if start.is_ascii_lowercase() != end.is_ascii_lowercase() {
            return None;
        }
        return Some(alpha_sequence(start, end, step));
    }

    None
}

/// Generate a numeric sequence. The step contributes its magnitude only;
/// direction always follows start → end, and step 0 acts as 1. Zero-padded
/// endpoint lexemes pad every item to the wider digit count.
fn numeric_sequence(
    start: i64,
    end: i64,
    step: i64,
    start_lex: &str,
    end_lex: &str,
) -> Vec<String> {
    let magnitude = match step.unsigned_abs().min(i64::MAX as u64) {
        0 => 1,
        m => m,
    } as i64;
    let width = pad_width(start_lex).max(pad_width(end_lex));

    let format_num = |n: i64| -> String {
        if width > 0 {
            if n < 0 {
                format!("-{:0>width$}", n.unsigned_abs(), width = width)
            } else {
                format!("{:0>width$}", n, width = width)
            }
        } else {
            n.to_string()
        }
    };

    let mut out = Vec::new();
    let mut i = start;
    if start <= end {
        while i <= end && out.len() < MAX_SEQUENCE_ITEMS {
            out.push(format_num(i));
            i = match i.checked_add(magnitude) {
                Some(next) => next,
                None => break,
            };
        }
    } else {
        while i >= end && out.len() < MAX_SEQUENCE_ITEMS {
            out.push(format_num(i));
            i = match i.checked_sub(magnitude) {
                Some(next) => next,
                None => break,
            };
        }
    }
    out
}

/// Digit width to pad to, when the lexeme is zero-padded (a leading 0, or
/// -0, with at least two digits).
fn pad_width(lexeme: &str) -> usize {
    let digits = lexeme.strip_prefix('-').unwrap_or(lexeme);
    if digits.len() > 1 && digits.starts_with('0') {
        digits.len()
    } else {
        0
    }
}

/// Generate a letter sequence over ASCII code points.
fn alpha_sequence(start: char, end: char, step: i64) -> Vec<String> {
    let magnitude = match step.unsigned_abs() {
        0 => 1,
        m => m.min(char::MAX as u64),
    };
    let start_code = start as u64;
    let end_code = end as u64;

    let mut out = Vec::new();
    let mut code = start_code;
    if start_code <= end_code {
        while code <= end_code && out.len() < MAX_SEQUENCE_ITEMS {
            if let Some(c) = char::from_u32(code as u32) {
                out.push(c.to_string());
            }
            code += magnitude;
        }
    } else {
        loop {
            if let Some(c) = char::from_u32(code as u32) {
                out.push(c.to_string());
            }
            if code < end_code + magnitude || out.len() >= MAX_SEQUENCE_ITEMS {
                break;
            }
            code -= magnitude;
        }
    }
    out
}
