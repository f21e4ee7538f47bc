//! Word-Span Scanner
//!
//! Scans one shell word at the cursor into a sequence of spans, recognizing
//! every quoting and substitution form by its opening sigil: backslash
//! escapes, the three quote styles, backquotes, all `$`-forms, and process
//! substitutions. Matched-pair regions re-enter the scanner (or a raw-text
//! scanner for substitutions) so nesting round-trips.
//!
//! The caller chooses the delimiter set that ends the word; delimiters only
//! apply at the top level, never inside a quoted or bracketed region.

use crate::ast::types::{ParamSubst, Parameter, ProcessDirection, Span, Word};
use crate::parser::input::{Builder, Cursor};
use crate::parser::param::scan_param_subst;
use crate::parser::types::{is_name_char, is_name_start, ParseError};

/// Characters naming a special parameter when they follow `$`.
const SPECIAL_PARAMS: &str = "@*#?$!-";

/// Scan a word until an unquoted character from `delims` (or end of input).
/// May produce an empty word; callers requiring one check for themselves.
pub fn scan_word(cur: &mut Cursor, delims: &str) -> Result<Word, ParseError> {
    let mut spans = Vec::new();
    while let Some(c) = cur.current() {
        // Line continuation produces no span
        if c == '\\' && cur.peek(1) == Some('\n') {
            cur.advance();
            cur.advance();
            continue;
        }
        // Process substitution starts with a would-be delimiter
        if (c == '<' || c == '>') && cur.peek(1) == Some('(') {
            let direction = if c == '<' {
                ProcessDirection::Input
            } else {
                ProcessDirection::Output
            };
            cur.advance();
            cur.advance();
            let raw = scan_raw_parens(cur)?;
            spans.push(Span::ProcessSubst(direction, raw));
            continue;
        }
        if delims.contains(c) {
            break;
        }
        spans.push(scan_span(cur, c)?);
    }
    Ok(Word::new(spans))
}

/// Scan a word inside `${...}`: stops at the closing `}` of the enclosing
/// expansion (literal brace pairs are balanced) or at any of `extra_stops`.
pub fn scan_word_in_braces(cur: &mut Cursor, extra_stops: &str) -> Result<Word, ParseError> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    while let Some(c) = cur.current() {
        if c == '\\' && cur.peek(1) == Some('\n') {
            cur.advance();
            cur.advance();
            continue;
        }
        if extra_stops.contains(c) {
            break;
        }
        if c == '}' {
            if depth == 0 {
                break;
            }
            depth -= 1;
            cur.advance();
            spans.push(Span::Char('}'));
            continue;
        }
        if c == '{' {
            depth += 1;
            cur.advance();
            spans.push(Span::Char('{'));
            continue;
        }
        if (c == '<' || c == '>') && cur.peek(1) == Some('(') {
            let direction = if c == '<' {
                ProcessDirection::Input
            } else {
                ProcessDirection::Output
            };
            cur.advance();
            cur.advance();
            spans.push(Span::ProcessSubst(direction, scan_raw_parens(cur)?));
            continue;
        }
        spans.push(scan_span(cur, c)?);
    }
    Ok(Word::new(spans))
}

/// Scan a word inside `[...]` (array subscripts): stops at the `]` matching
/// an already-consumed `[`, with nested bracket pairs balanced.
pub fn scan_word_in_brackets(cur: &mut Cursor) -> Result<Word, ParseError> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    while let Some(c) = cur.current() {
        if c == '\\' && cur.peek(1) == Some('\n') {
            cur.advance();
            cur.advance();
            continue;
        }
        if c == ']' {
            if depth == 0 {
                return Ok(Word::new(spans));
            }
            depth -= 1;
            cur.advance();
            spans.push(Span::Char(']'));
            continue;
        }
        if c == '[' {
            depth += 1;
            cur.advance();
            spans.push(Span::Char('['));
            continue;
        }
        spans.push(scan_span(cur, c)?);
    }
    Err(cur.error("unexpected EOF while looking for matching ']'"))
}

/// Scan one span whose first character is `c` (already checked against the
/// caller's delimiters).
fn scan_span(cur: &mut Cursor, c: char) -> Result<Span, ParseError> {
    match c {
        '\\' => {
            cur.advance();
            match cur.advance() {
                Some(e) => Ok(Span::Escape(e)),
                // A lone trailing backslash is literal
                None => Ok(Span::Char('\\')),
            }
        }
        '\'' => {
            cur.advance();
            Ok(Span::Single(scan_single(cur)?))
        }
        '"' => {
            cur.advance();
            Ok(Span::Double(scan_double(cur)?))
        }
        '`' => {
            cur.advance();
            let inner = scan_word(cur, "`")?;
            if !cur.eat('`') {
                return Err(cur.error("unexpected EOF while looking for matching '`'"));
            }
            Ok(Span::Backquote(inner))
        }
        '$' => scan_dollar(cur, false),
        _ => {
            cur.advance();
            Ok(Span::Char(c))
        }
    }
}

/// Dispatch on the character after `$`. Inside double quotes the `$'...'`
/// and `$"..."` forms are not special.
fn scan_dollar(cur: &mut Cursor, in_double: bool) -> Result<Span, ParseError> {
    cur.advance(); // $
    match cur.current() {
        Some('{') => {
            cur.advance();
            Ok(Span::Parameter(scan_param_subst(cur)?))
        }
        Some('(') if cur.peek(1) == Some('(') => {
            cur.advance();
            cur.advance();
            Ok(Span::ArithSubst(scan_raw_arith(cur)?))
        }
        Some('(') => {
            cur.advance();
            Ok(Span::CommandSubst(scan_raw_parens(cur)?))
        }
        Some('\'') if !in_double => {
            cur.advance();
            Ok(Span::AnsiC(scan_escaped_until(cur, '\'')?))
        }
        Some('"') if !in_double => {
            cur.advance();
            Ok(Span::Locale(scan_double(cur)?))
        }
        Some(c) if is_name_start(c) || c.is_ascii_digit() || SPECIAL_PARAMS.contains(c) => {
            Ok(Span::Parameter(ParamSubst::Bare(scan_bare_parameter(cur))))
        }
        _ => Ok(Span::Char('$')),
    }
}

/// Scan the parameter after a bare `$`: a name, a single digit, or a single
/// special character.
fn scan_bare_parameter(cur: &mut Cursor) -> Parameter {
    let c = cur.current().unwrap_or('\0');
    if is_name_start(c) {
        let mut name = String::new();
        while let Some(c) = cur.current() {
            if !is_name_char(c) {
                break;
            }
            name.push(c);
            cur.advance();
        }
        Parameter::new(name)
    } else {
        // $1 is ${1}; $10 is ${1}0. Specials also take one character.
        cur.advance();
        Parameter::new(c.to_string())
    }
}

/// Scan single-quoted content (no escapes) through the closing quote.
fn scan_single(cur: &mut Cursor) -> Result<String, ParseError> {
    let mut b = Builder::new();
    loop {
        match cur.advance() {
            Some('\'') => return Ok(b.finish()),
            Some(c) => b.push(c),
            None => return Err(cur.error("unexpected EOF while looking for matching \"'\"")),
        }
    }
}

/// Scan double-quoted content through the closing quote. Backslash escapes
/// only `$`, `` ` ``, `"`, `\` and newline; other backslashes are literal.
fn scan_double(cur: &mut Cursor) -> Result<Word, ParseError> {
    let mut spans = Vec::new();
    loop {
        match cur.current() {
            None => return Err(cur.error("unexpected EOF while looking for matching '\"'")),
            Some('"') => {
                cur.advance();
                return Ok(Word::new(spans));
            }
            Some('\\') => match cur.peek(1) {
                Some('\n') => {
                    cur.advance();
                    cur.advance();
                }
                Some(c) if "$`\"\\".contains(c) => {
                    cur.advance();
                    cur.advance();
                    spans.push(Span::Escape(c));
                }
                _ => {
                    cur.advance();
                    spans.push(Span::Char('\\'));
                }
            },
            Some('`') => {
                cur.advance();
                let inner = scan_word(cur, "`")?;
                if !cur.eat('`') {
                    return Err(cur.error("unexpected EOF while looking for matching '`'"));
                }
                spans.push(Span::Backquote(inner));
            }
            Some('$') => spans.push(scan_dollar(cur, true)?),
            Some(c) => {
                cur.advance();
                spans.push(Span::Char(c));
            }
        }
    }
}

/// Scan `$'...'` content: every backslash escapes the next character (the
/// sequences themselves are decoded by consumers, not here).
fn scan_escaped_until(cur: &mut Cursor, close: char) -> Result<Word, ParseError> {
    let mut spans = Vec::new();
    loop {
        match cur.advance() {
            None => {
                return Err(cur.error(format!(
                    "unexpected EOF while looking for matching {:?}",
                    close
                )))
            }
            Some(c) if c == close => return Ok(Word::new(spans)),
            Some('\\') => match cur.advance() {
                Some(e) => spans.push(Span::Escape(e)),
                None => spans.push(Span::Char('\\')),
            },
            Some(c) => spans.push(Span::Char(c)),
        }
    }
}

/// Scan raw text through the `)` matching an already-consumed `(`. Nested
/// parentheses are counted; quoted regions and comments are skipped so
/// parentheses inside them do not count.
pub fn scan_raw_parens(cur: &mut Cursor) -> Result<String, ParseError> {
    let mut b = Builder::new();
    let mut depth = 1usize;
    let mut prev: Option<char> = None;
    loop {
        let c = match cur.current() {
            Some(c) => c,
            None => return Err(cur.error("unexpected EOF while looking for matching ')'")),
        };
        match c {
            '\\' => {
                cur.advance();
                b.push('\\');
                if let Some(e) = cur.advance() {
                    b.push(e);
                }
            }
            '\'' => {
                cur.advance();
                b.push('\'');
                loop {
                    match cur.advance() {
                        Some('\'') => {
                            b.push('\'');
                            break;
                        }
                        Some(inner) => b.push(inner),
                        None => {
                            return Err(
                                cur.error("unexpected EOF while looking for matching \"'\"")
                            )
                        }
                    }
                }
            }
            '"' => {
                cur.advance();
                b.push('"');
                loop {
                    match cur.advance() {
                        Some('"') => {
                            b.push('"');
                            break;
                        }
                        Some('\\') => {
                            b.push('\\');
                            if let Some(e) = cur.advance() {
                                b.push(e);
                            }
                        }
                        Some(inner) => b.push(inner),
                        None => {
                            return Err(
                                cur.error("unexpected EOF while looking for matching '\"'")
                            )
                        }
                    }
                }
            }
            '`' => {
                cur.advance();
                b.push('`');
                loop {
                    match cur.advance() {
                        Some('`') => {
                            b.push('`');
                            break;
                        }
                        Some('\\') => {
                            b.push('\\');
                            if let Some(e) = cur.advance() {
                                b.push(e);
                            }
                        }
                        Some(inner) => b.push(inner),
                        None => {
                            return Err(cur.error("unexpected EOF while looking for matching '`'"))
                        }
                    }
                }
            }
            '#' if matches!(prev, None | Some(' ') | Some('\t') | Some('\n') | Some('(')
                | Some(';') | Some('&') | Some('|')) =>
            {
                // Comment to end of line: kept in the raw text, but
                // parentheses inside it do not count
                while let Some(cc) = cur.current() {
                    if cc == '\n' {
                        break;
                    }
                    cur.advance();
                    b.push(cc);
                }
            }
            '(' => {
                depth += 1;
                cur.advance();
                b.push('(');
            }
            ')' => {
                depth -= 1;
                cur.advance();
                if depth == 0 {
                    return Ok(b.finish());
                }
                b.push(')');
            }
            _ => {
                cur.advance();
                b.push(c);
            }
        }
        prev = Some(c);
    }
}

/// Scan raw arithmetic text through the `))` matching an already-consumed
/// `$((`, counting nested parentheses.
pub fn scan_raw_arith(cur: &mut Cursor) -> Result<String, ParseError> {
    let mut b = Builder::new();
    let mut depth = 0usize;
    loop {
        if depth == 0 && cur.at_str("))") {
            cur.advance();
            cur.advance();
            return Ok(b.finish());
        }
        let c = match cur.current() {
            Some(c) => c,
            None => return Err(cur.error("unexpected EOF while looking for matching '))'")),
        };
        match c {
            '(' => depth += 1,
            ')' => {
                if depth == 0 {
                    return Err(cur.error("unexpected ')' in arithmetic substitution"));
                }
                depth -= 1;
            }
            _ => {}
        }
        cur.advance();
        b.push(c);
    }
}
