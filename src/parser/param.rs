//! Parameter Expansion Sub-Grammar
//!
//! Classifies the contents of `${...}` into the parameter substitution
//! forms. Entered with the cursor just past `${`; consumes through the
//! closing `}`. Content that fits no form is not an error: it becomes a
//! `BadSubst` carrying the raw text, and the shell diagnoses it at
//! expansion time.

use lazy_static::lazy_static;
use regex_lite::Regex;

use crate::ast::types::{
    AltOp, CaseDirection, ParamSubst, Parameter, PatternSide, PrefixModifier, Span, Word,
};
use crate::parser::input::{Builder, Cursor};
use crate::parser::types::{is_name_char, is_name_start, ParseError};
use crate::parser::word::{scan_word_in_braces, scan_word_in_brackets};

/// Single characters naming a special parameter.
const SPECIAL_PARAMS: &str = "@*#?$!-";

lazy_static! {
    /// A braced parameter is a name, a positional number, or one special
    /// character; anything else falls through to BadSubst.
    static ref PARAM_SHAPE: Regex =
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*|[0-9]+)$").unwrap();
}

/// Scan a `${...}` substitution; the leading `${` is already consumed.
pub fn scan_param_subst(cur: &mut Cursor) -> Result<ParamSubst, ParseError> {
    let start = cur.save();
    match classify(cur) {
        Ok(Some(subst)) => Ok(subst),
        Ok(None) => {
            cur.restore(start);
            let raw = scan_raw_braces(cur)?;
            Ok(ParamSubst::BadSubst(raw))
        }
        Err(e) => Err(e),
    }
}

/// Try the structured forms. `Ok(None)` requests the BadSubst fallback;
/// `Err` is fatal (unterminated input).
fn classify(cur: &mut Cursor) -> Result<Option<ParamSubst>, ParseError> {
    // ${!name...}: indirection, prefix match, or array indices
    let indirect = cur.current() == Some('!')
        && cur
            .peek(1)
            .is_some_and(|c| is_name_char(c) || SPECIAL_PARAMS.contains(c));
    if indirect {
        cur.advance();
    }

    // ${#param}: length, unless # itself is the parameter or has an operator
    if !indirect
        && cur.current() == Some('#')
        && !matches!(cur.peek(1), None | Some(':' | '#' | '%' | '/' | '^' | ',' | '}'))
    {
        cur.advance();
        let parameter = match scan_parameter(cur)? {
            Some(p) => p,
            None => return Ok(None),
        };
        if !cur.eat('}') {
            return Ok(None);
        }
        return Ok(Some(ParamSubst::Length(parameter)));
    }

    let parameter = match scan_parameter(cur)? {
        Some(p) => p,
        None => return Ok(None),
    };

    if indirect {
        // ${!prefix@} / ${!prefix*}
        if parameter.subscript.is_none() {
            let modifier = match cur.current() {
                Some('@') if cur.peek(1) == Some('}') => Some(PrefixModifier::At),
                Some('*') if cur.peek(1) == Some('}') => Some(PrefixModifier::Star),
                _ => None,
            };
            if let Some(modifier) = modifier {
                cur.advance();
                cur.advance();
                return Ok(Some(ParamSubst::Prefix {
                    prefix: parameter.name,
                    modifier,
                }));
            }
        }
        // ${!name[@]} / ${!name[*]}
        if cur.current() == Some('}') {
            if let Some(sub) = &parameter.subscript {
                if sub.spans == [Span::Char('@')] || sub.spans == [Span::Char('*')] {
                    cur.advance();
                    return Ok(Some(ParamSubst::Indices(parameter)));
                }
            }
        }
    }

    if cur.eat('}') {
        return Ok(Some(ParamSubst::Brace {
            indirect,
            parameter,
        }));
    }

    scan_operation(cur, indirect, parameter)
}

/// Parse the operator suffix after the parameter.
fn scan_operation(
    cur: &mut Cursor,
    indirect: bool,
    parameter: Parameter,
) -> Result<Option<ParamSubst>, ParseError> {
    let c = match cur.current() {
        Some(c) => c,
        None => return Ok(None),
    };

    match c {
        ':' => {
            if let Some(op) = cur.peek(1).and_then(alt_op) {
                cur.advance();
                cur.advance();
                let word = scan_word_in_braces(cur, "")?;
                if !cur.eat('}') {
                    return Ok(None);
                }
                return Ok(Some(ParamSubst::Alt {
                    indirect,
                    parameter,
                    check_null: true,
                    op,
                    word,
                }));
            }
            // ${p:offset} / ${p:offset:length}; an empty offset means 0 but
            // only when a length follows
            cur.advance();
            let offset = scan_word_in_braces(cur, ":")?;
            let (length, had_length) = if cur.eat(':') {
                (scan_word_in_braces(cur, "")?, true)
            } else {
                (Word::default(), false)
            };
            if (offset.is_empty() && !had_length) || !cur.eat('}') {
                return Ok(None);
            }
            Ok(Some(ParamSubst::Substring {
                indirect,
                parameter,
                offset,
                length,
            }))
        }
        '-' | '=' | '?' | '+' => {
            let op = alt_op(c).unwrap();
            cur.advance();
            let word = scan_word_in_braces(cur, "")?;
            if !cur.eat('}') {
                return Ok(None);
            }
            Ok(Some(ParamSubst::Alt {
                indirect,
                parameter,
                check_null: false,
                op,
                word,
            }))
        }
        '#' | '%' => {
            let side = if c == '#' {
                PatternSide::Front
            } else {
                PatternSide::Back
            };
            let shortest = cur.peek(1) != Some(c);
            cur.advance();
            if !shortest {
                cur.advance();
            }
            let pattern = scan_word_in_braces(cur, "")?;
            if !cur.eat('}') {
                return Ok(None);
            }
            Ok(Some(ParamSubst::Delete {
                indirect,
                parameter,
                shortest,
                side,
                pattern,
            }))
        }
        '/' => {
            cur.advance();
            let all = cur.eat('/');
            let anchor = match cur.current() {
                Some('#') if !all => {
                    cur.advance();
                    Some(PatternSide::Front)
                }
                Some('%') if !all => {
                    cur.advance();
                    Some(PatternSide::Back)
                }
                _ => None,
            };
            let pattern = scan_word_in_braces(cur, "/")?;
            let replacement = if cur.eat('/') {
                scan_word_in_braces(cur, "")?
            } else {
                Word::default()
            };
            if !cur.eat('}') {
                return Ok(None);
            }
            Ok(Some(ParamSubst::Replace {
                indirect,
                parameter,
                all,
                anchor,
                pattern,
                replacement,
            }))
        }
        '^' | ',' => {
            let direction = if c == '^' {
                CaseDirection::Upper
            } else {
                CaseDirection::Lower
            };
            let all = cur.peek(1) == Some(c);
            cur.advance();
            if all {
                cur.advance();
            }
            let pattern = scan_word_in_braces(cur, "")?;
            if !cur.eat('}') {
                return Ok(None);
            }
            Ok(Some(ParamSubst::LetterCase {
                indirect,
                parameter,
                direction,
                all,
                pattern,
            }))
        }
        _ => Ok(None),
    }
}

fn alt_op(c: char) -> Option<AltOp> {
    match c {
        '-' => Some(AltOp::Default),
        '=' => Some(AltOp::Assign),
        '?' => Some(AltOp::Error),
        '+' => Some(AltOp::Use),
        _ => None,
    }
}

/// Parse a parameter inside braces: a name or positional number, or one
/// special character, with an optional `[subscript]`.
fn scan_parameter(cur: &mut Cursor) -> Result<Option<Parameter>, ParseError> {
    let c = match cur.current() {
        Some(c) => c,
        None => return Ok(None),
    };

    let name = if is_name_start(c) || c.is_ascii_digit() {
        let mut name = String::new();
        while let Some(c) = cur.current() {
            if !is_name_char(c) {
                break;
            }
            name.push(c);
            cur.advance();
        }
        if !PARAM_SHAPE.is_match(&name) {
            return Ok(None);
        }
        name
    } else if SPECIAL_PARAMS.contains(c) {
        cur.advance();
        c.to_string()
    } else {
        return Ok(None);
    };

    let subscript = if cur.current() == Some('[') {
        cur.advance();
        let sub = scan_word_in_brackets(cur)?;
        cur.advance(); // ]
        Some(sub)
    } else {
        None
    };

    Ok(Some(Parameter { name, subscript }))
}

/// Consume everything through the `}` balancing the already-consumed `${`,
/// skipping quoted regions and escapes, and return the raw inner text.
fn scan_raw_braces(cur: &mut Cursor) -> Result<String, ParseError> {
    let mut b = Builder::new();
    let mut depth = 1usize;
    loop {
        let c = match cur.current() {
            Some(c) => c,
            None => return Err(cur.error("unexpected EOF while looking for matching '}'")),
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
            '{' => {
                depth += 1;
                cur.advance();
                b.push('{');
            }
            '}' => {
                depth -= 1;
                cur.advance();
                if depth == 0 {
                    return Ok(b.finish());
                }
                b.push('}');
            }
            _ => {
                cur.advance();
                b.push(c);
            }
        }
    }
}
