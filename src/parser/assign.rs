//! Assignment Lexer
//!
//! Recognizes `name=value`, `name+=value`, `name[subscript]=value`, and
//! array literal assignments `name=( elem ... )`. Callers invoke this
//! speculatively: on failure nothing useful has been consumed and the
//! caller restores its saved position.

use crate::ast::types::{ArrayElement, Assign, AssignOp, Parameter, RValue};
use crate::parser::input::Cursor;
use crate::parser::types::{is_name_char, is_name_start, ParseError, WORD_DELIMITERS};
use crate::parser::word::{scan_word, scan_word_in_brackets};

/// Scan one assignment at the cursor.
pub fn scan_assign(cur: &mut Cursor) -> Result<Assign, ParseError> {
    let lhs = scan_lhs(cur)?;

    let op = if cur.eat_str("+=") {
        AssignOp::PlusEquals
    } else if cur.eat('=') {
        AssignOp::Equals
    } else {
        return Err(cur.error("expected '=' or '+='"));
    };

    let rvalue = if cur.current() == Some('(') {
        cur.advance();
        RValue::Array(scan_array_elements(cur)?)
    } else {
        RValue::Word(scan_word(cur, WORD_DELIMITERS)?)
    };

    Ok(Assign { lhs, op, rvalue })
}

/// Scan `name` or `name[subscript]` on the left of the operator.
fn scan_lhs(cur: &mut Cursor) -> Result<Parameter, ParseError> {
    match cur.current() {
        Some(c) if is_name_start(c) => {}
        _ => return Err(cur.error("expected assignment")),
    }
    let mut name = String::new();
    while let Some(c) = cur.current() {
        if !is_name_char(c) {
            break;
        }
        name.push(c);
        cur.advance();
    }

    if cur.current() == Some('[') {
        cur.advance();
        let sub = scan_word_in_brackets(cur)?;
        cur.advance(); // ]
        Ok(Parameter::with_subscript(name, sub))
    } else {
        Ok(Parameter::new(name))
    }
}

/// Scan array elements after the opening parenthesis, through `)`.
/// Elements are separated by arbitrary whitespace and newlines; comments
/// are whitespace here too.
fn scan_array_elements(cur: &mut Cursor) -> Result<Vec<ArrayElement>, ParseError> {
    let mut elements = Vec::new();
    loop {
        skip_array_space(cur);
        match cur.current() {
            None => return Err(cur.error("unexpected EOF while looking for matching ')'")),
            Some(')') => {
                cur.advance();
                return Ok(elements);
            }
            _ => {}
        }

        // [subscript]=word, falling back to a bare word on mismatch
        if cur.current() == Some('[') {
            let state = cur.save();
            cur.advance();
            match scan_word_in_brackets(cur) {
                Ok(sub) => {
                    cur.advance(); // ]
                    if cur.eat('=') {
                        let value = scan_word(cur, WORD_DELIMITERS)?;
                        elements.push(ArrayElement {
                            subscript: Some(sub),
                            value,
                        });
                        continue;
                    }
                    cur.restore(state);
                }
                Err(_) => cur.restore(state),
            }
        }

        let value = scan_word(cur, WORD_DELIMITERS)?;
        if value.is_empty() {
            return Err(cur.error("unexpected token in array literal"));
        }
        elements.push(ArrayElement {
            subscript: None,
            value,
        });
    }
}

fn skip_array_space(cur: &mut Cursor) {
    loop {
        match cur.current() {
            Some(' ' | '\t' | '\n') => {
                cur.advance();
            }
            Some('\\') if cur.peek(1) == Some('\n') => {
                cur.advance();
                cur.advance();
            }
            Some('#') => {
                while let Some(c) = cur.current() {
                    if c == '\n' {
                        break;
                    }
                    cur.advance();
                }
            }
            _ => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::Word;

    fn assign(input: &str) -> Assign {
        let mut cur = Cursor::new("test", input);
        let a = scan_assign(&mut cur).unwrap();
        assert!(cur.eof(), "trailing input");
        a
    }

    #[test]
    fn test_simple_assignment() {
        let a = assign("FOO=bar");
        assert_eq!(a.lhs, Parameter::new("FOO"));
        assert_eq!(a.op, AssignOp::Equals);
        assert_eq!(a.rvalue, RValue::Word(Word::from_string("bar")));
        assert_eq!(a.to_string(), "FOO=bar");
    }

    #[test]
    fn test_append_assignment() {
        let a = assign("FOO+=bar");
        assert_eq!(a.op, AssignOp::PlusEquals);
    }

    #[test]
    fn test_empty_value() {
        let a = assign("FOO=");
        assert_eq!(a.rvalue, RValue::Word(Word::default()));
    }

    #[test]
    fn test_subscript() {
        let a = assign("arr[2]=x");
        assert_eq!(
            a.lhs,
            Parameter::with_subscript("arr", Word::from_string("2"))
        );
    }

    #[test]
    fn test_array_literal() {
        let a = assign("arr=(a b c)");
        if let RValue::Array(elements) = &a.rvalue {
            assert_eq!(elements.len(), 3);
            assert_eq!(elements[1].value.to_string(), "b");
            assert!(elements[1].subscript.is_none());
        } else {
            panic!("Expected Array");
        }
        assert_eq!(a.to_string(), "arr=(a b c)");
    }

    #[test]
    fn test_array_with_subscripts_and_newlines() {
        let a = assign("arr=(\n  [0]=zero # comment\n  [1]=one\n  plain\n)");
        if let RValue::Array(elements) = &a.rvalue {
            assert_eq!(elements.len(), 3);
            assert_eq!(elements[0].subscript, Some(Word::from_string("0")));
            assert_eq!(elements[0].value.to_string(), "zero");
            assert!(elements[2].subscript.is_none());
        } else {
            panic!("Expected Array");
        }
    }

    #[test]
    fn test_bracket_word_element() {
        // [x is an ordinary word when no ]= follows
        let a = assign("arr=([x b)");
        if let RValue::Array(elements) = &a.rvalue {
            assert_eq!(elements.len(), 2);
            assert_eq!(elements[0].value.to_string(), "[x");
        } else {
            panic!("Expected Array");
        }
    }

    #[test]
    fn test_not_an_assignment() {
        let mut cur = Cursor::new("test", "a+b=c");
        assert!(scan_assign(&mut cur).is_err());
        let mut cur = Cursor::new("test", "echo");
        assert!(scan_assign(&mut cur).is_err());
    }
}
