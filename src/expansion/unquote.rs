//! Quote Removal
//!
//! Strips all quoting from a word: plain and escaped characters contribute
//! themselves, quoted regions contribute their content, and substitutions
//! are re-emitted verbatim (they have no unquoted form before expansion).

use crate::ast::types::{Span, Word};

/// Remove all quoting from a word.
pub fn unquote(word: &Word) -> String {
    let mut out = String::new();
    unquote_into(word, &mut out);
    out
}

fn unquote_into(word: &Word, out: &mut String) {
    for span in &word.spans {
        match span {
            Span::Char(c) | Span::Escape(c) => out.push(*c),
            Span::Single(s) => out.push_str(s),
            Span::Double(w) | Span::AnsiC(w) | Span::Locale(w) => unquote_into(w, out),
            Span::Backquote(_)
            | Span::Parameter(_)
            | Span::ArithSubst(_)
            | Span::CommandSubst(_)
            | Span::ProcessSubst(..) => out.push_str(&span.to_string()),
        }
    }
}
