//! Word Splitting
//!
//! IFS-based splitting of a word into fields. Only unquoted characters can
//! be delimiters; quoted regions and substitutions are opaque. Leading and
//! trailing delimiter runs are dropped, and empty fields are never
//! produced.

use crate::ast::types::{Span, Word};

/// Split `word` on the delimiter characters in `ifs`.
pub fn split_word(ifs: &str, word: &Word) -> Vec<Word> {
    let mut fields = Vec::new();
    let mut current: Vec<Span> = Vec::new();

    for span in &word.spans {
        match span {
            Span::Char(c) if ifs.contains(*c) => {
                if !current.is_empty() {
                    fields.push(Word::new(std::mem::take(&mut current)));
                }
            }
            _ => current.push(span.clone()),
        }
    }
    if !current.is_empty() {
        fields.push(Word::new(current));
    }
    fields
}
