//! Script source handling
//!
//! This module turns script text into executable statements:
//! - [`source`]: Line splitting, comment stripping and meta-tags
//! - [`literal`]: Literal coercion (token text → tagged value)
//! - [`lexer`]: Line tokenizer (line → typed components)
//!
//! There is no syntax tree. Each line is tokenized when the cursor reaches
//! it, so variable references always see the values current at that moment.

pub mod lexer;
pub mod literal;
pub mod source;

use crate::interpreter::errors::RuntimeError;
use crate::memory::value::CustomType;

/// Tokenize every statement line without executing anything.
///
/// References are not resolved. Returns `(1-based line, error)` pairs.
pub fn check_source(text: &str, types: &[CustomType]) -> Vec<(usize, RuntimeError)> {
    let parsed = match source::Source::parse(text) {
        Ok(parsed) => parsed,
        Err(err) => return vec![(0, err)],
    };

    parsed
        .lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.is_empty() && !source::is_meta_tag(line))
        .filter_map(|(index, line)| {
            lexer::tokenize(line, types, None)
                .err()
                .map(|err| (index + 1, err))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_source_reports_lines() {
        let errors = check_source("log ok\nlog \"open\nlog [1|2\nlog fine", &[]);
        let lines: Vec<usize> = errors.iter().map(|(line, _)| *line).collect();
        assert_eq!(lines, vec![2, 3]);
    }
}
