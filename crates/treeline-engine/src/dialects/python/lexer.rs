//! Line-level lexical scan of Python source.
//!
//! The outline pass needs two facts the raw text cannot give it directly:
//! which physical lines are continuations of a multi-line string or a
//! multi-line logical line (those must never become headlines), and which
//! lines open a `def`/`class` block. Tracking that takes a real scan:
//! triple-quoted strings, bracket nesting and backslash continuations all
//! span lines.

use std::collections::HashSet;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("unterminated string starting on line {0}")]
    UnterminatedString(usize),
    #[error("end of file inside a bracketed expression opened on line {0}")]
    UnclosedBracket(usize),
}

/// Facts derived from the scan, keyed by 1-based line numbers.
#[derive(Debug, Default)]
pub struct ScanFacts {
    /// Continuation lines: inside a multi-line string, or after the first
    /// line of a multi-line logical line.
    pub ignore_lines: HashSet<usize>,
    /// Lines containing a `def` or `class` keyword token.
    pub func_lines: HashSet<usize>,
}

#[derive(Clone, Copy)]
struct StringState {
    quote: char,
    triple: bool,
    start_line: usize,
}

pub fn scan(lines: &[String]) -> Result<ScanFacts, ScanError> {
    let mut facts = ScanFacts::default();
    let mut string: Option<StringState> = None;
    let mut bracket_depth = 0usize;
    let mut bracket_open_line = 0usize;
    let mut backslash_cont = false;

    for (idx, line) in lines.iter().enumerate() {
        let lnum = idx + 1;
        let continuing = string.is_some() || bracket_depth > 0 || backslash_cont;
        backslash_cont = false;

        if continuing {
            facts.ignore_lines.insert(lnum);
        }

        // code characters of this line, with strings and comments blanked
        let mut code = String::with_capacity(line.len());
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            if let Some(st) = string {
                // scanning for the closing quote
                if ch == '\\' {
                    chars.next();
                    continue;
                }
                if ch == st.quote {
                    if st.triple {
                        let mut run = 1;
                        while run < 3 && chars.peek() == Some(&st.quote) {
                            chars.next();
                            run += 1;
                        }
                        if run == 3 {
                            string = None;
                        }
                    } else {
                        string = None;
                    }
                }
                continue;
            }
            match ch {
                '#' => break,
                '\'' | '"' => {
                    let mut triple = false;
                    if chars.peek() == Some(&ch) {
                        let mut lookahead = chars.clone();
                        lookahead.next();
                        if lookahead.peek() == Some(&ch) {
                            chars.next();
                            chars.next();
                            triple = true;
                        } else {
                            // empty single-quoted string
                            chars.next();
                            continue;
                        }
                    }
                    string = Some(StringState {
                        quote: ch,
                        triple,
                        start_line: lnum,
                    });
                    code.push(' ');
                }
                '(' | '[' | '{' => {
                    if bracket_depth == 0 {
                        bracket_open_line = lnum;
                    }
                    bracket_depth += 1;
                    code.push(ch);
                }
                ')' | ']' | '}' => {
                    bracket_depth = bracket_depth.saturating_sub(1);
                    code.push(ch);
                }
                '\\' => {
                    if chars.peek().is_none() {
                        backslash_cont = true;
                    }
                }
                _ => code.push(ch),
            }
        }

        // a single-quoted string cannot run past the end of the line
        if let Some(st) = string
            && !st.triple
        {
            return Err(ScanError::UnterminatedString(st.start_line));
        }

        if has_def_or_class(&code) {
            facts.func_lines.insert(lnum);
        }
    }

    if let Some(st) = string {
        return Err(ScanError::UnterminatedString(st.start_line));
    }
    if bracket_depth > 0 {
        return Err(ScanError::UnclosedBracket(bracket_open_line));
    }
    Ok(facts)
}

/// Word-boundary test for the two block-opening keywords on the blanked
/// code text of one line.
fn has_def_or_class(code: &str) -> bool {
    for keyword in ["def", "class"] {
        let mut search = 0;
        while let Some(pos) = code[search..].find(keyword) {
            let start = search + pos;
            let end = start + keyword.len();
            let before_ok = start == 0
                || !code[..start]
                    .chars()
                    .next_back()
                    .is_some_and(|c| c.is_alphanumeric() || c == '_');
            let after_ok = !code[end..]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if before_ok && after_ok {
                return true;
            }
            search = end;
        }
    }
    false
}
