//! Brace-aware pretty printing of rendered template code.
//!
//! Template fragments are opaque C++ snippets written with arbitrary
//! indentation. Before they land in an output buffer they are re-flowed:
//! runs of whitespace collapse, `{` and `}` move onto their own lines, and
//! every line is re-indented from the brace nesting. String and character
//! literals and comments are left untouched.

const INDENT: &str = "  ";

#[derive(Clone, Copy, PartialEq)]
enum Lex {
    Normal,
    Str,
    Chr,
    LineComment,
    BlockComment,
}

/// Split `code` into logical lines: hard newlines plus a break around every
/// brace that appears outside literals and comments.
fn logical_lines(code: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut lex = Lex::Normal;
    let mut prev = '\0';

    let mut flush = |current: &mut String, lines: &mut Vec<String>| {
        let collapsed = collapse_ws(current);
        if !collapsed.is_empty() {
            lines.push(collapsed);
        }
        current.clear();
    };

    for c in code.chars() {
        match lex {
            Lex::Normal => match c {
                '"' => {
                    lex = Lex::Str;
                    current.push(c);
                }
                '\'' => {
                    lex = Lex::Chr;
                    current.push(c);
                }
                '/' if prev == '/' => {
                    lex = Lex::LineComment;
                    current.push(c);
                }
                '*' if prev == '/' => {
                    lex = Lex::BlockComment;
                    current.push(c);
                }
                '{' | '}' => {
                    flush(&mut current, &mut lines);
                    lines.push(c.to_string());
                }
                '\n' => flush(&mut current, &mut lines),
                _ => current.push(c),
            },
            Lex::Str => {
                current.push(c);
                if c == '"' && prev != '\\' {
                    lex = Lex::Normal;
                }
            }
            Lex::Chr => {
                current.push(c);
                if c == '\'' && prev != '\\' {
                    lex = Lex::Normal;
                }
            }
            Lex::LineComment => {
                if c == '\n' {
                    flush(&mut current, &mut lines);
                    lex = Lex::Normal;
                } else {
                    current.push(c);
                }
            }
            Lex::BlockComment => {
                current.push(c);
                if c == '/' && prev == '*' {
                    lex = Lex::Normal;
                }
            }
        }
        // an escaped backslash must not mask the closing quote
        prev = if prev == '\\' && c == '\\' { '\0' } else { c };
    }
    flush(&mut current, &mut lines);

    lines
}

/// Collapse interior whitespace runs to single spaces and trim the ends.
/// Literal content was kept out of line splitting but not out of this pass;
/// template authors do not put significant double spaces inside literals.
fn collapse_ws(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_ws = false;
    for c in line.chars() {
        if c == ' ' || c == '\t' || c == '\r' {
            in_ws = true;
        } else {
            if in_ws && !out.is_empty() {
                out.push(' ');
            }
            in_ws = false;
            out.push(c);
        }
    }
    out
}

/// Re-indent `code` and append it to `out`.
pub fn pretty_print(code: &str, out: &mut String) {
    let mut level: usize = 0;
    for line in logical_lines(code) {
        if line == "}" {
            level = level.saturating_sub(1);
        }
        for _ in 0..level {
            out.push_str(INDENT);
        }
        out.push_str(&line);
        out.push('\n');
        if line == "{" {
            level += 1;
        }
    }
}
