use std::{fmt, path::Path};

use owo_colors::OwoColorize;

/// A problem located at a byte offset in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError<'i> {
    pub problem: String,
    pub details: String,
    pub filename: &'i Path,
    pub source: &'i str,
    pub offset: usize,
}

// Verbose explanation with an excerpt of the offending line
impl<'i> SourceError<'i> {
    pub fn full_details(&self) -> String {
        let i = calculate_line_number(self.source, self.offset);
        let j = calculate_column_number(self.source, self.offset);

        let code = self
            .source
            .lines()
            .nth(i)
            .unwrap_or("");

        let line = i + 1;
        let column = j + 1;

        let width = line
            .to_string()
            .len();
        let width = 3.max(width);
        let caret = j + 1;

        format!(
            r#"
{}: {}
{}:{}:{}

{:width$} {}
{:width$} {} {}
{:width$} {} {:>caret$}

{}
            "#,
            "error".bright_red(),
            self.problem
                .bold(),
            self.filename
                .to_string_lossy(),
            line,
            column,
            ' ',
            '|'.bright_blue(),
            line.bright_blue(),
            '|'.bright_blue(),
            code,
            ' ',
            '|'.bright_blue(),
            '^'.bright_red(),
            self.details
        )
        .trim_ascii()
        .to_string()
    }
}

// Concise version, one line per problem
impl<'i> fmt::Display for SourceError<'i> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let i = calculate_line_number(self.source, self.offset);
        let j = calculate_column_number(self.source, self.offset);

        write!(
            f,
            "{}:{}:{} {}",
            self.filename
                .to_string_lossy(),
            i + 1,
            j + 1,
            self.problem
        )
    }
}

fn before(content: &str, offset: usize) -> &str {
    let mut offset = offset.min(content.len());
    while !content.is_char_boundary(offset) {
        offset -= 1;
    }
    &content[..offset]
}

// This returns a zero-origin result so that it can subsequently be used for
// splitting; for display to humans you'll have to add 1.
fn calculate_line_number(content: &str, offset: usize) -> usize {
    before(content, offset)
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
}

// Zero-origin as well, counted in characters.
fn calculate_column_number(content: &str, offset: usize) -> usize {
    let before = before(content, offset);
    match before.rfind('\n') {
        Some(start) => before[start + 1..]
            .chars()
            .count(),
        None => before
            .chars()
            .count(),
    }
}
