//! Composing and writing the .tex document for a structogram

use serde::Serialize;
use std::path::{Path, PathBuf};
use tinytemplate::TinyTemplate;
use tracing::{debug, info};

// The Python source goes in commented out, then the markup, then the output
// of the dry run (also commented out) so it can be seen in the LaTeX source
// but not in the compiled document.
static TEMPLATE: &'static str = r#"{{ for line in source }}% {line}
{{ endfor }}

{markup}


{{ if dry_run }}% Output of structogram {name} ({count} lines)
{{ for line in output }}% [{line.number}] {line.text}
{{ endfor }}{{ else }}% No structogram output generated (dry_run=False)
{{ endif }}"#;

#[derive(Serialize)]
struct Line {
    number: String,
    text: String,
}

#[derive(Serialize)]
struct Context<'a> {
    name: &'a str,
    source: Vec<&'a str>,
    markup: &'a str,
    dry_run: bool,
    count: usize,
    output: Vec<Line>,
}

/// Assemble the complete document. `capture` is None when no dry run was
/// performed.
pub fn document(
    name: &str,
    source: &str,
    markup: &str,
    capture: Option<&[String]>,
) -> Result<String, tinytemplate::error::Error> {
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("document", TEMPLATE)?;

    let output = capture
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, text)| Line {
            number: format!("{:02}", i + 1),
            text: text.clone(),
        })
        .collect::<Vec<_>>();

    let context = Context {
        name,
        source: source
            .split('\n')
            .collect(),
        markup: markup.trim_end_matches('\n'),
        dry_run: capture.is_some(),
        count: output.len(),
        output,
    };

    tt.render("document", &context)
}

/// What gets echoed to the terminal after a document has been written.
pub fn summary(name: &str, markup: &str, capture: Option<&[String]>) -> String {
    let rule = "-".repeat(60);
    let mut result = format!(
        "{}\n{}\n{}\n",
        rule,
        markup.trim_end_matches('\n'),
        rule
    );

    match capture {
        Some(lines) => {
            result.push_str(&format!(
                "Output of function/structogram {} ({} lines)\n",
                name,
                lines.len()
            ));
            for line in lines {
                result.push_str(line);
                result.push('\n');
            }
        }
        None => result.push_str("No structogram output generated (dry_run=False)\n"),
    }

    result
}

/// Anything not ending in `.tex` is replaced by a name derived from the
/// function.
pub fn target_filename(requested: Option<&Path>, name: &str) -> PathBuf {
    match requested {
        Some(path)
            if path
                .extension()
                .map_or(false, |extension| extension == "tex") =>
        {
            path.to_path_buf()
        }
        Some(path) => {
            debug!(
                "Ignoring output name {} without .tex extension",
                path.display()
            );
            default_filename(name)
        }
        None => default_filename(name),
    }
}

pub fn default_filename(name: &str) -> PathBuf {
    PathBuf::from(format!("structogram_{}.tex", name))
}

pub fn write(filename: &Path, text: &str) -> std::io::Result<()> {
    info!("Writing {}", filename.display());
    std::fs::write(filename, text)
}
