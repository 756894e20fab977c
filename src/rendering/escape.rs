//! Convert raw source fragments into text safe for LaTeX, highlighting
//! comparison operators and boolean keywords on the way.

enum Rule {
    Literal(&'static str, &'static str),
    // a word with a single space on either side
    Keyword(&'static str),
}

/// Applied in a single left-to-right pass: at each position the first rule
/// that matches wins, and replacement text is never scanned again. The
/// metacharacters therefore come first, ahead of the rules whose output
/// contains braces and dollar signs.
static RULES: [Rule; 15] = [
    Rule::Literal("%", "\\%"),
    Rule::Literal("{", "\\{"),
    Rule::Literal("}", "\\}"),
    Rule::Literal("_", "\\_"),
    Rule::Literal("&", "\\&"),
    Rule::Literal("$", "\\$"),
    Rule::Literal("<=", "$\\leq$"),
    Rule::Literal(">=", "$\\geq$"),
    Rule::Literal("<", "\\textless\\ "),
    Rule::Literal(">", "\\textgreater\\ "),
    Rule::Keyword("not"),
    Rule::Keyword("and"),
    Rule::Keyword("or"),
    Rule::Literal("'", "\\textquotedbl "),
    Rule::Literal("\"", "\\textquotedbl "),
];

pub fn escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 2);
    let mut rest = text;

    'outer: while !rest.is_empty() {
        for rule in &RULES {
            match rule {
                Rule::Literal(pattern, replacement) => {
                    if rest.starts_with(pattern) {
                        result.push_str(replacement);
                        rest = &rest[pattern.len()..];
                        continue 'outer;
                    }
                }
                Rule::Keyword(word) => {
                    // consume the leading space and the word; the trailing
                    // space stays to separate the next keyword
                    if let Some(after) = rest
                        .strip_prefix(' ')
                        .and_then(|r| r.strip_prefix(word))
                    {
                        if after.starts_with(' ') {
                            result.push_str(" \\pKey{");
                            result.push_str(word);
                            result.push('}');
                            rest = after;
                            continue 'outer;
                        }
                    }
                }
            }
        }

        let c = rest
            .chars()
            .next()
            .unwrap_or(' ');
        result.push(c);
        rest = &rest[c.len_utf8()..];
    }

    result
}
