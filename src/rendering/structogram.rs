//! Translate a syntax tree into struktex markup.
//!
//! Every function here is pure: the same node, source, and depth always
//! produce the same fragment. Depth only controls indentation.

use std::fmt;
use tracing::{debug, warn};

use crate::language::*;
use crate::rendering::escape::escape;
use crate::rendering::fragment::{Fragment, Problem};
use crate::rendering::idioms::{do_while_shape, input_shape};

const ASSIGN_HEIGHT: u8 = 6;
const LOOP_HEIGHT: u8 = 8;
const CASE_HEIGHT: u8 = 12;
const EMPTY: &str = "$\\emptyset$";

/// Handing the renderer something that is neither a statement nor a
/// container of statements is a programming error in the caller, and the
/// only failure that aborts rendering outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    UnexpectedNode(&'static str),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UnexpectedNode(kind) => write!(
                f,
                "expected a statement or a sequence of statements but got {}",
                kind
            ),
        }
    }
}

/// Render a whole module or a single function.
pub fn structogram(node: Node<'_, '_>, source: &str) -> Result<Fragment, RenderError> {
    render(node, source, 0)
}

pub fn render(node: Node<'_, '_>, source: &str, depth: usize) -> Result<Fragment, RenderError> {
    match node {
        Node::Module(module) => Ok(render_sequence(&module.body, source, 0)),
        Node::Function(function) => Ok(render_function(function, source)),
        Node::Statement(statement) => Ok(render_statement(statement, source, depth)),
        Node::Sequence(statements) => Ok(render_sequence(statements, source, depth)),
        Node::Case(case) => Ok(render_sequence(&case.body, source, depth)),
        Node::Expression(expression) => Err(RenderError::UnexpectedNode(
            expression
                .kind
                .describe(),
        )),
    }
}

/// Statements inside the struktogramm environment start two levels in.
fn indentation(depth: usize) -> String {
    "  ".repeat(2 * (depth + 1))
}

fn render_sequence(statements: &[Statement<'_>], source: &str, depth: usize) -> Fragment {
    statements
        .iter()
        .map(|statement| render_statement(statement, source, depth))
        .collect()
}

fn render_statement(statement: &Statement<'_>, source: &str, depth: usize) -> Fragment {
    match &statement.kind {
        StatementKind::Function(function) => render_function(function, source),
        StatementKind::Assignment { .. } => render_assignment(statement, source, depth),
        StatementKind::Expression(expression) => {
            render_expression(statement, expression, source, depth)
        }
        StatementKind::Conditional {
            test,
            consequent,
            alternative,
        } => render_conditional(test, consequent, alternative, source, depth),
        StatementKind::Loop { test, body } => render_loop(statement, test, body, source, depth),
        StatementKind::Match { subject, cases } => render_match(subject, cases, source, depth),
        StatementKind::Pass => render_empty(depth),
        StatementKind::Break
        | StatementKind::Continue
        | StatementKind::Return(_)
        | StatementKind::Unsupported { .. } => {
            let keyword = statement
                .kind
                .describe();
            warn!(
                offset = statement
                    .span
                    .start,
                "Skipping unsupported statement: {}",
                keyword
            );
            Fragment::reporting(Problem::UnsupportedStatement(
                statement
                    .span
                    .start,
                keyword,
            ))
        }
    }
}

fn assign(depth: usize, text: &str) -> Fragment {
    let mut fragment = Fragment::new();
    fragment.line(
        &indentation(depth),
        &format!("\\assign[{}]{{{}}}", ASSIGN_HEIGHT, text),
    );
    fragment
}

fn render_empty(depth: usize) -> Fragment {
    assign(depth, EMPTY)
}

fn render_function(function: &Function<'_>, source: &str) -> Fragment {
    debug!("Rendering structogram for {}", function.name.0);

    let mut fragment = Fragment::new();
    fragment.line("", &format!("% Structogram {} ", function.name.0));
    fragment.line("", "\\begin{centernss} ");
    fragment.line("  ", "\\begin{struktogramm}(120,100) ");
    fragment.append(render_sequence(&function.body, source, 0));
    fragment.line("  ", "\\end{struktogramm} ");
    fragment.line("", "\\end{centernss}");
    fragment
}

fn render_expression(
    statement: &Statement<'_>,
    expression: &Expression<'_>,
    source: &str,
    depth: usize,
) -> Fragment {
    let text = match (&expression.kind, expression.callee()) {
        (ExpressionKind::Call { function, .. }, Some("print")) => {
            // keep the arguments exactly as written
            let arguments = Span::new(
                function
                    .span
                    .end,
                statement
                    .span
                    .end,
            );
            format!("Output{}", arguments.text(source))
        }
        _ => statement
            .span
            .text(source)
            .to_string(),
    };

    assign(depth, &escape(&text))
}

fn render_assignment(statement: &Statement<'_>, source: &str, depth: usize) -> Fragment {
    match input_shape(statement) {
        Some(label) => assign(depth, &label),
        None => assign(
            depth,
            &escape(
                statement
                    .span
                    .text(source),
            ),
        ),
    }
}

fn render_loop(
    statement: &Statement<'_>,
    test: &Expression<'_>,
    body: &[Statement<'_>],
    source: &str,
    depth: usize,
) -> Fragment {
    let indent = indentation(depth);
    let mut fragment = Fragment::new();

    match do_while_shape(statement, source) {
        Some(condition) => {
            debug!("Drawing while loop as do-while");
            fragment.line(
                &indent,
                &format!("\\until[{}]{{{}}} ", LOOP_HEIGHT, condition),
            );
            // the trailing guard is represented by the exit condition
            let body = &body[..body.len() - 1];
            fragment.append(render_sequence(body, source, depth + 1));
            fragment.line(&indent, "\\untilend ");
        }
        None => {
            let condition = escape(
                test.span
                    .text(source),
            );
            fragment.line(
                &indent,
                &format!("\\while[{}]{{{}}} ", LOOP_HEIGHT, condition),
            );
            fragment.append(render_sequence(body, source, depth + 1));
            fragment.line(&indent, "\\whileend ");
        }
    }

    fragment
}

fn render_conditional(
    test: &Expression<'_>,
    consequent: &[Statement<'_>],
    alternative: &[Statement<'_>],
    source: &str,
    depth: usize,
) -> Fragment {
    let indent = indentation(depth);
    let condition = escape(
        test.span
            .text(source),
    );

    let mut fragment = Fragment::new();
    fragment.line(&indent, "\\ifthenelse{5}{5} ");
    fragment.line(
        &indent,
        &format!("  {{{}}} {{\\pTrue}}{{\\pFalse}} ", condition),
    );
    fragment.append(render_arm(consequent, source, depth + 1));
    fragment.line(&indent, "\\change ");
    fragment.append(render_arm(alternative, source, depth + 1));
    fragment.line(&indent, "\\ifend ");
    fragment
}

/// A structogram never shows an empty arm; a missing `else` (or one with
/// nothing drawable in it) gets a placeholder box.
fn render_arm(statements: &[Statement<'_>], source: &str, depth: usize) -> Fragment {
    let mut fragment = render_sequence(statements, source, depth);
    if fragment.is_empty() {
        fragment.append(render_empty(depth));
    }
    fragment
}

/// Patterns must be literals, with an optional wildcard as the final case.
fn validate_cases(cases: &[Case<'_>]) -> Result<(), Problem> {
    let count = cases.len();

    for case in cases {
        match &case
            .pattern
            .kind
        {
            PatternKind::Literal(_) => {}
            PatternKind::Wildcard if case.is_default(count) => {}
            PatternKind::Wildcard => {
                return Err(Problem::InvalidPattern(
                    case.pattern
                        .span
                        .start,
                    "wildcard before the last case",
                ))
            }
            other => {
                return Err(Problem::InvalidPattern(
                    case.pattern
                        .span
                        .start,
                    other.describe(),
                ))
            }
        }
    }

    Ok(())
}

fn render_match(
    subject: &Expression<'_>,
    cases: &[Case<'_>],
    source: &str,
    depth: usize,
) -> Fragment {
    if let Err(problem) = validate_cases(cases) {
        warn!(offset = problem.offset(), "{}", problem.message());
        return Fragment::reporting(problem);
    }

    let indent = indentation(depth);
    let count = cases.len();
    let default = cases
        .last()
        .map_or(false, |case| case.is_default(count));
    let subject = escape(
        subject
            .span
            .text(source),
    );

    let mut fragment = Fragment::new();

    for case in cases {
        let label = if case.is_wildcard() {
            "otherwise".to_string()
        } else {
            escape(
                case.pattern
                    .span
                    .text(source),
            )
        };

        let header = if case.position == 0 {
            format!(
                "\\case[{}]{{{}}}{{{}}}{{{}}}{{{}}}",
                CASE_HEIGHT, default as u8, count, subject, label
            )
        } else if case.is_default(count) {
            format!("\\switch[r]{{{}}}", label)
        } else {
            format!("\\switch{{{}}}", label)
        };

        fragment.line(&indent, &header);
        fragment.append(render_sequence(&case.body, source, depth + 1));
    }

    fragment.line(&indent, "\\caseend ");
    fragment
}
