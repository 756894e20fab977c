//! Recognize the two source shapes that get special treatment in a
//! structogram.

use crate::language::*;
use crate::rendering::escape::escape;

/// A loop of the shape
///
/// ```text
/// while True:
///     ...
///     if not <cond>:
///         break
/// ```
///
/// is a post-test loop in disguise. Returns the escaped `<cond>` text to
/// use as the exit condition, or None if the loop doesn't have this shape.
pub fn do_while_shape(statement: &Statement<'_>, source: &str) -> Option<String> {
    let StatementKind::Loop { test, body } = &statement.kind else {
        return None;
    };
    if !test.is_literal_true() {
        return None;
    }

    let last = body.last()?;
    let StatementKind::Conditional {
        test: guard,
        consequent,
        ..
    } = &last.kind
    else {
        return None;
    };

    // only the first statement of the guarded block is examined
    match consequent.first() {
        Some(Statement {
            kind: StatementKind::Break,
            ..
        }) => {}
        _ => return None,
    }

    if !matches!(guard.kind, ExpressionKind::Unary(UnaryOperator::Not, _)) {
        return None;
    }

    let condition = guard
        .span
        .text(source)
        .trim()
        .strip_prefix("not")?
        .trim();

    Some(escape(condition))
}

/// An assignment `x = input(...)` or `x = eval(input(...))` is drawn as an
/// input box. The two labels differ in trailing whitespace and that
/// difference is part of the output format.
pub fn input_shape(statement: &Statement<'_>) -> Option<String> {
    let StatementKind::Assignment { targets, value } = &statement.kind else {
        return None;
    };
    let [target] = targets.as_slice() else {
        return None;
    };
    let ExpressionKind::Name(name) = target.kind else {
        return None;
    };

    match value.callee()? {
        "input" => Some(format!("Input({}) \n", escape(name))),
        "eval" => match value
            .arguments()?
            .first()?
        {
            Argument::Positional(inner) if inner.callee() == Some("input") => {
                Some(format!("Input({})", escape(name)))
            }
            _ => None,
        },
        _ => None,
    }
}
