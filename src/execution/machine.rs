//! Tree-walking evaluation of the supported subset. Output goes to the sink
//! handed in by the caller and `input()` reads from the given reader; no
//! process-wide state is touched.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::io::{BufRead, Write};

use tracing::trace;

use crate::execution::value::{Number, Value};
use crate::execution::ExecutionError;
use crate::language::*;
use crate::parsing::parse_expression;

enum Flow {
    Next,
    Break(usize),
    Continue(usize),
    Return,
}

pub struct Machine<'s> {
    variables: HashMap<String, Value>,
    output: &'s mut dyn Write,
    input: &'s mut dyn BufRead,
}

impl<'s> Machine<'s> {
    pub fn new(output: &'s mut dyn Write, input: &'s mut dyn BufRead) -> Machine<'s> {
        Machine {
            variables: HashMap::new(),
            output,
            input,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables
            .get(name)
    }

    /// Run the body of a function that takes no arguments.
    pub fn call(&mut self, function: &Function<'_>) -> Result<(), ExecutionError> {
        if !function
            .parameters
            .is_empty()
        {
            return Err(ExecutionError::Parameters(
                function
                    .span
                    .start,
            ));
        }

        match self.execute_block(&function.body)? {
            Flow::Break(offset) => Err(ExecutionError::OutsideLoop(offset, "break")),
            Flow::Continue(offset) => Err(ExecutionError::OutsideLoop(offset, "continue")),
            Flow::Next | Flow::Return => Ok(()),
        }
    }

    fn execute_block(&mut self, statements: &[Statement<'_>]) -> Result<Flow, ExecutionError> {
        for statement in statements {
            match self.execute(statement)? {
                Flow::Next => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Next)
    }

    fn execute(&mut self, statement: &Statement<'_>) -> Result<Flow, ExecutionError> {
        let offset = statement
            .span
            .start;

        match &statement.kind {
            StatementKind::Function(_) => Err(ExecutionError::Unsupported(
                offset,
                "nested function definitions",
            )),
            StatementKind::Assignment { targets, value } => {
                let value = self.evaluate(value)?;
                for target in targets {
                    self.assign(target, value.clone())?;
                }
                Ok(Flow::Next)
            }
            StatementKind::Expression(expression) => {
                self.evaluate(expression)?;
                Ok(Flow::Next)
            }
            StatementKind::Conditional {
                test,
                consequent,
                alternative,
            } => {
                if self
                    .evaluate(test)?
                    .is_truthy()
                {
                    self.execute_block(consequent)
                } else {
                    self.execute_block(alternative)
                }
            }
            StatementKind::Loop { test, body } => {
                while self
                    .evaluate(test)?
                    .is_truthy()
                {
                    match self.execute_block(body)? {
                        Flow::Break(_) => break,
                        Flow::Return => return Ok(Flow::Return),
                        Flow::Next | Flow::Continue(_) => {}
                    }
                }
                Ok(Flow::Next)
            }
            StatementKind::Match { subject, cases } => {
                let value = self.evaluate(subject)?;
                for case in cases {
                    if self.matches(&case.pattern, &value)? {
                        trace!(position = case.position, "case matched");
                        return self.execute_block(&case.body);
                    }
                }
                Ok(Flow::Next)
            }
            StatementKind::Pass => Ok(Flow::Next),
            StatementKind::Break => Ok(Flow::Break(offset)),
            StatementKind::Continue => Ok(Flow::Continue(offset)),
            StatementKind::Return(value) => {
                if let Some(value) = value {
                    self.evaluate(value)?;
                }
                Ok(Flow::Return)
            }
            StatementKind::Unsupported { keyword } => {
                Err(ExecutionError::Unsupported(offset, *keyword))
            }
        }
    }

    fn assign(&mut self, target: &Expression<'_>, value: Value) -> Result<(), ExecutionError> {
        let offset = target
            .span
            .start;

        match &target.kind {
            ExpressionKind::Name(name) => {
                self.variables
                    .insert(name.to_string(), value);
                Ok(())
            }
            ExpressionKind::Tuple(names) | ExpressionKind::List(names) => {
                let values = match value {
                    Value::Tuple(values) | Value::List(values) => values,
                    other => {
                        return Err(ExecutionError::TypeMismatch(
                            offset,
                            format!("cannot unpack non-iterable {} object", other.type_name()),
                        ))
                    }
                };
                if values.len() != names.len() {
                    return Err(ExecutionError::InvalidValue(
                        offset,
                        format!(
                            "expected {} values to unpack, got {}",
                            names.len(),
                            values.len()
                        ),
                    ));
                }
                for (name, value) in names
                    .iter()
                    .zip(values)
                {
                    self.assign(name, value)?;
                }
                Ok(())
            }
            _ => Err(ExecutionError::Unsupported(
                offset,
                "assignment to this kind of target",
            )),
        }
    }

    fn matches(&mut self, pattern: &Pattern<'_>, value: &Value) -> Result<bool, ExecutionError> {
        match &pattern.kind {
            PatternKind::Literal(constant) => Ok(Value::from(constant).equals(value)),
            PatternKind::Wildcard => Ok(true),
            PatternKind::Capture(name) => {
                self.variables
                    .insert(name.to_string(), value.clone());
                Ok(true)
            }
            PatternKind::As(inner, name) => {
                if self.matches(inner, value)? {
                    self.variables
                        .insert(name.to_string(), value.clone());
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            PatternKind::Or(alternatives) => {
                for alternative in alternatives {
                    if self.matches(alternative, value)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            other => Err(ExecutionError::Unsupported(
                pattern
                    .span
                    .start,
                other.describe(),
            )),
        }
    }

    pub fn evaluate(&mut self, expression: &Expression<'_>) -> Result<Value, ExecutionError> {
        let offset = expression
            .span
            .start;

        match &expression.kind {
            ExpressionKind::Name(name) => self
                .variables
                .get(*name)
                .cloned()
                .ok_or_else(|| ExecutionError::UndefinedName(offset, name.to_string())),
            ExpressionKind::Constant(constant) => Ok(Value::from(constant)),
            ExpressionKind::Formatted(template) => self.format(template, offset),
            ExpressionKind::Unary(operator, operand) => {
                let value = self.evaluate(operand)?;
                unary(*operator, value, offset)
            }
            ExpressionKind::Binary(left, operator, right) => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary(*operator, left, right, offset)
            }
            ExpressionKind::Logical(left, operator, right) => {
                let left = self.evaluate(left)?;
                match (operator, left.is_truthy()) {
                    (LogicalOperator::And, false) | (LogicalOperator::Or, true) => Ok(left),
                    _ => self.evaluate(right),
                }
            }
            ExpressionKind::Compare(first, comparisons) => {
                let mut left = self.evaluate(first)?;
                for (operator, right) in comparisons {
                    let right = self.evaluate(right)?;
                    if !compare(*operator, &left, &right, offset)? {
                        return Ok(Value::Boolean(false));
                    }
                    left = right;
                }
                Ok(Value::Boolean(true))
            }
            ExpressionKind::Call {
                function,
                arguments,
            } => match function.kind {
                ExpressionKind::Name(name) => self.call_builtin(name, arguments, offset),
                _ => Err(ExecutionError::Unsupported(offset, "calling anything but a builtin")),
            },
            ExpressionKind::Attribute(_, _) => {
                Err(ExecutionError::Unsupported(offset, "attribute access"))
            }
            ExpressionKind::Subscript(container, index) => {
                let container = self.evaluate(container)?;
                let index = self.evaluate(index)?;
                subscript(&container, &index, offset)
            }
            ExpressionKind::Tuple(items) => Ok(Value::Tuple(self.evaluate_all(items)?)),
            ExpressionKind::List(items) => Ok(Value::List(self.evaluate_all(items)?)),
        }
    }

    fn evaluate_all(&mut self, items: &[Expression<'_>]) -> Result<Vec<Value>, ExecutionError> {
        items
            .iter()
            .map(|item| self.evaluate(item))
            .collect()
    }

    /// Evaluate expression text that was not part of the parsed source, as
    /// `eval()` and f-strings need. Errors are reported at `offset`.
    fn evaluate_text(&mut self, text: &str, offset: usize) -> Result<Value, ExecutionError> {
        let expression = parse_expression(text.trim())
            .map_err(|error| ExecutionError::Evaluation(offset, error.message()))?;
        self.evaluate(&expression)
            .map_err(|error| error.at(offset))
    }

    fn format(&mut self, template: &str, offset: usize) -> Result<Value, ExecutionError> {
        let mut result = String::new();
        let mut rest = template;

        while let Some(i) = rest.find(['{', '}']) {
            result.push_str(&rest[..i]);
            let after = &rest[i..];

            if after.starts_with("{{") {
                result.push('{');
                rest = &after[2..];
            } else if after.starts_with("}}") {
                result.push('}');
                rest = &after[2..];
            } else if after.starts_with('}') {
                return Err(ExecutionError::InvalidValue(
                    offset,
                    "single '}' encountered in format string".to_string(),
                ));
            } else {
                let close = after
                    .find('}')
                    .ok_or_else(|| {
                        ExecutionError::InvalidValue(
                            offset,
                            "expected '}' before end of string".to_string(),
                        )
                    })?;
                let inner = &after[1..close];

                let (text, repr) = match inner.strip_suffix("!r") {
                    Some(text) => (text, true),
                    None => (inner.strip_suffix("!s").unwrap_or(inner), false),
                };
                if text.contains(':') {
                    return Err(ExecutionError::Unsupported(
                        offset,
                        "format specifications",
                    ));
                }

                let value = self.evaluate_text(text, offset)?;
                if repr {
                    result.push_str(&value.repr());
                } else {
                    result.push_str(&value.to_string());
                }
                rest = &after[close + 1..];
            }
        }
        result.push_str(rest);

        Ok(Value::String(result))
    }

    fn write(&mut self, text: &str) -> Result<(), ExecutionError> {
        self.output
            .write_all(text.as_bytes())
            .map_err(|error| ExecutionError::Output(error.to_string()))
    }

    fn call_builtin(
        &mut self,
        name: &str,
        arguments: &[Argument<'_>],
        offset: usize,
    ) -> Result<Value, ExecutionError> {
        let mut positional = Vec::new();
        let mut keywords = Vec::new();
        for argument in arguments {
            match argument {
                Argument::Positional(expression) => positional.push(self.evaluate(expression)?),
                Argument::Keyword(keyword, expression) => {
                    keywords.push((*keyword, self.evaluate(expression)?))
                }
            }
        }

        if name != "print" && !keywords.is_empty() {
            return Err(ExecutionError::TypeMismatch(
                offset,
                format!("{}() takes no keyword arguments", name),
            ));
        }

        match name {
            "print" => {
                let mut separator = " ".to_string();
                let mut end = "\n".to_string();
                for (keyword, value) in keywords {
                    let text = match value {
                        Value::None => None,
                        Value::String(text) => Some(text),
                        other => {
                            return Err(ExecutionError::TypeMismatch(
                                offset,
                                format!("{} must be None or a string, not {}", keyword, other.type_name()),
                            ))
                        }
                    };
                    match keyword {
                        "sep" => separator = text.unwrap_or_else(|| " ".to_string()),
                        "end" => end = text.unwrap_or_else(|| "\n".to_string()),
                        "flush" => {}
                        _ => return Err(ExecutionError::Unsupported(offset, "this print() keyword")),
                    }
                }

                let line = positional
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>()
                    .join(&separator);
                self.write(&line)?;
                self.write(&end)?;
                Ok(Value::None)
            }
            "input" => {
                if let Some(prompt) = positional.first() {
                    self.write(&prompt.to_string())?;
                }
                self.output
                    .flush()
                    .map_err(|error| ExecutionError::Output(error.to_string()))?;

                let mut line = String::new();
                let count = self
                    .input
                    .read_line(&mut line)
                    .map_err(|error| ExecutionError::Output(error.to_string()))?;
                if count == 0 {
                    return Err(ExecutionError::EndOfInput(offset));
                }
                let line = line
                    .strip_suffix('\n')
                    .unwrap_or(&line);
                let line = line
                    .strip_suffix('\r')
                    .unwrap_or(line);
                Ok(Value::String(line.to_string()))
            }
            "eval" => match positional.as_slice() {
                [Value::String(text)] => {
                    let text = text.clone();
                    self.evaluate_text(&text, offset)
                }
                [other] => Err(ExecutionError::TypeMismatch(
                    offset,
                    format!("eval() arg 1 must be a string, not {}", other.type_name()),
                )),
                _ => Err(arity(offset, "eval", 1)),
            },
            "int" => match positional.as_slice() {
                [] => Ok(Value::Integer(0)),
                [value] => to_integer(value, offset),
                _ => Err(arity(offset, "int", 1)),
            },
            "float" => match positional.as_slice() {
                [] => Ok(Value::Float(0.0)),
                [value] => to_float(value, offset),
                _ => Err(arity(offset, "float", 1)),
            },
            "str" => match positional.as_slice() {
                [] => Ok(Value::String(String::new())),
                [value] => Ok(Value::String(value.to_string())),
                _ => Err(arity(offset, "str", 1)),
            },
            "bool" => match positional.as_slice() {
                [] => Ok(Value::Boolean(false)),
                [value] => Ok(Value::Boolean(value.is_truthy())),
                _ => Err(arity(offset, "bool", 1)),
            },
            "abs" => match positional.as_slice() {
                [value] => match value.as_number() {
                    Some(Number::Integer(n)) => n
                        .checked_abs()
                        .map(Value::Integer)
                        .ok_or(ExecutionError::Overflow(offset)),
                    Some(Number::Float(n)) => Ok(Value::Float(n.abs())),
                    None => Err(ExecutionError::TypeMismatch(
                        offset,
                        format!("bad operand type for abs(): '{}'", value.type_name()),
                    )),
                },
                _ => Err(arity(offset, "abs", 1)),
            },
            "len" => match positional.as_slice() {
                [Value::String(text)] => Ok(Value::Integer(
                    text.chars()
                        .count() as i64,
                )),
                [Value::Tuple(items)] | [Value::List(items)] => Ok(Value::Integer(items.len() as i64)),
                [other] => Err(ExecutionError::TypeMismatch(
                    offset,
                    format!("object of type '{}' has no len()", other.type_name()),
                )),
                _ => Err(arity(offset, "len", 1)),
            },
            "min" | "max" => {
                let candidates = match positional.as_slice() {
                    [Value::Tuple(items)] | [Value::List(items)] => Some(items.clone()),
                    _ => None,
                }
                .unwrap_or(positional);
                let wanted = if name == "min" {
                    ComparisonOperator::Less
                } else {
                    ComparisonOperator::Greater
                };

                let mut iter = candidates.into_iter();
                let mut best = iter
                    .next()
                    .ok_or_else(|| {
                        ExecutionError::InvalidValue(offset, format!("{}() arg is an empty sequence", name))
                    })?;
                for candidate in iter {
                    if compare(wanted, &candidate, &best, offset)? {
                        best = candidate;
                    }
                }
                Ok(best)
            }
            _ => {
                if self
                    .variables
                    .contains_key(name)
                {
                    Err(ExecutionError::TypeMismatch(
                        offset,
                        format!("'{}' object is not callable", name),
                    ))
                } else {
                    Err(ExecutionError::UndefinedName(offset, name.to_string()))
                }
            }
        }
    }
}

fn arity(offset: usize, name: &str, expected: usize) -> ExecutionError {
    ExecutionError::TypeMismatch(
        offset,
        format!("{}() takes at most {} argument", name, expected),
    )
}

fn to_integer(value: &Value, offset: usize) -> Result<Value, ExecutionError> {
    match value {
        Value::Integer(n) => Ok(Value::Integer(*n)),
        Value::Boolean(b) => Ok(Value::Integer(*b as i64)),
        Value::Float(f) => {
            if f.is_finite() && f.abs() < 9.2e18 {
                Ok(Value::Integer(f.trunc() as i64))
            } else {
                Err(ExecutionError::Overflow(offset))
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| {
                ExecutionError::InvalidValue(
                    offset,
                    format!("invalid literal for int() with base 10: {}", value.repr()),
                )
            }),
        other => Err(ExecutionError::TypeMismatch(
            offset,
            format!("int() argument must be a string or a number, not '{}'", other.type_name()),
        )),
    }
}

fn to_float(value: &Value, offset: usize) -> Result<Value, ExecutionError> {
    match value.as_number() {
        Some(number) => Ok(Value::Float(number.as_float())),
        None => match value {
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| {
                    ExecutionError::InvalidValue(
                        offset,
                        format!("could not convert string to float: {}", value.repr()),
                    )
                }),
            other => Err(ExecutionError::TypeMismatch(
                offset,
                format!("float() argument must be a string or a number, not '{}'", other.type_name()),
            )),
        },
    }
}

fn unary(operator: UnaryOperator, value: Value, offset: usize) -> Result<Value, ExecutionError> {
    if operator == UnaryOperator::Not {
        return Ok(Value::Boolean(!value.is_truthy()));
    }

    let mismatch = |symbol: &str| {
        ExecutionError::TypeMismatch(
            offset,
            format!("bad operand type for unary {}: '{}'", symbol, value.type_name()),
        )
    };

    match (operator, value.as_number()) {
        (UnaryOperator::Negate, Some(Number::Integer(n))) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or(ExecutionError::Overflow(offset)),
        (UnaryOperator::Negate, Some(Number::Float(f))) => Ok(Value::Float(-f)),
        (UnaryOperator::Plus, Some(Number::Integer(n))) => Ok(Value::Integer(n)),
        (UnaryOperator::Plus, Some(Number::Float(f))) => Ok(Value::Float(f)),
        (UnaryOperator::Invert, Some(Number::Integer(n))) => Ok(Value::Integer(!n)),
        (UnaryOperator::Negate, _) => Err(mismatch("-")),
        (UnaryOperator::Plus, _) => Err(mismatch("+")),
        _ => Err(mismatch("~")),
    }
}

fn symbol(operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::Add => "+",
        BinaryOperator::Subtract => "-",
        BinaryOperator::Multiply => "*",
        BinaryOperator::Divide => "/",
        BinaryOperator::FloorDivide => "//",
        BinaryOperator::Modulo => "%",
        BinaryOperator::Power => "**",
        BinaryOperator::BitAnd => "&",
        BinaryOperator::BitOr => "|",
        BinaryOperator::BitXor => "^",
        BinaryOperator::ShiftLeft => "<<",
        BinaryOperator::ShiftRight => ">>",
    }
}

fn binary(
    operator: BinaryOperator,
    left: Value,
    right: Value,
    offset: usize,
) -> Result<Value, ExecutionError> {
    match (operator, &left, &right) {
        (BinaryOperator::Add, Value::String(a), Value::String(b)) => {
            return Ok(Value::String(format!("{}{}", a, b)))
        }
        (BinaryOperator::Add, Value::List(a), Value::List(b)) => {
            return Ok(Value::List([a.as_slice(), b.as_slice()].concat()))
        }
        (BinaryOperator::Add, Value::Tuple(a), Value::Tuple(b)) => {
            return Ok(Value::Tuple([a.as_slice(), b.as_slice()].concat()))
        }
        (BinaryOperator::Multiply, Value::String(text), Value::Integer(count))
        | (BinaryOperator::Multiply, Value::Integer(count), Value::String(text)) => {
            let count = usize::try_from(*count).unwrap_or(0);
            return Ok(Value::String(text.repeat(count)));
        }
        (BinaryOperator::Modulo, Value::String(_), _) => {
            return Err(ExecutionError::Unsupported(offset, "%-formatting of strings"))
        }
        _ => {}
    }

    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(ExecutionError::TypeMismatch(
            offset,
            format!(
                "unsupported operand type(s) for {}: '{}' and '{}'",
                symbol(operator),
                left.type_name(),
                right.type_name()
            ),
        ));
    };

    match (a, b) {
        (Number::Integer(a), Number::Integer(b)) => integer_arithmetic(operator, a, b, offset),
        _ => float_arithmetic(operator, a.as_float(), b.as_float(), offset),
    }
}

fn integer_arithmetic(
    operator: BinaryOperator,
    a: i64,
    b: i64,
    offset: usize,
) -> Result<Value, ExecutionError> {
    let overflow = ExecutionError::Overflow(offset);

    if b == 0
        && matches!(
            operator,
            BinaryOperator::Divide | BinaryOperator::FloorDivide | BinaryOperator::Modulo
        )
    {
        return Err(ExecutionError::DivisionByZero(offset));
    }

    let result = match operator {
        BinaryOperator::Add => a
            .checked_add(b)
            .ok_or(overflow)?,
        BinaryOperator::Subtract => a
            .checked_sub(b)
            .ok_or(overflow)?,
        BinaryOperator::Multiply => a
            .checked_mul(b)
            .ok_or(overflow)?,
        BinaryOperator::Divide => return Ok(Value::Float(a as f64 / b as f64)),
        BinaryOperator::FloorDivide => {
            let quotient = a
                .checked_div(b)
                .ok_or(overflow)?;
            // round toward negative infinity
            if a % b != 0 && (a < 0) != (b < 0) {
                quotient - 1
            } else {
                quotient
            }
        }
        BinaryOperator::Modulo => {
            let remainder = a
                .checked_rem(b)
                .ok_or(overflow)?;
            // result takes the sign of the divisor
            if remainder != 0 && (remainder < 0) != (b < 0) {
                remainder + b
            } else {
                remainder
            }
        }
        BinaryOperator::Power => {
            if b < 0 {
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            let exponent = u32::try_from(b).map_err(|_| ExecutionError::Overflow(offset))?;
            a.checked_pow(exponent)
                .ok_or(overflow)?
        }
        BinaryOperator::BitAnd => a & b,
        BinaryOperator::BitOr => a | b,
        BinaryOperator::BitXor => a ^ b,
        BinaryOperator::ShiftLeft | BinaryOperator::ShiftRight if b < 0 => {
            return Err(ExecutionError::InvalidValue(
                offset,
                "negative shift count".to_string(),
            ))
        }
        BinaryOperator::ShiftLeft => {
            if b >= 63 {
                return Err(overflow);
            }
            a.checked_mul(1i64 << b)
                .ok_or(overflow)?
        }
        BinaryOperator::ShiftRight => {
            if b >= 64 {
                if a < 0 {
                    -1
                } else {
                    0
                }
            } else {
                a >> b
            }
        }
    };

    Ok(Value::Integer(result))
}

fn float_arithmetic(
    operator: BinaryOperator,
    a: f64,
    b: f64,
    offset: usize,
) -> Result<Value, ExecutionError> {
    if b == 0.0
        && matches!(
            operator,
            BinaryOperator::Divide | BinaryOperator::FloorDivide | BinaryOperator::Modulo
        )
    {
        return Err(ExecutionError::DivisionByZero(offset));
    }

    let result = match operator {
        BinaryOperator::Add => a + b,
        BinaryOperator::Subtract => a - b,
        BinaryOperator::Multiply => a * b,
        BinaryOperator::Divide => a / b,
        BinaryOperator::FloorDivide => (a / b).floor(),
        BinaryOperator::Modulo => {
            let remainder = a % b;
            if remainder != 0.0 && (remainder < 0.0) != (b < 0.0) {
                remainder + b
            } else {
                remainder
            }
        }
        BinaryOperator::Power => a.powf(b),
        _ => {
            return Err(ExecutionError::TypeMismatch(
                offset,
                format!(
                    "unsupported operand type(s) for {}: 'float'",
                    symbol(operator)
                ),
            ))
        }
    };

    Ok(Value::Float(result))
}

fn compare(
    operator: ComparisonOperator,
    left: &Value,
    right: &Value,
    offset: usize,
) -> Result<bool, ExecutionError> {
    match operator {
        ComparisonOperator::Equal => return Ok(left.equals(right)),
        ComparisonOperator::NotEqual => return Ok(!left.equals(right)),
        ComparisonOperator::Is => return Ok(left == right),
        ComparisonOperator::IsNot => return Ok(left != right),
        ComparisonOperator::In | ComparisonOperator::NotIn => {
            let found = match (left, right) {
                (Value::String(needle), Value::String(haystack)) => haystack.contains(needle.as_str()),
                (_, Value::Tuple(items)) | (_, Value::List(items)) => items
                    .iter()
                    .any(|item| item.equals(left)),
                _ => {
                    return Err(ExecutionError::TypeMismatch(
                        offset,
                        format!("argument of type '{}' is not iterable", right.type_name()),
                    ))
                }
            };
            return Ok(found == (operator == ComparisonOperator::In));
        }
        _ => {}
    }

    let ordering = match (left.as_number(), right.as_number(), left, right) {
        (Some(Number::Integer(a)), Some(Number::Integer(b)), _, _) => Some(a.cmp(&b)),
        (Some(a), Some(b), _, _) => a
            .as_float()
            .partial_cmp(&b.as_float()),
        (_, _, Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            return Err(ExecutionError::TypeMismatch(
                offset,
                format!(
                    "comparison not supported between instances of '{}' and '{}'",
                    left.type_name(),
                    right.type_name()
                ),
            ))
        }
    };

    // NaN compares false to everything
    let Some(ordering) = ordering else {
        return Ok(false);
    };

    Ok(match operator {
        ComparisonOperator::Less => ordering == Ordering::Less,
        ComparisonOperator::LessEqual => ordering != Ordering::Greater,
        ComparisonOperator::Greater => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    })
}

fn subscript(container: &Value, index: &Value, offset: usize) -> Result<Value, ExecutionError> {
    let Some(Number::Integer(position)) = index.as_number() else {
        return Err(ExecutionError::TypeMismatch(
            offset,
            format!("indices must be integers, not {}", index.type_name()),
        ));
    };

    let resolve = |length: usize| -> Result<usize, ExecutionError> {
        let length = length as i64;
        let actual = if position < 0 {
            position + length
        } else {
            position
        };
        if actual < 0 || actual >= length {
            Err(ExecutionError::InvalidValue(
                offset,
                "index out of range".to_string(),
            ))
        } else {
            Ok(actual as usize)
        }
    };

    match container {
        Value::Tuple(items) | Value::List(items) => Ok(items[resolve(items.len())?].clone()),
        Value::String(text) => {
            let chars: Vec<char> = text
                .chars()
                .collect();
            let c = chars[resolve(chars.len())?];
            Ok(Value::String(c.to_string()))
        }
        other => Err(ExecutionError::TypeMismatch(
            offset,
            format!("'{}' object is not subscriptable", other.type_name()),
        )),
    }
}
