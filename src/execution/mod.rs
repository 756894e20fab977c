//! Dry runs: execute a parameterless function and collect what it prints.

use std::io::{BufRead, Write};
use tracing::{debug, info};

use crate::language::Function;

mod machine;
mod value;

pub use machine::Machine;
pub use value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    UndefinedName(usize, String),
    TypeMismatch(usize, String),
    InvalidValue(usize, String),
    DivisionByZero(usize),
    Overflow(usize),
    Unsupported(usize, &'static str),
    OutsideLoop(usize, &'static str),
    EndOfInput(usize),
    Evaluation(usize, String),
    Parameters(usize),
    Output(String),
}

impl ExecutionError {
    pub fn offset(&self) -> usize {
        match self {
            ExecutionError::UndefinedName(offset, _) => *offset,
            ExecutionError::TypeMismatch(offset, _) => *offset,
            ExecutionError::InvalidValue(offset, _) => *offset,
            ExecutionError::DivisionByZero(offset) => *offset,
            ExecutionError::Overflow(offset) => *offset,
            ExecutionError::Unsupported(offset, _) => *offset,
            ExecutionError::OutsideLoop(offset, _) => *offset,
            ExecutionError::EndOfInput(offset) => *offset,
            ExecutionError::Evaluation(offset, _) => *offset,
            ExecutionError::Parameters(offset) => *offset,
            ExecutionError::Output(_) => 0,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ExecutionError::UndefinedName(_, name) => format!("name '{}' is not defined", name),
            ExecutionError::TypeMismatch(_, details) => details.clone(),
            ExecutionError::InvalidValue(_, details) => details.clone(),
            ExecutionError::DivisionByZero(_) => "division by zero".to_string(),
            ExecutionError::Overflow(_) => {
                "integer result does not fit in 64 bits".to_string()
            }
            ExecutionError::Unsupported(_, what) => {
                format!("{} cannot be executed in a dry run", what)
            }
            ExecutionError::OutsideLoop(_, keyword) => format!("'{}' outside loop", keyword),
            ExecutionError::EndOfInput(_) => {
                "input() reached the end of the supplied input".to_string()
            }
            ExecutionError::Evaluation(_, details) => {
                format!("eval() could not parse its argument: {}", details)
            }
            ExecutionError::Parameters(_) => {
                "only functions without parameters can be dry run".to_string()
            }
            ExecutionError::Output(details) => format!("failed writing output: {}", details),
        }
    }

    /// The same error, reported at a different place in the source. Used
    /// when the failing code was not itself part of the source text.
    pub fn at(self, offset: usize) -> ExecutionError {
        match self {
            ExecutionError::UndefinedName(_, name) => ExecutionError::UndefinedName(offset, name),
            ExecutionError::TypeMismatch(_, details) => {
                ExecutionError::TypeMismatch(offset, details)
            }
            ExecutionError::InvalidValue(_, details) => {
                ExecutionError::InvalidValue(offset, details)
            }
            ExecutionError::DivisionByZero(_) => ExecutionError::DivisionByZero(offset),
            ExecutionError::Overflow(_) => ExecutionError::Overflow(offset),
            ExecutionError::Unsupported(_, what) => ExecutionError::Unsupported(offset, what),
            ExecutionError::OutsideLoop(_, keyword) => ExecutionError::OutsideLoop(offset, keyword),
            ExecutionError::EndOfInput(_) => ExecutionError::EndOfInput(offset),
            ExecutionError::Evaluation(_, details) => ExecutionError::Evaluation(offset, details),
            ExecutionError::Parameters(_) => ExecutionError::Parameters(offset),
            ExecutionError::Output(details) => ExecutionError::Output(details),
        }
    }
}

/// Execute the function, writing whatever it prints to `output`.
pub fn run(
    function: &Function<'_>,
    output: &mut dyn Write,
    input: &mut dyn BufRead,
) -> Result<(), ExecutionError> {
    info!("Dry run of {}", function.name.0);

    let mut machine = Machine::new(output, input);
    machine.call(function)
}

/// Execute the function and return its printed output split into lines.
/// A final line without a terminating newline is kept.
pub fn capture(
    function: &Function<'_>,
    input: &mut dyn BufRead,
) -> Result<Vec<String>, ExecutionError> {
    let mut buffer: Vec<u8> = Vec::new();
    run(function, &mut buffer, input)?;

    let lines: Vec<String> = String::from_utf8_lossy(&buffer)
        .lines()
        .map(str::to_string)
        .collect();

    debug!(
        "Captured {} line{} of output",
        lines.len(),
        if lines.len() == 1 { "" } else { "s" }
    );
    Ok(lines)
}
