//! Presenting problems to the user against the source they came from.

use std::path::Path;

use crate::execution::ExecutionError;
use crate::parsing::ParsingError;
use crate::rendering::Problem;

mod display;

pub use display::SourceError;

impl<'i> SourceError<'i> {
    pub fn from_parsing(error: &ParsingError, filename: &'i Path, source: &'i str) -> Self {
        SourceError {
            problem: error.message(),
            details: "The file could not be read as the supported Python subset.".to_string(),
            filename,
            source,
            offset: error.offset(),
        }
    }

    pub fn from_problem(problem: &Problem, filename: &'i Path, source: &'i str) -> Self {
        SourceError {
            problem: problem.message(),
            details: "Nothing was drawn for this statement; the rest of the structogram was still produced.".to_string(),
            filename,
            source,
            offset: problem.offset(),
        }
    }

    pub fn from_execution(error: &ExecutionError, filename: &'i Path, source: &'i str) -> Self {
        SourceError {
            problem: error.message(),
            details: "The dry run stopped here. Use --no-dry-run to skip it.".to_string(),
            filename,
            source,
            offset: error.offset(),
        }
    }
}
