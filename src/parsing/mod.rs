//! parser for the supported Python subset

use std::path::Path;
use tracing::debug;

use crate::language::{LoadingError, Module};

mod lexer;
pub mod parser;

pub use parser::{parse_expression, ParsingError};

/// Read a file and return an owned String. We pass that ownership back to the
/// main function so that the Module created by parse() below can have the
/// same lifetime.
pub fn load(filename: &Path) -> Result<String, LoadingError<'_>> {
    match std::fs::read_to_string(filename) {
        Ok(content) => Ok(content),
        Err(error) => {
            debug!(?error);
            match error.kind() {
                std::io::ErrorKind::NotFound => Err(LoadingError {
                    problem: "File not found".to_string(),
                    details: String::new(),
                    filename,
                }),
                _ => Err(LoadingError {
                    problem: "Failed reading".to_string(),
                    details: error
                        .kind()
                        .to_string(),
                    filename,
                }),
            }
        }
    }
}

/// Parse source text into a Module, or return the error encountered.
pub fn parse(content: &str) -> Result<Module<'_>, ParsingError> {
    match parser::parse_via_tokens(content) {
        Ok(module) => {
            let count = module
                .functions()
                .count();
            debug!(
                "Found {} function{}",
                count,
                if count == 1 { "" } else { "s" }
            );
            Ok(module)
        }
        Err(error) => {
            debug!(offset = error.offset(), "{}", error.message());
            Err(error)
        }
    }
}
