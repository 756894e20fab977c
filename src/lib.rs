//! Draw struktex structograms from the body of a Python function.

pub mod error;
pub mod execution;
pub mod language;
pub mod output;
pub mod parsing;
pub mod regex;
pub mod rendering;
