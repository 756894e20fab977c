// Types representing the supported subset of Python

mod error;
mod types;

// Re-export all public symbols
pub use error::*;
pub use types::*;
