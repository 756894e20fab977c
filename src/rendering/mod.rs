//! Renderers turning a parsed function into struktex structogram markup

mod escape;
mod fragment;
mod idioms;
mod structogram;

pub use escape::escape;
pub use fragment::{Fragment, Problem};
pub use idioms::{do_while_shape, input_shape};
pub use structogram::{render, structogram, RenderError};
