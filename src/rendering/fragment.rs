//! Markup produced by the renderer, together with anything worth reporting
//! that was encountered while producing it.

use std::fmt;

/// Something in the input that rendered to nothing. Not fatal; the rest of
/// the structogram is still produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    InvalidPattern(usize, &'static str),
    UnsupportedStatement(usize, &'static str),
}

impl Problem {
    pub fn offset(&self) -> usize {
        match self {
            Problem::InvalidPattern(offset, _) => *offset,
            Problem::UnsupportedStatement(offset, _) => *offset,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Problem::InvalidPattern(_, kind) => format!(
                "match pattern is too complex ({}), use a literal or '_' as the last case",
                kind
            ),
            Problem::UnsupportedStatement(_, keyword) => {
                format!("{} statements are not drawn in structograms", keyword)
            }
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub markup: String,
    pub problems: Vec<Problem>,
}

impl Fragment {
    pub fn new() -> Fragment {
        Fragment::default()
    }

    pub fn reporting(problem: Problem) -> Fragment {
        Fragment {
            markup: String::new(),
            problems: vec![problem],
        }
    }

    /// Append one line of markup at the given indentation.
    pub fn line(&mut self, indent: &str, text: &str) {
        self.markup
            .push_str(indent);
        self.markup
            .push_str(text);
        self.markup
            .push('\n');
    }

    pub fn append(&mut self, other: Fragment) {
        self.markup
            .push_str(&other.markup);
        self.problems
            .extend(other.problems);
    }

    pub fn is_empty(&self) -> bool {
        self.markup
            .is_empty()
    }
}

impl FromIterator<Fragment> for Fragment {
    fn from_iter<T: IntoIterator<Item = Fragment>>(iter: T) -> Self {
        let mut result = Fragment::new();
        for fragment in iter {
            result.append(fragment);
        }
        result
    }
}
