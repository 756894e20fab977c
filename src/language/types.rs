//! Types representing an Abstract Syntax Tree for the supported Python subset

/// Byte offsets into the original source. Every node carries one so that
/// the verbatim text of any fragment can be recovered later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    /// The source text covered by this span.
    pub fn text<'i>(&self, source: &'i str) -> &'i str {
        source
            .get(self.start..self.end)
            .unwrap_or("")
    }
}

#[derive(Debug, PartialEq)]
pub struct Module<'i> {
    pub body: Vec<Statement<'i>>,
    pub span: Span,
}

impl<'i> Module<'i> {
    pub fn functions(&self) -> impl Iterator<Item = &Function<'i>> {
        self.body
            .iter()
            .filter_map(|statement| match &statement.kind {
                StatementKind::Function(function) => Some(function),
                _ => None,
            })
    }

    pub fn function(&self, name: &str) -> Option<&Function<'i>> {
        self.functions()
            .find(|function| function.name.0 == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identifier<'i>(pub &'i str);

#[derive(Debug, PartialEq)]
pub struct Function<'i> {
    pub name: Identifier<'i>,
    pub parameters: Vec<Identifier<'i>>,
    pub body: Vec<Statement<'i>>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct Statement<'i> {
    pub kind: StatementKind<'i>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum StatementKind<'i> {
    Function(Function<'i>),
    Assignment {
        targets: Vec<Expression<'i>>,
        value: Expression<'i>,
    },
    Expression(Expression<'i>),
    Conditional {
        test: Expression<'i>,
        consequent: Vec<Statement<'i>>,
        alternative: Vec<Statement<'i>>,
    },
    // pretest `while` loop
    Loop {
        test: Expression<'i>,
        body: Vec<Statement<'i>>,
    },
    Match {
        subject: Expression<'i>,
        cases: Vec<Case<'i>>,
    },
    Pass,
    Break,
    Continue,
    Return(Option<Expression<'i>>),
    // recognized, but outside the supported subset
    Unsupported {
        keyword: &'static str,
    },
}

impl StatementKind<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            StatementKind::Function(_) => "function definition",
            StatementKind::Assignment { .. } => "assignment",
            StatementKind::Expression(_) => "expression statement",
            StatementKind::Conditional { .. } => "if statement",
            StatementKind::Loop { .. } => "while loop",
            StatementKind::Match { .. } => "match statement",
            StatementKind::Pass => "pass",
            StatementKind::Break => "break",
            StatementKind::Continue => "continue",
            StatementKind::Return(_) => "return",
            StatementKind::Unsupported { keyword } => keyword,
        }
    }
}

/// One branch of a match statement.
#[derive(Debug, PartialEq)]
pub struct Case<'i> {
    pub pattern: Pattern<'i>,
    pub position: usize,
    pub body: Vec<Statement<'i>>,
    pub span: Span,
}

impl Case<'_> {
    pub fn is_wildcard(&self) -> bool {
        matches!(self.pattern.kind, PatternKind::Wildcard)
    }

    /// Only a wildcard in the final position counts as the default branch.
    pub fn is_default(&self, count: usize) -> bool {
        self.is_wildcard() && self.position + 1 == count
    }
}

#[derive(Debug, PartialEq)]
pub struct Pattern<'i> {
    pub kind: PatternKind<'i>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum PatternKind<'i> {
    Literal(Constant),
    Wildcard,
    Capture(&'i str),
    Value(Vec<&'i str>),
    As(Box<Pattern<'i>>, &'i str),
    Or(Vec<Pattern<'i>>),
    Sequence(Vec<Pattern<'i>>),
    Mapping,
    Class(&'i str),
}

impl PatternKind<'_> {
    pub fn describe(&self) -> &'static str {
        match self {
            PatternKind::Literal(_) => "literal pattern",
            PatternKind::Wildcard => "wildcard pattern",
            PatternKind::Capture(_) => "capture pattern",
            PatternKind::Value(_) => "value pattern",
            PatternKind::As(_, _) => "as pattern",
            PatternKind::Or(_) => "or pattern",
            PatternKind::Sequence(_) => "sequence pattern",
            PatternKind::Mapping => "mapping pattern",
            PatternKind::Class(_) => "class pattern",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Expression<'i> {
    pub kind: ExpressionKind<'i>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum ExpressionKind<'i> {
    Name(&'i str),
    Constant(Constant),
    // body of an f-string, escapes already processed, braces intact
    Formatted(String),
    Unary(UnaryOperator, Box<Expression<'i>>),
    Binary(Box<Expression<'i>>, BinaryOperator, Box<Expression<'i>>),
    Logical(Box<Expression<'i>>, LogicalOperator, Box<Expression<'i>>),
    Compare(Box<Expression<'i>>, Vec<(ComparisonOperator, Expression<'i>)>),
    Call {
        function: Box<Expression<'i>>,
        arguments: Vec<Argument<'i>>,
    },
    Attribute(Box<Expression<'i>>, &'i str),
    Subscript(Box<Expression<'i>>, Box<Expression<'i>>),
    Tuple(Vec<Expression<'i>>),
    List(Vec<Expression<'i>>),
}

impl<'i> ExpressionKind<'i> {
    pub fn describe(&self) -> &'static str {
        match self {
            ExpressionKind::Name(_) => "name",
            ExpressionKind::Constant(_) => "constant",
            ExpressionKind::Formatted(_) => "formatted string",
            ExpressionKind::Unary(_, _) => "unary operation",
            ExpressionKind::Binary(_, _, _) => "binary operation",
            ExpressionKind::Logical(_, _, _) => "boolean operation",
            ExpressionKind::Compare(_, _) => "comparison",
            ExpressionKind::Call { .. } => "call",
            ExpressionKind::Attribute(_, _) => "attribute",
            ExpressionKind::Subscript(_, _) => "subscript",
            ExpressionKind::Tuple(_) => "tuple",
            ExpressionKind::List(_) => "list",
        }
    }
}

impl<'i> Expression<'i> {
    /// The name being called, if this is a call of a plain name like
    /// `print(...)`.
    pub fn callee(&self) -> Option<&'i str> {
        match &self.kind {
            ExpressionKind::Call { function, .. } => match function.kind {
                ExpressionKind::Name(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn arguments(&self) -> Option<&[Argument<'i>]> {
        match &self.kind {
            ExpressionKind::Call { arguments, .. } => Some(arguments),
            _ => None,
        }
    }

    pub fn is_literal_true(&self) -> bool {
        matches!(self.kind, ExpressionKind::Constant(Constant::Boolean(true)))
    }
}

#[derive(Debug, PartialEq)]
pub enum Argument<'i> {
    Positional(Expression<'i>),
    Keyword(&'i str, Expression<'i>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Negate,
    Plus,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    In,
    NotIn,
    Is,
    IsNot,
}

/// Anything that can be handed to the structogram renderer.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a, 'i> {
    Module(&'a Module<'i>),
    Function(&'a Function<'i>),
    Statement(&'a Statement<'i>),
    Sequence(&'a [Statement<'i>]),
    Case(&'a Case<'i>),
    Expression(&'a Expression<'i>),
}
