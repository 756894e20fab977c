use crate::language::*;
use crate::parsing::lexer::{tokenize, Lexeme, Token};

pub fn parse_via_tokens(content: &str) -> Result<Module<'_>, ParsingError> {
    let mut input = Parser::new();
    input.initialize(content)?;
    input.read_module()
}

/// Parse a single expression, as needed by `eval()` during a dry run.
pub fn parse_expression(content: &str) -> Result<Expression<'_>, ParsingError> {
    let mut input = Parser::new();
    input.initialize(content)?;

    let expression = input.read_expression()?;
    match input.peek() {
        Token::Newline | Token::End => Ok(expression),
        _ => Err(ParsingError::Expected(input.offset(), "the end of the expression")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    IllegalParserState(usize),
    Unrecognized(usize),
    Expected(usize, &'static str),
    InvalidCharacter(usize, char),
    UnexpectedEndOfInput(usize),
    UnexpectedIndent(usize),
    InconsistentIndentation(usize),
    UnclosedString(usize),
    UnbalancedBracket(usize, char),
    InvalidNumber(usize),
    InvalidIdentifier(usize),
    NestedFunction(usize),
    Unsupported(usize, &'static str),
}

impl ParsingError {
    pub fn offset(&self) -> usize {
        match self {
            ParsingError::IllegalParserState(offset) => *offset,
            ParsingError::Unrecognized(offset) => *offset,
            ParsingError::Expected(offset, _) => *offset,
            ParsingError::InvalidCharacter(offset, _) => *offset,
            ParsingError::UnexpectedEndOfInput(offset) => *offset,
            ParsingError::UnexpectedIndent(offset) => *offset,
            ParsingError::InconsistentIndentation(offset) => *offset,
            ParsingError::UnclosedString(offset) => *offset,
            ParsingError::UnbalancedBracket(offset, _) => *offset,
            ParsingError::InvalidNumber(offset) => *offset,
            ParsingError::InvalidIdentifier(offset) => *offset,
            ParsingError::NestedFunction(offset) => *offset,
            ParsingError::Unsupported(offset, _) => *offset,
        }
    }

    pub fn message(&self) -> String {
        match self {
            ParsingError::IllegalParserState(_) => "illegal parser state".to_string(),
            ParsingError::Unrecognized(_) => "unrecognized".to_string(),
            ParsingError::Expected(_, value) => format!("expected {}", value),
            ParsingError::InvalidCharacter(_, c) => format!("invalid character '{}'", c),
            ParsingError::UnexpectedEndOfInput(_) => "unexpected end of input".to_string(),
            ParsingError::UnexpectedIndent(_) => "unexpected indent".to_string(),
            ParsingError::InconsistentIndentation(_) => {
                "unindent does not match any outer indentation level".to_string()
            }
            ParsingError::UnclosedString(_) => "unterminated string literal".to_string(),
            ParsingError::UnbalancedBracket(_, c) => format!("unbalanced bracket '{}'", c),
            ParsingError::InvalidNumber(_) => "invalid number".to_string(),
            ParsingError::InvalidIdentifier(_) => "keyword used as identifier".to_string(),
            ParsingError::NestedFunction(_) => {
                "nested function definitions are not supported".to_string()
            }
            ParsingError::Unsupported(_, what) => format!("{} is not supported", what),
        }
    }
}

static RESERVED: [&str; 32] = [
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Compound statements we recognize only so that they can be skipped and
/// reported.
fn compound_keyword(name: &str) -> Option<&'static str> {
    match name {
        "for" => Some("for"),
        "class" => Some("class"),
        "try" => Some("try"),
        "except" => Some("except"),
        "finally" => Some("finally"),
        "with" => Some("with"),
        "async" => Some("async"),
        _ => None,
    }
}

fn simple_keyword(name: &str) -> Option<&'static str> {
    match name {
        "import" => Some("import"),
        "from" => Some("from"),
        "global" => Some("global"),
        "nonlocal" => Some("nonlocal"),
        "del" => Some("del"),
        "assert" => Some("assert"),
        "raise" => Some("raise"),
        "yield" => Some("yield"),
        _ => None,
    }
}

static COMPARISONS: [(&str, ComparisonOperator); 6] = [
    ("<", ComparisonOperator::Less),
    ("<=", ComparisonOperator::LessEqual),
    (">", ComparisonOperator::Greater),
    (">=", ComparisonOperator::GreaterEqual),
    ("==", ComparisonOperator::Equal),
    ("!=", ComparisonOperator::NotEqual),
];

static AUGMENTED: [&str; 12] = [
    "+=", "-=", "*=", "/=", "//=", "%=", "**=", "&=", "|=", "^=", "<<=", ">>=",
];

#[derive(Debug)]
pub struct Parser<'i> {
    original: &'i str,
    tokens: Vec<Lexeme<'i>>,
    position: usize,
    nesting: usize,
}

impl<'i> Parser<'i> {
    pub fn new() -> Parser<'i> {
        Parser {
            original: "",
            tokens: Vec::new(),
            position: 0,
            nesting: 0,
        }
    }

    pub fn initialize(&mut self, content: &'i str) -> Result<(), ParsingError> {
        self.original = content;
        self.tokens = tokenize(content)?;
        self.position = 0;
        self.nesting = 0;
        Ok(())
    }

    fn peek(&self) -> Token<'i> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Token<'i> {
        self.tokens
            .get(self.position + ahead)
            .map_or(Token::End, |lexeme| lexeme.token)
    }

    /// Offset of the current token.
    fn offset(&self) -> usize {
        self.tokens
            .get(self.position)
            .map_or(
                self.original
                    .len(),
                |lexeme| {
                    lexeme
                        .span
                        .start
                },
            )
    }

    /// End of the last consumed token that carries text; layout tokens
    /// don't extend a node's span.
    fn previous_end(&self) -> usize {
        self.tokens[..self.position]
            .iter()
            .rev()
            .find(|lexeme| {
                !matches!(
                    lexeme.token,
                    Token::Newline | Token::Indent | Token::Dedent | Token::End
                )
            })
            .map_or(0, |lexeme| {
                lexeme
                    .span
                    .end
            })
    }

    fn advance(&mut self) -> Token<'i> {
        let token = self.peek();
        if self.position
            < self
                .tokens
                .len()
        {
            self.position += 1;
        }
        token
    }

    fn is_operator(&self, operator: &str) -> bool {
        self.peek() == Token::Operator(operator)
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        self.peek() == Token::Name(keyword)
    }

    fn consume_operator(&mut self, operator: &str) -> bool {
        if self.is_operator(operator) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn require_operator(
        &mut self,
        operator: &str,
        expected: &'static str,
    ) -> Result<(), ParsingError> {
        if self.consume_operator(operator) {
            Ok(())
        } else {
            Err(self.expected(expected))
        }
    }

    fn require_newline(&mut self) -> Result<(), ParsingError> {
        match self.peek() {
            Token::Newline => {
                self.advance();
                Ok(())
            }
            Token::End => Ok(()),
            _ => Err(self.expected("the end of the line")),
        }
    }

    fn expected(&self, what: &'static str) -> ParsingError {
        match self.peek() {
            Token::End => ParsingError::UnexpectedEndOfInput(self.offset()),
            _ => ParsingError::Expected(self.offset(), what),
        }
    }

    fn line_ended(&self) -> bool {
        self.position == 0
            || matches!(
                self.tokens[self.position - 1].token,
                Token::Newline | Token::End
            )
    }

    fn read_identifier(&mut self) -> Result<Identifier<'i>, ParsingError> {
        match self.peek() {
            Token::Name(name) if RESERVED.contains(&name) => {
                Err(ParsingError::InvalidIdentifier(self.offset()))
            }
            Token::Name(name) => {
                self.advance();
                Ok(Identifier(name))
            }
            _ => Err(self.expected("an identifier")),
        }
    }

    pub fn read_module(&mut self) -> Result<Module<'i>, ParsingError> {
        let mut body = Vec::new();

        loop {
            match self.peek() {
                Token::End => break,
                Token::Newline => {
                    self.advance();
                }
                Token::Indent => return Err(ParsingError::UnexpectedIndent(self.offset())),
                _ => body.push(self.read_statement()?),
            }
        }

        Ok(Module {
            body,
            span: Span::new(
                0,
                self.original
                    .len(),
            ),
        })
    }

    pub fn read_statement(&mut self) -> Result<Statement<'i>, ParsingError> {
        match self.peek() {
            Token::Name("def") => self.read_function(),
            Token::Name("if") => self.read_conditional(),
            Token::Name("while") => self.read_loop(),
            Token::Name("match") if self.is_match_statement() => self.read_match(),
            Token::Name(name) if compound_keyword(name).is_some() => self.read_unsupported_compound(),
            Token::Name("elif") | Token::Name("else") => {
                Err(ParsingError::Expected(self.offset(), "a statement"))
            }
            Token::Indent => Err(ParsingError::UnexpectedIndent(self.offset())),
            Token::End => Err(ParsingError::UnexpectedEndOfInput(self.offset())),
            _ => self.read_simple_statement(),
        }
    }

    /// `match` is only a keyword when it opens a block.
    fn is_match_statement(&self) -> bool {
        let mut ahead = 1;
        let mut last = Token::Name("match");
        loop {
            match self.peek_at(ahead) {
                Token::Newline | Token::End => break,
                token => last = token,
            }
            ahead += 1;
        }
        ahead > 2 && last == Token::Operator(":")
    }

    fn read_block(&mut self) -> Result<Vec<Statement<'i>>, ParsingError> {
        let mut statements = Vec::new();

        if self.peek() == Token::Newline {
            self.advance();
            if self.peek() != Token::Indent {
                return Err(self.expected("an indented block"));
            }
            self.advance();

            while !matches!(self.peek(), Token::Dedent | Token::End) {
                statements.push(self.read_statement()?);
            }
            if self.peek() == Token::Dedent {
                self.advance();
            }
        } else {
            // simple statements on the same line as the header
            loop {
                statements.push(self.read_simple_statement()?);
                if self.line_ended() {
                    break;
                }
            }
        }

        Ok(statements)
    }

    pub fn read_function(&mut self) -> Result<Statement<'i>, ParsingError> {
        let start = self.offset();
        self.advance();

        if self.nesting > 0 {
            return Err(ParsingError::NestedFunction(start));
        }

        let name = self.read_identifier()?;

        self.require_operator("(", "'(' after the function name")?;
        let mut parameters = Vec::new();
        while !self.is_operator(")") {
            parameters.push(self.read_identifier()?);
            if self.consume_operator(":") {
                self.read_test()?;
            }
            if self.consume_operator("=") {
                self.read_test()?;
            }
            if !self.consume_operator(",") {
                break;
            }
        }
        self.require_operator(")", "')' to close the parameter list")?;

        if self.consume_operator("->") {
            self.read_test()?;
        }
        self.require_operator(":", "':' after the function signature")?;

        self.nesting += 1;
        let body = self.read_block();
        self.nesting -= 1;
        let body = body?;

        let span = Span::new(start, self.previous_end());

        Ok(Statement {
            kind: StatementKind::Function(Function {
                name,
                parameters,
                body,
                span,
            }),
            span,
        })
    }

    /// Reads `if` and, recursively, `elif`; an `elif` becomes a conditional
    /// nested as the sole statement of the alternative.
    fn read_conditional(&mut self) -> Result<Statement<'i>, ParsingError> {
        let start = self.offset();
        self.advance();

        let test = self.read_test()?;
        self.require_operator(":", "':' after the condition")?;
        let consequent = self.read_block()?;

        let alternative = match self.peek() {
            Token::Name("elif") => vec![self.read_conditional()?],
            Token::Name("else") => {
                self.advance();
                self.require_operator(":", "':' after else")?;
                self.read_block()?
            }
            _ => Vec::new(),
        };

        Ok(Statement {
            kind: StatementKind::Conditional {
                test,
                consequent,
                alternative,
            },
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_loop(&mut self) -> Result<Statement<'i>, ParsingError> {
        let start = self.offset();
        self.advance();

        let test = self.read_test()?;
        self.require_operator(":", "':' after the loop condition")?;
        let body = self.read_block()?;

        if self.is_keyword("else") {
            return Err(ParsingError::Unsupported(self.offset(), "while-else"));
        }

        Ok(Statement {
            kind: StatementKind::Loop { test, body },
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_match(&mut self) -> Result<Statement<'i>, ParsingError> {
        let start = self.offset();
        self.advance();

        let subject = self.read_expression()?;
        self.require_operator(":", "':' after the match subject")?;
        if self.peek() != Token::Newline {
            return Err(self.expected("a block of cases"));
        }
        self.advance();
        if self.peek() != Token::Indent {
            return Err(self.expected("an indented block of cases"));
        }
        self.advance();

        let mut cases = Vec::new();
        while self.is_keyword("case") {
            let case = self.read_case(cases.len())?;
            cases.push(case);
        }

        if cases.is_empty() {
            return Err(self.expected("a case"));
        }
        match self.peek() {
            Token::Dedent => {
                self.advance();
            }
            Token::End => {}
            _ => return Err(self.expected("a case")),
        }

        Ok(Statement {
            kind: StatementKind::Match { subject, cases },
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_case(&mut self, position: usize) -> Result<Case<'i>, ParsingError> {
        let start = self.offset();
        self.advance();

        let pattern = self.read_pattern()?;
        if self.is_keyword("if") {
            return Err(ParsingError::Unsupported(self.offset(), "a case guard"));
        }
        self.require_operator(":", "':' after the case pattern")?;
        let body = self.read_block()?;

        Ok(Case {
            pattern,
            position,
            body,
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_pattern(&mut self) -> Result<Pattern<'i>, ParsingError> {
        let start = self.offset();
        let first = self.read_pattern_as()?;

        if !self.is_operator(",") {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.consume_operator(",") {
            if self.is_operator(":") {
                break;
            }
            items.push(self.read_pattern_as()?);
        }

        Ok(Pattern {
            kind: PatternKind::Sequence(items),
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_pattern_as(&mut self) -> Result<Pattern<'i>, ParsingError> {
        let start = self.offset();
        let pattern = self.read_pattern_or()?;

        if !self.is_keyword("as") {
            return Ok(pattern);
        }
        self.advance();
        let name = self.read_identifier()?;

        Ok(Pattern {
            kind: PatternKind::As(Box::new(pattern), name.0),
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_pattern_or(&mut self) -> Result<Pattern<'i>, ParsingError> {
        let start = self.offset();
        let first = self.read_pattern_closed()?;

        if !self.is_operator("|") {
            return Ok(first);
        }

        let mut alternatives = vec![first];
        while self.consume_operator("|") {
            alternatives.push(self.read_pattern_closed()?);
        }

        Ok(Pattern {
            kind: PatternKind::Or(alternatives),
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_pattern_closed(&mut self) -> Result<Pattern<'i>, ParsingError> {
        let start = self.offset();

        let kind = match self.peek() {
            Token::Number(_) | Token::String(_) => PatternKind::Literal(self.read_constant()?),
            Token::Operator("-") => {
                self.advance();
                match self.read_constant()? {
                    Constant::Integer(value) => PatternKind::Literal(Constant::Integer(-value)),
                    Constant::Float(value) => PatternKind::Literal(Constant::Float(-value)),
                    _ => return Err(ParsingError::Expected(start, "a number after '-'")),
                }
            }
            Token::Name("True") | Token::Name("False") | Token::Name("None") => {
                PatternKind::Literal(self.read_constant()?)
            }
            Token::Name("_") => {
                self.advance();
                PatternKind::Wildcard
            }
            Token::Name(_) => {
                let name = self.read_identifier()?;
                if self.is_operator(".") {
                    let mut path = vec![name.0];
                    while self.consume_operator(".") {
                        path.push(
                            self.read_identifier()?
                                .0,
                        );
                    }
                    PatternKind::Value(path)
                } else if self.is_operator("(") {
                    self.skip_brackets()?;
                    PatternKind::Class(name.0)
                } else {
                    PatternKind::Capture(name.0)
                }
            }
            Token::Operator("{") => {
                self.skip_brackets()?;
                PatternKind::Mapping
            }
            Token::Operator(open @ ("(" | "[")) => {
                self.advance();
                let close = if open == "(" { ")" } else { "]" };

                let mut items = Vec::new();
                let mut separated = false;
                while !self.is_operator(close) {
                    items.push(self.read_pattern_as()?);
                    if !self.consume_operator(",") {
                        break;
                    }
                    separated = true;
                }
                self.require_operator(close, "a closing bracket")?;

                if open == "(" && items.len() == 1 && !separated {
                    // parenthesized group, not a sequence
                    return Ok(items.remove(0));
                }
                PatternKind::Sequence(items)
            }
            _ => return Err(self.expected("a pattern")),
        };

        Ok(Pattern {
            kind,
            span: Span::new(start, self.previous_end()),
        })
    }

    /// Step over a bracketed group whose content we don't model.
    fn skip_brackets(&mut self) -> Result<(), ParsingError> {
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Token::Operator("(" | "[" | "{") => depth += 1,
                Token::Operator(")" | "]" | "}") => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::End => return Err(ParsingError::UnexpectedEndOfInput(self.offset())),
                _ => {}
            }
        }
    }

    fn read_unsupported_compound(&mut self) -> Result<Statement<'i>, ParsingError> {
        let start = self.offset();
        let keyword = match self.peek() {
            Token::Name(name) => compound_keyword(name),
            _ => None,
        }
        .ok_or(ParsingError::IllegalParserState(start))?;

        loop {
            self.skip_compound_clause()?;
            match self.peek() {
                Token::Name("else" | "elif" | "except" | "finally") => continue,
                _ => break,
            }
        }

        Ok(Statement {
            kind: StatementKind::Unsupported { keyword },
            span: Span::new(start, self.previous_end()),
        })
    }

    fn skip_compound_clause(&mut self) -> Result<(), ParsingError> {
        // header, up to the ':' outside any brackets
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Token::Operator("(" | "[" | "{") => depth += 1,
                Token::Operator(")" | "]" | "}") => depth = depth.saturating_sub(1),
                Token::Operator(":") if depth == 0 => break,
                Token::Newline | Token::End => {
                    return Err(ParsingError::Expected(self.offset(), "':' to open a block"))
                }
                _ => {}
            }
        }

        // body, either on the same line or as an indented block
        if self.peek() != Token::Newline {
            while !matches!(self.peek(), Token::Newline | Token::End) {
                self.advance();
            }
            self.require_newline()?;
            return Ok(());
        }

        self.advance();
        if self.peek() != Token::Indent {
            return Err(self.expected("an indented block"));
        }
        self.advance();

        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Token::Indent => depth += 1,
                Token::Dedent => depth -= 1,
                Token::End => break,
                _ => {}
            }
        }

        Ok(())
    }

    fn read_simple_statement(&mut self) -> Result<Statement<'i>, ParsingError> {
        let start = self.offset();

        let kind = match self.peek() {
            Token::Name("pass") => {
                self.advance();
                StatementKind::Pass
            }
            Token::Name("break") => {
                self.advance();
                StatementKind::Break
            }
            Token::Name("continue") => {
                self.advance();
                StatementKind::Continue
            }
            Token::Name("return") => {
                self.advance();
                if self.at_statement_end() {
                    StatementKind::Return(None)
                } else {
                    StatementKind::Return(Some(self.read_expression()?))
                }
            }
            Token::Name(name) if simple_keyword(name).is_some() => {
                let keyword = simple_keyword(name).ok_or(ParsingError::IllegalParserState(start))?;
                self.skip_statement();
                StatementKind::Unsupported { keyword }
            }
            _ => self.read_expression_statement()?,
        };

        let span = Span::new(start, self.previous_end());

        if !self.consume_operator(";") {
            self.require_newline()?;
        } else if self.peek() == Token::Newline {
            self.advance();
        }

        Ok(Statement { kind, span })
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek(),
            Token::Newline | Token::End | Token::Operator(";")
        )
    }

    fn skip_statement(&mut self) {
        while !self.at_statement_end() {
            self.advance();
        }
    }

    fn read_expression_statement(&mut self) -> Result<StatementKind<'i>, ParsingError> {
        let first = self.read_expression()?;

        match self.peek() {
            Token::Operator("=") => {
                let mut targets = vec![first];
                loop {
                    self.advance();
                    let next = self.read_expression()?;
                    if self.is_operator("=") {
                        targets.push(next);
                    } else {
                        return Ok(StatementKind::Assignment {
                            targets,
                            value: next,
                        });
                    }
                }
            }
            Token::Operator(operator) if AUGMENTED.contains(&operator) => {
                self.skip_statement();
                Ok(StatementKind::Unsupported {
                    keyword: "augmented assignment",
                })
            }
            Token::Operator(":") => {
                self.skip_statement();
                Ok(StatementKind::Unsupported {
                    keyword: "annotated assignment",
                })
            }
            _ => Ok(StatementKind::Expression(first)),
        }
    }

    /// An expression list; more than one element makes a tuple.
    pub fn read_expression(&mut self) -> Result<Expression<'i>, ParsingError> {
        let start = self.offset();
        let first = self.read_test()?;

        if !self.is_operator(",") {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.consume_operator(",") {
            if !self.starts_expression() {
                break;
            }
            items.push(self.read_test()?);
        }

        Ok(Expression {
            kind: ExpressionKind::Tuple(items),
            span: Span::new(start, self.previous_end()),
        })
    }

    fn starts_expression(&self) -> bool {
        match self.peek() {
            Token::Name(name) => {
                !RESERVED.contains(&name) || name == "not" || name == "lambda"
            }
            Token::Number(_) | Token::String(_) => true,
            Token::Operator(operator) => {
                matches!(operator, "(" | "[" | "{" | "-" | "+" | "~")
            }
            _ => false,
        }
    }

    fn read_test(&mut self) -> Result<Expression<'i>, ParsingError> {
        if self.is_keyword("lambda") {
            return Err(ParsingError::Unsupported(self.offset(), "lambda"));
        }

        let expression = self.read_or()?;

        if self.is_keyword("if") {
            return Err(ParsingError::Unsupported(
                self.offset(),
                "a conditional expression",
            ));
        }

        Ok(expression)
    }

    fn read_logical(
        &mut self,
        keyword: &str,
        operator: LogicalOperator,
        next: fn(&mut Self) -> Result<Expression<'i>, ParsingError>,
    ) -> Result<Expression<'i>, ParsingError> {
        let start = self.offset();
        let mut left = next(self)?;

        while self.is_keyword(keyword) {
            self.advance();
            let right = next(self)?;
            left = Expression {
                kind: ExpressionKind::Logical(Box::new(left), operator, Box::new(right)),
                span: Span::new(start, self.previous_end()),
            };
        }

        Ok(left)
    }

    fn read_or(&mut self) -> Result<Expression<'i>, ParsingError> {
        self.read_logical("or", LogicalOperator::Or, Self::read_and)
    }

    fn read_and(&mut self) -> Result<Expression<'i>, ParsingError> {
        self.read_logical("and", LogicalOperator::And, Self::read_not)
    }

    fn read_not(&mut self) -> Result<Expression<'i>, ParsingError> {
        if !self.is_keyword("not") {
            return self.read_comparison();
        }

        let start = self.offset();
        self.advance();
        let operand = self.read_not()?;

        Ok(Expression {
            kind: ExpressionKind::Unary(UnaryOperator::Not, Box::new(operand)),
            span: Span::new(start, self.previous_end()),
        })
    }

    fn comparison_operator(&self) -> Option<(ComparisonOperator, usize)> {
        match (self.peek(), self.peek_at(1)) {
            (Token::Operator(operator), _) => COMPARISONS
                .iter()
                .find(|(symbol, _)| *symbol == operator)
                .map(|(_, comparison)| (*comparison, 1)),
            (Token::Name("in"), _) => Some((ComparisonOperator::In, 1)),
            (Token::Name("not"), Token::Name("in")) => Some((ComparisonOperator::NotIn, 2)),
            (Token::Name("is"), Token::Name("not")) => Some((ComparisonOperator::IsNot, 2)),
            (Token::Name("is"), _) => Some((ComparisonOperator::Is, 1)),
            _ => None,
        }
    }

    fn read_comparison(&mut self) -> Result<Expression<'i>, ParsingError> {
        let start = self.offset();
        let left = self.read_bit_or()?;

        let mut comparisons = Vec::new();
        while let Some((operator, width)) = self.comparison_operator() {
            for _ in 0..width {
                self.advance();
            }
            comparisons.push((operator, self.read_bit_or()?));
        }

        if comparisons.is_empty() {
            return Ok(left);
        }

        Ok(Expression {
            kind: ExpressionKind::Compare(Box::new(left), comparisons),
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_binary(
        &mut self,
        operators: &[(&str, BinaryOperator)],
        next: fn(&mut Self) -> Result<Expression<'i>, ParsingError>,
    ) -> Result<Expression<'i>, ParsingError> {
        let start = self.offset();
        let mut left = next(self)?;

        loop {
            let operator = match self.peek() {
                Token::Operator(symbol) => operators
                    .iter()
                    .find(|(candidate, _)| *candidate == symbol)
                    .map(|(_, operator)| *operator),
                _ => None,
            };
            let Some(operator) = operator else {
                break;
            };

            self.advance();
            let right = next(self)?;
            left = Expression {
                kind: ExpressionKind::Binary(Box::new(left), operator, Box::new(right)),
                span: Span::new(start, self.previous_end()),
            };
        }

        Ok(left)
    }

    fn read_bit_or(&mut self) -> Result<Expression<'i>, ParsingError> {
        self.read_binary(&[("|", BinaryOperator::BitOr)], Self::read_bit_xor)
    }

    fn read_bit_xor(&mut self) -> Result<Expression<'i>, ParsingError> {
        self.read_binary(&[("^", BinaryOperator::BitXor)], Self::read_bit_and)
    }

    fn read_bit_and(&mut self) -> Result<Expression<'i>, ParsingError> {
        self.read_binary(&[("&", BinaryOperator::BitAnd)], Self::read_shift)
    }

    fn read_shift(&mut self) -> Result<Expression<'i>, ParsingError> {
        self.read_binary(
            &[
                ("<<", BinaryOperator::ShiftLeft),
                (">>", BinaryOperator::ShiftRight),
            ],
            Self::read_arithmetic,
        )
    }

    fn read_arithmetic(&mut self) -> Result<Expression<'i>, ParsingError> {
        self.read_binary(
            &[("+", BinaryOperator::Add), ("-", BinaryOperator::Subtract)],
            Self::read_term,
        )
    }

    fn read_term(&mut self) -> Result<Expression<'i>, ParsingError> {
        self.read_binary(
            &[
                ("*", BinaryOperator::Multiply),
                ("/", BinaryOperator::Divide),
                ("//", BinaryOperator::FloorDivide),
                ("%", BinaryOperator::Modulo),
            ],
            Self::read_factor,
        )
    }

    fn read_factor(&mut self) -> Result<Expression<'i>, ParsingError> {
        let operator = match self.peek() {
            Token::Operator("-") => UnaryOperator::Negate,
            Token::Operator("+") => UnaryOperator::Plus,
            Token::Operator("~") => UnaryOperator::Invert,
            _ => return self.read_power(),
        };

        let start = self.offset();
        self.advance();
        let operand = self.read_factor()?;

        Ok(Expression {
            kind: ExpressionKind::Unary(operator, Box::new(operand)),
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_power(&mut self) -> Result<Expression<'i>, ParsingError> {
        let start = self.offset();
        let base = self.read_primary()?;

        if !self.consume_operator("**") {
            return Ok(base);
        }
        // right associative, and binds tighter than a unary minus on its left
        let exponent = self.read_factor()?;

        Ok(Expression {
            kind: ExpressionKind::Binary(Box::new(base), BinaryOperator::Power, Box::new(exponent)),
            span: Span::new(start, self.previous_end()),
        })
    }

    fn read_primary(&mut self) -> Result<Expression<'i>, ParsingError> {
        let start = self.offset();
        let mut expression = self.read_atom()?;

        loop {
            if self.consume_operator("(") {
                let arguments = self.read_arguments()?;
                expression = Expression {
                    kind: ExpressionKind::Call {
                        function: Box::new(expression),
                        arguments,
                    },
                    span: Span::new(start, self.previous_end()),
                };
            } else if self.consume_operator("[") {
                let index = self.read_expression()?;
                if self.is_operator(":") {
                    return Err(ParsingError::Unsupported(self.offset(), "slicing"));
                }
                self.require_operator("]", "']' to close the subscript")?;
                expression = Expression {
                    kind: ExpressionKind::Subscript(Box::new(expression), Box::new(index)),
                    span: Span::new(start, self.previous_end()),
                };
            } else if self.consume_operator(".") {
                let name = self.read_identifier()?;
                expression = Expression {
                    kind: ExpressionKind::Attribute(Box::new(expression), name.0),
                    span: Span::new(start, self.previous_end()),
                };
            } else {
                break;
            }
        }

        Ok(expression)
    }

    /// Arguments after the opening parenthesis, through the closing one.
    fn read_arguments(&mut self) -> Result<Vec<Argument<'i>>, ParsingError> {
        let mut arguments = Vec::new();

        while !self.is_operator(")") {
            if self.is_operator("*") || self.is_operator("**") {
                return Err(ParsingError::Unsupported(
                    self.offset(),
                    "argument unpacking",
                ));
            }

            let argument = match (self.peek(), self.peek_at(1)) {
                (Token::Name(name), Token::Operator("=")) => {
                    self.advance();
                    self.advance();
                    Argument::Keyword(name, self.read_test()?)
                }
                _ => Argument::Positional(self.read_test()?),
            };
            arguments.push(argument);

            if !self.consume_operator(",") {
                break;
            }
        }

        self.require_operator(")", "')' to close the argument list")?;
        Ok(arguments)
    }

    fn read_atom(&mut self) -> Result<Expression<'i>, ParsingError> {
        let start = self.offset();

        let kind = match self.peek() {
            Token::Name("True") | Token::Name("False") | Token::Name("None") => {
                ExpressionKind::Constant(self.read_constant()?)
            }
            Token::Name(_) => ExpressionKind::Name(
                self.read_identifier()?
                    .0,
            ),
            Token::Number(_) => ExpressionKind::Constant(self.read_constant()?),
            Token::String(_) => self.read_strings()?,
            Token::Operator("(") => {
                self.advance();
                if self.consume_operator(")") {
                    ExpressionKind::Tuple(Vec::new())
                } else {
                    let inner = self.read_expression()?;
                    self.require_operator(")", "')' to close the parenthesis")?;
                    match inner.kind {
                        // a parenthesized tuple spans its parentheses
                        ExpressionKind::Tuple(items) => ExpressionKind::Tuple(items),
                        _ => return Ok(inner),
                    }
                }
            }
            Token::Operator("[") => {
                self.advance();
                let mut items = Vec::new();
                while !self.is_operator("]") {
                    items.push(self.read_test()?);
                    if !self.consume_operator(",") {
                        break;
                    }
                }
                self.require_operator("]", "']' to close the list")?;
                ExpressionKind::List(items)
            }
            Token::Operator("{") => {
                return Err(ParsingError::Unsupported(
                    start,
                    "a dictionary or set display",
                ))
            }
            _ => return Err(self.expected("an expression")),
        };

        Ok(Expression {
            kind,
            span: Span::new(start, self.previous_end()),
        })
    }

    /// Adjacent string literals concatenate. If any of them is an f-string
    /// the result is a formatted string, so braces in the plain parts are
    /// doubled to keep them literal.
    fn read_strings(&mut self) -> Result<ExpressionKind<'i>, ParsingError> {
        let mut parts = Vec::new();

        while let Token::String(raw) = self.peek() {
            parts.push(decode_string(raw));
            self.advance();
        }

        if parts
            .iter()
            .any(|(_, formatted)| *formatted)
        {
            let mut template = String::new();
            for (value, formatted) in parts {
                if formatted {
                    template.push_str(&value);
                } else {
                    template.push_str(
                        &value
                            .replace('{', "{{")
                            .replace('}', "}}"),
                    );
                }
            }
            Ok(ExpressionKind::Formatted(template))
        } else {
            let value = parts
                .into_iter()
                .map(|(value, _)| value)
                .collect();
            Ok(ExpressionKind::Constant(Constant::String(value)))
        }
    }

    fn read_constant(&mut self) -> Result<Constant, ParsingError> {
        let offset = self.offset();

        let constant = match self.peek() {
            Token::Name("True") => Constant::Boolean(true),
            Token::Name("False") => Constant::Boolean(false),
            Token::Name("None") => Constant::None,
            Token::Number(text) => parse_number(text).ok_or(ParsingError::InvalidNumber(offset))?,
            Token::String(_) => {
                return match self.read_strings()? {
                    ExpressionKind::Constant(constant) => Ok(constant),
                    _ => Err(ParsingError::Unsupported(offset, "an f-string here")),
                };
            }
            _ => return Err(self.expected("a literal")),
        };

        self.advance();
        Ok(constant)
    }
}

fn parse_number(text: &str) -> Option<Constant> {
    let digits = text.replace('_', "");
    let lower = digits.to_ascii_lowercase();

    if lower.ends_with('j') {
        return None;
    }

    let radix = match lower.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return i64::from_str_radix(&lower[2..], radix)
            .ok()
            .map(Constant::Integer);
    }

    if lower.contains(['.', 'e']) {
        lower
            .parse::<f64>()
            .ok()
            .map(Constant::Float)
    } else {
        lower
            .parse::<i64>()
            .ok()
            .map(Constant::Integer)
    }
}

/// Strip prefix and quotes from a string token and process escapes unless
/// it is a raw string. Returns the value and whether it was an f-string.
fn decode_string(raw: &str) -> (String, bool) {
    let quote = raw
        .find(['\'', '"'])
        .unwrap_or(0);
    let prefix = raw[..quote].to_ascii_lowercase();
    let body = &raw[quote..];

    let width = if body.starts_with("\"\"\"") || body.starts_with("'''") {
        3
    } else {
        1
    };
    let inner = body
        .get(width..body.len() - width.min(body.len()))
        .unwrap_or("");

    let value = if prefix.contains('r') {
        inner.to_string()
    } else {
        unescape(inner)
    };

    (value, prefix.contains('f'))
}

fn unescape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('\'') => result.push('\''),
            Some('"') => result.push('"'),
            Some('\n') => {}
            Some(e @ ('x' | 'u')) => {
                let count = if e == 'x' { 2 } else { 4 };
                let hex: String = chars
                    .by_ref()
                    .take(count)
                    .collect();
                match u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                {
                    Some(decoded) => result.push(decoded),
                    None => {
                        result.push('\\');
                        result.push(e);
                        result.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}
