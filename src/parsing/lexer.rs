//! Split source into tokens. Python's block structure is carried by leading
//! whitespace, so INDENT and DEDENT tokens are synthesized here at the start
//! of each logical line; inside brackets line breaks are not significant.

use crate::compile;
use crate::language::Span;
use crate::parsing::parser::ParsingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'i> {
    Name(&'i str),
    Number(&'i str),
    // raw text including prefix and quotes
    String(&'i str),
    Operator(&'i str),
    Newline,
    Indent,
    Dedent,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexeme<'i> {
    pub token: Token<'i>,
    pub span: Span,
}

// longest first
static OPERATORS: [&str; 46] = [
    "**=", "//=", ">>=", "<<=", "...", "**", "//", "==", "!=", "<=", ">=", "->", "+=", "-=", "*=",
    "/=", "%=", "&=", "|=", "^=", ":=", "<<", ">>", "+", "-", "*", "/", "%", "<", ">", "=", "(",
    ")", "[", "]", "{", "}", ",", ":", ".", ";", "@", "&", "|", "^", "~",
];

static STRING_PREFIXES: [&str; 10] = ["r", "u", "b", "f", "rb", "br", "fr", "rf", "R", "F"];

pub fn tokenize(content: &str) -> Result<Vec<Lexeme<'_>>, ParsingError> {
    let mut lexer = Lexer {
        original: content,
        offset: 0,
        brackets: Vec::new(),
        indents: vec![0],
        tokens: Vec::new(),
        at_line_start: true,
    };

    lexer.run()?;

    Ok(lexer.tokens)
}

struct Lexer<'i> {
    original: &'i str,
    offset: usize,
    brackets: Vec<(char, usize)>,
    indents: Vec<usize>,
    tokens: Vec<Lexeme<'i>>,
    at_line_start: bool,
}

impl<'i> Lexer<'i> {
    fn rest(&self) -> &'i str {
        &self.original[self.offset..]
    }

    fn push(&mut self, token: Token<'i>, start: usize, end: usize) {
        self.tokens
            .push(Lexeme {
                token,
                span: Span::new(start, end),
            });
    }

    /// Logical lines end once; blank lines and lines that only continue an
    /// open bracket never produce a NEWLINE.
    fn push_newline(&mut self, at: usize) {
        match self
            .tokens
            .last()
        {
            None => {}
            Some(lexeme) if lexeme.token == Token::Newline => {}
            Some(_) => self.push(Token::Newline, at, at + 1),
        }
    }

    fn run(&mut self) -> Result<(), ParsingError> {
        while self.offset
            < self
                .original
                .len()
        {
            if self.at_line_start {
                self.at_line_start = false;
                self.read_indentation()?;
                continue;
            }

            let rest = self.rest();
            let c = match rest
                .chars()
                .next()
            {
                Some(c) => c,
                None => break,
            };

            match c {
                ' ' | '\t' | '\x0c' | '\r' => self.offset += 1,
                '#' => {
                    let width = rest
                        .find('\n')
                        .unwrap_or(rest.len());
                    self.offset += width;
                }
                '\\' if rest[1..].starts_with('\n') => self.offset += 2,
                '\\' if rest[1..].starts_with("\r\n") => self.offset += 3,
                '\n' => {
                    if self
                        .brackets
                        .is_empty()
                    {
                        self.push_newline(self.offset);
                        self.at_line_start = true;
                    }
                    self.offset += 1;
                }
                '"' | '\'' => self.read_string(0)?,
                c if c.is_ascii_digit() => self.read_number()?,
                '.' if rest[1..].starts_with(|d: char| d.is_ascii_digit()) => self.read_number()?,
                c if c == '_' || c.is_alphabetic() => self.read_name()?,
                _ => self.read_operator(c)?,
            }
        }

        if let Some((c, at)) = self
            .brackets
            .last()
        {
            return Err(ParsingError::UnbalancedBracket(*at, *c));
        }

        let end = self
            .original
            .len();
        self.push_newline(end);
        while self
            .indents
            .len()
            > 1
        {
            self.indents
                .pop();
            self.push(Token::Dedent, end, end);
        }
        self.push(Token::End, end, end);

        Ok(())
    }

    fn read_indentation(&mut self) -> Result<(), ParsingError> {
        let rest = self.rest();
        let mut width = 0;
        let mut consumed = 0;

        for c in rest.chars() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / 8 + 1) * 8,
                '\x0c' => width = 0,
                _ => break,
            }
            consumed += 1;
        }

        self.offset += consumed;

        // blank and comment-only lines don't count
        let rest = self.rest();
        if rest.is_empty()
            || rest.starts_with('\n')
            || rest.starts_with("\r\n")
            || rest.starts_with('#')
        {
            return Ok(());
        }

        let current = self
            .indents
            .last()
            .copied()
            .unwrap_or(0);

        if width > current {
            self.indents
                .push(width);
            self.push(Token::Indent, self.offset, self.offset);
        } else if width < current {
            while self
                .indents
                .last()
                .map_or(false, |&level| level > width)
            {
                self.indents
                    .pop();
                self.push(Token::Dedent, self.offset, self.offset);
            }
            if self
                .indents
                .last()
                .copied()
                != Some(width)
            {
                return Err(ParsingError::InconsistentIndentation(self.offset));
            }
        }

        Ok(())
    }

    fn read_name(&mut self) -> Result<(), ParsingError> {
        let start = self.offset;
        let re = compile!(r"^[\p{L}_][\p{L}\p{N}_]*");

        let name = match re.find(self.rest()) {
            Some(found) => found.as_str(),
            None => {
                let c = self
                    .rest()
                    .chars()
                    .next()
                    .unwrap_or('?');
                return Err(ParsingError::InvalidCharacter(start, c));
            }
        };

        let after = &self.rest()[name.len()..];
        if STRING_PREFIXES.contains(&name) && after.starts_with(['"', '\'']) {
            return self.read_string(name.len());
        }

        self.offset += name.len();
        self.push(Token::Name(name), start, self.offset);
        Ok(())
    }

    fn read_number(&mut self) -> Result<(), ParsingError> {
        let start = self.offset;
        let radix = compile!(r"^0[xXoObB][0-9a-fA-F_]+");
        let decimal = compile!(r"^(?:[0-9][0-9_]*(?:\.[0-9_]*)?|\.[0-9][0-9_]*)(?:[eE][+-]?[0-9]+)?[jJ]?");

        let rest = self.rest();
        let found = radix
            .find(rest)
            .or_else(|| decimal.find(rest))
            .ok_or(ParsingError::InvalidNumber(start))?;

        let text = found.as_str();
        self.offset += text.len();
        self.push(Token::Number(text), start, self.offset);
        Ok(())
    }

    /// Strings are kept raw here; the parser decodes escapes. A backslash
    /// always protects the following character from closing the string.
    fn read_string(&mut self, prefix: usize) -> Result<(), ParsingError> {
        let start = self.offset;
        let rest = self.rest();
        let body = &rest[prefix..];

        let quote = match body
            .chars()
            .next()
        {
            Some(c) => c,
            None => return Err(ParsingError::UnclosedString(start)),
        };
        let triple: String = std::iter::repeat(quote)
            .take(3)
            .collect();
        let delimiter = if body.starts_with(&triple) {
            triple.as_str()
        } else {
            &triple[..1]
        };

        let mut chars = body[delimiter.len()..].char_indices();
        let mut end = None;

        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '\n' if delimiter.len() == 1 => break,
                _ if body[delimiter.len() + i..].starts_with(delimiter) => {
                    end = Some(delimiter.len() + i + delimiter.len());
                    break;
                }
                _ => {}
            }
        }

        match end {
            Some(width) => {
                let text = &rest[..prefix + width];
                self.offset += text.len();
                self.push(Token::String(text), start, self.offset);
                Ok(())
            }
            None => Err(ParsingError::UnclosedString(start)),
        }
    }

    fn read_operator(&mut self, c: char) -> Result<(), ParsingError> {
        let start = self.offset;
        let rest = self.rest();

        let operator = OPERATORS
            .iter()
            .find(|operator| rest.starts_with(*operator))
            .copied()
            .ok_or(ParsingError::InvalidCharacter(start, c))?;

        match operator {
            "(" | "[" | "{" => self
                .brackets
                .push((c, start)),
            ")" | "]" | "}" => {
                let expected = match operator {
                    ")" => '(',
                    "]" => '[',
                    _ => '{',
                };
                match self
                    .brackets
                    .pop()
                {
                    Some((open, _)) if open == expected => {}
                    _ => return Err(ParsingError::UnbalancedBracket(start, c)),
                }
            }
            _ => {}
        }

        self.offset += operator.len();
        self.push(Token::Operator(operator), start, self.offset);
        Ok(())
    }
}
