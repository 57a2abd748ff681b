//! Tokenizer for the literal-assignment language used inside script headers.
//!
//! Newlines are significant only outside brackets, so a list opened on one
//! header line and closed on another produces a single logical statement.

use crate::header::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Name(String),
    Str(String),
    Int(i64),
    /// Decimal digits of an integer too wide for `i64`.
    BigInt(String),
    Float(f64),
    /// One of `( ) [ ] { } , : ; . =`.
    Punct(char),
    /// Arithmetic, comparison and augmented-assignment operators.
    Op(&'static str),
    Newline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    /// 1-based line within the lexed text.
    pub line: usize,
}

/// Deepest bracket or unary nesting accepted in a header.
pub const MAX_NESTING: usize = 100;

/// Longest operators first so that `**=` wins over `**` and `*`.
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "**", "//", "==", "!=", "<=", ">=", "->", ":=", "+=", "-=",
    "*=", "/=", "%=", "&=", "|=", "^=", "@=", "<<", ">>", "+", "-", "*", "/", "%", "<", ">",
    "&", "|", "^", "~", "@",
];

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    /// Currently open brackets, innermost last.
    depth: Vec<char>,
    tokens: Vec<Spanned>,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            depth: Vec::new(),
            tokens: Vec::new(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Spanned>, ParseError> {
        while let Some(ch) = self.peek() {
            match ch {
                '\n' => {
                    self.pos += 1;
                    if self.depth.is_empty() {
                        self.push_newline();
                    }
                    self.line += 1;
                }
                ' ' | '\t' | '\r' | '\x0c' => self.pos += 1,
                '#' => self.skip_comment(),
                '\\' => self.line_continuation()?,
                '"' | '\'' => {
                    let value = self.string(false)?;
                    self.push(Token::Str(value));
                }
                c if c.is_ascii_digit() => self.number()?,
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number()?,
                c if c == '_' || c.is_alphabetic() => self.name_or_prefixed_string()?,
                '(' | '[' | '{' => {
                    if self.depth.len() >= MAX_NESTING {
                        return Err(self.error("too deeply nested"));
                    }
                    self.depth.push(ch);
                    self.pos += 1;
                    self.push(Token::Punct(ch));
                }
                ')' | ']' | '}' => {
                    let expected = match ch {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    if self.depth.pop() != Some(expected) {
                        return Err(self.error(format!("unmatched '{ch}'")));
                    }
                    self.pos += 1;
                    self.push(Token::Punct(ch));
                }
                _ => self.operator_or_punct(ch)?,
            }
        }

        if let Some(open) = self.depth.last() {
            return Err(self.error(format!("'{open}' was never closed")));
        }
        self.push_newline();
        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, token: Token) {
        self.tokens.push(Spanned {
            token,
            line: self.line,
        });
    }

    fn push_newline(&mut self) {
        // Blank lines never produce empty statements.
        if matches!(
            self.tokens.last(),
            None | Some(Spanned {
                token: Token::Newline,
                ..
            })
        ) {
            return;
        }
        self.push(Token::Newline);
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Malformed {
            line: self.line,
            message: message.into(),
        }
    }

    fn skip_comment(&mut self) {
        while let Some(ch) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn line_continuation(&mut self) -> Result<(), ParseError> {
        self.pos += 1;
        if self.peek() == Some('\r') {
            self.pos += 1;
        }
        match self.peek() {
            Some('\n') => {
                self.pos += 1;
                self.line += 1;
                Ok(())
            }
            _ => Err(self.error("unexpected character after line continuation")),
        }
    }

    fn name_or_prefixed_string(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '_' || ch.is_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        if matches!(self.peek(), Some('"' | '\'')) {
            match name.as_str() {
                "r" | "R" => {
                    let value = self.string(true)?;
                    self.push(Token::Str(value));
                    return Ok(());
                }
                "u" | "U" => {
                    let value = self.string(false)?;
                    self.push(Token::Str(value));
                    return Ok(());
                }
                _ => {}
            }
        }

        self.push(Token::Name(name));
        Ok(())
    }

    fn string(&mut self, raw: bool) -> Result<String, ParseError> {
        let quote = self.peek().unwrap_or('"');
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        let start_line = self.line;
        self.pos += if triple { 3 } else { 1 };

        let mut out = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err(ParseError::Malformed {
                    line: start_line,
                    message: "unterminated string literal".to_string(),
                });
            };

            if ch == quote {
                if !triple {
                    self.pos += 1;
                    return Ok(out);
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    return Ok(out);
                }
            }

            match ch {
                '\n' if !triple => {
                    return Err(ParseError::Malformed {
                        line: start_line,
                        message: "unterminated string literal".to_string(),
                    });
                }
                '\n' => {
                    out.push('\n');
                    self.pos += 1;
                    self.line += 1;
                }
                '\\' if raw => {
                    // Raw strings keep the backslash but it still shields a quote.
                    out.push('\\');
                    self.pos += 1;
                    if let Some(next) = self.peek() {
                        if next == '\n' {
                            self.line += 1;
                        }
                        out.push(next);
                        self.pos += 1;
                    }
                }
                '\\' => {
                    self.pos += 1;
                    self.escape(&mut out)?;
                }
                other => {
                    out.push(other);
                    self.pos += 1;
                }
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), ParseError> {
        let Some(ch) = self.peek() else {
            return Err(self.error("unterminated string literal"));
        };
        self.pos += 1;
        match ch {
            '\n' => self.line += 1,
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            'x' => out.push(self.hex_escape(2)?),
            'u' => out.push(self.hex_escape(4)?),
            'U' => out.push(self.hex_escape(8)?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, ParseError> {
        let end = self.pos + digits;
        if end > self.chars.len() {
            return Err(self.error("truncated escape sequence"));
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        let code = u32::from_str_radix(&hex, 16)
            .map_err(|_| self.error(format!("invalid escape sequence '{hex}'")))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| self.error(format!("invalid code point {code:#x}")))
    }

    fn number(&mut self) -> Result<(), ParseError> {
        if self.peek() == Some('0') {
            let radix = match self.peek_at(1) {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let digits = self.take_digits(|c| c.is_digit(radix));
                if digits.is_empty() {
                    return Err(self.error("invalid integer literal"));
                }
                let token = match i64::from_str_radix(&digits, radix) {
                    Ok(value) => Token::Int(value),
                    Err(_) => Token::BigInt(to_decimal(&digits, radix)),
                };
                self.push(token);
                return self.reject_trailing_name();
            }
        }

        let mut text = self.take_digits(|c| c.is_ascii_digit());
        let mut is_float = false;

        if self.peek() == Some('.') {
            is_float = true;
            self.pos += 1;
            text.push('.');
            text.push_str(&self.take_digits(|c| c.is_ascii_digit()));
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = self.peek_at(1).filter(|c| matches!(c, '+' | '-'));
            let digit_at = if sign.is_some() { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.pos += digit_at;
                text.push('e');
                if let Some(sign) = sign {
                    text.push(sign);
                }
                text.push_str(&self.take_digits(|c| c.is_ascii_digit()));
            }
        }

        if is_float {
            let value: f64 = text
                .parse()
                .map_err(|_| self.error(format!("invalid float literal '{text}'")))?;
            self.push(Token::Float(value));
        } else {
            if text.len() > 1 && text.starts_with('0') && text.chars().any(|c| c != '0') {
                return Err(self.error(format!("leading zeros in integer literal '{text}'")));
            }
            let token = match text.parse() {
                Ok(value) => Token::Int(value),
                Err(_) => Token::BigInt(text),
            };
            self.push(token);
        }

        self.reject_trailing_name()
    }

    /// Collects digits matching `accept`, dropping `_` separators.
    fn take_digits(&mut self, accept: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(ch) = self.peek() {
            if accept(ch) {
                out.push(ch);
            } else if ch != '_' || !self.peek_at(1).is_some_and(&accept) {
                break;
            }
            self.pos += 1;
        }
        out
    }

    fn reject_trailing_name(&self) -> Result<(), ParseError> {
        match self.peek() {
            Some(c) if c == '_' || c.is_alphanumeric() => {
                Err(self.error(format!("invalid character '{c}' in number")))
            }
            _ => Ok(()),
        }
    }

    fn operator_or_punct(&mut self, ch: char) -> Result<(), ParseError> {
        for op in OPERATORS {
            let len = op.chars().count();
            if self.pos + len <= self.chars.len()
                && self.chars[self.pos..self.pos + len].iter().copied().eq(op.chars())
            {
                self.pos += len;
                self.push(Token::Op(op));
                return Ok(());
            }
        }

        match ch {
            ',' | ':' | ';' | '.' | '=' => {
                self.pos += 1;
                self.push(Token::Punct(ch));
                Ok(())
            }
            other => Err(self.error(format!("invalid character '{other}'"))),
        }
    }
}

/// Rewrites `digits` in `radix` as decimal text.
fn to_decimal(digits: &str, radix: u32) -> String {
    // Little-endian base-10 digits.
    let mut decimal = vec![0u32];
    for digit in digits.chars().filter_map(|c| c.to_digit(radix)) {
        let mut carry = digit;
        for slot in decimal.iter_mut() {
            let value = *slot * radix + carry;
            *slot = value % 10;
            carry = value / 10;
        }
        while carry > 0 {
            decimal.push(carry % 10);
            carry /= 10;
        }
    }
    decimal.iter().rev().map(u32::to_string).collect()
}
