//! Script header extraction and literal evaluation.
//!
//! A header is a run of comment lines delimited by `# ///` markers:
//!
//! ```text
//! # /// script
//! # command = "weather"
//! # aliases = ["weather", "wttr"]
//! # dependencies = [
//! #   "requests<3",
//! # ]
//! # ///
//! ```
//!
//! The collected comment text is parsed as a small assignment language. Only
//! literals are evaluated; a well-formed value that is not a literal (a call,
//! a variable reference, arithmetic) is told apart from a syntax error.
//! Brackets and unary operators nest at most [`MAX_NESTING`] deep.

use thiserror::Error;

use crate::lexer::{Lexer, MAX_NESTING, Spanned, Token};
use crate::metadata::ScriptMetadata;
use crate::value::Value;

/// Prefix of the lines that open and close a header block.
pub const HEADER_DELIMITER: &str = "# ///";

/// Errors raised while parsing a script header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Header text is not valid assignment syntax.
    #[error("malformed header syntax at line {line}: {message}")]
    Malformed { line: usize, message: String },

    /// A value parsed but is not a literal.
    #[error("unevaluable value for key '{key}'")]
    Unevaluable { key: String },
}

/// Parses the metadata header embedded in `content`.
///
/// Returns an empty [`ScriptMetadata`] when the content has no header block.
/// When a key is assigned more than once the last assignment wins.
///
/// # Errors
///
/// Returns [`ParseError::Malformed`] when the header is not valid syntax and
/// [`ParseError::Unevaluable`] when a value is not a literal. Line numbers in
/// `Malformed` refer to lines of `content`.
///
/// # Examples
///
/// ```
/// use act_core::parse_header;
///
/// let script = "\
/// ## /// script
/// ## command = \"weather\"
/// ## aliases = [\"weather\", \"wttr\"]
/// ## ///
/// print('hi')
/// ";
/// let meta = parse_header(script).unwrap();
/// assert_eq!(meta.command(), Some("weather"));
/// assert_eq!(meta.aliases(), vec!["weather", "wttr"]);
/// ```
pub fn parse_header(content: &str) -> Result<ScriptMetadata, ParseError> {
    let block = extract_block(content);
    let text = block
        .iter()
        .map(|(_, line)| *line)
        .collect::<Vec<_>>()
        .join("\n");

    let tokens = Lexer::new(&text)
        .tokenize()
        .map_err(|err| remap_line(err, &block))?;
    let statements = Parser::new(&tokens)
        .statements()
        .map_err(|err| remap_line(err, &block))?;

    let mut metadata = ScriptMetadata::new();
    for statement in statements {
        let Statement::Assign { mut targets, value } = statement else {
            continue;
        };
        if targets.len() != 1 {
            continue;
        }
        let Some(Expr::Name(key)) = targets.pop() else {
            continue;
        };
        match value.to_literal() {
            Some(literal) => metadata.insert(key, literal),
            None => return Err(ParseError::Unevaluable { key }),
        }
    }

    Ok(metadata)
}

/// Renders `metadata` as a header block that parses back to an equal mapping.
///
/// # Examples
///
/// ```
/// use act_core::{ScriptMetadata, Value, parse_header, render_header};
///
/// let mut meta = ScriptMetadata::new();
/// meta.insert("command", Value::from("build"));
/// meta.insert("aliases", Value::from(vec!["b"]));
/// let rendered = render_header(&meta);
/// assert!(rendered.starts_with("# /// script\n"));
/// assert_eq!(parse_header(&rendered).unwrap(), meta);
/// ```
pub fn render_header(metadata: &ScriptMetadata) -> String {
    let mut out = String::from("# /// script\n");
    for (key, value) in metadata.iter() {
        out.push_str(&format!("# {key} = {}\n", value.to_literal_string()));
    }
    out.push_str("# ///\n");
    out
}

/// Collects the stripped comment lines of the first header block along with
/// their 1-based line numbers in the script text.
fn extract_block(content: &str) -> Vec<(usize, &str)> {
    let mut started = false;
    let mut lines = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let stripped = line.trim();
        if stripped.starts_with(HEADER_DELIMITER) {
            if started {
                break;
            }
            started = true;
            continue;
        }
        if started {
            if let Some(rest) = stripped.strip_prefix('#') {
                lines.push((idx + 1, rest.trim()));
            }
        }
    }

    lines
}

fn remap_line(err: ParseError, block: &[(usize, &str)]) -> ParseError {
    match err {
        ParseError::Malformed { line, message } => {
            let mapped = block
                .get(line.saturating_sub(1))
                .or(block.last())
                .map(|(source_line, _)| *source_line)
                .unwrap_or(line);
            ParseError::Malformed {
                line: mapped,
                message,
            }
        }
        other => other,
    }
}

#[derive(Debug, Clone)]
enum Expr {
    Const(Value),
    Name(String),
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Unary(&'static str, Box<Expr>),
    /// Well-formed but never a literal: calls, attributes, operators, dicts.
    Opaque,
}

impl Expr {
    fn to_literal(&self) -> Option<Value> {
        match self {
            Expr::Const(value) => Some(value.clone()),
            Expr::List(items) | Expr::Tuple(items) => items
                .iter()
                .map(Expr::to_literal)
                .collect::<Option<Vec<_>>>()
                .map(Value::List),
            Expr::Unary(op, operand) => match (*op, operand.to_literal()?) {
                ("-", Value::Int(n)) => Some(
                    n.checked_neg()
                        .map_or_else(|| negate_digits(&n.to_string()), Value::Int),
                ),
                ("-", Value::BigInt(digits)) => Some(negate_digits(&digits)),
                ("-", Value::Float(f)) => Some(Value::Float(-f)),
                ("+", value @ (Value::Int(_) | Value::BigInt(_) | Value::Float(_))) => {
                    Some(value)
                }
                _ => None,
            },
            Expr::Name(_) | Expr::Opaque => None,
        }
    }
}

/// Flips the sign of a decimal integer, narrowing to `Int` when it fits.
fn negate_digits(digits: &str) -> Value {
    let negated = match digits.strip_prefix('-') {
        Some(abs) => abs.to_string(),
        None => format!("-{digits}"),
    };
    match negated.parse() {
        Ok(n) => Value::Int(n),
        Err(_) => Value::BigInt(negated),
    }
}

#[derive(Debug)]
enum Statement {
    Assign { targets: Vec<Expr>, value: Expr },
    Other,
}

const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Keywords read as binary operators between two operands.
const INFIX_KEYWORDS: &[&str] = &["and", "or", "if", "else", "in", "is", "for"];

const AUGMENTED_OPS: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "**=", "&=", "|=", "^=", ">>=", "<<=", "@=",
];

const TOO_DEEP: &str = "too deeply nested";

/// Parser for `target = value` statements.
///
/// Values are literals, optionally wrapped in brackets or signed. Anything
/// else that still reads as an operand (a name, a call, an attribute, a
/// subscript, a dict, operators between operands) parses to
/// [`Expr::Opaque`] so that it is reported as unevaluable rather than
/// malformed. Call arguments, subscripts and braces are skipped whole.
struct Parser<'t> {
    tokens: &'t [Spanned],
    pos: usize,
    /// Open brackets plus pending unary operators.
    depth: usize,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Spanned]) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn statements(mut self) -> Result<Vec<Statement>, ParseError> {
        let mut out = Vec::new();
        loop {
            while self.eat_punct(';') || self.eat_newline() {}
            if self.peek().is_none() {
                return Ok(out);
            }
            out.push(self.statement()?);
            if !(self.eat_punct(';') || self.eat_newline()) && self.peek().is_some() {
                return Err(self.unexpected());
            }
        }
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        let first = self.expr_list()?;

        if let Some(Token::Op(op)) = self.peek() {
            if AUGMENTED_OPS.contains(op) {
                self.pos += 1;
                self.expr_list()?;
                return Ok(Statement::Other);
            }
        }

        if self.eat_punct(':') {
            // Annotated assignment: never a plain assignment.
            self.expr()?;
            if self.eat_punct('=') {
                self.expr_list()?;
            }
            return Ok(Statement::Other);
        }

        if !self.check_punct('=') {
            return Ok(Statement::Other);
        }

        let mut chain = vec![first];
        while self.eat_punct('=') {
            chain.push(self.expr_list()?);
        }
        let value = chain.pop().unwrap_or(Expr::Opaque);

        for target in &chain {
            if !is_assignable(target) {
                return Err(self.error("cannot assign to literal"));
            }
        }

        Ok(Statement::Assign {
            targets: chain,
            value,
        })
    }

    /// `expr (',' expr)* [',']`, producing a tuple when a comma is present.
    fn expr_list(&mut self) -> Result<Expr, ParseError> {
        let first = self.expr()?;
        if !self.check_punct(',') {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_punct(',') {
            if self.at_expr_end() {
                break;
            }
            items.push(self.expr()?);
        }
        Ok(Expr::Tuple(items))
    }

    /// `unary (infix unary)*`; any infix operator makes the result opaque.
    fn expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;
        while self.eat_infix() {
            self.unary()?;
            expr = Expr::Opaque;
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let mut ops = Vec::new();
        loop {
            let op = match self.peek() {
                Some(Token::Op(op @ ("-" | "+" | "~"))) => *op,
                Some(Token::Name(name)) if name == "not" => "not",
                _ => break,
            };
            if self.depth + ops.len() >= MAX_NESTING {
                return Err(self.error(TOO_DEEP));
            }
            self.pos += 1;
            ops.push(op);
        }

        self.depth += ops.len();
        let operand = self.postfix();
        self.depth -= ops.len();

        let mut expr = operand?;
        for op in ops.into_iter().rev() {
            expr = Expr::Unary(op, Box::new(expr));
        }
        Ok(expr)
    }

    fn postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.atom()?;
        loop {
            if self.eat_punct('(') {
                self.skip_to_close(')');
            } else if self.eat_punct('[') {
                self.skip_to_close(']');
            } else if self.eat_punct('.') {
                match self.next() {
                    Some(Token::Name(name)) if !KEYWORDS.contains(&name.as_str()) => {}
                    _ => return Err(self.previous_unexpected()),
                }
            } else {
                return Ok(expr);
            }
            expr = Expr::Opaque;
        }
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.next() else {
            return Err(self.error("unexpected end of header"));
        };

        match token {
            Token::Str(first) => {
                let mut value = first.clone();
                while let Some(Token::Str(more)) = self.peek() {
                    value.push_str(more);
                    self.pos += 1;
                }
                Ok(Expr::Const(Value::Str(value)))
            }
            Token::Int(n) => Ok(Expr::Const(Value::Int(*n))),
            Token::BigInt(digits) => Ok(Expr::Const(Value::BigInt(digits.clone()))),
            Token::Float(f) => Ok(Expr::Const(Value::Float(*f))),
            Token::Name(name) => match name.as_str() {
                "True" => Ok(Expr::Const(Value::Bool(true))),
                "False" => Ok(Expr::Const(Value::Bool(false))),
                "None" => Ok(Expr::Const(Value::None)),
                keyword if KEYWORDS.contains(&keyword) => Err(self.previous_unexpected()),
                _ => Ok(Expr::Name(name.clone())),
            },
            Token::Punct('(') => self.nested(|p| {
                let (mut items, comma) = p.sequence(')')?;
                if items.len() == 1 && !comma {
                    if let Some(inner) = items.pop() {
                        return Ok(inner);
                    }
                }
                Ok(Expr::Tuple(items))
            }),
            Token::Punct('[') => self.nested(|p| Ok(Expr::List(p.sequence(']')?.0))),
            Token::Punct('{') => {
                self.skip_to_close('}');
                Ok(Expr::Opaque)
            }
            _ => Err(self.previous_unexpected()),
        }
    }

    /// Comma-separated items up to `close`, trailing comma allowed. Also
    /// reports whether any comma was seen.
    fn sequence(&mut self, close: char) -> Result<(Vec<Expr>, bool), ParseError> {
        let mut items = Vec::new();
        let mut comma = false;
        loop {
            if self.eat_punct(close) {
                return Ok((items, comma));
            }
            items.push(self.expr()?);
            if self.eat_punct(close) {
                return Ok((items, comma));
            }
            self.expect_punct(',')?;
            comma = true;
        }
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Expr, ParseError>,
    ) -> Result<Expr, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error(TOO_DEEP));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Consumes tokens through the bracket that closes the current group.
    /// The lexer has already verified that brackets balance.
    fn skip_to_close(&mut self, close: char) {
        let mut depth = 0usize;
        while let Some(token) = self.next() {
            match token {
                Token::Punct('(' | '[' | '{') => depth += 1,
                Token::Punct(c) if *c == close && depth == 0 => return,
                Token::Punct(')' | ']' | '}') => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    fn eat_infix(&mut self) -> bool {
        let infix = match self.peek() {
            Some(Token::Op(op)) => {
                !AUGMENTED_OPS.contains(op) && !matches!(*op, "~" | "->" | ":=")
            }
            Some(Token::Name(name)) if name == "not" => {
                // `not in`
                let next = self.tokens.get(self.pos + 1).map(|s| &s.token);
                if matches!(next, Some(Token::Name(n)) if n == "in") {
                    self.pos += 1;
                    true
                } else {
                    false
                }
            }
            Some(Token::Name(name)) => INFIX_KEYWORDS.contains(&name.as_str()),
            _ => false,
        };
        if infix {
            self.pos += 1;
        }
        infix
    }

    fn at_expr_end(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(Token::Newline)
                | Some(Token::Punct(')' | ']' | '}' | '=' | ';' | ':'))
        ) || matches!(self.peek(), Some(Token::Op(op)) if AUGMENTED_OPS.contains(op))
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check_punct(&self, ch: char) -> bool {
        matches!(self.peek(), Some(Token::Punct(c)) if *c == ch)
    }

    fn eat_punct(&mut self, ch: char) -> bool {
        if self.check_punct(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_newline(&mut self) -> bool {
        if matches!(self.peek(), Some(Token::Newline)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, ch: char) -> Result<(), ParseError> {
        if self.eat_punct(ch) {
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn current_line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Malformed {
            line: self.current_line(),
            message: message.into(),
        }
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(token) => self.error(format!("unexpected {}", describe(token))),
            None => self.error("unexpected end of header"),
        }
    }

    fn previous_unexpected(&self) -> ParseError {
        let spanned = self.tokens.get(self.pos.saturating_sub(1));
        ParseError::Malformed {
            line: spanned.map(|s| s.line).unwrap_or(1),
            message: match spanned {
                Some(s) => format!("unexpected {}", describe(&s.token)),
                None => "unexpected end of header".to_string(),
            },
        }
    }
}

fn is_assignable(target: &Expr) -> bool {
    match target {
        Expr::Name(_) | Expr::Opaque => true,
        Expr::List(items) | Expr::Tuple(items) => items.iter().all(is_assignable),
        Expr::Const(_) | Expr::Unary(..) => false,
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Name(name) => format!("name '{name}'"),
        Token::Str(_) => "string".to_string(),
        Token::Int(n) => format!("number {n}"),
        Token::BigInt(digits) => format!("number {digits}"),
        Token::Float(f) => format!("number {f}"),
        Token::Punct(c) => format!("'{c}'"),
        Token::Op(op) => format!("'{op}'"),
        Token::Newline => "end of line".to_string(),
    }
}
