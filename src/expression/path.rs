//! PathEvaluator: a small expression language over context variables
//!
//! Supports:
//! - `Exif.title`: variable paths (see `EvalContext::lookup`)
//! - `'text'`, `"text"`, `42`, `1.5`, `true`, `false`, `null`: literals
//! - `[a, b, ...]`: sequences
//! - `a + b`: text concatenation (numeric addition when every operand is a number)
//! - `a | filter | filter(arg)`: filter pipeline (lowercase, uppercase, trim,
//!   split, join, sort, first, default)
//!
//! String literals accept `\n`, `\t` and backslash-escaped quotes or
//! backslashes; any other escaped character stands for itself.
//!
//! An optional `${ ... }` wrapper around the whole expression is ignored.

use super::value::{scalar_text, type_name};
use super::{EvalContext, EvalError, EvalResult, Evaluator};
use serde_json::{Number, Value};

/// The bundled evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct PathEvaluator;

impl PathEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for PathEvaluator {
    fn evaluate(&self, expression: &str, context: &EvalContext) -> EvalResult<Value> {
        let expr = parse(expression)?;
        eval(&expr, context)
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Str(String),
    Num(Number),
    Word(String),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Plus,
    Pipe,
}

fn syntax(expression: &str, message: impl Into<String>) -> EvalError {
    EvalError::Syntax {
        expression: expression.to_string(),
        message: message.into(),
    }
}

fn tokenize(source: &str) -> EvalResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '[' | ']' | '(' | ')' | ',' | '+' | '|' => {
                chars.next();
                tokens.push(match ch {
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    ',' => Token::Comma,
                    '+' => Token::Plus,
                    _ => Token::Pipe,
                });
            }
            '\'' | '"' => {
                let quote = ch;
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(escaped) => text.push(escaped),
                            None => return Err(syntax(source, "unterminated string literal")),
                        },
                        Some(c) if c == quote => break,
                        Some(c) => text.push(c),
                        None => return Err(syntax(source, "unterminated string literal")),
                    }
                }
                tokens.push(Token::Str(text));
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut literal = String::new();
                literal.push(c);
                chars.next();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = parse_number(&literal)
                    .ok_or_else(|| syntax(source, format!("invalid number `{}`", literal)))?;
                tokens.push(Token::Num(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == '.' {
                        word.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word));
            }
            other => {
                return Err(syntax(source, format!("unexpected character `{}`", other)));
            }
        }
    }

    Ok(tokens)
}

fn parse_number(literal: &str) -> Option<Number> {
    if literal.contains('.') {
        literal.parse::<f64>().ok().and_then(Number::from_f64)
    } else {
        literal.parse::<i64>().ok().map(Number::from)
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Literal(Value),
    Path(String),
    Array(Vec<Expr>),
    Concat(Vec<Expr>),
    Filtered { input: Box<Expr>, filters: Vec<FilterCall> },
}

#[derive(Debug, Clone, PartialEq)]
struct FilterCall {
    name: String,
    args: Vec<Expr>,
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

/// Strip an optional `${ ... }` wrapper.
fn unwrap_expression(expression: &str) -> &str {
    let trimmed = expression.trim();
    trimmed
        .strip_prefix("${")
        .and_then(|inner| inner.strip_suffix('}'))
        .unwrap_or(trimmed)
}

fn parse(expression: &str) -> EvalResult<Expr> {
    let source = unwrap_expression(expression);
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(syntax(expression, "empty expression"));
    }

    let mut parser = Parser {
        source: expression,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> EvalError {
        syntax(self.source, message)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.tokens.get(self.pos) == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> EvalResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn parse_expr(&mut self) -> EvalResult<Expr> {
        let input = self.parse_concat()?;
        let mut filters = Vec::new();

        while self.eat(&Token::Pipe) {
            let name = match self.advance() {
                Some(Token::Word(name)) => name,
                _ => return Err(self.error("expected filter name after `|`")),
            };
            let args = if self.eat(&Token::LParen) {
                self.parse_list(&Token::RParen, "`)`")?
            } else {
                Vec::new()
            };
            filters.push(FilterCall { name, args });
        }

        if filters.is_empty() {
            Ok(input)
        } else {
            Ok(Expr::Filtered {
                input: Box::new(input),
                filters,
            })
        }
    }

    fn parse_concat(&mut self) -> EvalResult<Expr> {
        let first = self.parse_primary()?;
        if self.tokens.get(self.pos) != Some(&Token::Plus) {
            return Ok(first);
        }

        let mut parts = vec![first];
        while self.eat(&Token::Plus) {
            parts.push(self.parse_primary()?);
        }
        Ok(Expr::Concat(parts))
    }

    fn parse_primary(&mut self) -> EvalResult<Expr> {
        match self.advance() {
            Some(Token::Str(s)) => Ok(Expr::Literal(Value::String(s))),
            Some(Token::Num(n)) => Ok(Expr::Literal(Value::Number(n))),
            Some(Token::Word(word)) => Ok(match word.as_str() {
                "true" => Expr::Literal(Value::Bool(true)),
                "false" => Expr::Literal(Value::Bool(false)),
                "null" => Expr::Literal(Value::Null),
                _ => Expr::Path(word),
            }),
            Some(Token::LBracket) => Ok(Expr::Array(self.parse_list(&Token::RBracket, "`]`")?)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(&Token::RParen, "`)`")?;
                Ok(inner)
            }
            Some(other) => Err(self.error(format!("unexpected token {:?}", other))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    /// Parse comma-separated expressions up to and including `close`.
    fn parse_list(&mut self, close: &Token, what: &str) -> EvalResult<Vec<Expr>> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expr()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(close, what)?;
            return Ok(items);
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn eval(expr: &Expr, ctx: &EvalContext) -> EvalResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Path(path) => ctx
            .lookup(path)
            .cloned()
            .ok_or_else(|| EvalError::UndefinedVariable(path.clone())),
        Expr::Array(items) => items
            .iter()
            .map(|item| eval(item, ctx))
            .collect::<EvalResult<Vec<_>>>()
            .map(Value::Array),
        Expr::Concat(parts) => {
            let values = parts
                .iter()
                .map(|part| eval(part, ctx))
                .collect::<EvalResult<Vec<_>>>()?;
            concat(&values)
        }
        Expr::Filtered { input, filters } => {
            let mut current = eval(input, ctx)?;
            for filter in filters {
                let args = filter
                    .args
                    .iter()
                    .map(|arg| eval(arg, ctx))
                    .collect::<EvalResult<Vec<_>>>()?;
                current = apply_filter(current, &filter.name, &args)?;
            }
            Ok(current)
        }
    }
}

fn concat(values: &[Value]) -> EvalResult<Value> {
    if values.iter().all(Value::is_i64) {
        let mut sum: i64 = 0;
        for value in values {
            let n = value.as_i64().unwrap_or_default();
            sum = sum
                .checked_add(n)
                .ok_or_else(|| EvalError::Type("integer overflow in `+`".to_string()))?;
        }
        return Ok(Value::from(sum));
    }
    if values.iter().all(Value::is_number) {
        let sum: f64 = values.iter().filter_map(Value::as_f64).sum();
        return Number::from_f64(sum)
            .map(Value::Number)
            .ok_or_else(|| EvalError::Type("non-finite result in `+`".to_string()));
    }

    let mut text = String::new();
    for value in values {
        let part = scalar_text(value).ok_or_else(|| {
            EvalError::Type(format!("cannot concatenate {} with `+`", type_name(value)))
        })?;
        text.push_str(&part);
    }
    Ok(Value::String(text))
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

fn apply_filter(value: Value, name: &str, args: &[Value]) -> EvalResult<Value> {
    match name {
        "lowercase" => map_strings(value, name, |s| s.to_lowercase()),
        "uppercase" => map_strings(value, name, |s| s.to_uppercase()),
        "trim" => map_strings(value, name, |s| s.trim().to_string()),
        "split" => {
            let separator = text_arg(args, name)?.unwrap_or_else(|| ",".to_string());
            match value {
                Value::String(s) => Ok(Value::Array(
                    s.split(separator.as_str())
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                )),
                Value::Null => Ok(Value::Array(Vec::new())),
                // Already a sequence
                Value::Array(_) => Ok(value),
                other => Err(filter_type_error(name, "a string", &other)),
            }
        }
        "join" => {
            let separator = text_arg(args, name)?.unwrap_or_else(|| ",".to_string());
            match value {
                Value::Array(items) => {
                    let parts = items
                        .iter()
                        .map(|item| scalar_text(item).ok_or_else(|| filter_type_error(name, "scalar items", item)))
                        .collect::<EvalResult<Vec<_>>>()?;
                    Ok(Value::String(parts.join(&separator)))
                }
                Value::Null => Ok(Value::String(String::new())),
                Value::String(_) => Ok(value),
                other => Err(filter_type_error(name, "an array", &other)),
            }
        }
        "sort" => match value {
            Value::Array(items) => {
                let mut keyed = items
                    .into_iter()
                    .map(|item| {
                        scalar_text(&item)
                            .map(|key| (key, item.clone()))
                            .ok_or_else(|| filter_type_error(name, "scalar items", &item))
                    })
                    .collect::<EvalResult<Vec<_>>>()?;
                keyed.sort_by(|a, b| a.0.cmp(&b.0));
                Ok(Value::Array(keyed.into_iter().map(|(_, item)| item).collect()))
            }
            other => Err(filter_type_error(name, "an array", &other)),
        },
        "first" => match value {
            Value::Array(items) => Ok(items.into_iter().next().unwrap_or(Value::Null)),
            other => Ok(other),
        },
        "default" => {
            let fallback = args
                .first()
                .cloned()
                .ok_or_else(|| EvalError::Type("default filter requires an argument".to_string()))?;
            let is_empty = match &value {
                Value::Null => true,
                Value::String(s) => s.is_empty(),
                Value::Array(items) => items.is_empty(),
                _ => false,
            };
            Ok(if is_empty { fallback } else { value })
        }
        _ => Err(EvalError::UnknownFilter(name.to_string())),
    }
}

fn filter_type_error(filter: &str, expected: &str, found: &Value) -> EvalError {
    EvalError::Type(format!(
        "{} filter requires {}, got {}",
        filter,
        expected,
        type_name(found)
    ))
}

/// First filter argument as text, if given.
fn text_arg(args: &[Value], filter: &str) -> EvalResult<Option<String>> {
    match args.first() {
        None => Ok(None),
        Some(arg) => scalar_text(arg)
            .map(Some)
            .ok_or_else(|| filter_type_error(filter, "a scalar argument", arg)),
    }
}

/// Apply `f` to a string, or to each string in an array.
fn map_strings(value: Value, filter: &str, f: impl Fn(&str) -> String) -> EvalResult<Value> {
    match value {
        Value::String(s) => Ok(Value::String(f(&s))),
        Value::Array(items) => Ok(Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Value::String(f(&s)),
                    other => other,
                })
                .collect(),
        )),
        Value::Null => Ok(Value::Null),
        other => Err(filter_type_error(filter, "a string", &other)),
    }
}
