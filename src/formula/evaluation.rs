//! Formula evaluation.
//!
//! A formula sequence is serialized into an arithmetic expression (tags and
//! numbers wrapped in parentheses) and evaluated by a small precedence-climbing
//! parser over the fixed operator set.
//!
//! Precedence, highest first: `^` (right-associative), unary sign, `*` `/`,
//! `+` `-` (left-associative). A unary sign is only accepted at the start of
//! the expression or right after `(`.

use super::item::{FormulaItem, Operator};
use super::number::parse_number;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// A parenthesis pair directly wrapping another pair with no nesting inside.
    static ref DOUBLE_PARENS: Regex = Regex::new(r"\(\(([^()]+)\)\)").unwrap();
}

/// Why a formula could not be evaluated.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvalError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unexpected '{token}' at offset {offset}")]
    UnexpectedToken { token: String, offset: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("result is not a finite number ({0})")]
    NonFinite(f64),
    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),
}

type Result<T> = std::result::Result<T, EvalError>;

/// Evaluate a formula sequence.
///
/// An empty sequence evaluates to `0`.
pub fn evaluate(items: &[FormulaItem]) -> Result<f64> {
    if items.is_empty() {
        return Ok(0.0);
    }

    let expression = collapse_parens(&build_expression(items)?);
    tracing::debug!(%expression, "evaluating formula");

    let result = evaluate_expression(&expression);
    if let Err(ref err) = result {
        tracing::debug!(%expression, %err, "formula evaluation failed");
    }
    result
}

/// Evaluate a formula and render the result for display.
///
/// Failures render as an empty string.
pub fn display_result(items: &[FormulaItem]) -> String {
    evaluate(items).map(format_result).unwrap_or_default()
}

/// Format a result as a plain number with at most ten decimals.
pub fn format_result(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let formatted = format!("{:.10}", value);
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        if trimmed == "-0" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

/// Serialize items left to right into expression text.
fn build_expression(items: &[FormulaItem]) -> Result<String> {
    let mut expression = String::new();

    for item in items {
        match item {
            FormulaItem::Tag(tag) => expression.push_str(&format!("({})", tag.value)),
            FormulaItem::Operator(op) => expression.push(op.as_char()),
            FormulaItem::Number(text) => {
                let value =
                    parse_number(text).ok_or_else(|| EvalError::InvalidNumber(text.clone()))?;
                expression.push_str(&format!("({})", value));
            }
        }
    }

    Ok(expression)
}

/// Collapse `((x))` into `(x)`.
fn collapse_parens(expression: &str) -> String {
    DOUBLE_PARENS.replace_all(expression, "($1)").into_owned()
}

/// Evaluate arithmetic expression text.
pub(crate) fn evaluate_expression(expression: &str) -> Result<f64> {
    let tokens = lex(expression)?;
    let value = Parser::new(tokens).parse()?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvalError::NonFinite(value))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum TokenKind {
    Num(f64),
    Op(Operator),
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

impl Token {
    fn text(&self) -> String {
        match self.kind {
            TokenKind::Num(value) => value.to_string(),
            TokenKind::Op(op) => op.to_string(),
        }
    }
}

fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut literal = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    literal.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            let value = parse_number(&literal).ok_or(EvalError::InvalidNumber(literal))?;
            tokens.push(Token {
                kind: TokenKind::Num(value),
                offset,
            });
        } else if let Some(op) = Operator::from_char(c) {
            tokens.push(Token {
                kind: TokenKind::Op(op),
                offset,
            });
            chars.next();
        } else {
            return Err(EvalError::UnexpectedChar { ch: c, offset });
        }
    }

    Ok(tokens)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None = 0,
    AddSub,
    MulDiv,
    Pow,
}

fn binary_precedence(op: Operator) -> Option<Precedence> {
    match op {
        Operator::Add | Operator::Sub => Some(Precedence::AddSub),
        Operator::Mul | Operator::Div => Some(Precedence::MulDiv),
        Operator::Pow => Some(Precedence::Pow),
        Operator::Open | Operator::Close => None,
    }
}

fn apply(op: Operator, left: f64, right: f64) -> f64 {
    match op {
        Operator::Add => left + right,
        Operator::Sub => left - right,
        Operator::Mul => left * right,
        Operator::Div => left / right,
        Operator::Pow => left.powf(right),
        Operator::Open | Operator::Close => unreachable!("parentheses are not binary operators"),
    }
}

/// Maximum nesting of sub-expressions (parentheses, signs, `^` chains).
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn parse(&mut self) -> Result<f64> {
        let value = self.parse_binary(Precedence::None)?;
        match self.tokens.get(self.pos) {
            Some(token) => Err(self.unexpected(token)),
            None => Ok(value),
        }
    }

    fn unexpected(&self, token: &Token) -> EvalError {
        EvalError::UnexpectedToken {
            token: token.text(),
            offset: token.offset,
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        let token = self
            .tokens
            .get(self.pos)
            .copied()
            .ok_or(EvalError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(token)
    }

    fn parse_binary(&mut self, min: Precedence) -> Result<f64> {
        if self.depth >= MAX_DEPTH {
            return Err(EvalError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = self.parse_operands(min);
        self.depth -= 1;
        result
    }

    fn parse_operands(&mut self, min: Precedence) -> Result<f64> {
        let mut left = self.parse_unary()?;

        while let Some(token) = self.tokens.get(self.pos) {
            let TokenKind::Op(op) = token.kind else {
                break;
            };
            let Some(prec) = binary_precedence(op) else {
                break;
            };
            if prec <= min {
                break;
            }
            self.pos += 1;

            // Recursing one level lower lets a following `^` bind to the right.
            let next_min = if op == Operator::Pow {
                Precedence::MulDiv
            } else {
                prec
            };
            let right = self.parse_binary(next_min)?;
            left = apply(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<f64> {
        let sign_allowed = self.pos == 0
            || matches!(
                self.tokens.get(self.pos - 1).map(|t| t.kind),
                Some(TokenKind::Op(Operator::Open))
            );

        if sign_allowed
            && let Some(Token {
                kind: TokenKind::Op(op @ (Operator::Add | Operator::Sub)),
                ..
            }) = self.tokens.get(self.pos).copied()
        {
            self.pos += 1;
            let operand = self.parse_binary(Precedence::MulDiv)?;
            return Ok(if op == Operator::Sub { -operand } else { operand });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<f64> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Num(value) => Ok(value),
            TokenKind::Op(Operator::Open) => {
                let value = self.parse_binary(Precedence::None)?;
                let close = self.next_token()?;
                if close.kind == TokenKind::Op(Operator::Close) {
                    Ok(value)
                } else {
                    Err(self.unexpected(&close))
                }
            }
            TokenKind::Op(_) => Err(self.unexpected(&token)),
        }
    }
}
