//! Free-text tokenizer.
//!
//! Splits a typed mini-expression such as `5+10-4` into formula items. The
//! whole text must evaluate before anything is produced, so a rejected text
//! never causes a partial insertion.

use super::evaluation::{EvalError, evaluate_expression};
use super::item::{FormulaItem, Operator};
use super::number::{is_operator_char, renormalize};
use thiserror::Error;

/// Why free text could not be tokenized.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TokenizeError {
    #[error("nothing to tokenize")]
    Empty,
    #[error("character '{ch}' at offset {offset} is not part of an expression")]
    InvalidCharacter { ch: char, offset: usize },
    #[error("expression does not evaluate: {0}")]
    NotEvaluable(#[from] EvalError),
}

fn is_expression_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.' || is_operator_char(c)
}

/// Tokenize free text into formula items, in source order.
///
/// Only digits, `.` and the operator characters are accepted; anything else
/// (letters naming tags, whitespace inside the text) rejects the whole input.
pub fn tokenize(text: &str) -> Result<Vec<FormulaItem>, TokenizeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TokenizeError::Empty);
    }

    if let Some((offset, ch)) = text.char_indices().find(|&(_, c)| !is_expression_char(c)) {
        return Err(TokenizeError::InvalidCharacter { ch, offset });
    }

    evaluate_expression(text)?;

    let mut items = Vec::new();
    let mut literal = String::new();

    for c in text.chars() {
        match Operator::from_char(c) {
            Some(op) => {
                flush_literal(&mut literal, &mut items)?;
                items.push(FormulaItem::Operator(op));
            }
            None => literal.push(c),
        }
    }
    flush_literal(&mut literal, &mut items)?;

    tracing::debug!(%text, count = items.len(), "tokenized expression");
    Ok(items)
}

fn flush_literal(literal: &mut String, items: &mut Vec<FormulaItem>) -> Result<(), TokenizeError> {
    if literal.is_empty() {
        return Ok(());
    }

    let normalized =
        renormalize(literal).ok_or_else(|| EvalError::InvalidNumber(literal.clone()))?;
    items.push(FormulaItem::Number(normalized));
    literal.clear();
    Ok(())
}
