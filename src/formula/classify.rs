//! Single-token classification.
//!
//! Short typed text is either an operator followed by a number (`+5`), a
//! bare number (`12.5`) or a bare operator (`*`). Anything else is left to
//! suggestion-based insertion.

use super::item::{FormulaItem, Operator};
use super::number::renormalize;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// An arithmetic operator directly followed by a number, e.g. `*2.5`.
    static ref OPERATOR_NUMBER: Regex = Regex::new(r"^([+\-*/^])([0-9.]+)$").unwrap();

    /// A plain unsigned number with optional decimals.
    static ref PLAIN_NUMBER: Regex = Regex::new(r"^[0-9]+(\.[0-9]+)?$").unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("'{0}' is not a number or operator")]
    NoMatch(String),
}

/// What to insert at the cursor for a classified token.
#[derive(Clone, Debug, PartialEq)]
pub enum InsertionPlan {
    /// Insert the operator, then the renormalized number.
    OperatorNumber(Operator, String),
    /// Insert a renormalized number.
    Number(String),
    /// Insert a single operator.
    Operator(Operator),
}

impl InsertionPlan {
    /// The items to insert, in order.
    pub fn items(&self) -> Vec<FormulaItem> {
        match self {
            Self::OperatorNumber(op, number) => {
                vec![FormulaItem::Operator(*op), FormulaItem::number(number.as_str())]
            }
            Self::Number(number) => vec![FormulaItem::number(number.as_str())],
            Self::Operator(op) => vec![FormulaItem::Operator(*op)],
        }
    }
}

/// Classify trimmed text as a single insertable token.
pub fn classify(text: &str) -> Result<InsertionPlan, ClassifyError> {
    let trimmed = text.trim();
    let no_match = || ClassifyError::NoMatch(trimmed.to_string());

    if let Some(caps) = OPERATOR_NUMBER.captures(trimmed) {
        let op = caps[1]
            .chars()
            .next()
            .and_then(Operator::from_char)
            .ok_or_else(no_match)?;
        let number = renormalize(&caps[2]).ok_or_else(no_match)?;
        return Ok(InsertionPlan::OperatorNumber(op, number));
    }

    if PLAIN_NUMBER.is_match(trimmed) {
        let number = renormalize(trimmed).ok_or_else(no_match)?;
        return Ok(InsertionPlan::Number(number));
    }

    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next())
        && let Some(op) = Operator::from_char(c)
    {
        return Ok(InsertionPlan::Operator(op));
    }

    Err(no_match())
}
