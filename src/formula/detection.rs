//! Expression detection for typed formula text.
//!
//! Decides whether text submitted with Enter looks like a multi-token
//! expression (handed to the tokenizer) rather than a single value or
//! operator (handed to the classifier).

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// A run of at least three digit, operator or parenthesis characters.
    static ref EXPRESSION_RUN: Regex = Regex::new(r"[0-9+\-*/^()]{3,}").unwrap();

    /// Any operator or parenthesis character.
    static ref HAS_OPERATOR: Regex = Regex::new(r"[+\-*/^()]").unwrap();
}

/// Check if input looks like a full mini-expression.
///
/// Returns `true` if the trimmed input:
/// 1. Contains at least one operator or parenthesis
/// 2. Contains a run of three or more digit/operator/parenthesis characters
pub fn looks_like_expression(input: &str) -> bool {
    let trimmed = input.trim();
    HAS_OPERATOR.is_match(trimmed) && EXPRESSION_RUN.is_match(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expressions_accepted() {
        assert!(looks_like_expression("5+10-4"));
        assert!(looks_like_expression("2^8"));
        assert!(looks_like_expression("(2+3)*4"));
        assert!(looks_like_expression("+55"));
        assert!(looks_like_expression("  1/3  "));
    }

    #[test]
    fn test_single_tokens_rejected() {
        assert!(!looks_like_expression("+5"));
        assert!(!looks_like_expression("123"));
        assert!(!looks_like_expression("42.5"));
        assert!(!looks_like_expression("*"));
        assert!(!looks_like_expression(""));
    }

    #[test]
    fn test_split_runs_rejected() {
        // Decimal points break the run, as do letters.
        assert!(!looks_like_expression("1.5*.2"));
        assert!(!looks_like_expression("rent+1"));
        assert!(looks_like_expression("1.5+22"));
    }
}
