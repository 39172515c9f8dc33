//! Numeric literal helpers shared by the classifier, tokenizer and evaluator.

use super::item::Operator;

/// Check if a character belongs to the fixed operator set.
pub fn is_operator_char(c: char) -> bool {
    Operator::from_char(c).is_some()
}

/// Parse a number literal.
///
/// Accepts an optional sign followed by digits and at most one decimal point,
/// with at least one digit. Words such as `inf` or `NaN` are not numbers here.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let unsigned = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);

    let digits = unsigned.chars().filter(|c| c.is_ascii_digit()).count();
    let dots = unsigned.chars().filter(|&c| c == '.').count();
    if digits == 0 || dots > 1 || digits + dots != unsigned.len() {
        return None;
    }

    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Render a number in its canonical decimal form.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Covers -0 as well.
        return "0".to_string();
    }
    format!("{}", value)
}

/// Convert a literal's text to its canonical decimal form.
///
/// Strips leading zeros and redundant trailing fractional zeros, e.g.
/// `"007"` becomes `"7"` and `"2.50"` becomes `"2.5"`. Returns `None` if the
/// text is not a number.
pub fn renormalize(text: &str) -> Option<String> {
    parse_number(text).map(format_number)
}
