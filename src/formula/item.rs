//! Formula items: the building blocks of a formula sequence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the fixed operator characters `+ - * / ^ ( )`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Open,
    Close,
}

impl Operator {
    /// Every operator, in the order the characters are listed in the operator set.
    pub const ALL: [Operator; 7] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Pow,
        Self::Open,
        Self::Close,
    ];

    /// Look up the operator for a character, if it is one.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Add),
            '-' => Some(Self::Sub),
            '*' => Some(Self::Mul),
            '/' => Some(Self::Div),
            '^' => Some(Self::Pow),
            '(' => Some(Self::Open),
            ')' => Some(Self::Close),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Add => '+',
            Self::Sub => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Pow => '^',
            Self::Open => '(',
            Self::Close => ')',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A named, categorized value that stands in for a number inside a formula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Opaque identifier from the suggestion source.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Numeric value used during evaluation.
    pub value: f64,
    /// Category (e.g. "income", "expense").
    pub category: String,
}

impl Tag {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        value: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value,
            category: category.into(),
        }
    }
}

/// A single entry of a formula sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum FormulaItem {
    /// A number kept as text so the user's digits survive until evaluation.
    Number(String),
    /// An operator or parenthesis.
    Operator(Operator),
    /// A tag reference.
    Tag(Tag),
}

impl FormulaItem {
    /// Shorthand for a number literal item.
    pub fn number(text: impl Into<String>) -> Self {
        Self::Number(text.into())
    }

    /// Check if this item is a tag.
    pub fn is_tag(&self) -> bool {
        matches!(self, Self::Tag(_))
    }

    /// Get the tag if this item is one.
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Self::Tag(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Renders the item the way the formula line shows it: tags as `{{name}}`.
impl fmt::Display for FormulaItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(text) => write!(f, "{}", text),
            Self::Operator(op) => write!(f, "{}", op),
            Self::Tag(tag) => write!(f, "{{{{{}}}}}", tag.name),
        }
    }
}

// Convenient From implementations

impl From<Operator> for FormulaItem {
    fn from(op: Operator) -> Self {
        Self::Operator(op)
    }
}

impl From<Tag> for FormulaItem {
    fn from(tag: Tag) -> Self {
        Self::Tag(tag)
    }
}
