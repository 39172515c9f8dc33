//! Formula module for building and evaluating formulas.
//!
//! This module provides functionality to:
//! - Represent formula items (numbers, operators, tags)
//! - Detect whether typed text looks like a full expression
//! - Tokenize free text and classify single tokens into items
//! - Mutate a formula sequence at its cursor
//! - Evaluate a sequence to a number

mod classify;
mod detection;
mod evaluation;
mod item;
mod number;
mod sequence;
mod tokenize;

pub use classify::{ClassifyError, InsertionPlan, classify};
pub use detection::looks_like_expression;
pub use evaluation::{EvalError, display_result, evaluate, format_result};
pub use item::{FormulaItem, Operator, Tag};
pub use number::renormalize;
pub use sequence::{FormulaSequence, MemoryStore, SequenceError, SequenceStore};
pub use tokenize::{TokenizeError, tokenize};
