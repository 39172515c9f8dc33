//! Core of a formula input widget.
//!
//! A formula is a flat sequence of number literals, operator characters and
//! tags (named, categorized numeric values). This crate turns typed text into
//! formula items, keeps the sequence and its cursor consistent, and evaluates
//! the formula with a small arithmetic parser.

pub mod config;
pub mod formula;
pub mod input;
pub mod suggest;
