//! Formula sequence with an insertion cursor.
//!
//! Every mutator takes the current snapshot by reference and returns a new
//! one, so the evaluator and renderer never observe a half-applied change.
//! The cursor is always within `0..=len`.

use super::item::{FormulaItem, Tag};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("index {index} is out of range for a formula of length {len}")]
    OutOfRange { index: usize, len: usize },
    #[error("item at index {0} is not a tag")]
    NotATag(usize),
}

/// An ordered list of formula items plus the cursor position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormulaSequence {
    items: Vec<FormulaItem>,
    cursor: usize,
}

impl FormulaSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence from items, with the cursor at the end.
    pub fn from_items(items: Vec<FormulaItem>) -> Self {
        let cursor = items.len();
        Self { items, cursor }
    }

    pub fn items(&self) -> &[FormulaItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&FormulaItem> {
        self.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index before which new items are inserted.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Insert one item at the cursor and advance the cursor past it.
    pub fn insert_at_cursor(&self, item: FormulaItem) -> Self {
        self.insert_many_at_cursor(vec![item])
    }

    /// Insert items as one contiguous block at the cursor, preserving their order.
    pub fn insert_many_at_cursor(&self, items: Vec<FormulaItem>) -> Self {
        let mut next = self.clone();
        let count = items.len();
        next.items.splice(next.cursor..next.cursor, items);
        next.cursor += count;
        next
    }

    /// Remove the item just before the cursor. No-op at position 0.
    pub fn delete_before_cursor(&self) -> Self {
        let mut next = self.clone();
        if next.cursor > 0 {
            next.items.remove(next.cursor - 1);
            next.cursor -= 1;
        }
        next
    }

    /// Replace the tag at `index` with another tag. The cursor is unchanged.
    pub fn replace_at(&self, index: usize, tag: Tag) -> Result<Self, SequenceError> {
        match self.items.get(index) {
            None => Err(SequenceError::OutOfRange {
                index,
                len: self.items.len(),
            }),
            Some(item) if !item.is_tag() => Err(SequenceError::NotATag(index)),
            Some(_) => {
                let mut next = self.clone();
                next.items[index] = FormulaItem::Tag(tag);
                Ok(next)
            }
        }
    }

    /// Empty the sequence and reset the cursor.
    pub fn clear(&self) -> Self {
        Self::new()
    }

    /// Move the cursor, clamped to the sequence bounds.
    pub fn set_cursor(&self, cursor: usize) -> Self {
        Self {
            items: self.items.clone(),
            cursor: cursor.min(self.items.len()),
        }
    }

    pub fn move_left(&self) -> Self {
        self.set_cursor(self.cursor.saturating_sub(1))
    }

    pub fn move_right(&self) -> Self {
        self.set_cursor(self.cursor + 1)
    }

    /// Render the items as a line of text, tags as `{{name}}`.
    pub fn render(&self) -> String {
        self.items
            .iter()
            .map(|item| item.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Storage for the current formula sequence.
///
/// Callers read the current snapshot, compute a new one and write it back;
/// nothing holds on to a sequence between calls.
pub trait SequenceStore {
    fn get(&self) -> FormulaSequence;
    fn set(&mut self, sequence: FormulaSequence);
}

/// In-memory sequence store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    sequence: FormulaSequence,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceStore for MemoryStore {
    fn get(&self) -> FormulaSequence {
        self.sequence.clone()
    }

    fn set(&mut self, sequence: FormulaSequence) {
        self.sequence = sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::item::Operator;

    fn tag(id: &str, value: f64) -> Tag {
        Tag::new(id, format!("tag-{}", id), value, "income")
    }

    fn assert_cursor_in_bounds(seq: &FormulaSequence) {
        assert!(seq.cursor() <= seq.len());
    }

    #[test]
    fn test_insert_advances_cursor() {
        let seq = FormulaSequence::new()
            .insert_at_cursor(FormulaItem::number("1"))
            .insert_at_cursor(Operator::Add.into());
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.cursor(), 2);
    }

    #[test]
    fn test_insert_in_the_middle() {
        let seq = FormulaSequence::from_items(vec![
            FormulaItem::number("1"),
            FormulaItem::number("3"),
        ])
        .set_cursor(1)
        .insert_many_at_cursor(vec![Operator::Add.into(), FormulaItem::number("2")]);

        assert_eq!(seq.render(), "1 + 2 3");
        assert_eq!(seq.cursor(), 3);
    }

    #[test]
    fn test_tag_round_trip() {
        let t = tag("9", 42.0);
        let seq = FormulaSequence::new()
            .insert_at_cursor(FormulaItem::number("1"))
            .insert_at_cursor(t.clone().into());
        assert_eq!(seq.get(1), Some(&FormulaItem::Tag(t)));
    }

    #[test]
    fn test_snapshots_are_independent() {
        let before = FormulaSequence::new().insert_at_cursor(FormulaItem::number("1"));
        let after = before.insert_at_cursor(Operator::Mul.into());
        assert_eq!(before.len(), 1);
        assert_eq!(after.len(), 2);
    }

    #[test]
    fn test_delete_before_cursor() {
        let empty = FormulaSequence::new().delete_before_cursor();
        assert!(empty.is_empty());
        assert_eq!(empty.cursor(), 0);

        let seq = FormulaSequence::from_items(vec![
            FormulaItem::number("1"),
            Operator::Add.into(),
            FormulaItem::number("2"),
        ])
        .set_cursor(2)
        .delete_before_cursor();
        assert_eq!(seq.render(), "1 2");
        assert_eq!(seq.cursor(), 1);

        let start = seq.set_cursor(0).delete_before_cursor();
        assert_eq!(start.len(), 2);
    }

    #[test]
    fn test_replace_at() {
        let seq = FormulaSequence::from_items(vec![
            tag("1", 10.0).into(),
            Operator::Add.into(),
            FormulaItem::number("2"),
        ])
        .set_cursor(1);

        let replaced = seq.replace_at(0, tag("2", 20.0)).unwrap();
        assert_eq!(replaced.get(0).and_then(|i| i.as_tag()), Some(&tag("2", 20.0)));
        assert_eq!(replaced.cursor(), 1);

        assert_eq!(
            seq.replace_at(1, tag("3", 1.0)),
            Err(SequenceError::NotATag(1))
        );
        assert_eq!(
            seq.replace_at(5, tag("3", 1.0)),
            Err(SequenceError::OutOfRange { index: 5, len: 3 })
        );
    }

    #[test]
    fn test_clear() {
        let seq = FormulaSequence::from_items(vec![FormulaItem::number("4")]).clear();
        assert!(seq.is_empty());
        assert_eq!(seq.cursor(), 0);
    }

    #[test]
    fn test_cursor_clamped() {
        let seq = FormulaSequence::from_items(vec![FormulaItem::number("4")]);
        assert_eq!(seq.set_cursor(10).cursor(), 1);
        assert_eq!(seq.move_right().cursor(), 1);
        assert_eq!(seq.set_cursor(0).move_left().cursor(), 0);
    }

    #[test]
    fn test_cursor_invariant_over_mixed_mutations() {
        let mut seq = FormulaSequence::new();
        for step in 0..40 {
            seq = match step % 7 {
                0 => seq.insert_at_cursor(FormulaItem::number("1")),
                1 => seq.move_left(),
                2 => seq.insert_many_at_cursor(vec![Operator::Sub.into(), tag("x", 2.0).into()]),
                3 => seq.delete_before_cursor(),
                4 => seq.move_right(),
                5 => seq.set_cursor(step),
                _ => {
                    if step % 3 == 0 {
                        seq.clear()
                    } else {
                        seq.delete_before_cursor()
                    }
                }
            };
            assert_cursor_in_bounds(&seq);
        }
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.get().is_empty());
        let next = store.get().insert_at_cursor(FormulaItem::number("3"));
        store.set(next.clone());
        assert_eq!(store.get(), next);
    }
}
