//! Formula input controller.
//!
//! Glues typed text and key presses to the formula core: Enter dispatches
//! text to the tokenizer or classifier, letters trigger tag suggestions, and
//! arrow keys move the cursor or the suggestion selection. The sequence lives
//! in a [`SequenceStore`]; every change is read from and written back to it.

use crate::formula::{
    FormulaSequence, SequenceStore, Tag, classify, display_result, looks_like_expression, tokenize,
};
use crate::suggest::{SuggestionItem, SuggestionSource};

/// Keys the controller reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Backspace,
    Enter,
}

fn has_letters(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_alphabetic())
}

/// Controller for a formula input line.
pub struct FormulaInput<S, P> {
    store: S,
    source: P,
    input: String,
    suggestions: Vec<SuggestionItem>,
    selected_suggestion: Option<usize>,
    show_suggestions: bool,
    /// Index of the tag whose suggestions replace it on confirm.
    editing_tag: Option<usize>,
    result: String,
}

impl<S: SequenceStore, P: SuggestionSource> FormulaInput<S, P> {
    pub fn new(store: S, source: P) -> Self {
        let result = display_result(store.get().items());
        Self {
            store,
            source,
            input: String::new(),
            suggestions: Vec::new(),
            selected_suggestion: None,
            show_suggestions: false,
            editing_tag: None,
            result,
        }
    }

    /// Current formula snapshot.
    pub fn sequence(&self) -> FormulaSequence {
        self.store.get()
    }

    /// Displayed result; empty when the formula does not evaluate.
    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn suggestions(&self) -> &[SuggestionItem] {
        &self.suggestions
    }

    pub fn selected_suggestion(&self) -> Option<usize> {
        self.selected_suggestion
    }

    pub fn showing_suggestions(&self) -> bool {
        self.show_suggestions && !self.suggestions.is_empty()
    }

    pub fn editing_tag(&self) -> Option<usize> {
        self.editing_tag
    }

    /// The formula line as text, tags rendered as `{{name}}`.
    pub fn render_formula(&self) -> String {
        self.store.get().render()
    }

    /// Replace the typed text.
    ///
    /// Text containing letters is a tag query: suggestions are fetched and the
    /// selection is reset.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.show_suggestions = has_letters(&self.input);

        if self.show_suggestions {
            self.selected_suggestion = None;
            self.suggestions = self.fetch_suggestions();
        } else {
            self.suggestions.clear();
        }
    }

    fn fetch_suggestions(&self) -> Vec<SuggestionItem> {
        if self.input.trim().is_empty() {
            return Vec::new();
        }

        match self.source.suggest(&self.input) {
            Ok(suggestions) => suggestions,
            Err(err) => {
                tracing::warn!(query = %self.input, "Suggestion lookup failed: {:#}", err);
                Vec::new()
            }
        }
    }

    /// Handle a key press. Returns `true` if the key was consumed.
    pub fn handle_key(&mut self, key: Key) -> bool {
        let sequence = self.store.get();

        match key {
            Key::Left if sequence.cursor() > 0 => {
                self.commit(sequence.move_left());
                self.editing_tag = None;
                true
            }
            Key::Right if sequence.cursor() < sequence.len() => {
                self.commit(sequence.move_right());
                self.editing_tag = None;
                true
            }
            Key::Backspace if self.input.is_empty() => {
                self.commit(sequence.delete_before_cursor());
                self.editing_tag = None;
                true
            }
            _ if self.showing_suggestions() => self.handle_suggestion_key(key),
            Key::Enter if !self.input.trim().is_empty() => {
                self.submit();
                true
            }
            _ => false,
        }
    }

    fn handle_suggestion_key(&mut self, key: Key) -> bool {
        let count = self.suggestions.len();

        match key {
            Key::Down => {
                self.selected_suggestion = match self.selected_suggestion {
                    Some(idx) if idx + 1 < count => Some(idx + 1),
                    _ => Some(0),
                };
                true
            }
            Key::Up => {
                self.selected_suggestion = match self.selected_suggestion {
                    Some(idx) if idx > 0 => Some(idx - 1),
                    _ => Some(count - 1),
                };
                true
            }
            Key::Enter => match self.selected_suggestion {
                Some(idx) => self.choose_suggestion(idx),
                None => false,
            },
            _ => false,
        }
    }

    /// Insert the typed text as formula items.
    ///
    /// Expression-like text goes through the tokenizer; anything else through
    /// the single-token classifier. Rejected text leaves the formula untouched.
    fn submit(&mut self) {
        let text = self.input.trim().to_string();

        let items = if looks_like_expression(&text) {
            match tokenize(&text) {
                Ok(items) => Some(items),
                Err(err) => {
                    tracing::warn!(%text, "Invalid expression: {}", err);
                    None
                }
            }
        } else {
            match classify(&text) {
                Ok(plan) => Some(plan.items()),
                Err(err) => {
                    tracing::debug!("{}", err);
                    None
                }
            }
        };

        if let Some(items) = items {
            tracing::debug!(count = items.len(), "inserting items at cursor");
            let next = self.store.get().insert_many_at_cursor(items);
            self.commit(next);
            self.editing_tag = None;
        }

        self.reset_input();
    }

    /// Confirm the suggestion at `index`.
    ///
    /// While a tag is being edited the suggestion replaces it; otherwise it is
    /// inserted at the cursor. Returns `false` if there is no such suggestion.
    pub fn choose_suggestion(&mut self, index: usize) -> bool {
        let Some(suggestion) = self.suggestions.get(index).cloned() else {
            return false;
        };
        let tag = Tag::from(suggestion);
        let sequence = self.store.get();

        let editing = self
            .editing_tag
            .filter(|&idx| sequence.get(idx).is_some_and(|item| item.is_tag()));

        let next = match editing {
            Some(idx) => match sequence.replace_at(idx, tag) {
                Ok(next) => next,
                Err(err) => {
                    tracing::warn!("Failed to replace tag: {}", err);
                    return false;
                }
            },
            None => sequence.insert_at_cursor(tag.into()),
        };

        self.commit(next);
        self.editing_tag = None;
        self.reset_input();
        true
    }

    /// Toggle editing of the tag at `index` and put the cursor right after it.
    ///
    /// Returns `false` if `index` does not hold a tag.
    pub fn click_tag(&mut self, index: usize) -> bool {
        let sequence = self.store.get();
        if !sequence.get(index).is_some_and(|item| item.is_tag()) {
            return false;
        }

        self.editing_tag = if self.editing_tag == Some(index) {
            None
        } else {
            Some(index)
        };
        self.commit(sequence.set_cursor(index + 1));
        self.reset_input();
        true
    }

    /// Empty the formula and the typed text.
    pub fn clear(&mut self) {
        let cleared = self.store.get().clear();
        self.commit(cleared);
        self.editing_tag = None;
        self.reset_input();
    }

    fn reset_input(&mut self) {
        self.input.clear();
        self.suggestions.clear();
        self.selected_suggestion = None;
        self.show_suggestions = false;
    }

    fn commit(&mut self, sequence: FormulaSequence) {
        self.result = display_result(sequence.items());
        self.store.set(sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{FormulaItem, MemoryStore};
    use crate::suggest::CatalogSource;

    struct FailingSource;

    impl SuggestionSource for FailingSource {
        fn suggest(&self, _query: &str) -> anyhow::Result<Vec<SuggestionItem>> {
            anyhow::bail!("network unreachable")
        }
    }

    fn catalog() -> CatalogSource {
        CatalogSource::from_json(
            r#"[
                {"id": "1", "name": "Salary", "value": 5000, "category": "income"},
                {"id": "2", "name": "Rent", "value": 1200, "category": "expense"},
                {"id": "3", "name": "Rental income", "value": 700, "category": "income"}
            ]"#,
        )
        .unwrap()
    }

    fn input() -> FormulaInput<MemoryStore, CatalogSource> {
        FormulaInput::new(MemoryStore::new(), catalog())
    }

    fn type_and_enter(input: &mut FormulaInput<MemoryStore, CatalogSource>, text: &str) {
        input.set_input(text);
        input.handle_key(Key::Enter);
    }

    #[test]
    fn test_expression_entry() {
        let mut input = input();
        assert_eq!(input.result(), "0");

        type_and_enter(&mut input, "5+10-4");
        assert_eq!(input.render_formula(), "5 + 10 - 4");
        assert_eq!(input.sequence().cursor(), 5);
        assert_eq!(input.result(), "11");
        assert_eq!(input.input(), "");
    }

    #[test]
    fn test_single_tokens() {
        let mut input = input();
        type_and_enter(&mut input, "007");
        type_and_enter(&mut input, "*3");
        type_and_enter(&mut input, "-");
        assert_eq!(input.render_formula(), "7 * 3 -");
        assert_eq!(input.result(), "");

        type_and_enter(&mut input, "1");
        assert_eq!(input.result(), "20");
    }

    #[test]
    fn test_rejected_text_leaves_formula_untouched() {
        let mut input = input();
        type_and_enter(&mut input, "2");
        type_and_enter(&mut input, "5++3");
        type_and_enter(&mut input, "%");
        assert_eq!(input.render_formula(), "2");
        assert_eq!(input.input(), "");
    }

    #[test]
    fn test_suggestion_navigation_and_insert() {
        let mut input = input();
        type_and_enter(&mut input, "10");
        type_and_enter(&mut input, "+");

        input.set_input("rent");
        assert!(input.showing_suggestions());
        assert_eq!(input.suggestions().len(), 2);
        assert_eq!(input.selected_suggestion(), None);

        // Enter without a selection does nothing
        assert!(!input.handle_key(Key::Enter));

        assert!(input.handle_key(Key::Down));
        assert!(input.handle_key(Key::Down));
        assert!(input.handle_key(Key::Down));
        assert_eq!(input.selected_suggestion(), Some(0));
        assert!(input.handle_key(Key::Up));
        assert_eq!(input.selected_suggestion(), Some(1));

        let chosen = input.suggestions()[1].clone();
        assert!(input.handle_key(Key::Enter));
        assert_eq!(
            input.sequence().get(2),
            Some(&FormulaItem::Tag(chosen.clone().into()))
        );
        assert_eq!(input.result(), format!("{}", 10.0 + chosen.value));
        assert!(!input.showing_suggestions());
    }

    #[test]
    fn test_edit_tag_replaces_in_place() {
        let mut input = input();
        input.set_input("salary");
        assert!(input.choose_suggestion(0));
        type_and_enter(&mut input, "-100");
        assert_eq!(input.result(), "4900");

        assert!(input.click_tag(0));
        assert_eq!(input.editing_tag(), Some(0));
        assert_eq!(input.sequence().cursor(), 1);

        input.set_input("Rent");
        let rent = input
            .suggestions()
            .iter()
            .position(|s| s.name == "Rent")
            .unwrap();
        assert!(input.choose_suggestion(rent));

        assert_eq!(input.render_formula(), "{{Rent}} - 100");
        assert_eq!(input.sequence().cursor(), 1);
        assert_eq!(input.editing_tag(), None);
        assert_eq!(input.result(), "1100");
    }

    #[test]
    fn test_click_tag_toggles() {
        let mut input = input();
        input.set_input("salary");
        input.choose_suggestion(0);

        assert!(input.click_tag(0));
        assert!(input.click_tag(0));
        assert_eq!(input.editing_tag(), None);
        assert!(!input.click_tag(3));
    }

    #[test]
    fn test_cursor_keys_and_backspace() {
        let mut input = input();
        type_and_enter(&mut input, "1+2");

        assert!(input.handle_key(Key::Left));
        assert!(input.handle_key(Key::Backspace));
        assert_eq!(input.render_formula(), "1 2");
        assert_eq!(input.result(), "");
        assert_eq!(input.sequence().cursor(), 1);

        type_and_enter(&mut input, "*");
        assert_eq!(input.render_formula(), "1 * 2");
        assert_eq!(input.result(), "2");

        assert!(input.handle_key(Key::Right));
        assert!(!input.handle_key(Key::Right));
        input.handle_key(Key::Left);
        input.handle_key(Key::Left);
        input.handle_key(Key::Left);
        assert!(!input.handle_key(Key::Left));
        assert!(input.handle_key(Key::Backspace));
        assert_eq!(input.sequence().len(), 3);
    }

    #[test]
    fn test_backspace_with_text_is_ignored() {
        let mut input = input();
        type_and_enter(&mut input, "4");
        input.set_input("9");
        assert!(!input.handle_key(Key::Backspace));
        assert_eq!(input.sequence().len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut input = input();
        type_and_enter(&mut input, "(2+3)*4");
        assert_eq!(input.result(), "20");

        input.clear();
        assert!(input.sequence().is_empty());
        assert_eq!(input.sequence().cursor(), 0);
        assert_eq!(input.result(), "0");
    }

    #[test]
    fn test_failing_source_means_no_suggestions() {
        let mut input = FormulaInput::new(MemoryStore::new(), FailingSource);
        input.set_input("rent");
        assert!(input.suggestions().is_empty());
        assert!(!input.showing_suggestions());
    }

    #[test]
    fn test_digits_do_not_query_suggestions() {
        let mut input = input();
        input.set_input("12");
        assert!(!input.showing_suggestions());
        input.handle_key(Key::Enter);
        assert_eq!(
            input.sequence().items(),
            &[FormulaItem::number("12")][..]
        );
    }
}
