//! Input widgets the chat controller reads from.

use crate::endpoint::Endpoint;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line text field with a character cursor.
#[derive(Debug, Clone, Default)]
pub struct InputField {
    value: String,
    cursor: usize,
}

impl InputField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Cursor position, in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_value(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.value, self.cursor);
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let byte_pos = char_to_byte_index(&self.value, self.cursor);
            self.value.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.value.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.value.chars().count();
    }
}

/// Drop-down style selector over endpoint names.
///
/// Options are plain strings, like the values of an HTML `<select>`; the
/// controller maps them through [`Endpoint::from_selection`] at send time.
#[derive(Debug, Clone)]
pub struct EndpointSelector {
    options: Vec<String>,
    selected: usize,
}

impl Default for EndpointSelector {
    fn default() -> Self {
        Self::new(Endpoint::default())
    }
}

impl EndpointSelector {
    /// Selector over every known endpoint with `initial` selected.
    pub fn new(initial: Endpoint) -> Self {
        let all = Endpoint::all();
        let selected = all.iter().position(|e| *e == initial).unwrap_or(0);
        Self {
            options: all.iter().map(|e| e.as_str().to_string()).collect(),
            selected,
        }
    }

    pub fn with_options(options: Vec<String>, selected: usize) -> Self {
        Self { options, selected }
    }

    /// Current option value, or "" if there are no options.
    pub fn value(&self) -> &str {
        self.options
            .get(self.selected)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::from_selection(self.value())
    }

    pub fn select_next(&mut self) {
        if !self.options.is_empty() {
            self.selected = (self.selected + 1) % self.options.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.options.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.options.len() - 1);
        }
    }
}
