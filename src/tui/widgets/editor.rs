use ratatui::layout::Rect;

/// Single-line text input with a char-indexed cursor and undo history
#[derive(Debug, Clone, Default)]
pub struct Editor {
    chars: Vec<char>,
    pub cursor: usize,
    /// First visible column when the text is wider than its field
    pub scroll_col: usize,
    undo_stack: Vec<(Vec<char>, usize)>,
}

const MAX_HISTORY: usize = 100;

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_string(content: &str) -> Self {
        let chars: Vec<char> = content.chars().filter(|c| *c != '\n').collect();
        let cursor = chars.len();
        Self {
            chars,
            cursor,
            scroll_col: 0,
            undo_stack: Vec::new(),
        }
    }

    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn is_blank(&self) -> bool {
        self.chars.iter().all(|c| c.is_whitespace())
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    fn record(&mut self) {
        if self.undo_stack.len() == MAX_HISTORY {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push((self.chars.clone(), self.cursor));
    }

    /// Replace the whole text, undoable
    pub fn set_text(&mut self, text: &str) {
        self.record();
        self.chars = text.chars().filter(|c| *c != '\n').collect();
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        if !self.chars.is_empty() {
            self.set_text("");
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        self.record();
        self.chars.insert(self.cursor, ch);
        self.cursor += 1;
    }

    /// Backspace
    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.record();
        self.cursor -= 1;
        self.chars.remove(self.cursor);
    }

    /// Delete key
    pub fn delete_forward(&mut self) {
        if self.cursor >= self.chars.len() {
            return;
        }
        self.record();
        self.chars.remove(self.cursor);
    }

    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some((chars, cursor)) => {
                self.chars = chars;
                self.cursor = cursor;
                true
            }
            None => false,
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.chars.len());
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.chars.len();
    }

    pub fn move_cursor_word_left(&mut self) {
        let mut i = self.cursor;
        while i > 0 && self.chars[i - 1].is_whitespace() {
            i -= 1;
        }
        while i > 0 && !self.chars[i - 1].is_whitespace() {
            i -= 1;
        }
        self.cursor = i;
    }

    pub fn move_cursor_word_right(&mut self) {
        let len = self.chars.len();
        let mut i = self.cursor;
        while i < len && !self.chars[i].is_whitespace() {
            i += 1;
        }
        while i < len && self.chars[i].is_whitespace() {
            i += 1;
        }
        self.cursor = i;
    }

    /// Keep the cursor inside a field `width` columns wide
    pub fn update_horizontal_scroll(&mut self, width: usize) {
        if width == 0 {
            return;
        }
        if self.cursor < self.scroll_col {
            self.scroll_col = self.cursor;
        } else if self.cursor >= self.scroll_col + width {
            self.scroll_col = self.cursor + 1 - width;
        }
    }

    /// The slice of text visible in a field `width` columns wide
    pub fn visible_text(&self, width: usize) -> String {
        self.chars.iter().skip(self.scroll_col).take(width).collect()
    }

    /// Screen position of the cursor inside `area` (the field's inner area)
    pub fn cursor_screen_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let col = self.cursor.checked_sub(self.scroll_col)?;
        if col >= area.width as usize || area.height == 0 {
            return None;
        }
        Some((area.x + col as u16, area.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> Editor {
        let mut editor = Editor::new();
        for ch in text.chars() {
            editor.insert_char(ch);
        }
        editor
    }

    #[test]
    fn typing_and_backspace_respect_cursor() {
        let mut editor = typed("helo");
        editor.move_cursor_left();
        editor.insert_char('l');
        assert_eq!(editor.text(), "hello");

        editor.move_cursor_home();
        editor.delete_char();
        assert_eq!(editor.text(), "hello");
        editor.delete_forward();
        assert_eq!(editor.text(), "ello");
    }

    #[test]
    fn newlines_are_ignored() {
        let mut editor = typed("a\nb");
        assert_eq!(editor.text(), "ab");
        editor.set_text("x\ny");
        assert_eq!(editor.text(), "xy");
    }

    #[test]
    fn undo_restores_previous_text() {
        let mut editor = typed("ab");
        editor.set_text("replaced");
        assert!(editor.undo());
        assert_eq!(editor.text(), "ab");
        assert_eq!(editor.cursor, 2);
        assert!(editor.undo());
        assert!(editor.undo());
        assert!(!editor.undo());
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn word_motion_skips_whitespace() {
        let mut editor = Editor::from_string("buy  oat milk");
        editor.move_cursor_word_left();
        assert_eq!(editor.cursor, 9);
        editor.move_cursor_word_left();
        assert_eq!(editor.cursor, 5);
        editor.move_cursor_home();
        editor.move_cursor_word_right();
        assert_eq!(editor.cursor, 5);
    }

    #[test]
    fn horizontal_scroll_follows_cursor() {
        let mut editor = Editor::from_string("abcdefghij");
        editor.update_horizontal_scroll(4);
        assert_eq!(editor.scroll_col, 7);
        assert_eq!(editor.visible_text(4), "hij");
        assert_eq!(editor.cursor_screen_pos(Rect::new(10, 5, 4, 1)), Some((13, 5)));

        editor.move_cursor_home();
        editor.update_horizontal_scroll(4);
        assert_eq!(editor.scroll_col, 0);
        assert_eq!(editor.visible_text(4), "abcd");
    }

    #[test]
    fn blank_detection() {
        assert!(Editor::from_string("   ").is_blank());
        assert!(!Editor::from_string(" a ").is_blank());
    }
}
