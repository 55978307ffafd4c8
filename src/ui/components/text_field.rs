use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::Theme;
use crate::ui::{Component, EventResult, Result};

/// Single-line labelled input that lives inside a form.
///
/// Editing keys are handled here; Enter, Esc and focus movement are left to
/// the owning form.
pub struct TextField {
    label: String,
    value: String,
    /// Cursor position in characters, not bytes.
    cursor: usize,
    placeholder: Option<String>,
    focused: bool,
}

impl TextField {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: String::new(),
            cursor: 0,
            placeholder: None,
            focused: false,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub const fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    fn char_count(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map_or(self.value.len(), |(i, _)| i)
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    fn delete_char_before_cursor(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_offset(self.cursor);
            self.value.remove(at);
        }
    }

    fn delete_char_at_cursor(&mut self) {
        if self.cursor < self.char_count() {
            let at = self.byte_offset(self.cursor);
            self.value.remove(at);
        }
    }

    fn delete_word_before_cursor(&mut self) {
        let chars: Vec<char> = self.value.chars().collect();
        let mut pos = self.cursor;
        while pos > 0 && chars[pos - 1] == ' ' {
            pos -= 1;
        }
        while pos > 0 && chars[pos - 1] != ' ' {
            pos -= 1;
        }
        let (start, end) = (self.byte_offset(pos), self.byte_offset(self.cursor));
        self.value.drain(start..end);
        self.cursor = pos;
    }
}

impl Component for TextField {
    type Output = ();

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        Ok(match (key.code, key.modifiers) {
            (KeyCode::Backspace, KeyModifiers::ALT)
            | (KeyCode::Char('w'), KeyModifiers::CONTROL) => {
                self.delete_word_before_cursor();
                EventResult::Consumed
            }
            (KeyCode::Backspace, _) => {
                self.delete_char_before_cursor();
                EventResult::Consumed
            }
            (KeyCode::Delete, _) => {
                self.delete_char_at_cursor();
                EventResult::Consumed
            }
            (KeyCode::Left, _) => {
                self.cursor = self.cursor.saturating_sub(1);
                EventResult::Consumed
            }
            (KeyCode::Right, _) => {
                self.cursor = (self.cursor + 1).min(self.char_count());
                EventResult::Consumed
            }
            (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
                self.cursor = 0;
                EventResult::Consumed
            }
            (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.cursor = self.char_count();
                EventResult::Consumed
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.clear();
                EventResult::Consumed
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.insert_char(c);
                EventResult::Consumed
            }
            _ => EventResult::Ignored,
        })
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let input_style = Style::default().fg(theme.text);
        let cursor_style = Style::default()
            .fg(theme.base)
            .bg(theme.text)
            .add_modifier(Modifier::BOLD);
        let placeholder_style = Style::default().fg(theme.muted());

        let line = match (&self.placeholder, self.focused) {
            (Some(placeholder), focused) if self.value.is_empty() => {
                let mut spans = Vec::new();
                if focused {
                    spans.push(Span::styled(" ", cursor_style));
                }
                spans.push(Span::styled(placeholder.clone(), placeholder_style));
                Line::from(spans)
            }
            (_, true) => {
                let before: String = self.value.chars().take(self.cursor).collect();
                let mut rest = self.value.chars().skip(self.cursor);
                let at_cursor = rest.next().unwrap_or(' ');
                Line::from(vec![
                    Span::styled(before, input_style),
                    Span::styled(at_cursor.to_string(), cursor_style),
                    Span::styled(rest.collect::<String>(), input_style),
                ])
            }
            (_, false) => Line::from(Span::styled(self.value.clone(), input_style)),
        };

        let (border_color, title_color) = if self.focused {
            (theme.border_focused(), theme.mauve)
        } else {
            (theme.border(), theme.subtext0)
        };

        let block = Block::default()
            .title(format!(" {} ", self.label))
            .title_style(Style::default().fg(title_color))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        frame.render_widget(Paragraph::new(line).block(block), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::{char_key, key};

    fn type_text(field: &mut TextField, text: &str) {
        for c in text.chars() {
            field.handle_key(char_key(c)).unwrap();
        }
    }

    #[test]
    fn test_typing_and_cursor_editing() {
        let mut field = TextField::new("Name");
        type_text(&mut field, "Bill Gtes");
        for _ in 0..3 {
            field.handle_key(key(KeyCode::Left)).unwrap();
        }
        type_text(&mut field, "a");
        assert_eq!(field.value(), "Bill Gates");

        field.handle_key(key(KeyCode::End)).unwrap();
        field.handle_key(key(KeyCode::Backspace)).unwrap();
        assert_eq!(field.value(), "Bill Gate");
    }

    #[test]
    fn test_multibyte_characters() {
        let mut field = TextField::new("Name");
        type_text(&mut field, "José");
        field.handle_key(key(KeyCode::Backspace)).unwrap();
        type_text(&mut field, "é");
        field.handle_key(key(KeyCode::Home)).unwrap();
        field.handle_key(key(KeyCode::Delete)).unwrap();
        assert_eq!(field.value(), "osé");
    }

    #[test]
    fn test_delete_word() {
        let mut field = TextField::new("Email");
        type_text(&mut field, "bill gates ");
        field
            .handle_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::ALT))
            .unwrap();
        assert_eq!(field.value(), "bill ");
    }

    #[test]
    fn test_form_keys_are_left_to_parent() {
        let mut field = TextField::new("Name");
        assert_eq!(field.handle_key(key(KeyCode::Enter)).unwrap(), EventResult::Ignored);
        assert_eq!(field.handle_key(key(KeyCode::Esc)).unwrap(), EventResult::Ignored);
        assert_eq!(field.handle_key(key(KeyCode::Tab)).unwrap(), EventResult::Ignored);
    }
}
