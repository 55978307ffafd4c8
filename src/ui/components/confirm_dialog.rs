use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

use crate::Theme;
use crate::config::{DialogAction, KeyResolver};
use crate::ui::{Component, EventResult, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmEvent {
    Confirmed,
    Cancelled,
}

#[derive(Default, Clone, Copy)]
enum ConfirmStyle {
    #[default]
    Normal,
    /// Shows red warning styling.
    Danger,
}

pub struct ConfirmDialog {
    title: String,
    message: String,
    confirm_text: String,
    cancel_text: String,
    style: ConfirmStyle,
    resolver: Arc<KeyResolver>,
}

impl ConfirmDialog {
    pub fn new(message: impl Into<String>, resolver: Arc<KeyResolver>) -> Self {
        Self {
            title: "Confirm".to_string(),
            message: message.into(),
            confirm_text: "Yes".to_string(),
            cancel_text: "No".to_string(),
            style: ConfirmStyle::Normal,
            resolver,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub const fn danger(mut self) -> Self {
        self.style = ConfirmStyle::Danger;
        self
    }
}

impl Component for ConfirmDialog {
    type Output = ConfirmEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if self.resolver.matches_dialog(&key, DialogAction::Confirm) {
            return Ok(ConfirmEvent::Confirmed.into());
        }
        if self.resolver.matches_dialog(&key, DialogAction::Cancel) {
            return Ok(ConfirmEvent::Cancelled.into());
        }
        // Modal: nothing below sees the key
        Ok(EventResult::Consumed)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup_area = area.centered(Constraint::Percentage(60), Constraint::Length(7));
        frame.render_widget(Clear, popup_area);

        let (title_color, border_color, confirm_color) = match self.style {
            ConfirmStyle::Normal => (theme.mauve, theme.lavender, theme.green),
            ConfirmStyle::Danger => (theme.red, theme.red, theme.red),
        };

        let key_style = Style::default()
            .fg(theme.key_hint())
            .add_modifier(Modifier::BOLD);
        let confirm_style = Style::default()
            .fg(confirm_color)
            .add_modifier(Modifier::BOLD);
        let cancel_style = Style::default()
            .fg(theme.overlay1)
            .add_modifier(Modifier::BOLD);

        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                self.message.clone(),
                Style::default().fg(theme.text),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    format!("[{}]", self.resolver.display_dialog(DialogAction::Confirm)),
                    key_style,
                ),
                Span::raw(" "),
                Span::styled(self.confirm_text.clone(), confirm_style),
                Span::raw("    "),
                Span::styled(
                    format!("[{}]", self.resolver.display_dialog(DialogAction::Cancel)),
                    key_style,
                ),
                Span::raw(" "),
                Span::styled(self.cancel_text.clone(), cancel_style),
            ]),
        ];

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(
                Style::default()
                    .fg(title_color)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color))
            .style(Style::default().bg(theme.base));

        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });

        frame.render_widget(paragraph, popup_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::{char_key, key, render_to_string};
    use crossterm::event::KeyCode;

    fn dialog() -> ConfirmDialog {
        ConfirmDialog::new("Are you sure to delete Bill Gates", Arc::new(KeyResolver::default()))
            .with_title("Delete student")
            .danger()
    }

    #[test]
    fn test_confirm_and_cancel() {
        let mut dialog = dialog();
        assert_eq!(
            dialog.handle_key(char_key('y')).unwrap(),
            EventResult::Event(ConfirmEvent::Confirmed)
        );
        assert_eq!(
            dialog.handle_key(key(KeyCode::Enter)).unwrap(),
            EventResult::Event(ConfirmEvent::Confirmed)
        );
        assert_eq!(
            dialog.handle_key(char_key('n')).unwrap(),
            EventResult::Event(ConfirmEvent::Cancelled)
        );
        assert_eq!(
            dialog.handle_key(key(KeyCode::Esc)).unwrap(),
            EventResult::Event(ConfirmEvent::Cancelled)
        );
    }

    #[test]
    fn test_other_keys_are_swallowed() {
        let mut dialog = dialog();
        assert_eq!(dialog.handle_key(char_key('q')).unwrap(), EventResult::Consumed);
    }

    #[test]
    fn test_render_shows_message_and_choices() {
        let mut dialog = dialog();
        let text = render_to_string(80, 20, |frame| {
            dialog.render(frame, frame.area(), &Theme::default());
        });
        assert!(text.contains("Delete student"));
        assert!(text.contains("Are you sure to delete Bill Gates"));
        assert!(text.contains("Yes"));
        assert!(text.contains("No"));
    }
}
