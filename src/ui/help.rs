use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::Theme;
use crate::config::{DialogAction, KeyResolver};
use crate::ui::{Component, EventResult, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybinding {
    pub key: String,
    pub description: String,
    /// Whether this keybinding is also shown in the status bar.
    pub hint: bool,
}

impl Keybinding {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            hint: false,
        }
    }

    /// Create a keybinding that is also shown as a hint in the status bar.
    pub fn hint(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            hint: true,
        }
    }
}

/// A titled group of keybindings for the help overlay.
pub struct KeybindingSection {
    pub title: String,
    pub keybindings: Vec<Keybinding>,
}

impl KeybindingSection {
    pub fn new(title: impl Into<String>, keybindings: Vec<Keybinding>) -> Self {
        Self {
            title: title.into(),
            keybindings,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpEvent {
    Close,
}

pub struct HelpOverlay {
    sections: Vec<KeybindingSection>,
    resolver: Arc<KeyResolver>,
}

impl HelpOverlay {
    pub const fn new(sections: Vec<KeybindingSection>, resolver: Arc<KeyResolver>) -> Self {
        Self { sections, resolver }
    }
}

impl Component for HelpOverlay {
    type Output = HelpEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if self.resolver.matches_dialog(&key, DialogAction::Dismiss) {
            return Ok(HelpEvent::Close.into());
        }
        Ok(EventResult::Consumed)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let popup_area = area.centered(Constraint::Percentage(60), Constraint::Percentage(80));
        frame.render_widget(Clear, popup_area);

        let key_style = Style::default()
            .fg(theme.key_hint())
            .add_modifier(Modifier::BOLD);
        let desc_style = Style::default().fg(theme.text);
        let section_style = Style::default()
            .fg(theme.subtext0)
            .add_modifier(Modifier::BOLD);

        let mut lines: Vec<Line> = Vec::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(
                format!("── {} ──", section.title),
                section_style,
            )));
            for kb in &section.keybindings {
                lines.push(Line::from(vec![
                    Span::styled(format!("{:>14}", kb.key), key_style),
                    Span::raw("  "),
                    Span::styled(kb.description.clone(), desc_style),
                ]));
            }
        }

        let title = format!(
            " Help (press {} to close) ",
            self.resolver.display_dialog(DialogAction::Dismiss)
        );
        let block = Block::default()
            .title(title)
            .title_style(Style::default().fg(theme.mauve).add_modifier(Modifier::BOLD))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.lavender))
            .style(Style::default().bg(theme.base));

        frame.render_widget(Paragraph::new(lines).block(block), popup_area);
    }
}
