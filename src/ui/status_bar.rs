use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use crate::Theme;
use crate::config::{GlobalAction, KeyResolver, NavAction};
use crate::ui::Keybinding;

/// One-line bar at the bottom: API endpoint on the left, key hints on the right.
pub struct StatusBar {
    endpoint: String,
    resolver: Arc<KeyResolver>,
}

impl StatusBar {
    pub fn new(endpoint: impl Into<String>, resolver: Arc<KeyResolver>) -> Self {
        Self {
            endpoint: endpoint.into(),
            resolver,
        }
    }

    pub fn render_with_keybindings(
        &self,
        frame: &mut Frame,
        area: Rect,
        theme: &Theme,
        local_keybindings: &[Keybinding],
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let endpoint_width = u16::try_from(self.endpoint.chars().count() + 6)
            .unwrap_or(u16::MAX)
            .min(inner.width / 2);
        let [left, right] =
            Layout::horizontal([Constraint::Length(endpoint_width), Constraint::Fill(1)])
                .areas(inner);

        let endpoint = Line::from(vec![
            Span::styled(
                "API ",
                Style::default()
                    .fg(theme.mauve)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                truncate_str(&self.endpoint, usize::from(left.width.saturating_sub(4))),
                Style::default().fg(theme.text),
            ),
        ]);
        frame.render_widget(Paragraph::new(endpoint), left);

        let global = self.global_keybindings();
        let mut spans = Vec::new();
        for kb in local_keybindings.iter().chain(&global).filter(|kb| kb.hint) {
            if !spans.is_empty() {
                spans.push(Span::styled(" │ ", Style::default().fg(theme.surface2)));
            }
            spans.push(Span::styled(kb.key.clone(), Style::default().fg(theme.key_hint())));
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                kb.description.clone(),
                Style::default().fg(theme.subtext0),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans).right_aligned()), right);
    }

    /// Application-wide keybindings, also listed in the help overlay.
    pub fn global_keybindings(&self) -> Vec<Keybinding> {
        vec![
            Keybinding::new(
                format!(
                    "{}/{}",
                    self.resolver.display_nav(NavAction::Up),
                    self.resolver.display_nav(NavAction::Down)
                ),
                "Move selection",
            ),
            Keybinding::new(
                format!(
                    "{}/{}",
                    self.resolver.display_nav(NavAction::PageUp),
                    self.resolver.display_nav(NavAction::PageDown)
                ),
                "Previous/next page",
            ),
            Keybinding::new(
                format!(
                    "{}/{}",
                    self.resolver.display_nav(NavAction::Home),
                    self.resolver.display_nav(NavAction::End)
                ),
                "First/last student",
            ),
            Keybinding::hint(self.resolver.display_global(GlobalAction::Help), "Help"),
            Keybinding::new(self.resolver.display_global(GlobalAction::Suspend), "Suspend"),
            Keybinding::hint(self.resolver.display_global(GlobalAction::Quit), "Quit"),
        ]
    }
}

/// Truncate a string to fit within a given width, adding "..." if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width > 3 {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_width).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::render_to_string;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("http://localhost", 40), "http://localhost");
        assert_eq!(truncate_str("http://localhost", 10), "http://...");
        assert_eq!(truncate_str("abc", 2), "ab");
    }

    #[test]
    fn test_render_endpoint_and_hints() {
        let bar = StatusBar::new("http://localhost:8080/api/v1", Arc::new(KeyResolver::default()));
        let text = render_to_string(100, 3, |frame| {
            bar.render_with_keybindings(
                frame,
                frame.area(),
                &Theme::default(),
                &[Keybinding::hint("a", "Add")],
            );
        });
        assert!(text.contains("API http://localhost:8080/api/v1"));
        assert!(text.contains("a Add"));
        assert!(text.contains("q Quit"));
        assert!(!text.contains("Suspend"));
    }
}
