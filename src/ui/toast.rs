use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap};

use crate::Theme;
use crate::notify::{Notification, NotificationKind, Placement};
use crate::ui::Component;

const TOAST_WIDTH: u16 = 50;
const TOAST_HEIGHT: u16 = 4;

struct Toast {
    notification: Notification,
    created_at: Instant,
}

/// Transient notifications stacked in a screen corner.
///
/// Top-right toasts stack downwards, bottom-left toasts stack upwards.
pub struct ToastManager {
    toasts: VecDeque<Toast>,
    duration: Duration,
    max_visible: usize,
}

impl ToastManager {
    pub const fn new(duration: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            duration,
            max_visible: 4,
        }
    }

    pub fn show(&mut self, notification: Notification) {
        self.toasts.push_back(Toast {
            notification,
            created_at: Instant::now(),
        });
        while self.toasts.len() > self.max_visible {
            self.toasts.pop_front();
        }
    }

    fn toast_area(area: Rect, placement: Placement, slot: u16) -> Option<Rect> {
        let width = TOAST_WIDTH.min(area.width.saturating_sub(2));
        let offset = slot * TOAST_HEIGHT;
        if offset + TOAST_HEIGHT > area.height {
            return None;
        }
        let (x, y) = match placement {
            Placement::TopRight => (
                area.x + area.width.saturating_sub(width + 1),
                area.y + offset,
            ),
            Placement::BottomLeft => (
                area.x + 1,
                area.y + area.height - offset - TOAST_HEIGHT,
            ),
        };
        Some(Rect::new(x, y, width, TOAST_HEIGHT))
    }
}

impl Component for ToastManager {
    type Output = ();

    fn handle_tick(&mut self) {
        let duration = self.duration;
        self.toasts.retain(|t| t.created_at.elapsed() < duration);
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let mut top_right = 0u16;
        let mut bottom_left = 0u16;

        // Newest first, closest to the corner
        for toast in self.toasts.iter().rev() {
            let placement = toast.notification.placement;
            let slot = match placement {
                Placement::TopRight => &mut top_right,
                Placement::BottomLeft => &mut bottom_left,
            };
            let Some(toast_area) = Self::toast_area(area, placement, *slot) else {
                continue;
            };
            *slot += 1;

            let (color, icon) = match toast.notification.kind {
                NotificationKind::Success => (theme.success(), "✓"),
                NotificationKind::Error => (theme.error(), "✗"),
            };

            frame.render_widget(Clear, toast_area);

            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color))
                .style(Style::default().bg(theme.surface0));

            let lines = vec![
                Line::from(vec![
                    Span::styled(format!("{icon} "), Style::default().fg(color)),
                    Span::styled(
                        toast.notification.title.clone(),
                        Style::default()
                            .fg(theme.text)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(Span::styled(
                    toast.notification.detail.clone(),
                    Style::default().fg(theme.subtext0),
                )),
            ];

            let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
            frame.render_widget(paragraph, toast_area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::render_to_string;

    #[test]
    fn test_placement_corners() {
        let mut toasts = ToastManager::new(Duration::from_secs(60));
        toasts.show(Notification::success("Student deleted", "Student with 1 was deleted"));
        toasts.show(Notification::error(
            "There was an issue",
            "boom",
            Some(Placement::BottomLeft),
        ));

        let text = render_to_string(120, 20, |frame| {
            toasts.render(frame, frame.area(), &Theme::default());
        });
        let lines: Vec<&str> = text.lines().collect();

        let success_row = lines.iter().position(|l| l.contains("Student deleted")).unwrap();
        let error_row = lines.iter().position(|l| l.contains("There was an issue")).unwrap();
        assert_eq!(success_row, 1);
        assert_eq!(error_row, 17);
        assert!(lines[success_row].find("Student deleted").unwrap() > 60);
        assert!(lines[error_row].find("There was an issue").unwrap() < 10);
    }

    #[test]
    fn test_toasts_expire_on_tick() {
        let mut toasts = ToastManager::new(Duration::ZERO);
        toasts.show(Notification::success("Saved", ""));
        assert_eq!(toasts.toasts.len(), 1);
        toasts.handle_tick();
        assert_eq!(toasts.toasts.len(), 0);
    }

    #[test]
    fn test_oldest_toast_is_dropped() {
        let mut toasts = ToastManager::new(Duration::from_secs(60));
        for i in 0..6 {
            toasts.show(Notification::success(format!("toast {i}"), ""));
        }
        assert_eq!(toasts.toasts.len(), 4);
    }
}
