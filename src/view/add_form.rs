use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};

use crate::Theme;
use crate::model::{Gender, NewStudent};
use crate::ui::{Component, EventResult, Result, TextField};

const DRAWER_WIDTH: u16 = 48;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddFormEvent {
    Submit(NewStudent),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Name,
    Email,
    Gender,
}

impl Focus {
    const fn next(self) -> Self {
        match self {
            Self::Name => Self::Email,
            Self::Email => Self::Gender,
            Self::Gender => Self::Name,
        }
    }

    const fn previous(self) -> Self {
        match self {
            Self::Name => Self::Gender,
            Self::Email => Self::Name,
            Self::Gender => Self::Email,
        }
    }
}

/// Right-hand drawer collecting the fields of a new student.
///
/// Captures every key while open. Input survives a failed submission.
pub struct AddStudentForm {
    name: TextField,
    email: TextField,
    gender: Gender,
    focus: Focus,
    submitting: bool,
    error: Option<&'static str>,
}

impl AddStudentForm {
    pub fn new() -> Self {
        let mut form = Self {
            name: TextField::new("Name").with_placeholder("Please enter student name"),
            email: TextField::new("Email").with_placeholder("Please enter student email"),
            gender: Gender::default(),
            focus: Focus::Name,
            submitting: false,
            error: None,
        };
        form.apply_focus();
        form
    }

    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// A submission failed: unlock the form and keep what was typed.
    pub const fn submission_failed(&mut self) {
        self.submitting = false;
    }

    fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
        self.apply_focus();
    }

    fn apply_focus(&mut self) {
        self.name.set_focused(self.focus == Focus::Name);
        self.email.set_focused(self.focus == Focus::Email);
    }

    fn submit(&mut self) -> EventResult<AddFormEvent> {
        let name = self.name.value().trim();
        let email = self.email.value().trim();
        if name.is_empty() {
            self.error = Some("Please enter student name");
            self.set_focus(Focus::Name);
            return EventResult::Consumed;
        }
        if email.is_empty() {
            self.error = Some("Please enter student email");
            self.set_focus(Focus::Email);
            return EventResult::Consumed;
        }

        let student = NewStudent {
            name: name.to_string(),
            email: email.to_string(),
            gender: self.gender,
        };
        self.error = None;
        self.submitting = true;
        AddFormEvent::Submit(student).into()
    }

    fn render_gender(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let focused = self.focus == Focus::Gender;
        let mut spans = Vec::new();
        for gender in Gender::ALL {
            let style = if gender == self.gender {
                Style::default()
                    .fg(theme.base)
                    .bg(if focused { theme.mauve } else { theme.overlay1 })
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.subtext0)
            };
            spans.push(Span::styled(format!(" {gender} "), style));
            spans.push(Span::raw(" "));
        }

        let (border_color, title_color) = if focused {
            (theme.border_focused(), theme.mauve)
        } else {
            (theme.border(), theme.subtext0)
        };
        let block = Block::default()
            .title(" Gender ")
            .title_style(Style::default().fg(title_color))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border_color));

        frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
    }
}

impl Default for AddStudentForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for AddStudentForm {
    type Output = AddFormEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        match key.code {
            KeyCode::Esc => return Ok(AddFormEvent::Close.into()),
            KeyCode::Enter => return Ok(self.submit()),
            KeyCode::Tab | KeyCode::Down => {
                self.set_focus(self.focus.next());
                return Ok(EventResult::Consumed);
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.set_focus(self.focus.previous());
                return Ok(EventResult::Consumed);
            }
            _ => {}
        }

        match self.focus {
            Focus::Name => {
                self.name.handle_key(key)?;
            }
            Focus::Email => {
                self.email.handle_key(key)?;
            }
            Focus::Gender => match key.code {
                KeyCode::Left => self.gender = self.gender.previous(),
                KeyCode::Right | KeyCode::Char(' ') => self.gender = self.gender.next(),
                _ => {}
            },
        }
        Ok(EventResult::Consumed)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let [_, drawer] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(DRAWER_WIDTH)])
                .areas(area);
        frame.render_widget(Clear, drawer);

        let block = Block::default()
            .title(" Add new Student ")
            .title_style(
                Style::default()
                    .fg(theme.mauve)
                    .add_modifier(Modifier::BOLD),
            )
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.lavender))
            .style(Style::default().bg(theme.base));
        let inner = block.inner(drawer);
        frame.render_widget(block, drawer);

        let [name, email, gender, _, status, hints] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.name.render(frame, name, theme);
        self.email.render(frame, email, theme);
        self.render_gender(frame, gender, theme);

        let status_line = match (self.submitting, self.error) {
            (true, _) => Line::from(Span::styled(
                "Submitting...",
                Style::default().fg(theme.yellow),
            )),
            (false, Some(error)) => Line::from(Span::styled(error, Style::default().fg(theme.error()))),
            (false, None) => Line::from(""),
        };
        frame.render_widget(Paragraph::new(status_line), status);

        let key_style = Style::default().fg(theme.key_hint());
        let desc_style = Style::default().fg(theme.subtext0);
        let hint_line = Line::from(vec![
            Span::styled("Enter", key_style),
            Span::styled(" submit  ", desc_style),
            Span::styled("Tab", key_style),
            Span::styled(" next field  ", desc_style),
            Span::styled("Esc", key_style),
            Span::styled(" close", desc_style),
        ]);
        frame.render_widget(Paragraph::new(hint_line), hints);
    }
}
