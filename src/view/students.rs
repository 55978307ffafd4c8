use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph};
use tracing::debug;

use crate::Theme;
use crate::config::{KeyResolver, StudentsAction};
use crate::model::{NewStudent, Student, StudentId};
use crate::store::StoreState;
use crate::ui::{
    ColumnDef, Component, ConfirmDialog, ConfirmEvent, EventResult, Keybinding, Result, Spinner,
    Table, TableRow,
};
use crate::view::{AddFormEvent, AddStudentForm, ViewMode, derive_avatar, view_mode};

/// Intents the student screen asks the store to carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentsEvent {
    Refresh,
    Remove(StudentId),
    Add(NewStudent),
}

impl TableRow for Student {
    fn columns() -> &'static [ColumnDef] {
        const COLUMNS: &[ColumnDef] = &[
            ColumnDef::new("", Constraint::Length(4)),
            ColumnDef::new("ID", Constraint::Length(6)),
            ColumnDef::new("NAME", Constraint::Fill(2)),
            ColumnDef::new("EMAIL", Constraint::Fill(3)),
            ColumnDef::new("GENDER", Constraint::Length(8)),
            ColumnDef::new("ACTIONS", Constraint::Length(14)),
        ];
        COLUMNS
    }

    fn render_cells(&self, theme: &Theme) -> Vec<Cell<'static>> {
        vec![
            Cell::from(derive_avatar(&self.name).to_string()).style(
                Style::default()
                    .fg(theme.blue)
                    .add_modifier(Modifier::BOLD),
            ),
            Cell::from(self.id.to_string()),
            Cell::from(self.name.clone()),
            Cell::from(self.email.clone()),
            Cell::from(self.gender.as_str()),
            // Edit is shown but has no action behind it
            Cell::from(Line::from(vec![
                Span::styled("Delete", Style::default().fg(theme.red)),
                Span::raw("  "),
                Span::styled(
                    "Edit",
                    Style::default()
                        .fg(theme.muted())
                        .add_modifier(Modifier::DIM),
                ),
            ])),
        ]
    }
}

struct PendingDelete {
    id: StudentId,
    dialog: ConfirmDialog,
}

/// The roster screen: loading, empty and populated modes plus the add drawer
/// and the delete confirmation.
pub struct StudentsView {
    state: StoreState,
    table: Table<Student>,
    spinner: Spinner,
    pending_delete: Option<PendingDelete>,
    add_form: Option<AddStudentForm>,
    resolver: Arc<KeyResolver>,
}

impl StudentsView {
    pub fn new(page_size: usize, resolver: Arc<KeyResolver>) -> Self {
        Self {
            state: StoreState::default(),
            table: Table::new(Vec::new(), page_size, Arc::clone(&resolver))
                .with_title(" Students "),
            spinner: Spinner::new().with_label("Loading students..."),
            pending_delete: None,
            add_form: None,
            resolver,
        }
    }

    pub fn mode(&self) -> ViewMode {
        view_mode(&self.state)
    }

    /// Take a new snapshot from the store.
    pub fn set_state(&mut self, state: StoreState) {
        let vanished = self.pending_delete.as_ref().is_some_and(|pending| {
            !state.is_loading && !state.students.iter().any(|s| s.id == pending.id)
        });
        if vanished {
            debug!("Selected student vanished, dropping delete confirmation");
            self.pending_delete = None;
        }
        self.table.set_items(state.students.clone());
        self.state = state;
    }

    /// The store finished an add intent: close the drawer on success.
    ///
    /// A drawer that has nothing in flight was opened after the submission
    /// and is left alone.
    pub fn add_finished(&mut self, ok: bool) {
        let Some(form) = &mut self.add_form else {
            return;
        };
        if !form.is_submitting() {
            debug!("Add finished for a drawer that is no longer open");
            return;
        }
        if ok {
            self.add_form = None;
        } else {
            form.submission_failed();
        }
    }

    pub const fn has_overlay(&self) -> bool {
        self.pending_delete.is_some() || self.add_form.is_some()
    }

    /// Keybindings for the help overlay and status bar.
    pub fn keybindings(&self) -> Vec<Keybinding> {
        vec![
            Keybinding::hint(
                self.resolver.display_students(StudentsAction::Add),
                "Add student",
            ),
            Keybinding::hint(
                self.resolver.display_students(StudentsAction::Delete),
                "Delete student",
            ),
            Keybinding::hint(
                self.resolver.display_students(StudentsAction::Reload),
                "Reload",
            ),
        ]
    }

    fn open_delete_confirmation(&mut self) {
        let Some(student) = self.table.selected_item() else {
            return;
        };
        let dialog = ConfirmDialog::new(
            format!("Are you sure to delete {}", student.name),
            Arc::clone(&self.resolver),
        )
        .with_title("Delete student")
        .danger();
        self.pending_delete = Some(PendingDelete {
            id: student.id,
            dialog,
        });
    }

    fn add_affordance(&self, label: &str, theme: &Theme) -> Vec<Span<'static>> {
        vec![
            Span::styled(
                format!("[{}]", self.resolver.display_students(StudentsAction::Add)),
                Style::default()
                    .fg(theme.key_hint())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {label}"), Style::default().fg(theme.green)),
        ]
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let [header, body] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
        frame.render_widget(
            Paragraph::new(Line::from(self.add_affordance("Add New Student", theme))),
            header,
        );

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()));
        let inner = block.inner(body);
        frame.render_widget(block, body);

        let placeholder = Paragraph::new(Span::styled("No data", Style::default().fg(theme.muted())))
            .alignment(Alignment::Center);
        let center = inner.centered(Constraint::Fill(1), Constraint::Length(1));
        frame.render_widget(placeholder, center);
    }

    fn render_populated(&mut self, frame: &mut Frame, area: Rect, theme: &Theme, count: usize) {
        let [header, body] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

        let mut spans = vec![
            Span::styled("Number of students: ", Style::default().fg(theme.text)),
            Span::styled(
                format!("[{count}]"),
                Style::default()
                    .fg(theme.mauve)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("   "),
        ];
        spans.extend(self.add_affordance("Add new Student", theme));
        frame.render_widget(Paragraph::new(Line::from(spans)), header);

        self.table.render(frame, body, theme);
    }
}

impl Component for StudentsView {
    type Output = StudentsEvent;

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        if let Some(pending) = &mut self.pending_delete {
            let result = pending.dialog.handle_key(key)?;
            let id = pending.id;
            return Ok(match result {
                EventResult::Event(ConfirmEvent::Confirmed) => {
                    self.pending_delete = None;
                    StudentsEvent::Remove(id).into()
                }
                EventResult::Event(ConfirmEvent::Cancelled) => {
                    self.pending_delete = None;
                    EventResult::Consumed
                }
                EventResult::Consumed | EventResult::Ignored => EventResult::Consumed,
            });
        }

        if let Some(form) = &mut self.add_form {
            return Ok(match form.handle_key(key)? {
                EventResult::Event(AddFormEvent::Submit(student)) => StudentsEvent::Add(student).into(),
                EventResult::Event(AddFormEvent::Close) => {
                    self.add_form = None;
                    EventResult::Consumed
                }
                EventResult::Consumed => EventResult::Consumed,
                EventResult::Ignored => EventResult::Ignored,
            });
        }

        let mode = self.mode();
        if mode == ViewMode::Loading {
            return Ok(EventResult::Ignored);
        }

        if self.resolver.matches_students(&key, StudentsAction::Add) {
            self.add_form = Some(AddStudentForm::new());
            return Ok(EventResult::Consumed);
        }
        if self.resolver.matches_students(&key, StudentsAction::Reload) {
            return Ok(StudentsEvent::Refresh.into());
        }
        if let ViewMode::Populated { .. } = mode {
            if self.resolver.matches_students(&key, StudentsAction::Delete) {
                self.open_delete_confirmation();
                return Ok(EventResult::Consumed);
            }
            if self.table.handle_key(key)?.is_consumed() {
                return Ok(EventResult::Consumed);
            }
        }

        Ok(EventResult::Ignored)
    }

    fn handle_tick(&mut self) {
        self.spinner.handle_tick();
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        match self.mode() {
            ViewMode::Loading => self.spinner.render(frame, area, theme),
            ViewMode::Empty => self.render_empty(frame, area, theme),
            ViewMode::Populated { count } => self.render_populated(frame, area, theme, count),
        }

        if let Some(form) = &mut self.add_form {
            form.render(frame, area, theme);
        }
        if let Some(pending) = &mut self.pending_delete {
            pending.dialog.render(frame, area, theme);
        }
    }
}
