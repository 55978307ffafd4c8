use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Cell, Row, Table as TableWidget, TableState};

use crate::Theme;
use crate::config::{KeyResolver, NavAction};
use crate::ui::{Component, EventResult, Result};

pub struct ColumnDef {
    pub header: &'static str,
    pub constraint: Constraint,
}

impl ColumnDef {
    pub const fn new(header: &'static str, constraint: Constraint) -> Self {
        Self { header, constraint }
    }
}

pub trait TableRow {
    fn columns() -> &'static [ColumnDef];
    fn render_cells(&self, theme: &Theme) -> Vec<Cell<'static>>;
}

/// Selectable table that shows its rows one page at a time.
///
/// The visible page always contains the selected row.
pub struct Table<T: TableRow> {
    items: Vec<T>,
    selected: Option<usize>,
    page_size: usize,
    title: Option<String>,
    resolver: Arc<KeyResolver>,
}

impl<T: TableRow> Table<T> {
    pub fn new(items: Vec<T>, page_size: usize, resolver: Arc<KeyResolver>) -> Self {
        let selected = (!items.is_empty()).then_some(0);
        Self {
            items,
            selected,
            page_size: page_size.max(1),
            title: None,
            resolver,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Replace the rows, keeping the selection index where it still fits.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.selected = match (self.selected, items.len()) {
            (_, 0) => None,
            (Some(i), len) => Some(i.min(len - 1)),
            (None, _) => Some(0),
        };
        self.items = items;
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size).max(1)
    }

    /// Zero-based page holding the selection.
    pub fn current_page(&self) -> usize {
        self.selected.unwrap_or(0) / self.page_size
    }

    fn select(&mut self, index: usize) {
        if !self.items.is_empty() {
            self.selected = Some(index.min(self.items.len() - 1));
        }
    }

    fn select_next(&mut self) {
        let next = self.selected.map_or(0, |i| i + 1);
        self.select(next);
    }

    fn select_previous(&mut self) {
        let previous = self.selected.map_or(0, |i| i.saturating_sub(1));
        self.select(previous);
    }

    fn next_page(&mut self) {
        let target = (self.current_page() + 1) * self.page_size;
        if target < self.items.len() {
            self.select(target);
        } else {
            self.select(self.items.len().saturating_sub(1));
        }
    }

    fn previous_page(&mut self) {
        let target = self.current_page().saturating_sub(1) * self.page_size;
        self.select(target);
    }
}

impl<T: TableRow> Component for Table<T> {
    type Output = ();

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult<Self::Output>> {
        let resolver = Arc::clone(&self.resolver);
        if resolver.matches_nav(&key, NavAction::Down) {
            self.select_next();
        } else if resolver.matches_nav(&key, NavAction::Up) {
            self.select_previous();
        } else if resolver.matches_nav(&key, NavAction::PageDown) {
            self.next_page();
        } else if resolver.matches_nav(&key, NavAction::PageUp) {
            self.previous_page();
        } else if resolver.matches_nav(&key, NavAction::Home) {
            self.select(0);
        } else if resolver.matches_nav(&key, NavAction::End) {
            self.select(self.items.len().saturating_sub(1));
        } else {
            return Ok(EventResult::Ignored);
        }
        Ok(EventResult::Consumed)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let columns = T::columns();

        let header_cells: Vec<Cell> = columns
            .iter()
            .map(|c| {
                Cell::from(c.header).style(
                    Style::default()
                        .fg(theme.header())
                        .add_modifier(Modifier::BOLD),
                )
            })
            .collect();
        let header = Row::new(header_cells)
            .height(1)
            .style(Style::default().bg(theme.surface0));

        let page_start = self.current_page() * self.page_size;
        let rows: Vec<Row> = self
            .items
            .iter()
            .skip(page_start)
            .take(self.page_size)
            .map(|item| Row::new(item.render_cells(theme)).style(Style::default().fg(theme.text)))
            .collect();

        let widths: Vec<Constraint> = columns.iter().map(|c| c.constraint).collect();

        let page_indicator = Line::from(format!(
            " Page {}/{} ",
            self.current_page() + 1,
            self.page_count()
        ))
        .style(Style::default().fg(theme.subtext0))
        .right_aligned();

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme.border()))
            .title_bottom(page_indicator);
        if let Some(title) = &self.title {
            block = block.title(title.as_str()).title_style(
                Style::default()
                    .fg(theme.mauve)
                    .add_modifier(Modifier::BOLD),
            );
        }

        let table = TableWidget::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(
                Style::default()
                    .bg(theme.selection_bg())
                    .fg(theme.lavender)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = TableState::default().with_selected(self.selected.map(|i| i - page_start));
        frame.render_stateful_widget(table, area, &mut state);
    }
}
