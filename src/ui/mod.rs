//! UI building blocks shared by the screens.
//!
//! - [`Component`] - reusable, interactive widget
//! - [`EventResult`] - outcome of handling a key event

mod component;
pub mod components;
mod help;
mod status_bar;
mod toast;
pub mod widgets;

pub use component::Component;
pub use components::{
    ColumnDef, ConfirmDialog, ConfirmEvent, Table, TableRow, TextField,
};
pub use help::{HelpEvent, HelpOverlay, Keybinding, KeybindingSection};
pub use status_bar::StatusBar;
pub use toast::ToastManager;
pub use widgets::Spinner;

/// Result type alias for UI operations.
pub type Result<T> = std::result::Result<T, color_eyre::Report>;

/// Result of handling an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult<E> {
    /// Input was not handled, parent should process it.
    Ignored,
    /// Input was consumed but produced no event.
    Consumed,
    /// Input was consumed and produced an event.
    Event(E),
}

impl<E> EventResult<E> {
    /// Returns true if the input was consumed (not ignored).
    pub const fn is_consumed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

impl<E> From<E> for EventResult<E> {
    fn from(event: E) -> Self {
        Self::Event(event)
    }
}
