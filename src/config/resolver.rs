use crate::config::actions::{DialogAction, GlobalAction, NavAction, StudentsAction};
use crate::config::keybindings::KeybindingsConfig;
use crossterm::event::KeyEvent;
use std::sync::Arc;

/// Maps key events to configured actions.
pub struct KeyResolver {
    pub keybindings: Arc<KeybindingsConfig>,
}

impl KeyResolver {
    pub const fn new(keybindings: Arc<KeybindingsConfig>) -> Self {
        Self { keybindings }
    }

    // Global actions
    pub fn matches_global(&self, event: &KeyEvent, action: GlobalAction) -> bool {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => kb.quit.matches(event),
            GlobalAction::Help => kb.help.matches(event),
            GlobalAction::Suspend => kb.suspend.matches(event),
        }
    }

    pub fn display_global(&self, action: GlobalAction) -> String {
        let kb = &self.keybindings.global;
        match action {
            GlobalAction::Quit => kb.quit.display(),
            GlobalAction::Help => kb.help.display(),
            GlobalAction::Suspend => kb.suspend.display(),
        }
    }

    // Navigation actions
    pub fn matches_nav(&self, event: &KeyEvent, action: NavAction) -> bool {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => kb.up.matches(event),
            NavAction::Down => kb.down.matches(event),
            NavAction::PageUp => kb.page_up.matches(event),
            NavAction::PageDown => kb.page_down.matches(event),
            NavAction::Home => kb.home.matches(event),
            NavAction::End => kb.end.matches(event),
        }
    }

    pub fn display_nav(&self, action: NavAction) -> String {
        let kb = &self.keybindings.navigation;
        match action {
            NavAction::Up => kb.up.display(),
            NavAction::Down => kb.down.display(),
            NavAction::PageUp => kb.page_up.display(),
            NavAction::PageDown => kb.page_down.display(),
            NavAction::Home => kb.home.display(),
            NavAction::End => kb.end.display(),
        }
    }

    // Student list actions
    pub fn matches_students(&self, event: &KeyEvent, action: StudentsAction) -> bool {
        let kb = &self.keybindings.students;
        match action {
            StudentsAction::Add => kb.add.matches(event),
            StudentsAction::Delete => kb.delete.matches(event),
            StudentsAction::Reload => kb.reload.matches(event),
        }
    }

    pub fn display_students(&self, action: StudentsAction) -> String {
        let kb = &self.keybindings.students;
        match action {
            StudentsAction::Add => kb.add.display(),
            StudentsAction::Delete => kb.delete.display(),
            StudentsAction::Reload => kb.reload.display(),
        }
    }

    // Dialog actions
    pub fn matches_dialog(&self, event: &KeyEvent, action: DialogAction) -> bool {
        let kb = &self.keybindings.dialog;
        match action {
            DialogAction::Confirm => kb.confirm.matches(event),
            DialogAction::Cancel => kb.cancel.matches(event),
            DialogAction::Dismiss => kb.dismiss.matches(event),
        }
    }

    pub fn display_dialog(&self, action: DialogAction) -> String {
        let kb = &self.keybindings.dialog;
        match action {
            DialogAction::Confirm => kb.confirm.display(),
            DialogAction::Cancel => kb.cancel.display(),
            DialogAction::Dismiss => kb.dismiss.display(),
        }
    }
}

impl Default for KeyResolver {
    fn default() -> Self {
        Self::new(Arc::new(KeybindingsConfig::default()))
    }
}
