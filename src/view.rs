//! The student screen and the pure rules it renders by.

mod add_form;
mod students;

use std::fmt;

pub use add_form::{AddFormEvent, AddStudentForm};
pub use students::{StudentsEvent, StudentsView};

use crate::store::StoreState;

/// Which of the three screens the store state maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Loading,
    Empty,
    Populated { count: usize },
}

pub fn view_mode(state: &StoreState) -> ViewMode {
    if state.is_loading {
        ViewMode::Loading
    } else if state.students.is_empty() {
        ViewMode::Empty
    } else {
        ViewMode::Populated {
            count: state.students.len(),
        }
    }
}

/// Glyph shown in a student's avatar cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Avatar {
    Generic,
    Initials(String),
}

impl fmt::Display for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => f.write_str("◉"),
            Self::Initials(initials) => f.write_str(initials),
        }
    }
}

/// Avatar for a name: first character of a single word, otherwise the first
/// character of the first word followed by the last character of the name.
pub fn derive_avatar(name: &str) -> Avatar {
    let trimmed = name.trim();
    let mut words = trimmed.split_whitespace();
    let Some(first_word) = words.next() else {
        return Avatar::Generic;
    };

    let mut initials: String = first_word.chars().take(1).collect();
    if words.next().is_some() {
        initials.extend(trimmed.chars().last());
    }
    Avatar::Initials(initials.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::student;

    #[test]
    fn test_view_mode() {
        let loading = StoreState::default();
        assert_eq!(view_mode(&loading), ViewMode::Loading);

        let empty = StoreState {
            students: Vec::new(),
            is_loading: false,
        };
        assert_eq!(view_mode(&empty), ViewMode::Empty);

        let populated = StoreState {
            students: vec![student(1, "Bill Gates")],
            is_loading: false,
        };
        assert_eq!(view_mode(&populated), ViewMode::Populated { count: 1 });
    }

    #[test]
    fn test_loading_wins_over_records() {
        let refetching = StoreState {
            students: vec![student(1, "Bill Gates")],
            is_loading: true,
        };
        assert_eq!(view_mode(&refetching), ViewMode::Loading);
    }

    #[test]
    fn test_avatar() {
        assert_eq!(derive_avatar(""), Avatar::Generic);
        assert_eq!(derive_avatar("   "), Avatar::Generic);
        assert_eq!(derive_avatar("Bob"), Avatar::Initials("B".into()));
        assert_eq!(derive_avatar("Bill Gates"), Avatar::Initials("BS".into()));
        assert_eq!(derive_avatar("  ada  lovelace "), Avatar::Initials("AE".into()));
        assert_eq!(derive_avatar("Émile"), Avatar::Initials("É".into()));
    }
}
