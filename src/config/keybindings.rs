use crossterm::event::KeyCode;
use serde::{Deserialize, Serialize};

use crate::config::key::{Key, KeyBinding};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalKeybindings {
    pub quit: KeyBinding,
    pub help: KeyBinding,
    pub suspend: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationKeybindings {
    pub up: KeyBinding,
    pub down: KeyBinding,
    pub page_up: KeyBinding,
    pub page_down: KeyBinding,
    pub home: KeyBinding,
    pub end: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentsKeybindings {
    pub add: KeyBinding,
    pub delete: KeyBinding,
    pub reload: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogKeybindings {
    pub confirm: KeyBinding,
    pub cancel: KeyBinding,
    pub dismiss: KeyBinding,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct KeybindingsConfig {
    pub global: GlobalKeybindings,
    pub navigation: NavigationKeybindings,
    pub students: StudentsKeybindings,
    pub dialog: DialogKeybindings,
}

impl Default for GlobalKeybindings {
    fn default() -> Self {
        Self {
            quit: Key::new(KeyCode::Char('q')).into(),
            help: Key::new(KeyCode::Char('?')).into(),
            suspend: Key::with_ctrl(KeyCode::Char('z')).into(),
        }
    }
}

impl Default for NavigationKeybindings {
    fn default() -> Self {
        Self {
            up: vec![Key::new(KeyCode::Char('k')), Key::new(KeyCode::Up)].into(),
            down: vec![Key::new(KeyCode::Char('j')), Key::new(KeyCode::Down)].into(),
            page_up: Key::new(KeyCode::PageUp).into(),
            page_down: Key::new(KeyCode::PageDown).into(),
            home: vec![Key::new(KeyCode::Char('g')), Key::new(KeyCode::Home)].into(),
            end: vec![Key::new(KeyCode::Char('G')), Key::new(KeyCode::End)].into(),
        }
    }
}

impl Default for StudentsKeybindings {
    fn default() -> Self {
        Self {
            add: Key::new(KeyCode::Char('a')).into(),
            delete: vec![Key::new(KeyCode::Char('d')), Key::new(KeyCode::Delete)].into(),
            reload: Key::new(KeyCode::Char('r')).into(),
        }
    }
}

impl Default for DialogKeybindings {
    fn default() -> Self {
        Self {
            confirm: vec![
                Key::new(KeyCode::Char('y')),
                Key::new(KeyCode::Char('Y')),
                Key::new(KeyCode::Enter),
            ]
            .into(),
            cancel: vec![
                Key::new(KeyCode::Char('n')),
                Key::new(KeyCode::Char('N')),
                Key::new(KeyCode::Esc),
            ]
            .into(),
            dismiss: vec![
                Key::new(KeyCode::Enter),
                Key::new(KeyCode::Esc),
                Key::new(KeyCode::Char('q')),
                Key::new(KeyCode::Char('?')),
            ]
            .into(),
        }
    }
}
