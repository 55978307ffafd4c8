use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyEvent;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::Theme;
use crate::api::StudentApi;
use crate::config::{AppConfig, DialogAction, GlobalAction, KeyResolver};
use crate::notify::{ChannelNotifier, Notification};
use crate::store::{Intent, Outcome, RecordStore, StoreHandle, StoreState};
use crate::tui::{Event, Tui};
use crate::ui::{
    Component, EventResult, HelpEvent, HelpOverlay, Keybinding, KeybindingSection, StatusBar,
    ToastManager,
};
use crate::view::{StudentsEvent, StudentsView};

/// Messages processed by the application loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMessage {
    Tick,
    Render,
    Resize(u16, u16),
    Suspend,
    Resume,
    Quit,
    ClearScreen,
    DisplayHelp,
    /// A new snapshot from the record store.
    StoreChanged(StoreState),
    StoreOutcome(Outcome),
    Notify(Notification),
}

pub struct App {
    theme: Theme,
    resolver: Arc<KeyResolver>,
    students: StudentsView,
    status_bar: StatusBar,
    toasts: ToastManager,
    help: Option<HelpOverlay>,
    store: StoreHandle,
    should_quit: bool,
    should_suspend: bool,
    message_tx: UnboundedSender<AppMessage>,
    message_rx: UnboundedReceiver<AppMessage>,
}

impl App {
    /// Build the application and start the record store task.
    pub fn new(
        config: &AppConfig,
        resolver: Arc<KeyResolver>,
        theme: Theme,
        api: Arc<dyn StudentApi>,
        endpoint: impl Into<String>,
    ) -> Self {
        let (message_tx, message_rx) = mpsc::unbounded_channel();

        let notifier = Arc::new(ChannelNotifier::new(message_tx.clone()));
        let changes = message_tx.clone();
        let outcomes = message_tx.clone();
        let store = StoreHandle::spawn(
            RecordStore::new(api, notifier),
            move |state| {
                let _ = changes.send(AppMessage::StoreChanged(state.clone()));
            },
            move |outcome| {
                let _ = outcomes.send(AppMessage::StoreOutcome(outcome));
            },
        );

        Self {
            theme,
            students: StudentsView::new(config.ui.page_size, Arc::clone(&resolver)),
            status_bar: StatusBar::new(endpoint, Arc::clone(&resolver)),
            toasts: ToastManager::new(Duration::from_secs(config.ui.toast_secs)),
            help: None,
            resolver,
            store,
            should_quit: false,
            should_suspend: false,
            message_tx,
            message_rx,
        }
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = Tui::new(60.0, 4.0)?;
        tui.enter()?;
        self.mount()?;

        loop {
            self.handle_events(&mut tui).await?;
            self.handle_messages(&mut tui)?;
            if self.should_suspend {
                tui.suspend()?;
                self.message_tx.send(AppMessage::Resume)?;
                self.message_tx.send(AppMessage::ClearScreen)?;
                tui.enter()?;
            } else if self.should_quit {
                break;
            }
        }

        self.store.close();
        tui.exit()?;
        Ok(())
    }

    /// Initial load.
    fn mount(&self) -> color_eyre::Result<()> {
        info!("Loading students");
        self.store.send(Intent::Refresh)
    }

    async fn handle_events(&mut self, tui: &mut Tui) -> color_eyre::Result<()> {
        let Some(event) = tui.next_event().await else {
            return Ok(());
        };

        match event {
            Event::Quit => self.message_tx.send(AppMessage::Quit)?,
            Event::Tick => self.message_tx.send(AppMessage::Tick)?,
            Event::Render => self.message_tx.send(AppMessage::Render)?,
            Event::Resize(width, height) => {
                self.message_tx.send(AppMessage::Resize(width, height))?;
            }
            Event::Key(key) => self.handle_key_event(key)?,
            Event::Error(err) => warn!("Terminal event error: {err}"),
        }
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> color_eyre::Result<()> {
        if let Some(help) = &mut self.help {
            if let EventResult::Event(HelpEvent::Close) = help.handle_key(key)? {
                self.help = None;
            }
            return Ok(());
        }

        match self.students.handle_key(key)? {
            EventResult::Event(event) => return self.dispatch(event),
            EventResult::Consumed => return Ok(()),
            EventResult::Ignored => {}
        }

        let message = if self.resolver.matches_global(&key, GlobalAction::Quit) {
            AppMessage::Quit
        } else if self.resolver.matches_global(&key, GlobalAction::Help) {
            AppMessage::DisplayHelp
        } else if self.resolver.matches_global(&key, GlobalAction::Suspend) {
            AppMessage::Suspend
        } else {
            return Ok(());
        };
        self.message_tx.send(message)?;
        Ok(())
    }

    fn dispatch(&self, event: StudentsEvent) -> color_eyre::Result<()> {
        let intent = match event {
            StudentsEvent::Refresh => Intent::Refresh,
            StudentsEvent::Remove(id) => Intent::Remove(id),
            StudentsEvent::Add(student) => Intent::Add(student),
        };
        debug!("Dispatching {intent:?}");
        self.store.send(intent)
    }

    fn handle_messages(&mut self, tui: &mut Tui) -> color_eyre::Result<()> {
        while let Ok(message) = self.message_rx.try_recv() {
            match message {
                AppMessage::Render => self.render(tui)?,
                AppMessage::Resize(width, height) => {
                    tui.resize(Rect::new(0, 0, width, height))?;
                    self.render(tui)?;
                }
                AppMessage::ClearScreen => tui.clear()?,
                message => self.update(message),
            }
        }
        Ok(())
    }

    /// Apply a message that does not touch the terminal.
    fn update(&mut self, message: AppMessage) {
        if !matches!(message, AppMessage::Tick) {
            debug!("Handling message: {message:?}");
        }

        match message {
            AppMessage::Tick => {
                self.students.handle_tick();
                self.toasts.handle_tick();
            }
            AppMessage::Quit => self.should_quit = true,
            AppMessage::Suspend => self.should_suspend = true,
            AppMessage::Resume => self.should_suspend = false,
            AppMessage::DisplayHelp => {
                self.help = Some(HelpOverlay::new(
                    self.help_sections(),
                    Arc::clone(&self.resolver),
                ));
            }
            AppMessage::StoreChanged(state) => self.students.set_state(state),
            AppMessage::StoreOutcome(Outcome::Added { ok }) => self.students.add_finished(ok),
            AppMessage::StoreOutcome(Outcome::Removed { id, ok }) => {
                debug!("Removal of student {id} finished, ok: {ok}");
            }
            AppMessage::Notify(notification) => self.toasts.show(notification),
            AppMessage::Render | AppMessage::Resize(..) | AppMessage::ClearScreen => {}
        }
    }

    fn help_sections(&self) -> Vec<KeybindingSection> {
        vec![
            KeybindingSection::new("Students", self.students.keybindings()),
            KeybindingSection::new(
                "Dialogs",
                vec![
                    Keybinding::new(self.resolver.display_dialog(DialogAction::Confirm), "Confirm"),
                    Keybinding::new(self.resolver.display_dialog(DialogAction::Cancel), "Cancel"),
                ],
            ),
            KeybindingSection::new("General", self.status_bar.global_keybindings()),
        ]
    }

    fn render(&mut self, tui: &mut Tui) -> color_eyre::Result<()> {
        tui.draw(|frame| self.draw(frame))?;
        Ok(())
    }

    fn draw(&mut self, frame: &mut Frame) {
        let [main, status] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).areas(frame.area());

        self.students.render(frame, main, &self.theme);
        self.status_bar.render_with_keybindings(
            frame,
            status,
            &self.theme,
            &self.students.keybindings(),
        );
        self.toasts.render(frame, main, &self.theme);

        if let Some(help) = &mut self.help {
            help.render(frame, frame.area(), &self.theme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, NewStudent};
    use crate::notify::{NotificationKind, Placement};
    use crate::store::tests::{Call, MockApi, student};
    use crate::api::{ApiError, ErrorBody};
    use crate::ui::testing::{char_key, key, render_to_string};
    use crate::view::ViewMode;
    use crossterm::event::KeyCode;
    use pretty_assertions::assert_eq;
    use tokio::time::timeout;

    fn app(api: Arc<MockApi>) -> App {
        App::new(
            &AppConfig::default(),
            Arc::new(KeyResolver::default()),
            Theme::default(),
            api,
            "http://localhost:8080/api/v1",
        )
    }

    /// Feed queued messages into the app until `done` matches one.
    async fn pump_until(app: &mut App, done: impl Fn(&AppMessage) -> bool) {
        loop {
            let message = timeout(Duration::from_secs(5), app.message_rx.recv())
                .await
                .expect("timed out waiting for app message")
                .expect("message channel closed");
            let finished = done(&message);
            app.update(message);
            if finished {
                break;
            }
        }
    }

    fn loaded(message: &AppMessage) -> bool {
        matches!(message, AppMessage::StoreChanged(state) if !state.is_loading)
    }

    #[tokio::test]
    async fn test_mount_loads_students() {
        let api = Arc::new(MockApi::default());
        api.push_list(Ok(vec![student(1, "Bill Gates")]));
        let mut app = app(api.clone());
        assert_eq!(app.students.mode(), ViewMode::Loading);

        app.mount().unwrap();
        pump_until(&mut app, loaded).await;

        assert_eq!(app.students.mode(), ViewMode::Populated { count: 1 });
        assert_eq!(api.calls(), vec![Call::List]);

        let text = render_to_string(120, 30, |frame| app.draw(frame));
        assert!(text.contains("Number of students: [1]"));
        assert!(text.contains("API http://localhost:8080/api/v1"));
    }

    #[tokio::test]
    async fn test_delete_flow_shows_toast_and_empties() {
        let api = Arc::new(MockApi::default());
        api.push_list(Ok(vec![student(1, "Bill Gates")]));
        api.push_delete(Ok(()));
        api.push_list(Ok(Vec::new()));
        let mut app = app(api.clone());

        app.mount().unwrap();
        pump_until(&mut app, loaded).await;

        app.handle_key_event(char_key('d')).unwrap();
        app.handle_key_event(char_key('y')).unwrap();
        pump_until(&mut app, |m| matches!(m, AppMessage::StoreOutcome(_))).await;

        assert_eq!(app.students.mode(), ViewMode::Empty);
        assert_eq!(api.calls(), vec![Call::List, Call::Delete(1), Call::List]);

        let text = render_to_string(120, 30, |frame| app.draw(frame));
        assert!(text.contains("Student deleted"));
        assert!(text.contains("No data"));
    }

    #[tokio::test]
    async fn test_failed_add_keeps_drawer_open() {
        let api = Arc::new(MockApi::default());
        api.push_list(Ok(Vec::new()));
        api.push_create(Err(ApiError::Status {
            status: 400,
            body: ErrorBody {
                message: Some("Email 'ada@example.com' is taken".to_string()),
                error: Some("Bad Request".to_string()),
                status: Some(400),
                path: None,
            },
        }));
        let mut app = app(api.clone());
        app.mount().unwrap();
        pump_until(&mut app, loaded).await;

        app.handle_key_event(char_key('a')).unwrap();
        for c in "Ada".chars() {
            app.handle_key_event(char_key(c)).unwrap();
        }
        app.handle_key_event(key(KeyCode::Tab)).unwrap();
        for c in "ada@example.com".chars() {
            app.handle_key_event(char_key(c)).unwrap();
        }
        app.handle_key_event(key(KeyCode::Enter)).unwrap();

        let mut notifications = Vec::new();
        loop {
            let message = timeout(Duration::from_secs(5), app.message_rx.recv())
                .await
                .unwrap()
                .unwrap();
            if let AppMessage::Notify(notification) = &message {
                notifications.push(notification.clone());
            }
            let finished = matches!(message, AppMessage::StoreOutcome(_));
            app.update(message);
            if finished {
                break;
            }
        }

        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Error);
        assert_eq!(notifications[0].placement, Placement::BottomLeft);
        assert_eq!(
            notifications[0].detail,
            "Email 'ada@example.com' is taken [400] [Bad Request]"
        );
        assert!(app.students.has_overlay());
        assert_eq!(
            api.calls(),
            vec![
                Call::List,
                Call::Create(NewStudent {
                    name: "Ada".to_string(),
                    email: "ada@example.com".to_string(),
                    gender: Gender::Male,
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_global_keys() {
        let api = Arc::new(MockApi::default());
        api.push_list(Ok(Vec::new()));
        let mut app = app(api);
        app.mount().unwrap();
        pump_until(&mut app, loaded).await;

        app.handle_key_event(char_key('?')).unwrap();
        pump_until(&mut app, |m| *m == AppMessage::DisplayHelp).await;
        assert!(app.help.is_some());

        // While help is open, q closes it instead of quitting
        app.handle_key_event(char_key('q')).unwrap();
        assert!(app.help.is_none());
        assert!(!app.should_quit);

        app.handle_key_event(char_key('q')).unwrap();
        pump_until(&mut app, |m| *m == AppMessage::Quit).await;
        assert!(app.should_quit);
    }
}
