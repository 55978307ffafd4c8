//! The record store: authoritative in-session copy of the student list.
//!
//! [`RecordStore`] owns the [`StoreState`] and is the only thing that mutates
//! it. Every transition is pushed synchronously to subscribed listeners, which
//! is how the view learns about new state. The application runs the store
//! inside a single task behind a [`StoreHandle`], so intents are applied one at
//! a time in the order they were issued.

use std::sync::Arc;

use color_eyre::eyre::eyre;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ErrorBody, StudentApi};
use crate::model::{NewStudent, Student, StudentId};
use crate::notify::{Notifier, Placement};

const ISSUE_TITLE: &str = "There was an issue";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreState {
    /// Last successfully fetched collection, in server order.
    pub students: Vec<Student>,
    pub is_loading: bool,
}

impl Default for StoreState {
    fn default() -> Self {
        Self {
            students: Vec::new(),
            is_loading: true,
        }
    }
}

type Listener = Box<dyn Fn(&StoreState) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(usize);

pub struct RecordStore {
    api: Arc<dyn StudentApi>,
    notifier: Arc<dyn Notifier>,
    state: StoreState,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: usize,
}

impl RecordStore {
    pub fn new(api: Arc<dyn StudentApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: StoreState::default(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub const fn state(&self) -> &StoreState {
        &self.state
    }

    /// Register a listener called after every state transition.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&StoreState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.retain(|(existing, _)| *existing != id);
    }

    fn emit(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.state);
        }
    }

    /// Replace the collection with the server's current one.
    ///
    /// On failure the previous list is kept and an error is reported.
    pub async fn refresh(&mut self) {
        self.state.is_loading = true;
        self.emit();

        let api = Arc::clone(&self.api);
        match api.list_students().await {
            Ok(students) => {
                info!("Loaded {} students", students.len());
                self.state.students = students;
            }
            Err(err) => {
                warn!("Failed to load students: {err}");
                self.notifier
                    .notify_error(ISSUE_TITLE, &list_error_detail(&err), None);
            }
        }

        self.state.is_loading = false;
        self.emit();
    }

    /// Delete a student, then refresh on success.
    ///
    /// Returns whether the server accepted the deletion.
    pub async fn remove(&mut self, id: StudentId) -> bool {
        let api = Arc::clone(&self.api);
        match api.delete_student(id).await {
            Ok(()) => {
                info!("Deleted student {id}");
                self.notifier
                    .notify_success("Student deleted", &format!("Student with {id} was deleted"));
                self.refresh().await;
                true
            }
            Err(err) => {
                warn!("Failed to delete student {id}: {err}");
                self.notifier.notify_error(
                    ISSUE_TITLE,
                    &mutation_error_detail(&err),
                    Some(Placement::BottomLeft),
                );
                false
            }
        }
    }

    /// Create a student, then refresh on success.
    ///
    /// Returns whether the server accepted the new record.
    pub async fn add(&mut self, student: NewStudent) -> bool {
        let api = Arc::clone(&self.api);
        match api.create_student(&student).await {
            Ok(created) => {
                info!(
                    "Added student {} (id {:?})",
                    student.name,
                    created.map(|s| s.id)
                );
                self.notifier.notify_success(
                    "Student successfully added",
                    &format!("{} was added to the system", student.name),
                );
                self.refresh().await;
                true
            }
            Err(err) => {
                warn!("Failed to add student {}: {err}", student.name);
                self.notifier.notify_error(
                    ISSUE_TITLE,
                    &mutation_error_detail(&err),
                    Some(Placement::BottomLeft),
                );
                false
            }
        }
    }
}

fn message_or_default(body: &ErrorBody, status: u16) -> String {
    body.message
        .clone()
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

/// `{message}[{error}][{status}][path:{path}]`
fn list_error_detail(err: &ApiError) -> String {
    match (err.status(), err.body()) {
        (Some(status), Some(body)) => format!(
            "{}[{}][{}][path:{}]",
            message_or_default(body, status),
            body.error.as_deref().unwrap_or_default(),
            body.status.unwrap_or(status),
            body.path.as_deref().unwrap_or_default(),
        ),
        _ => err.to_string(),
    }
}

/// `{message} [{status}] [{error}]`
fn mutation_error_detail(err: &ApiError) -> String {
    match (err.status(), err.body()) {
        (Some(status), Some(body)) => format!(
            "{} [{}] [{}]",
            message_or_default(body, status),
            body.status.unwrap_or(status),
            body.error.as_deref().unwrap_or_default(),
        ),
        _ => err.to_string(),
    }
}

/// A request for the store, issued by the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Refresh,
    Remove(StudentId),
    Add(NewStudent),
}

/// Result of a mutating intent, reported once its refresh has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Removed { id: StudentId, ok: bool },
    Added { ok: bool },
}

/// Owner of the task that runs a [`RecordStore`].
///
/// Dropping the handle abandons whatever request is in flight. [`close`]
/// lets the queued intents finish instead.
///
/// [`close`]: StoreHandle::close
pub struct StoreHandle {
    tx: Option<UnboundedSender<Intent>>,
    task: JoinHandle<()>,
}

impl StoreHandle {
    /// Run `store` in its own task, forwarding every state transition to
    /// `on_change` until the handle is closed.
    pub fn spawn(
        mut store: RecordStore,
        on_change: impl Fn(&StoreState) + Send + Sync + 'static,
        on_outcome: impl Fn(Outcome) + Send + 'static,
    ) -> Self {
        let subscription = store.subscribe(on_change);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            while let Some(intent) = rx.recv().await {
                debug!("Applying intent {intent:?}");
                match intent {
                    Intent::Refresh => store.refresh().await,
                    Intent::Remove(id) => {
                        let ok = store.remove(id).await;
                        on_outcome(Outcome::Removed { id, ok });
                    }
                    Intent::Add(student) => {
                        let ok = store.add(student).await;
                        on_outcome(Outcome::Added { ok });
                    }
                }
                debug!("Store holds {} students", store.state().students.len());
            }
            store.unsubscribe(subscription);
            debug!("Store task finished");
        });
        Self {
            tx: Some(tx),
            task,
        }
    }

    pub fn send(&self, intent: Intent) -> color_eyre::Result<()> {
        let Some(tx) = &self.tx else {
            return Err(eyre!("Store is closed"));
        };
        tx.send(intent)?;
        Ok(())
    }

    /// Stop accepting intents. The task drains what is queued, detaches its
    /// listener and exits.
    pub fn close(&mut self) {
        if self.tx.take().is_some() {
            debug!("Closing store");
        }
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::Gender;
    use crate::notify::{Notification, NotificationKind};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        List,
        Create(NewStudent),
        Delete(StudentId),
    }

    /// Scripted API: each call pops the next queued response.
    #[derive(Default)]
    pub struct MockApi {
        lists: Mutex<VecDeque<Result<Vec<Student>, ApiError>>>,
        creates: Mutex<VecDeque<Result<Option<Student>, ApiError>>>,
        deletes: Mutex<VecDeque<Result<(), ApiError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl MockApi {
        pub fn push_list(&self, result: Result<Vec<Student>, ApiError>) {
            self.lists.lock().unwrap().push_back(result);
        }

        pub fn push_create(&self, result: Result<Option<Student>, ApiError>) {
            self.creates.lock().unwrap().push_back(result);
        }

        pub fn push_delete(&self, result: Result<(), ApiError>) {
            self.deletes.lock().unwrap().push_back(result);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StudentApi for MockApi {
        async fn list_students(&self) -> Result<Vec<Student>, ApiError> {
            self.calls.lock().unwrap().push(Call::List);
            self.lists
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected list call")
        }

        async fn create_student(&self, student: &NewStudent) -> Result<Option<Student>, ApiError> {
            self.calls.lock().unwrap().push(Call::Create(student.clone()));
            self.creates
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected create call")
        }

        async fn delete_student(&self, id: StudentId) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(Call::Delete(id));
            self.deletes
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected delete call")
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        notifications: Mutex<Vec<Notification>>,
    }

    impl RecordingNotifier {
        pub fn notifications(&self) -> Vec<Notification> {
            self.notifications.lock().unwrap().clone()
        }

        fn count(&self, kind: NotificationKind) -> usize {
            self.notifications()
                .iter()
                .filter(|n| n.kind == kind)
                .count()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify_success(&self, title: &str, detail: &str) {
            self.notifications
                .lock()
                .unwrap()
                .push(Notification::success(title, detail));
        }

        fn notify_error(&self, title: &str, detail: &str, placement: Option<Placement>) {
            self.notifications
                .lock()
                .unwrap()
                .push(Notification::error(title, detail, placement));
        }
    }

    pub fn student(id: StudentId, name: &str) -> Student {
        Student {
            id,
            name: name.to_string(),
            email: format!("{}@x.com", name.to_lowercase().replace(' ', ".")),
            gender: Gender::Male,
        }
    }

    fn status_error(status: u16, message: &str, error: &str) -> ApiError {
        ApiError::Status {
            status,
            body: ErrorBody {
                message: Some(message.to_string()),
                error: Some(error.to_string()),
                status: Some(status),
                path: None,
            },
        }
    }

    fn setup() -> (Arc<MockApi>, Arc<RecordingNotifier>, RecordStore) {
        let api = Arc::new(MockApi::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = RecordStore::new(api.clone(), notifier.clone());
        (api, notifier, store)
    }

    fn record_states(store: &mut RecordStore) -> Arc<Mutex<Vec<StoreState>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |state| sink.lock().unwrap().push(state.clone()));
        seen
    }

    #[test]
    fn test_new_store_is_loading_and_empty() {
        let (_, _, store) = setup();
        assert!(store.state().is_loading);
        assert!(store.state().students.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_replaces_students_in_server_order() {
        let (api, notifier, mut store) = setup();
        let students = vec![student(3, "Cy"), student(1, "Al"), student(2, "Bo")];
        api.push_list(Ok(students.clone()));

        store.refresh().await;

        assert!(!store.state().is_loading);
        assert_eq!(store.state().students, students);
        assert!(notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_notifies_loading_then_result() {
        let (api, _, mut store) = setup();
        let seen = record_states(&mut store);
        api.push_list(Ok(vec![student(1, "Al")]));

        store.refresh().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].is_loading);
        assert!(!seen[1].is_loading);
        assert_eq!(seen[1].students.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_students() {
        let (api, notifier, mut store) = setup();
        api.push_list(Ok(vec![student(1, "Al")]));
        store.refresh().await;

        api.push_list(Err(ApiError::Status {
            status: 500,
            body: ErrorBody {
                message: Some("boom".to_string()),
                error: Some("Internal Server Error".to_string()),
                status: Some(500),
                path: Some("/api/v1/students".to_string()),
            },
        }));
        store.refresh().await;

        assert!(!store.state().is_loading);
        assert_eq!(store.state().students, vec![student(1, "Al")]);
        let notifications = notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].title, "There was an issue");
        assert_eq!(
            notifications[0].detail,
            "boom[Internal Server Error][500][path:/api/v1/students]"
        );
        assert_eq!(notifications[0].placement, Placement::TopRight);
    }

    #[tokio::test]
    async fn test_first_refresh_failure_clears_loading() {
        let (api, notifier, mut store) = setup();
        api.push_list(Err(ApiError::Parse {
            url: "http://x/students".to_string(),
            reason: "expected value".to_string(),
        }));

        store.refresh().await;

        assert!(!store.state().is_loading);
        assert!(store.state().students.is_empty());
        assert_eq!(notifier.count(NotificationKind::Error), 1);
    }

    #[tokio::test]
    async fn test_remove_success_refreshes_once_after_delete() {
        let (api, notifier, mut store) = setup();
        api.push_list(Ok(vec![student(1, "Bill Gates"), student(2, "Al")]));
        store.refresh().await;

        api.push_delete(Ok(()));
        api.push_list(Ok(vec![student(2, "Al")]));
        assert!(store.remove(1).await);

        assert_eq!(
            api.calls(),
            vec![Call::List, Call::Delete(1), Call::List]
        );
        assert!(store.state().students.iter().all(|s| s.id != 1));
        let notifications = notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Success);
        assert_eq!(notifications[0].title, "Student deleted");
        assert_eq!(notifications[0].detail, "Student with 1 was deleted");
    }

    #[tokio::test]
    async fn test_remove_failure_leaves_state_untouched() {
        let (api, notifier, mut store) = setup();
        api.push_list(Ok(vec![student(1, "Al")]));
        store.refresh().await;
        let seen = record_states(&mut store);
        let before = store.state().clone();

        api.push_delete(Err(status_error(
            404,
            "Student with id 9 does not exists",
            "Not Found",
        )));
        assert!(!store.remove(9).await);

        assert_eq!(store.state(), &before);
        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(api.calls(), vec![Call::List, Call::Delete(9)]);
        let notifications = notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Error);
        assert_eq!(
            notifications[0].detail,
            "Student with id 9 does not exists [404] [Not Found]"
        );
        assert_eq!(notifications[0].placement, Placement::BottomLeft);
    }

    #[tokio::test]
    async fn test_add_success_refreshes() {
        let (api, notifier, mut store) = setup();
        let new = NewStudent {
            name: "Ada".to_string(),
            email: "ada@x.com".to_string(),
            gender: Gender::Female,
        };
        api.push_create(Ok(None));
        api.push_list(Ok(vec![student(5, "Ada")]));

        assert!(store.add(new.clone()).await);

        assert_eq!(api.calls(), vec![Call::Create(new), Call::List]);
        assert_eq!(store.state().students.len(), 1);
        let notifications = notifier.notifications();
        assert_eq!(notifications[0].title, "Student successfully added");
        assert_eq!(notifications[0].detail, "Ada was added to the system");
    }

    #[tokio::test]
    async fn test_add_failure_reports_and_skips_refresh() {
        let (api, notifier, mut store) = setup();
        api.push_create(Err(status_error(
            400,
            "Email 'ada@x.com' is taken",
            "Bad Request",
        )));

        assert!(!store.add(NewStudent::default()).await);

        assert_eq!(api.calls().len(), 1);
        assert!(store.state().is_loading);
        let notifications = notifier.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(
            notifications[0].detail,
            "Email 'ada@x.com' is taken [400] [Bad Request]"
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_updates() {
        let (api, _, mut store) = setup();
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        let id = store.subscribe(move |_| *counter.lock().unwrap() += 1);
        store.unsubscribe(id);

        api.push_list(Ok(vec![]));
        store.refresh().await;

        assert_eq!(*seen.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_handle_applies_intents_in_order() {
        let (api, _, store) = setup();
        let (state_tx, mut state_rx) = mpsc::unbounded_channel();
        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();

        api.push_list(Ok(vec![student(1, "Bill Gates")]));
        api.push_delete(Ok(()));
        api.push_list(Ok(vec![]));

        let handle = StoreHandle::spawn(
            store,
            move |state| {
                let _ = state_tx.send(state.clone());
            },
            move |outcome| {
                let _ = outcome_tx.send(outcome);
            },
        );
        handle.send(Intent::Refresh).unwrap();
        handle.send(Intent::Remove(1)).unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(2), outcome_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, Outcome::Removed { id: 1, ok: true });
        assert_eq!(api.calls(), vec![Call::List, Call::Delete(1), Call::List]);

        let mut last = None;
        while let Ok(state) = state_rx.try_recv() {
            last = Some(state);
        }
        let last = last.unwrap();
        assert!(!last.is_loading);
        assert!(last.students.is_empty());
    }

    #[tokio::test]
    async fn test_close_drains_queue_and_detaches_listener() {
        let (api, _, store) = setup();
        let (state_tx, mut state_rx) = mpsc::unbounded_channel();
        api.push_list(Ok(vec![student(1, "Bill Gates")]));

        let mut handle = StoreHandle::spawn(
            store,
            move |state| {
                let _ = state_tx.send(state.clone());
            },
            |_| {},
        );
        handle.send(Intent::Refresh).unwrap();
        handle.close();
        assert!(handle.send(Intent::Refresh).is_err());

        let mut states = Vec::new();
        // The channel closes once the task has dropped the listener
        while let Some(state) = tokio::time::timeout(Duration::from_secs(2), state_rx.recv())
            .await
            .unwrap()
        {
            states.push(state);
        }
        assert_eq!(states.len(), 2);
        assert_eq!(states[1].students, vec![student(1, "Bill Gates")]);
        assert_eq!(api.calls(), vec![Call::List]);
    }
}
