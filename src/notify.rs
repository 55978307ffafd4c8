//! Transient user notifications.
//!
//! The record store reports outcomes through a [`Notifier`] handed to it at
//! construction. The application wires in a [`ChannelNotifier`] that forwards
//! each notification to the UI loop, where it becomes a toast.

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::app::AppMessage;

/// Screen corner a notification is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    TopRight,
    BottomLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub detail: String,
    pub placement: Placement,
}

impl Notification {
    pub fn success(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: title.into(),
            detail: detail.into(),
            placement: Placement::default(),
        }
    }

    pub fn error(
        title: impl Into<String>,
        detail: impl Into<String>,
        placement: Option<Placement>,
    ) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: title.into(),
            detail: detail.into(),
            placement: placement.unwrap_or_default(),
        }
    }
}

/// Fire-and-forget sink for success and error messages.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, title: &str, detail: &str);

    fn notify_error(&self, title: &str, detail: &str, placement: Option<Placement>);
}

/// Forwards notifications to the application loop.
pub struct ChannelNotifier {
    tx: UnboundedSender<AppMessage>,
}

impl ChannelNotifier {
    pub const fn new(tx: UnboundedSender<AppMessage>) -> Self {
        Self { tx }
    }

    fn send(&self, notification: Notification) {
        debug!("Notification: {notification:?}");
        // The UI loop is gone once the session ends; nothing left to show.
        let _ = self.tx.send(AppMessage::Notify(notification));
    }
}

impl Notifier for ChannelNotifier {
    fn notify_success(&self, title: &str, detail: &str) {
        self.send(Notification::success(title, detail));
    }

    fn notify_error(&self, title: &str, detail: &str, placement: Option<Placement>) {
        self.send(Notification::error(title, detail, placement));
    }
}
