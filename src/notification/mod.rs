//! Move feedback: in-app toasts and desktop notifications

use std::collections::VecDeque;
use std::str::FromStr;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::board::BoardNotice;
use crate::error::{ApiError, BoardError};

/// How long a toast stays on screen.
pub const TOAST_TTL: Duration = Duration::from_secs(5);

/// Notification backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationBackend {
    /// No notifications
    None,
    /// Toasts in the board footer
    #[default]
    InApp,
    /// Desktop notifications only (via notify-rust)
    System,
    /// Both toasts and desktop notifications
    Both,
}

impl NotificationBackend {
    /// Parse backend from settings value (case-insensitive)
    pub fn from_settings_value(s: &str) -> Option<Self> {
        Self::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::InApp => "in-app",
            Self::System => "system",
            Self::Both => "both",
        }
    }
}

impl FromStr for NotificationBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "none" => Ok(Self::None),
            "in-app" | "inapp" | "toast" => Ok(Self::InApp),
            "system" => Ok(Self::System),
            "both" => Ok(Self::Both),
            _ => Err(()),
        }
    }
}

fn backend_targets(backend: NotificationBackend) -> (bool, bool) {
    match backend {
        NotificationBackend::None => (false, false),
        NotificationBackend::InApp => (true, false),
        NotificationBackend::System => (false, true),
        NotificationBackend::Both => (true, true),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
}

impl Toast {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Maps a failed move or fetch to a user-facing title and message.
pub fn toast_for_error(err: &BoardError) -> Toast {
    let cause = match err {
        BoardError::RemoteRejected { cause, .. } | BoardError::FetchFailed(cause) => cause.clone(),
        BoardError::NetworkUnavailable(message) => ApiError::Network(message.clone()),
        other => return Toast::error("Error", other.to_string()),
    };

    match cause {
        ApiError::Network(_) => Toast::error(
            "Connection Failed",
            "Unable to connect to the server. Please check your connection.",
        ),
        ApiError::Unauthorized => Toast::error(
            "Session Expired",
            "Your session has expired. Please log in again.",
        ),
        ApiError::Rejected(message) if message.contains("Only owners can") => {
            Toast::error("Permission Denied", message)
        }
        ApiError::Rejected(message) if message.contains("don't have access") => {
            Toast::error("Access Denied", message)
        }
        ApiError::Rejected(message) => Toast::error("Error", message),
        other => Toast::error("Error", other.to_string()),
    }
}

/// Toast for an outward board notice. Selections and fetch failures are not
/// toasts.
pub fn toast_for_notice(notice: &BoardNotice) -> Option<Toast> {
    match notice {
        BoardNotice::MoveConfirmed { .. } => {
            Some(Toast::success("Task Moved", "Status updated successfully"))
        }
        BoardNotice::MoveFailed { error, .. } => Some(toast_for_error(error)),
        BoardNotice::TaskSelected(_) | BoardNotice::FetchFailed(_) => None,
    }
}

#[derive(Debug)]
pub struct ToastQueue {
    toasts: VecDeque<(Instant, Toast)>,
    ttl: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(TOAST_TTL)
    }
}

impl ToastQueue {
    pub fn new(ttl: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            ttl,
        }
    }

    pub fn push(&mut self, toast: Toast, now: Instant) {
        self.toasts.push_back((now, toast));
    }

    /// Drops expired toasts; returns whether anything was removed.
    pub fn prune(&mut self, now: Instant) -> bool {
        let before = self.toasts.len();
        self.toasts
            .retain(|(shown_at, _)| now.saturating_duration_since(*shown_at) < self.ttl);
        before != self.toasts.len()
    }

    /// Newest toast still on screen.
    pub fn current(&self) -> Option<&Toast> {
        self.toasts.back().map(|(_, toast)| toast)
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

/// Routes toasts to the configured backend(s).
#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    backend: NotificationBackend,
}

impl Notifier {
    pub fn new(backend: NotificationBackend) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> NotificationBackend {
        self.backend
    }

    pub fn notify(&self, queue: &mut ToastQueue, toast: Toast, now: Instant) {
        let (in_app, system) = backend_targets(self.backend);
        if !in_app && !system {
            debug!(title = %toast.title, "notification skipped (backend is none)");
            return;
        }
        if system {
            send_system_notification(&toast);
        }
        if in_app {
            queue.push(toast, now);
        }
    }
}

fn send_system_notification(toast: &Toast) {
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        let timeout_ms = TOAST_TTL.as_millis().min(u128::from(u32::MAX)) as u32;
        let icon = match toast.level {
            ToastLevel::Success => "dialog-information",
            ToastLevel::Error => "dialog-error",
        };
        debug!(title = %toast.title, timeout_ms, "sending system notification");

        let notification_result = notify_rust::Notification::new()
            .summary(&toast.title)
            .body(&toast.message)
            .icon(icon)
            .timeout(notify_rust::Timeout::Milliseconds(timeout_ms))
            .show();

        if let Err(err) = notification_result {
            warn!(error = %err, "failed to send system notification");
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        debug!(title = %toast.title, "system notifications not supported on this OS");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaskId, TaskStatus};

    fn rejected(cause: ApiError) -> BoardError {
        BoardError::RemoteRejected {
            task_id: TaskId(1),
            cause,
        }
    }

    #[test]
    fn test_notification_backend_from_str() {
        assert_eq!(
            NotificationBackend::from_settings_value("in-app"),
            Some(NotificationBackend::InApp)
        );
        assert_eq!(
            NotificationBackend::from_settings_value("IN_APP"),
            Some(NotificationBackend::InApp)
        );
        assert_eq!(
            NotificationBackend::from_settings_value("System"),
            Some(NotificationBackend::System)
        );
        assert_eq!(
            NotificationBackend::from_settings_value("none"),
            Some(NotificationBackend::None)
        );
        assert_eq!(NotificationBackend::from_settings_value("pager"), None);
        assert_eq!(NotificationBackend::default(), NotificationBackend::InApp);
    }

    #[test]
    fn test_backend_targets() {
        assert_eq!(backend_targets(NotificationBackend::None), (false, false));
        assert_eq!(backend_targets(NotificationBackend::InApp), (true, false));
        assert_eq!(backend_targets(NotificationBackend::System), (false, true));
        assert_eq!(backend_targets(NotificationBackend::Both), (true, true));
    }

    #[test]
    fn error_toasts_follow_server_message() {
        let toast = toast_for_error(&rejected(ApiError::Rejected(
            "Only owners can move tasks".to_string(),
        )));
        assert_eq!(toast.title, "Permission Denied");
        assert_eq!(toast.message, "Only owners can move tasks");

        let toast = toast_for_error(&rejected(ApiError::Rejected(
            "You don't have access to this project".to_string(),
        )));
        assert_eq!(toast.title, "Access Denied");

        let toast = toast_for_error(&rejected(ApiError::Unauthorized));
        assert_eq!(toast.title, "Session Expired");

        let toast = toast_for_error(&rejected(ApiError::Network("refused".to_string())));
        assert_eq!(toast.title, "Connection Failed");

        let toast = toast_for_error(&rejected(ApiError::Http(502)));
        assert_eq!(toast.title, "Error");
        assert_eq!(toast.level, ToastLevel::Error);
    }

    #[test]
    fn notices_map_to_toasts() {
        let confirmed = BoardNotice::MoveConfirmed {
            task_id: TaskId(1),
            status: TaskStatus::Done,
        };
        assert_eq!(
            toast_for_notice(&confirmed),
            Some(Toast::success("Task Moved", "Status updated successfully"))
        );
        assert_eq!(toast_for_notice(&BoardNotice::TaskSelected(TaskId(1))), None);
    }

    #[test]
    fn toasts_expire_after_ttl() {
        let start = Instant::now();
        let mut queue = ToastQueue::default();
        queue.push(Toast::success("a", "first"), start);
        queue.push(Toast::error("b", "second"), start + Duration::from_secs(2));

        assert_eq!(queue.current().map(|t| t.message.as_str()), Some("second"));
        assert!(queue.prune(start + Duration::from_secs(5)));
        assert_eq!(queue.len(), 1);
        assert!(queue.prune(start + Duration::from_secs(7)));
        assert!(queue.is_empty());
    }

    #[test]
    fn backend_none_drops_toasts() {
        let mut queue = ToastQueue::default();
        Notifier::new(NotificationBackend::None).notify(
            &mut queue,
            Toast::success("Task Moved", "ok"),
            Instant::now(),
        );
        assert!(queue.is_empty());

        Notifier::new(NotificationBackend::InApp).notify(
            &mut queue,
            Toast::success("Task Moved", "ok"),
            Instant::now(),
        );
        assert_eq!(queue.len(), 1);
    }
}
