//! Failure notices surfaced to the operator-facing notification system.
//!
//! The banner/alert UI itself is an external collaborator; this module owns
//! the shape of what gets sent to it. A failed bulk fetch produces exactly
//! two notices, a terse one for the banner and a detailed one for the
//! notification list, both tagged as an error-category request failure.

/// Classification tag carried on every notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    RequestFail,
}

/// Fire-and-forget sink for user-facing failure notices.
pub trait AlertSink: Send + Sync + 'static {
    fn notify_error(&self, kind: AlertKind, message: &str);
}

const FETCH_FAILED_MSG: &str = "Failed to retrieve robots";

/// Wraps an [`AlertSink`] and owns the notice patterns the registry emits.
pub struct AlertSender<S> {
    sink: S,
}

impl<S: AlertSink> AlertSender<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Emit the two-notice pair for a failed bulk fetch.
    pub fn request_failure(&self, error: &anyhow::Error) {
        self.sink.notify_error(AlertKind::RequestFail, FETCH_FAILED_MSG);
        self.sink.notify_error(
            AlertKind::RequestFail,
            &format!("{}: {:#}", FETCH_FAILED_MSG, error),
        );
    }
}
