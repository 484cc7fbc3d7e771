use std::sync::Arc;

use client_core::{FeedbackDurations, Notification, NotificationKind, NotificationSink, TransientNotifier};

/// Echoes every notification to the terminal and keeps the timed copy for
/// anything that asks what is on screen.
pub struct ConsoleSink {
    inner: Arc<TransientNotifier>,
}

impl ConsoleSink {
    pub fn new(durations: FeedbackDurations) -> Arc<Self> {
        Arc::new(Self {
            inner: TransientNotifier::new(durations),
        })
    }
}

impl NotificationSink for ConsoleSink {
    fn notify(&self, kind: NotificationKind, message: String) {
        match kind {
            NotificationKind::Error => eprintln!("error: {message}"),
            NotificationKind::Success => println!("ok: {message}"),
            NotificationKind::Info => println!("note: {message}"),
        }
        self.inner.notify(kind, message);
    }

    fn dismiss(&self, kind: NotificationKind) {
        self.inner.dismiss(kind);
    }

    fn active(&self) -> Vec<Notification> {
        self.inner.active()
    }
}
