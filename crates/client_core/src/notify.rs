//! Transient operator feedback.
//!
//! Each [`NotificationKind`] is its own channel. Showing a notification on a
//! channel cancels that channel's pending auto-dismiss so an older timer can
//! never hide a newer message.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Error,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub visible: bool,
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: String);
    fn dismiss(&self, kind: NotificationKind);

    /// Notifications currently on screen.
    fn active(&self) -> Vec<Notification> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackDurations {
    pub error: Duration,
    pub success: Duration,
    pub info: Duration,
}

impl Default for FeedbackDurations {
    fn default() -> Self {
        Self {
            error: Duration::from_millis(1000),
            success: Duration::from_millis(2000),
            info: Duration::from_millis(2000),
        }
    }
}

impl FeedbackDurations {
    pub fn for_kind(&self, kind: NotificationKind) -> Duration {
        match kind {
            NotificationKind::Error => self.error,
            NotificationKind::Success => self.success,
            NotificationKind::Info => self.info,
        }
    }
}

#[derive(Default)]
struct Channel {
    current: Option<Notification>,
    generation: u64,
    dismiss_task: Option<JoinHandle<()>>,
}

impl Channel {
    fn cancel_timer(&mut self) {
        if let Some(task) = self.dismiss_task.take() {
            task.abort();
        }
    }
}

type Channels = Arc<Mutex<HashMap<NotificationKind, Channel>>>;

/// Default sink: keeps the latest message per channel and hides it after the
/// channel's display duration.
pub struct TransientNotifier {
    durations: FeedbackDurations,
    channels: Channels,
}

impl TransientNotifier {
    pub fn new(durations: FeedbackDurations) -> Arc<Self> {
        Arc::new(Self {
            durations,
            channels: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn current(&self, kind: NotificationKind) -> Option<Notification> {
        lock(&self.channels)
            .get(&kind)
            .and_then(|channel| channel.current.clone())
    }

    fn schedule_dismiss(&self, kind: NotificationKind, generation: u64) -> Option<JoinHandle<()>> {
        // Outside a runtime the message simply stays until replaced.
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let delay = self.durations.for_kind(kind);
        let channels = Arc::clone(&self.channels);
        Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut guard = lock(&channels);
            if let Some(channel) = guard.get_mut(&kind) {
                if channel.generation == generation {
                    channel.current = None;
                    channel.dismiss_task = None;
                    debug!(?kind, "transient notification expired");
                }
            }
        }))
    }
}

impl NotificationSink for TransientNotifier {
    fn notify(&self, kind: NotificationKind, message: String) {
        let generation = {
            let mut guard = lock(&self.channels);
            let channel = guard.entry(kind).or_default();
            channel.cancel_timer();
            channel.generation += 1;
            channel.current = Some(Notification {
                kind,
                message,
                visible: true,
            });
            channel.generation
        };

        let task = self.schedule_dismiss(kind, generation);
        let mut guard = lock(&self.channels);
        if let Some(channel) = guard.get_mut(&kind) {
            if channel.generation == generation {
                channel.dismiss_task = task;
            } else if let Some(task) = task {
                task.abort();
            }
        }
    }

    fn dismiss(&self, kind: NotificationKind) {
        let mut guard = lock(&self.channels);
        if let Some(channel) = guard.get_mut(&kind) {
            channel.cancel_timer();
            channel.generation += 1;
            channel.current = None;
        }
    }

    fn active(&self) -> Vec<Notification> {
        let guard = lock(&self.channels);
        [
            NotificationKind::Error,
            NotificationKind::Success,
            NotificationKind::Info,
        ]
        .into_iter()
        .filter_map(|kind| guard.get(&kind).and_then(|channel| channel.current.clone()))
        .collect()
    }
}

fn lock(channels: &Channels) -> std::sync::MutexGuard<'_, HashMap<NotificationKind, Channel>> {
    channels.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/notify_tests.rs"]
mod tests;
