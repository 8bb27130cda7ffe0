//! Notification mailbox
//!
//! Sensor handlers run on the simulator's delivery thread and may not touch
//! the HUD. They post short messages into a bounded channel instead; the HUD
//! drains it once per tick and shows the newest message.

use async_channel::{Receiver, Sender};
use metrics::counter;
use tracing::trace;

/// How long a notification stays on screen unless told otherwise
pub const DEFAULT_NOTIFICATION_SECONDS: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NotificationLevel {
    #[default]
    Info,
    /// Drawn in red
    Error,
}

/// One transient message for the HUD
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub text: String,
    pub level: NotificationLevel,
    pub seconds: f64,
}

impl Notification {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NotificationLevel::Info,
            seconds: DEFAULT_NOTIFICATION_SECONDS,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: format!("Error: {}", text.into()),
            level: NotificationLevel::Error,
            seconds: DEFAULT_NOTIFICATION_SECONDS,
        }
    }

    pub fn with_seconds(mut self, seconds: f64) -> Self {
        self.seconds = seconds;
        self
    }
}

/// Create a bounded mailbox
pub fn notification_channel(capacity: usize) -> (NotificationSender, NotificationReceiver) {
    let (tx, rx) = async_channel::bounded(capacity.max(1));
    (NotificationSender { tx }, NotificationReceiver { rx })
}

/// Posting side, cloned into every handler
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: Sender<Notification>,
}

impl NotificationSender {
    /// Post without blocking
    ///
    /// A full mailbox evicts its oldest message so the newest always lands.
    /// Returns false only when the mailbox is closed.
    pub fn send(&self, notification: Notification) -> bool {
        match self.tx.force_send(notification) {
            Ok(None) => true,
            Ok(Some(evicted)) => {
                counter!("carla_hud_notifications_dropped_total").increment(1);
                trace!(text = %evicted.text, "notification mailbox full, evicted oldest");
                true
            }
            Err(e) => {
                trace!(text = %e.0.text, "notification mailbox closed");
                false
            }
        }
    }

    pub fn notify(&self, text: impl Into<String>) -> bool {
        self.send(Notification::info(text))
    }

    pub fn notify_for(&self, text: impl Into<String>, seconds: f64) -> bool {
        self.send(Notification::info(text).with_seconds(seconds))
    }

    pub fn error(&self, text: impl Into<String>) -> bool {
        self.send(Notification::error(text))
    }
}

/// Draining side, owned by the render loop
#[derive(Debug)]
pub struct NotificationReceiver {
    rx: Receiver<Notification>,
}

impl NotificationReceiver {
    /// Take everything queued so far, oldest first
    pub fn drain(&self) -> Vec<Notification> {
        let mut out = Vec::with_capacity(self.rx.len());
        while let Ok(n) = self.rx.try_recv() {
            out.push(n);
        }
        out
    }

    /// Newest queued notification, discarding older ones
    pub fn latest(&self) -> Option<Notification> {
        self.drain().pop()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
