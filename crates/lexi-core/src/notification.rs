//! Transient, auto-dismissing user notifications.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// Holds at most one visible message.
///
/// A newer message replaces the current one. Each message is dismissed after
/// the configured duration unless it was replaced in the meantime.
#[derive(Clone)]
pub struct Notifier {
    tx: Arc<watch::Sender<Option<Notification>>>,
    next_id: Arc<AtomicU64>,
    duration: Duration,
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            tx: Arc::new(tx),
            next_id: Arc::new(AtomicU64::new(1)),
            duration,
        }
    }

    /// Shows `message` and schedules its dismissal. Must be called from
    /// within a tokio runtime.
    pub fn notify(&self, message: impl Into<String>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            message: message.into(),
            raised_at: Utc::now(),
        };
        tracing::debug!(id, message = %notification.message, "Notification raised");
        self.tx.send_replace(Some(notification));

        let tx = self.tx.clone();
        let duration = self.duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            tx.send_if_modified(|current| {
                if current.as_ref().is_some_and(|n| n.id == id) {
                    *current = None;
                    true
                } else {
                    false
                }
            });
        });
        id
    }

    pub fn current(&self) -> Option<Notification> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.tx.subscribe()
    }
}
