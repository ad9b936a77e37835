use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_id: u64,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(user_id: u64, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self { user_id, subject: subject.into(), body: body.into() }
    }
}

#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// Delivery channel (push, email, ...). Outcomes are logged, never
/// fed back into the lifecycle.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: u64, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn notify(&self, user_id: u64, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(user_id, subject, body, "Notification delivered");
        Ok(())
    }
}

/// Producer half of the outbound queue. Enqueue only after the
/// transaction that caused the notification has committed.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            warn!(user_id = e.0.user_id, subject = %e.0.subject, "Notification dropped: dispatcher gone");
        }
    }

    pub fn enqueue_all(&self, notifications: impl IntoIterator<Item = Notification>) {
        for n in notifications {
            self.enqueue(n);
        }
    }
}

/// Drains the queue into `sink` until every producer is dropped.
pub async fn run_dispatcher(mut rx: mpsc::UnboundedReceiver<Notification>, sink: Arc<dyn NotificationSink>) {
    while let Some(n) = rx.recv().await {
        if let Err(e) = sink.notify(n.user_id, &n.subject, &n.body).await {
            warn!(error = %e, user_id = n.user_id, subject = %n.subject, "Notification delivery failed");
        }
    }
    info!("Notification dispatcher stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{run_dispatcher, Notification, NotificationQueue, NotificationSink, NotifyError};

    #[derive(Default)]
    struct FlakySink {
        delivered: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl NotificationSink for FlakySink {
        async fn notify(&self, user_id: u64, _subject: &str, _body: &str) -> Result<(), NotifyError> {
            if user_id == 13 {
                return Err(NotifyError("mailbox full".to_string()));
            }
            self.delivered.lock().unwrap().push(user_id);
            Ok(())
        }
    }

    #[actix_web::test]
    async fn dispatcher_keeps_going_past_failed_deliveries() {
        let (queue, rx) = NotificationQueue::channel();
        queue.enqueue_all([
            Notification::new(1, "a", "a"),
            Notification::new(13, "b", "b"),
            Notification::new(2, "c", "c"),
        ]);
        drop(queue);

        let sink = Arc::new(FlakySink::default());
        run_dispatcher(rx, sink.clone()).await;

        assert_eq!(*sink.delivered.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn enqueue_after_dispatcher_shutdown_does_not_panic() {
        let (queue, rx) = NotificationQueue::channel();
        drop(rx);
        queue.enqueue(Notification::new(1, "subject", "body"));
    }
}
