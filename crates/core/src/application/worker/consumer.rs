// Consumer Worker - drains a fixed quota of items

use super::pause;
use crate::domain::{
    BoundedQueue, CancelToken, EventAction, WorkerEvent, WorkerOutcome, WorkerReport, WorkerRole,
};
use crate::port::{DelayPolicy, NoDelay, QueueObserver, TracingObserver};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

/// Pulls `quota` items from the shared queue, blocking while it is empty
pub struct ConsumerWorker<T> {
    id: String,
    queue: Arc<BoundedQueue<T>>,
    delay: Arc<dyn DelayPolicy>,
    observer: Arc<dyn QueueObserver>,
}

impl<T: Display> ConsumerWorker<T> {
    /// Create a consumer with no simulated delay and tracing events
    pub fn new(id: impl Into<String>, queue: Arc<BoundedQueue<T>>) -> Self {
        Self {
            id: id.into(),
            queue,
            delay: Arc::new(NoDelay),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_delay(mut self, delay: Arc<dyn DelayPolicy>) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn QueueObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Consume `quota` items.
    ///
    /// Terminates after exactly `quota` successful consumes, or earlier when
    /// `cancel` fires. A cancelled wait removes nothing.
    pub fn run(&self, quota: usize, cancel: &CancelToken) -> WorkerReport {
        info!(worker = %self.id, quota, "Consumer started");

        let mut consumed = 0;
        let outcome = loop {
            if consumed == quota {
                break WorkerOutcome::Completed;
            }
            if cancel.is_cancelled() {
                break WorkerOutcome::Cancelled;
            }

            let item = match self.queue.consume(cancel) {
                Ok(item) => item,
                Err(e) => {
                    warn!(worker = %self.id, error = %e, "Consumer interrupted while waiting");
                    break WorkerOutcome::Cancelled;
                }
            };
            consumed += 1;
            self.observer.on_event(&WorkerEvent {
                actor: self.id.clone(),
                action: EventAction::Consumed,
                item: item.to_string(),
            });

            pause(self.delay.as_ref());
        };

        if outcome == WorkerOutcome::Cancelled {
            warn!(
                worker = %self.id,
                consumed,
                abandoned = quota - consumed,
                "Consumer cancelled"
            );
        }
        info!(worker = %self.id, consumed, %outcome, "Consumer stopped");

        WorkerReport {
            worker: self.id.clone(),
            role: WorkerRole::Consumer,
            quota,
            completed: consumed,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cancel_channel;
    use crate::port::observer::mocks::RecordingObserver;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_consumer_drains_quota_fifo() {
        let queue = Arc::new(BoundedQueue::new(5).unwrap());
        for i in 1..=5 {
            queue.produce_blocking(i).unwrap();
        }
        let observer = Arc::new(RecordingObserver::new());
        let consumer =
            ConsumerWorker::new("consumer-1", queue.clone()).with_observer(observer.clone());

        let report = consumer.run(3, &CancelToken::never());

        assert!(report.is_complete());
        assert_eq!(report.role, WorkerRole::Consumer);
        assert_eq!(observer.items(EventAction::Consumed), vec!["1", "2", "3"]);
        assert_eq!(queue.size(), 2);
    }

    #[test]
    fn test_cancel_while_blocked_consumes_nothing_more() {
        let queue = Arc::new(BoundedQueue::new(3).unwrap());
        queue.produce_blocking(10).unwrap();

        let (cancel_tx, token) = cancel_channel();
        cancel_tx.wake_on_cancel(queue.clone());

        let handle = {
            let consumer = ConsumerWorker::new("consumer-1", queue.clone());
            thread::spawn(move || consumer.run(4, &token))
        };

        let deadline = Instant::now() + Duration::from_secs(2);
        while queue.waiting_consumers() == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        cancel_tx.cancel();
        let report = handle.join().unwrap();

        assert_eq!(report.outcome, WorkerOutcome::Cancelled);
        assert_eq!(report.completed, 1);
        assert!(queue.is_empty());
    }
}
