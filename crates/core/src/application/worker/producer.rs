// Producer Worker - generates a fixed quota of labeled messages

use super::pause;
use crate::domain::{
    BoundedQueue, CancelToken, EventAction, Message, WorkerEvent, WorkerOutcome, WorkerReport,
    WorkerRole,
};
use crate::port::{DelayPolicy, NoDelay, QueueObserver, TracingObserver};
use std::sync::Arc;
use tracing::{info, warn};

/// Pushes `quota` messages into the shared queue, blocking while it is full
pub struct ProducerWorker {
    id: String,
    queue: Arc<BoundedQueue<Message>>,
    delay: Arc<dyn DelayPolicy>,
    observer: Arc<dyn QueueObserver>,
}

impl ProducerWorker {
    /// Create a producer with no simulated delay and tracing events
    pub fn new(id: impl Into<String>, queue: Arc<BoundedQueue<Message>>) -> Self {
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

    /// Produce `quota` messages labeled `{label_prefix}-{n}` (n from 1).
    ///
    /// Terminates after exactly `quota` successful produces, or earlier when
    /// `cancel` fires. Cancellation is reported in the outcome, never as an
    /// error, and the remaining quota is abandoned.
    pub fn run(&self, quota: usize, label_prefix: &str, cancel: &CancelToken) -> WorkerReport {
        info!(worker = %self.id, quota, "Producer started");

        let mut produced = 0;
        let outcome = loop {
            if produced == quota {
                break WorkerOutcome::Completed;
            }
            if cancel.is_cancelled() {
                break WorkerOutcome::Cancelled;
            }

            let message = Message::new(&self.id, label_prefix, produced + 1);
            let label = message.label.clone();

            if let Err(e) = self.queue.produce(message, cancel) {
                warn!(worker = %self.id, error = %e, "Producer interrupted while waiting");
                break WorkerOutcome::Cancelled;
            }
            produced += 1;
            self.observer.on_event(&WorkerEvent {
                actor: self.id.clone(),
                action: EventAction::Produced,
                item: label,
            });

            pause(self.delay.as_ref());
        };

        if outcome == WorkerOutcome::Cancelled {
            warn!(
                worker = %self.id,
                produced,
                abandoned = quota - produced,
                "Producer cancelled"
            );
        }
        info!(worker = %self.id, produced, %outcome, "Producer stopped");

        WorkerReport {
            worker: self.id.clone(),
            role: WorkerRole::Producer,
            quota,
            completed: produced,
            outcome,
        }
    }
}
