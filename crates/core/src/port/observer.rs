// Queue Observer Port - advisory produce/consume events

use crate::domain::{EventAction, WorkerEvent};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Receives one event per successful produce/consume.
///
/// Purely observational; implementations must not block for long since they
/// run on the worker thread between queue operations.
pub trait QueueObserver: Send + Sync {
    fn on_event(&self, event: &WorkerEvent);
}

/// Emits each event as a `tracing` debug record (production default)
pub struct TracingObserver;

impl QueueObserver for TracingObserver {
    fn on_event(&self, event: &WorkerEvent) {
        debug!(
            actor = %event.actor,
            action = %event.action,
            item = %event.item,
            "{}", event
        );
    }
}

/// Counts produce/consume events and forwards them to an inner observer.
/// Counters stay accurate for workers that never report back.
pub struct CountingObserver {
    inner: Arc<dyn QueueObserver>,
    produced: AtomicUsize,
    consumed: AtomicUsize,
}

impl CountingObserver {
    pub fn new(inner: Arc<dyn QueueObserver>) -> Self {
        Self {
            inner,
            produced: AtomicUsize::new(0),
            consumed: AtomicUsize::new(0),
        }
    }

    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::SeqCst)
    }

    pub fn consumed(&self) -> usize {
        self.consumed.load(Ordering::SeqCst)
    }
}

impl QueueObserver for CountingObserver {
    fn on_event(&self, event: &WorkerEvent) {
        match event.action {
            EventAction::Produced => self.produced.fetch_add(1, Ordering::SeqCst),
            EventAction::Consumed => self.consumed.fetch_add(1, Ordering::SeqCst),
        };
        self.inner.on_event(event);
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records every event in arrival order
    #[derive(Default)]
    pub struct RecordingObserver {
        events: Mutex<Vec<WorkerEvent>>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<WorkerEvent> {
            self.events.lock().unwrap().clone()
        }

        /// Item labels for one action, in arrival order
        pub fn items(&self, action: EventAction) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.action == action)
                .map(|e| e.item.clone())
                .collect()
        }
    }

    impl QueueObserver for RecordingObserver {
        fn on_event(&self, event: &WorkerEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }
}
