// Bounded Queue - fixed-capacity FIFO with blocking handoff

use super::cancel::{CancelToken, Interruptible};
use super::error::{QueueError, Result};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard};
use tracing::debug;

const POISONED: &str = "bounded queue invariant broken: a thread panicked while holding the lock";

struct State<T> {
    items: VecDeque<T>,
    waiting_producers: usize,
    waiting_consumers: usize,
}

/// Which side of the queue a suspended thread is waiting on
#[derive(Debug, Clone, Copy)]
enum Waiter {
    Producer,
    Consumer,
}

/// Fixed-capacity FIFO shared by many producers and many consumers.
///
/// One mutex guards the items and the waiter counts. Producers suspend on
/// `not_full` and consumers on `not_empty`; every state change broadcasts to
/// the opposite side and every waiter re-checks its predicate in a loop.
///
/// # Example
/// ```
/// use handoff_core::domain::BoundedQueue;
///
/// let queue = BoundedQueue::new(2).unwrap();
/// queue.produce_blocking("a").unwrap();
/// queue.produce_blocking("b").unwrap();
/// assert_eq!(queue.size(), 2);
/// assert_eq!(queue.consume_blocking().unwrap(), "a");
/// ```
pub struct BoundedQueue<T> {
    state: Mutex<State<T>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create an empty queue; fails with `InvalidArgument` when capacity is 0
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(QueueError::InvalidArgument(
                "capacity must be positive, got 0".to_string(),
            ));
        }

        Ok(Self {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                waiting_producers: 0,
                waiting_consumers: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        })
    }

    /// Create from an untrusted signed capacity (CLI, env)
    pub fn from_signed(capacity: i64) -> Result<Self> {
        match usize::try_from(capacity) {
            Ok(capacity) if capacity > 0 => Self::new(capacity),
            _ => Err(QueueError::InvalidArgument(format!(
                "capacity must be positive, got {}",
                capacity
            ))),
        }
    }

    /// Append `item` at the tail, suspending while the queue is full.
    ///
    /// Returns `Interrupted` (item dropped, queue untouched) if `cancel`
    /// fires while this thread has to wait.
    pub fn produce(&self, item: T, cancel: &CancelToken) -> Result<()> {
        let state = self.lock();
        let mut state = self.wait_while(state, Waiter::Producer, cancel, |s| {
            s.items.len() >= self.capacity
        })?;

        state.items.push_back(item);
        assert!(
            state.items.len() <= self.capacity,
            "queue size {} exceeded capacity {}",
            state.items.len(),
            self.capacity
        );

        self.not_empty.notify_all();
        Ok(())
    }

    /// Remove the head item, suspending while the queue is empty.
    ///
    /// Returns `Interrupted` (nothing removed) if `cancel` fires while this
    /// thread has to wait.
    pub fn consume(&self, cancel: &CancelToken) -> Result<T> {
        let state = self.lock();
        let mut state =
            self.wait_while(state, Waiter::Consumer, cancel, |s| s.items.is_empty())?;

        let Some(item) = state.items.pop_front() else {
            unreachable!("consumer resumed on an empty queue");
        };
        assert!(
            state.items.len() < self.capacity,
            "queue size {} exceeded capacity {} after consume",
            state.items.len(),
            self.capacity
        );

        self.not_full.notify_all();
        Ok(item)
    }

    /// `produce` without a cancellation source
    pub fn produce_blocking(&self, item: T) -> Result<()> {
        self.produce(item, &CancelToken::never())
    }

    /// `consume` without a cancellation source
    pub fn consume_blocking(&self) -> Result<T> {
        self.consume(&CancelToken::never())
    }

    /// Current number of items
    pub fn size(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Threads currently suspended in `produce`
    pub fn waiting_producers(&self) -> usize {
        self.lock().waiting_producers
    }

    /// Threads currently suspended in `consume`
    pub fn waiting_consumers(&self) -> usize {
        self.lock().waiting_consumers
    }

    /// A poisoned lock means an invariant assertion fired mid-update; the
    /// contents can no longer be trusted, so every later access panics too.
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().expect(POISONED)
    }

    /// Suspend on the condvar for `waiter` until `blocked` is false.
    /// Cancellation is checked before every suspend and after every wake.
    fn wait_while<'a, F>(
        &self,
        mut state: MutexGuard<'a, State<T>>,
        waiter: Waiter,
        cancel: &CancelToken,
        blocked: F,
    ) -> Result<MutexGuard<'a, State<T>>>
    where
        F: Fn(&State<T>) -> bool,
    {
        while blocked(&*state) {
            if cancel.is_cancelled() {
                debug!(?waiter, "wait cancelled");
                return Err(QueueError::Interrupted);
            }

            let condvar = match waiter {
                Waiter::Producer => {
                    debug!(size = state.items.len(), "waiting to produce (queue full)");
                    state.waiting_producers += 1;
                    &self.not_full
                }
                Waiter::Consumer => {
                    debug!("waiting to consume (queue empty)");
                    state.waiting_consumers += 1;
                    &self.not_empty
                }
            };

            state = condvar.wait(state).expect(POISONED);

            match waiter {
                Waiter::Producer => state.waiting_producers -= 1,
                Waiter::Consumer => state.waiting_consumers -= 1,
            }

            if cancel.is_cancelled() {
                debug!(?waiter, "wait cancelled");
                return Err(QueueError::Interrupted);
            }
        }
        Ok(state)
    }
}

impl<T: Send> Interruptible for BoundedQueue<T> {
    fn interrupt_waiters(&self) {
        // Broadcasting under the lock means no waiter can sit between its
        // cancel check and its suspend while we notify. A poisoned lock is
        // still held here; the woken waiters are the ones that fail.
        let _state = self.state.lock();
        self.not_full.notify_all();
        self.not_empty.notify_all();
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("BoundedQueue");
        out.field("capacity", &self.capacity);
        match self.state.lock() {
            Ok(state) => out
                .field("size", &state.items.len())
                .field("waiting_producers", &state.waiting_producers)
                .field("waiting_consumers", &state.waiting_consumers)
                .finish(),
            Err(_) => out.field("poisoned", &true).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cancel::cancel_channel;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Poll `cond` until true or the deadline passes
    fn wait_until(cond: impl Fn() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = BoundedQueue::<i32>::new(0);
        assert!(matches!(result, Err(QueueError::InvalidArgument(_))));
    }

    #[test]
    fn test_negative_capacity_rejected() {
        let result = BoundedQueue::<i32>::from_signed(-1);
        assert!(matches!(result, Err(QueueError::InvalidArgument(_))));
        assert!(result.unwrap_err().to_string().contains("-1"));

        assert!(BoundedQueue::<i32>::from_signed(0).is_err());
        assert_eq!(BoundedQueue::<i32>::from_signed(3).unwrap().capacity(), 3);
    }

    #[test]
    fn test_capacity_and_fifo_order() {
        let queue = BoundedQueue::new(3).unwrap();
        queue.produce_blocking(1).unwrap();
        queue.produce_blocking(2).unwrap();
        queue.produce_blocking(3).unwrap();

        assert_eq!(queue.size(), 3);
        assert_eq!(queue.capacity(), 3);

        assert_eq!(queue.consume_blocking().unwrap(), 1);
        assert_eq!(queue.consume_blocking().unwrap(), 2);
        assert_eq!(queue.consume_blocking().unwrap(), 3);
        assert_eq!(queue.size(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_produce_blocks_when_full() {
        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        queue.produce_blocking(1).unwrap();

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.produce_blocking(2))
        };

        assert!(wait_until(|| queue.waiting_producers() == 1));
        assert!(!producer.is_finished(), "producer should be suspended");
        assert_eq!(queue.size(), 1);

        assert_eq!(queue.consume_blocking().unwrap(), 1);
        producer.join().unwrap().unwrap();

        assert_eq!(queue.size(), 1);
        assert_eq!(queue.waiting_producers(), 0);
        assert_eq!(queue.consume_blocking().unwrap(), 2);
    }

    #[test]
    fn test_consume_blocks_when_empty() {
        let queue = Arc::new(BoundedQueue::<i32>::new(1).unwrap());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.consume_blocking())
        };

        assert!(wait_until(|| queue.waiting_consumers() == 1));
        assert!(!consumer.is_finished(), "consumer should be suspended");

        queue.produce_blocking(42).unwrap();
        assert_eq!(consumer.join().unwrap().unwrap(), 42);
        assert_eq!(queue.size(), 0);
    }

    #[test]
    fn test_spurious_wake_resuspends() {
        let queue = Arc::new(BoundedQueue::<i32>::new(1).unwrap());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.consume_blocking())
        };
        assert!(wait_until(|| queue.waiting_consumers() == 1));

        // Wake without any state change; the consumer must go back to sleep
        queue.interrupt_waiters();
        assert!(wait_until(|| queue.waiting_consumers() == 1));
        thread::sleep(Duration::from_millis(20));
        assert!(!consumer.is_finished());

        queue.produce_blocking(7).unwrap();
        assert_eq!(consumer.join().unwrap().unwrap(), 7);
    }

    #[test]
    fn test_cancel_blocked_producer_leaves_queue_untouched() {
        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        queue.produce_blocking("first").unwrap();

        let (cancel_tx, token) = cancel_channel();
        cancel_tx.wake_on_cancel(queue.clone());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.produce("second", &token))
        };
        assert!(wait_until(|| queue.waiting_producers() == 1));

        cancel_tx.cancel();

        assert_eq!(producer.join().unwrap(), Err(QueueError::Interrupted));
        assert_eq!(queue.size(), 1);
        assert_eq!(queue.waiting_producers(), 0);
        assert_eq!(queue.consume_blocking().unwrap(), "first");
    }

    #[test]
    fn test_cancel_blocked_consumer_removes_nothing() {
        let queue = Arc::new(BoundedQueue::<i32>::new(2).unwrap());
        let (cancel_tx, token) = cancel_channel();
        cancel_tx.wake_on_cancel(queue.clone());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.consume(&token))
        };
        assert!(wait_until(|| queue.waiting_consumers() == 1));

        cancel_tx.cancel();

        assert_eq!(consumer.join().unwrap(), Err(QueueError::Interrupted));
        assert_eq!(queue.size(), 0);
        assert_eq!(queue.waiting_consumers(), 0);
    }

    #[test]
    fn test_cancelled_token_only_matters_when_blocking() {
        let queue = BoundedQueue::new(1).unwrap();
        let (cancel_tx, token) = cancel_channel();
        cancel_tx.cancel();

        // Space available: no wait, so no interruption
        queue.produce(1, &token).unwrap();
        // Full: would have to wait, so interrupted immediately
        assert_eq!(queue.produce(2, &token), Err(QueueError::Interrupted));

        assert_eq!(queue.consume(&token).unwrap(), 1);
        assert_eq!(queue.consume(&token), Err(QueueError::Interrupted));
    }

    #[test]
    fn test_capacity_one_strict_handoff() {
        let queue = Arc::new(BoundedQueue::new(1).unwrap());
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..100 {
                    queue.produce_blocking(i).unwrap();
                    assert!(queue.size() <= 1);
                }
            })
        };

        let received: Vec<i32> = (0..100).map(|_| queue.consume_blocking().unwrap()).collect();
        producer.join().unwrap();

        assert_eq!(received, (0..100).collect::<Vec<_>>());
        assert_eq!(queue.size(), 0);
    }

    #[test]
    fn test_debug_shows_size_and_capacity() {
        let queue = BoundedQueue::new(4).unwrap();
        queue.produce_blocking(1u8).unwrap();
        let rendered = format!("{:?}", queue);
        assert!(rendered.contains("capacity: 4"));
        assert!(rendered.contains("size: 1"));
    }

    /// Panic while holding the queue lock, as a failed invariant assertion does
    fn poison<T: Send + 'static>(queue: &Arc<BoundedQueue<T>>) {
        let queue = Arc::clone(queue);
        let result = thread::spawn(move || {
            let _state = queue.state.lock().unwrap();
            panic!("invariant failed mid-update");
        })
        .join();
        assert!(result.is_err());
    }

    #[test]
    fn test_poisoned_queue_stops_serving() {
        let queue = Arc::new(BoundedQueue::new(2).unwrap());
        queue.produce_blocking(1).unwrap();
        poison(&queue);

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.consume_blocking())
        };
        assert!(consumer.join().is_err(), "consume must not succeed");

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.produce_blocking(2))
        };
        assert!(producer.join().is_err(), "produce must not succeed");
    }

    #[test]
    #[should_panic(expected = "bounded queue invariant broken")]
    fn test_poisoned_queue_size_panics() {
        let queue = Arc::new(BoundedQueue::<u8>::new(1).unwrap());
        poison(&queue);
        queue.size();
    }

    #[test]
    fn test_poisoned_queue_fails_blocked_waiters_on_cancel() {
        let queue = Arc::new(BoundedQueue::<u8>::new(1).unwrap());
        let (cancel_tx, token) = cancel_channel();
        cancel_tx.wake_on_cancel(queue.clone());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.consume(&token))
        };
        assert!(wait_until(|| queue.waiting_consumers() == 1));
        poison(&queue);

        // Broadcast still goes out; the woken waiter panics instead of resuming
        cancel_tx.cancel();
        assert!(consumer.join().is_err());
        assert!(format!("{:?}", queue).contains("poisoned: true"));
    }
}
