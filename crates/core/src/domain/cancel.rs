// Cancellation Token for blocked queue waits

use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Something whose blocked waiters can be woken so they re-check cancellation
pub trait Interruptible: Send + Sync {
    /// Wake every suspended waiter; waiters that are not cancelled re-suspend
    fn interrupt_waiters(&self);
}

/// Cancellation signal observed by workers and by blocked queue operations
#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Token that is never cancelled (its sender is already gone)
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    /// Check if cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Cancellation sender
pub struct CancelSender {
    tx: watch::Sender<bool>,
    wakers: Mutex<Vec<Arc<dyn Interruptible>>>,
}

impl CancelSender {
    /// Register a queue whose waiters must be woken on cancel
    pub fn wake_on_cancel(&self, target: Arc<dyn Interruptible>) {
        let mut wakers = match self.wakers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        wakers.push(target);
    }

    /// Signal cancellation to every token, then wake blocked waiters.
    /// The flag must be visible before the broadcast.
    pub fn cancel(&self) {
        self.tx.send_replace(true);

        let wakers = match self.wakers.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for target in wakers {
            target.interrupt_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Create a cancellation channel
pub fn cancel_channel() -> (CancelSender, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (
        CancelSender {
            tx,
            wakers: Mutex::new(Vec::new()),
        },
        CancelToken { rx },
    )
}
