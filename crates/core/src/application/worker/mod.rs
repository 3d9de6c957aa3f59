// Workers - bounded-quota producer and consumer loops

pub mod constants;
mod consumer;
mod panic_guard;
mod producer;

pub use crate::domain::cancel::{cancel_channel, CancelSender, CancelToken};
pub use consumer::ConsumerWorker;
pub use panic_guard::{execute_guarded, PanicGuardResult};
pub use producer::ProducerWorker;

use crate::port::DelayPolicy;

/// Sleep for the policy's next delay (uncoordinated, touches no shared state)
fn pause(policy: &dyn DelayPolicy) {
    let delay = policy.next_delay();
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
