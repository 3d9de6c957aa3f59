// Domain Layer - Queue, cancellation and worker entities

pub mod cancel;
pub mod error;
pub mod message;
pub mod queue;
pub mod worker;

// Re-exports
pub use cancel::{cancel_channel, CancelSender, CancelToken, Interruptible};
pub use error::QueueError;
pub use message::Message;
pub use queue::BoundedQueue;
pub use worker::{EventAction, WorkerEvent, WorkerOutcome, WorkerReport, WorkerRole};
