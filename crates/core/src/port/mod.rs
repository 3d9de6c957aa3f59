// Port Layer - Interfaces for external collaborators

pub mod delay;
pub mod id_provider; // For deterministic testing
pub mod observer;
pub mod time_provider;

// Re-exports
pub use delay::{DelayPolicy, NoDelay, RandomDelay};
pub use id_provider::IdProvider;
pub use observer::{CountingObserver, QueueObserver, TracingObserver};
pub use time_provider::TimeProvider;
