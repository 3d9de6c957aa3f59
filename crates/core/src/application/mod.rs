// Application Layer - Workers and the simulation supervisor

pub mod simulation;
pub mod worker;

// Re-exports
pub use simulation::{Simulation, SimulationConfig, SimulationReport};
pub use worker::{cancel_channel, CancelSender, CancelToken, ConsumerWorker, ProducerWorker};
