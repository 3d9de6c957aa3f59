// Handoff Core - Bounded queue, workers and orchestration
// NO CLI or subscriber setup here; the simulator crate is the composition root

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
