// Panic isolation for worker threads
use std::panic::{catch_unwind, UnwindSafe};
use tracing::error;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed successfully
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Execute a closure with panic isolation
///
/// A panicking worker (including a capacity invariant assertion) is caught
/// here and turned into `PanicGuardResult::Panicked` so the orchestrator can
/// still report on the remaining workers.
///
/// # Example
/// ```text
/// let result = execute_guarded(|| {
///     panic!("test panic");
/// });
///
/// match result {
///     PanicGuardResult::Panicked(msg) => {
///         println!("Caught panic: {}", msg);
///     }
///     _ => {}
/// }
/// ```
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + UnwindSafe,
{
    match catch_unwind(f) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };

            error!(panic_msg = %panic_msg, "Worker panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes_through() {
        match execute_guarded(|| 42) {
            PanicGuardResult::Success(v) => assert_eq!(v, 42),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_panic_message_captured() {
        let result: PanicGuardResult<()> = execute_guarded(|| panic!("boom {}", 7));
        match result {
            PanicGuardResult::Panicked(msg) => assert_eq!(msg, "boom 7"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
