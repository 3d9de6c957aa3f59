// ID Provider Port (for deterministic testing)

/// ID provider interface (allows deterministic run IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique simulation run ID
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

pub mod mocks {
    use super::*;

    /// Always returns the same ID
    pub struct FixedIdProvider(pub String);

    impl IdProvider for FixedIdProvider {
        fn generate_id(&self) -> String {
            self.0.clone()
        }
    }
}
