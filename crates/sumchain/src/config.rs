//! program configuration

use serde::{Deserialize, Serialize};

/// default program name, bound into the verification key
pub const DEFAULT_PROGRAM_NAME: &str = "add-example";

/// compile-time configuration of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramConfig {
    /// bound into the verification key
    pub name: String,
    /// key derivation seed. random when unset
    pub seed: Option<[u8; 32]>,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PROGRAM_NAME.to_string(),
            seed: None,
        }
    }
}

impl ProgramConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// deterministic keys, mostly for tests and reproducible benchmarks
    pub fn with_seed(mut self, seed: [u8; 32]) -> Self {
        self.seed = Some(seed);
        self
    }
}
