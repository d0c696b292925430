//! error types for sumchain

use thiserror::Error;

use crate::relation::Method;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// a constraint of the method's circuit does not hold for the supplied
    /// inputs. covers both a wrong equality and a parent that failed
    /// recursive verification.
    #[error("{method} constraint {constraint} not satisfied")]
    Unsatisfied { method: Method, constraint: usize },

    #[error("value does not fit in {bits} bits")]
    OutOfRange { bits: usize },

    #[error("invalid inputs for {method}: {reason}")]
    InvalidInputs { method: Method, reason: String },

    #[error("{method} witness covers {actual} wires, circuit has {expected}")]
    WitnessLength {
        method: Method,
        expected: usize,
        actual: usize,
    },

    #[error("{method} circuit shape does not match the compiled relation")]
    ShapeMismatch { method: Method },

    #[error("compilation failed: {0}")]
    Compilation(String),

    #[error("merge requires at least one proof")]
    EmptyMerge,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("key derivation failed")]
    KeyDerivation,
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(e: bincode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
