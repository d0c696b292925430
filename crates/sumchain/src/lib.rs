//! Recursively composable arithmetic accumulator
//!
//! A running sum over the pallas base field that only advances through
//! certified transitions. Every transition produces a proof that the new
//! value is a correct function of previously certified values:
//!
//! - `init`: value is zero
//! - `addNumber`: parent + x
//! - `addBatch`: parent + 10·x, rebuilt from the bits of x ten times
//! - `merge`: sum of two proofs from any two chains
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  relation    │──▶│  constraint  │──▶│   backend    │
//! │ (4 methods)  │   │  (circuit)   │   │ compile/prove│
//! └──────┬───────┘   └──────────────┘   │   /verify    │
//!        │ batch (bit reconstruction)   └──────┬───────┘
//!        ▼                                     ▼
//!   RecursiveVerifier ◀──────────────────── Program ◀── accumulator
//!   (parents checked in-circuit)                        (chains, merge trees)
//! ```
//!
//! The proving backend is reached only through [`backend::compile`],
//! [`backend::prove`] and [`backend::verify`]. Parent proofs are checked by
//! an injected [`RecursiveVerifier`] while the child is synthesized, and a
//! parent that fails leaves the child's circuit unsatisfied.
//!
//! ## Example
//!
//! ```
//! use sumchain::{Chain, Program, ProgramConfig, fp_from_u64};
//!
//! let program = Program::compile(ProgramConfig::default()).unwrap();
//! let mut chain = Chain::init(&program).unwrap();
//! chain.add_batch(fp_from_u64(5)).unwrap();
//! chain.add_number(fp_from_u64(4)).unwrap();
//! assert_eq!(chain.value(), fp_from_u64(54));
//! assert!(sumchain::verify(chain.head(), program.verification_key()));
//! ```

pub mod accumulator;
pub mod backend;
pub mod batch;
pub mod config;
pub mod constraint;
mod error;
pub mod field;
pub mod program;
pub mod proof;
pub mod relation;

pub use accumulator::{merge_all, merge_pair, par_branches, Chain};
pub use backend::{MethodKey, VerificationKey};
pub use batch::{BATCH_BITS, BATCH_ROUNDS, GROUPS, GROUP_SIZE};
pub use config::{ProgramConfig, DEFAULT_PROGRAM_NAME};
pub use constraint::{
    Circuit, CircuitBuilder, CircuitStats, Constraint, LinearCombination, WireId, Witness,
    WitnessLength,
};
pub use error::{Error, Result};
pub use field::{fp_from_hex, fp_from_u128, fp_from_u64, fp_to_hex, Fp};
pub use program::Program;
pub use proof::Proof;
pub use relation::{Method, MethodInputs, RecursiveVerifier};

/// check a proof against a verification key
///
/// returns `false` for any invalid proof instead of failing.
pub fn verify(proof: &Proof, vk: &VerificationKey) -> bool {
    backend::verify(proof, vk)
}
