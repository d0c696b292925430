//! compiled accumulator program
//!
//! entry points for the four transitions plus verification. a [`Program`]
//! owns both halves of the key pair and verifies its own proofs when they
//! come back as parents.

use std::time::Instant;

use tracing::debug;

use crate::backend::{self, ProvingKey, VerificationKey};
use crate::config::ProgramConfig;
use crate::constraint::CircuitStats;
use crate::field::Fp;
use crate::proof::Proof;
use crate::relation::{Method, MethodInputs, RecursiveVerifier};
use crate::Result;

#[derive(Debug)]
pub struct Program {
    config: ProgramConfig,
    pk: ProvingKey,
    vk: VerificationKey,
}

impl Program {
    /// compile every method and derive keys
    pub fn compile(config: ProgramConfig) -> Result<Self> {
        let start = Instant::now();
        let (pk, vk) = backend::compile(&config)?;
        debug!(program = %config.name, elapsed_ms = start.elapsed().as_millis() as u64, "compiled");
        Ok(Self { config, pk, vk })
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    pub fn verification_key(&self) -> &VerificationKey {
        &self.vk
    }

    /// prove any method with explicit inputs
    pub fn prove(&self, method: Method, inputs: &MethodInputs<'_>) -> Result<Proof> {
        let start = Instant::now();
        let proof = backend::prove(&self.pk, method, inputs, self)?;
        debug!(
            method = %method,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "proved"
        );
        Ok(proof)
    }

    /// seed a chain. `new_value` must be zero
    pub fn init(&self, new_value: Fp) -> Result<Proof> {
        self.prove(Method::Init, &MethodInputs::init(new_value))
    }

    /// `new_value == parent + x`
    pub fn add_number(&self, new_value: Fp, parent: &Proof, x: Fp) -> Result<Proof> {
        self.prove(Method::AddNumber, &MethodInputs::add_number(new_value, parent, x))
    }

    /// `new_value == parent + 10·x` via bit reconstruction
    pub fn add_batch(&self, new_value: Fp, parent: &Proof, x: Fp) -> Result<Proof> {
        self.prove(Method::AddBatch, &MethodInputs::add_batch(new_value, parent, x))
    }

    /// `new_value == left + right`
    pub fn merge(&self, new_value: Fp, left: &Proof, right: &Proof) -> Result<Proof> {
        self.prove(Method::Merge, &MethodInputs::merge(new_value, left, right))
    }

    pub fn verify(&self, proof: &Proof) -> bool {
        backend::verify(proof, &self.vk)
    }

    /// constraint statistics per method
    pub fn analyze_methods(&self) -> Vec<(Method, CircuitStats)> {
        Method::ALL
            .iter()
            .map(|&method| (method, self.pk.stats(method)))
            .collect()
    }
}

impl RecursiveVerifier for Program {
    fn verify_recursive(&self, proof: &Proof) -> bool {
        self.verify(proof)
    }
}
