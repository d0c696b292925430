//! compile / prove / verify
//!
//! attested-constraint backend. compilation synthesizes every method once
//! to fix its circuit shape, then derives an ed25519 key pair. proving
//! re-synthesizes the method with real inputs, checks that the shape matches
//! the compiled one and that every constraint holds (parents included), and
//! only then signs the public statement. verification checks the signature
//! against the verification key and needs no witness.
//!
//! ```text
//! compile:  methods ──synthesize──▶ digests ──┐
//!           seed ──hkdf──▶ signing key ───────┴──▶ (ProvingKey, VerificationKey)
//!
//! prove:    inputs ──synthesize──▶ circuit + witness
//!                                  │ shape == compiled?   else ShapeMismatch
//!                                  │ all constraints hold? else Unsatisfied
//!                                  ▼
//!           sign(H(domain ‖ vk digest ‖ method ‖ public value)) ──▶ Proof
//! ```

use core::fmt;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use ff::{Field, PrimeField};
use hkdf::Hkdf;
use rand::RngCore;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::ProgramConfig;
use crate::constraint::{CircuitBuilder, CircuitStats};
use crate::field::{serde_bytes_hex, Fp};
use crate::proof::Proof;
use crate::relation::{synthesize, Method, MethodInputs, RecursiveVerifier};
use crate::{Error, Result};

const KEY_INFO: &[u8] = b"sumchain:ed25519:v1";
const STATEMENT_DOMAIN: &[u8] = b"sumchain:statement:v1";
const KEY_DOMAIN: &[u8] = b"sumchain:vk:v1";

/// compiled shape of one method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodKey {
    pub method: Method,
    #[serde(with = "serde_bytes_hex")]
    pub digest: [u8; 32],
    pub constraints: usize,
}

/// public artifact needed to check any proof of a program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationKey {
    pub program: String,
    /// one entry per method, in [`Method::ALL`] order
    pub methods: Vec<MethodKey>,
    #[serde(with = "serde_bytes_hex")]
    pub verifying_key: [u8; 32],
    #[serde(with = "serde_bytes_hex")]
    pub digest: [u8; 32],
}

impl VerificationKey {
    fn compute_digest(program: &str, methods: &[MethodKey], verifying_key: &[u8; 32]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(KEY_DOMAIN);
        hasher.update((program.len() as u64).to_le_bytes());
        hasher.update(program.as_bytes());
        hasher.update((methods.len() as u64).to_le_bytes());
        for key in methods {
            hasher.update([key.method.tag()]);
            hasher.update(key.digest);
            hasher.update((key.constraints as u64).to_le_bytes());
        }
        hasher.update(verifying_key);
        hasher.finalize().into()
    }

    /// digest matches the rest of the key and methods are in order
    pub fn is_consistent(&self) -> bool {
        self.methods.len() == Method::ALL.len()
            && self.methods.iter().zip(Method::ALL).all(|(k, m)| k.method == m)
            && Self::compute_digest(&self.program, &self.methods, &self.verifying_key) == self.digest
    }

    pub fn method(&self, method: Method) -> Option<&MethodKey> {
        self.methods.get(method.index()).filter(|key| key.method == method)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// parse a key, rejecting one whose methods or digest do not line up
    pub fn from_json(json: &str) -> Result<Self> {
        let vk: VerificationKey = serde_json::from_str(json)?;
        if !vk.is_consistent() {
            return Err(Error::Serialization(format!(
                "verification key for {} is inconsistent ({} methods)",
                vk.program,
                vk.methods.len()
            )));
        }
        Ok(vk)
    }
}

/// secret half of a compiled program
pub struct ProvingKey {
    signing_key: SigningKey,
    methods: Vec<MethodKey>,
    stats: Vec<CircuitStats>,
    key_digest: [u8; 32],
}

impl ProvingKey {
    pub fn stats(&self, method: Method) -> CircuitStats {
        self.stats[method.index()]
    }
}

impl fmt::Debug for ProvingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvingKey")
            .field("verifying_key", &hex::encode(self.signing_key.verifying_key().to_bytes()))
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// parents are never checked while fixing shapes
struct ShapeOnly;

impl RecursiveVerifier for ShapeOnly {
    fn verify_recursive(&self, _proof: &Proof) -> bool {
        false
    }
}

/// derive the signing key from a seed
fn derive_signing_key(seed: &[u8; 32], program: &str) -> Result<SigningKey> {
    let hk = Hkdf::<Sha256>::new(Some(program.as_bytes()), seed);
    let mut key_bytes = [0u8; 32];
    hk.expand(KEY_INFO, &mut key_bytes)
        .map_err(|_| Error::KeyDerivation)?;
    Ok(SigningKey::from_bytes(&key_bytes))
}

/// synthesize and check the shape of every method, then derive keys
pub fn compile(config: &ProgramConfig) -> Result<(ProvingKey, VerificationKey)> {
    if config.name.is_empty() {
        return Err(Error::Compilation("program name must not be empty".into()));
    }

    let mut methods = Vec::with_capacity(Method::ALL.len());
    let mut stats = Vec::with_capacity(Method::ALL.len());
    for method in Method::ALL {
        let placeholders: Vec<Proof> = (0..method.arity())
            .map(|_| Proof::placeholder(Fp::ZERO))
            .collect();
        let inputs = MethodInputs {
            new_value: Fp::ZERO,
            witness: method.takes_witness().then_some(Fp::ZERO),
            parents: placeholders.iter().collect(),
        };

        let mut cs = CircuitBuilder::new();
        synthesize(method, &mut cs, &inputs, &ShapeOnly)
            .map_err(|e| Error::Compilation(format!("{}: {}", method, e)))?;
        let (circuit, _) = cs.build();
        circuit
            .validate()
            .map_err(|e| Error::Compilation(format!("{}: {}", method, e)))?;

        let method_stats = circuit.stats();
        info!(method = %method, "compiled: {}", method_stats);
        methods.push(MethodKey {
            method,
            digest: circuit.digest(),
            constraints: method_stats.constraints,
        });
        stats.push(method_stats);
    }

    let seed = match config.seed {
        Some(seed) => seed,
        None => {
            let mut seed = [0u8; 32];
            ChaCha20Rng::from_entropy().fill_bytes(&mut seed);
            seed
        }
    };
    let signing_key = derive_signing_key(&seed, &config.name)?;
    let verifying_key = signing_key.verifying_key().to_bytes();
    let digest = VerificationKey::compute_digest(&config.name, &methods, &verifying_key);

    let vk = VerificationKey {
        program: config.name.clone(),
        methods: methods.clone(),
        verifying_key,
        digest,
    };
    let pk = ProvingKey {
        signing_key,
        methods,
        stats,
        key_digest: digest,
    };
    debug!(digest = %hex::encode(digest), "verification key derived");

    Ok((pk, vk))
}

/// message signed for a statement
fn statement(key_digest: &[u8; 32], method: Method, public_input: &Fp) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(STATEMENT_DOMAIN);
    hasher.update(key_digest);
    hasher.update([method.tag()]);
    hasher.update(public_input.to_repr());
    hasher.finalize().into()
}

/// build a proof of `method` over `inputs`
///
/// fails closed: no proof is produced unless every constraint, including
/// the verification of each parent, holds.
pub fn prove<V: RecursiveVerifier + ?Sized>(
    pk: &ProvingKey,
    method: Method,
    inputs: &MethodInputs<'_>,
    verifier: &V,
) -> Result<Proof> {
    let mut cs = CircuitBuilder::new();
    let output = synthesize(method, &mut cs, inputs, verifier)?;
    let public_input = cs.value(output);
    let (circuit, witness) = cs.build();

    if circuit.digest() != pk.methods[method.index()].digest {
        return Err(Error::ShapeMismatch { method });
    }
    let unsatisfied = circuit
        .first_unsatisfied(&witness)
        .map_err(|e| Error::WitnessLength {
            method,
            expected: e.expected,
            actual: e.actual,
        })?;
    if let Some(index) = unsatisfied {
        warn!(
            method = %method,
            constraint = index,
            label = circuit.label(index),
            "constraint not satisfied"
        );
        return Err(Error::Unsatisfied { method, constraint: index });
    }

    let message = statement(&pk.key_digest, method, &public_input);
    let signature: Signature = pk.signing_key.sign(&message);
    debug!(method = %method, constraints = circuit.constraints.len(), "proof certified");

    Ok(Proof::new(method, public_input, signature.to_bytes()))
}

/// check a proof against a verification key. never panics
pub fn verify(proof: &Proof, vk: &VerificationKey) -> bool {
    if !vk.is_consistent() {
        return false;
    }
    if proof.proofs_verified() as usize != proof.method().arity() {
        return false;
    }
    let Ok(verifying_key) = VerifyingKey::from_bytes(&vk.verifying_key) else {
        return false;
    };

    let message = statement(&vk.digest, proof.method(), &proof.public_input());
    let signature = Signature::from_bytes(proof.certificate());
    verifying_key.verify_strict(&message, &signature).is_ok()
}
