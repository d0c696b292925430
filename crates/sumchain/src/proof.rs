//! proof certificates
//!
//! a proof binds a public value to a method and a certificate. it carries
//! no witness data and is never mutated after construction.

use serde::{Deserialize, Serialize};

use crate::field::{serde_bytes_hex, serde_fp, Fp};
use crate::relation::Method;
use crate::{Error, Result};

/// certified transition result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    method: Method,
    /// accumulated sum attested by this proof
    #[serde(with = "serde_fp")]
    public_input: Fp,
    /// parent proofs checked while building this one
    proofs_verified: u8,
    #[serde(rename = "proof", with = "serde_bytes_hex")]
    certificate: [u8; 64],
}

impl Proof {
    pub(crate) fn new(method: Method, public_input: Fp, certificate: [u8; 64]) -> Self {
        Self {
            method,
            public_input,
            proofs_verified: method.arity() as u8,
            certificate,
        }
    }

    /// stand-in parent used when synthesizing circuit shapes
    pub(crate) fn placeholder(public_input: Fp) -> Self {
        Self::new(Method::Init, public_input, [0u8; 64])
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn public_input(&self) -> Fp {
        self.public_input
    }

    pub fn proofs_verified(&self) -> u8 {
        self.proofs_verified
    }

    pub fn certificate(&self) -> &[u8; 64] {
        &self.certificate
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let proof: Proof = serde_json::from_str(json)?;
        proof.check_shape()?;
        Ok(proof)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let proof: Proof = bincode::deserialize(bytes)?;
        proof.check_shape()?;
        Ok(proof)
    }

    fn check_shape(&self) -> Result<()> {
        if self.proofs_verified as usize != self.method.arity() {
            return Err(Error::Serialization(format!(
                "{} proof must verify {} parents, claims {}",
                self.method,
                self.method.arity(),
                self.proofs_verified
            )));
        }
        Ok(())
    }
}
