//! transition relation
//!
//! four transitions advance the accumulator. each one is a predicate over
//! the new public value, an optional private witness and its parent proofs:
//!
//! | method      | parents | witness | predicate                      |
//! |-------------|---------|---------|--------------------------------|
//! | `init`      | 0       | -       | new == 0                       |
//! | `addNumber` | 1       | x       | new == parent + x              |
//! | `addBatch`  | 1       | x       | new == parent + 10·x (bitwise) |
//! | `merge`     | 2       | -       | new == left + right            |
//!
//! every parent is checked by the injected [`RecursiveVerifier`] before the
//! equality is asserted. the verifier's answer becomes a wire constrained to
//! one, so a bad parent leaves the circuit unsatisfied exactly like bad
//! arithmetic does.

use core::fmt;

use ff::Field;
use serde::{Deserialize, Serialize};

use crate::batch;
use crate::constraint::{CircuitBuilder, LinearCombination, WireId};
use crate::field::Fp;
use crate::proof::Proof;
use crate::{Error, Result};

/// checks a proof from inside the construction of another proof
pub trait RecursiveVerifier {
    fn verify_recursive(&self, proof: &Proof) -> bool;
}

/// the transitions of the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "init")]
    Init,
    #[serde(rename = "addNumber")]
    AddNumber,
    #[serde(rename = "addBatch")]
    AddBatch,
    #[serde(rename = "merge")]
    Merge,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Init, Method::AddNumber, Method::AddBatch, Method::Merge];

    pub fn name(self) -> &'static str {
        match self {
            Method::Init => "init",
            Method::AddNumber => "addNumber",
            Method::AddBatch => "addBatch",
            Method::Merge => "merge",
        }
    }

    /// number of parent proofs verified
    pub fn arity(self) -> usize {
        match self {
            Method::Init => 0,
            Method::AddNumber | Method::AddBatch => 1,
            Method::Merge => 2,
        }
    }

    pub fn takes_witness(self) -> bool {
        matches!(self, Method::AddNumber | Method::AddBatch)
    }

    /// stable domain tag
    pub fn tag(self) -> u8 {
        match self {
            Method::Init => 0,
            Method::AddNumber => 1,
            Method::AddBatch => 2,
            Method::Merge => 3,
        }
    }

    /// position in [`Method::ALL`]
    pub fn index(self) -> usize {
        self.tag() as usize
    }

    pub fn from_tag(tag: u8) -> Option<Method> {
        Method::ALL.get(tag as usize).copied()
    }

    /// the value the transition produces, computed natively
    ///
    /// `None` if the inputs do not fit the method.
    pub fn next_value(self, witness: Option<Fp>, parents: &[Fp]) -> Option<Fp> {
        if parents.len() != self.arity() || witness.is_some() != self.takes_witness() {
            return None;
        }
        match self {
            Method::Init => Some(Fp::ZERO),
            Method::AddNumber => Some(parents[0] + witness?),
            Method::AddBatch => Some(batch::batch_sum(parents[0], witness?)),
            Method::Merge => Some(parents[0] + parents[1]),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// inputs for one transition
#[derive(Debug, Clone)]
pub struct MethodInputs<'a> {
    /// claimed new state (public)
    pub new_value: Fp,
    /// private witness
    pub witness: Option<Fp>,
    pub parents: Vec<&'a Proof>,
}

impl<'a> MethodInputs<'a> {
    pub fn init(new_value: Fp) -> Self {
        Self { new_value, witness: None, parents: Vec::new() }
    }

    pub fn add_number(new_value: Fp, parent: &'a Proof, x: Fp) -> Self {
        Self { new_value, witness: Some(x), parents: vec![parent] }
    }

    pub fn add_batch(new_value: Fp, parent: &'a Proof, x: Fp) -> Self {
        Self { new_value, witness: Some(x), parents: vec![parent] }
    }

    pub fn merge(new_value: Fp, left: &'a Proof, right: &'a Proof) -> Self {
        Self { new_value, witness: None, parents: vec![left, right] }
    }

    /// reject inputs that do not fit the method before any synthesis
    pub fn check(&self, method: Method) -> Result<()> {
        if self.parents.len() != method.arity() {
            return Err(Error::InvalidInputs {
                method,
                reason: format!("expected {} parent proofs, got {}", method.arity(), self.parents.len()),
            });
        }
        if self.witness.is_some() != method.takes_witness() {
            let reason = if method.takes_witness() {
                "missing witness"
            } else {
                "unexpected witness"
            };
            return Err(Error::InvalidInputs { method, reason: reason.into() });
        }
        Ok(())
    }
}

/// allocate a parent's public value and its verification bit
fn verify_parent<V: RecursiveVerifier + ?Sized>(
    cs: &mut CircuitBuilder,
    verifier: &V,
    index: usize,
    parent: &Proof,
) -> WireId {
    let value = cs.add_witness(parent.public_input());
    let verified = if verifier.verify_recursive(parent) { Fp::ONE } else { Fp::ZERO };
    let bit = cs.add_witness(verified);
    cs.assert_boolean(format!("parent {} verification bit", index), bit);
    cs.assert_const(format!("parent {} verifies", index), bit, Fp::ONE);
    value
}

/// synthesize the circuit of `method` for `inputs`
///
/// returns the public wire holding the new state.
pub fn synthesize<V: RecursiveVerifier + ?Sized>(
    method: Method,
    cs: &mut CircuitBuilder,
    inputs: &MethodInputs<'_>,
    verifier: &V,
) -> Result<WireId> {
    inputs.check(method)?;

    let new_state = cs.add_public(inputs.new_value);
    let parents: Vec<WireId> = inputs
        .parents
        .iter()
        .enumerate()
        .map(|(i, parent)| verify_parent(cs, verifier, i, parent))
        .collect();
    let witness = inputs.witness.unwrap_or(Fp::ZERO);

    match method {
        Method::Init => {
            cs.assert_const("init state is zero", new_state, Fp::ZERO);
        }
        Method::AddNumber => {
            let x = cs.add_witness(witness);
            let sum = cs.add("parent + x", parents[0], x);
            cs.assert_eq(
                "new state == parent + x",
                LinearCombination::from_wire(new_state),
                LinearCombination::from_wire(sum),
            );
        }
        Method::AddBatch => {
            let x = cs.add_witness(witness);
            let target = batch::add_batch(cs, parents[0], x)?;
            cs.assert_eq(
                "new state == batch target",
                LinearCombination::from_wire(new_state),
                LinearCombination::from_wire(target),
            );
        }
        Method::Merge => {
            let sum = cs.add("left + right", parents[0], parents[1]);
            cs.assert_eq(
                "new state == left + right",
                LinearCombination::from_wire(new_state),
                LinearCombination::from_wire(sum),
            );
        }
    }

    Ok(new_state)
}
