//! constraint system for transition circuits
//!
//! rank-1 style model over the pallas base field:
//! - mul constraints: A * B = C (non-linear)
//! - eq constraints: A = B (linear)
//! - boolean constraints: w * (w - 1) = 0
//! - constant constraints: w = k
//!
//! A, B and C are linear combinations of wires. the builder assigns a value
//! to every wire as it is allocated, so synthesis produces the circuit shape
//! and its witness in one pass. the shape never depends on the values.

use core::fmt;

use ff::{Field, PrimeField};
use sha2::{Digest, Sha256};

use crate::field::Fp;

/// wire index into witness vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(pub usize);

impl WireId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// sum of scaled wires plus a constant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearCombination {
    pub terms: Vec<(WireId, Fp)>,
    pub constant: Fp,
}

impl LinearCombination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_wire(wire: WireId) -> Self {
        Self::new().with_term(wire, Fp::ONE)
    }

    pub fn from_constant(value: Fp) -> Self {
        Self { terms: Vec::new(), constant: value }
    }

    /// add `coeff * wire`
    pub fn with_term(mut self, wire: WireId, coeff: Fp) -> Self {
        self.terms.push((wire, coeff));
        self
    }

    pub fn with_wire(self, wire: WireId) -> Self {
        self.with_term(wire, Fp::ONE)
    }

    pub fn with_constant(mut self, value: Fp) -> Self {
        self.constant += value;
        self
    }

    /// evaluate against witness values
    pub fn evaluate(&self, values: &[Fp]) -> Fp {
        self.terms
            .iter()
            .fold(self.constant, |acc, (wire, coeff)| acc + values[wire.0] * coeff)
    }

    fn max_wire(&self) -> Option<usize> {
        self.terms.iter().map(|(w, _)| w.0).max()
    }

    fn absorb(&self, hasher: &mut Sha256) {
        hasher.update((self.terms.len() as u64).to_le_bytes());
        for (wire, coeff) in &self.terms {
            hasher.update((wire.0 as u64).to_le_bytes());
            hasher.update(coeff.to_repr());
        }
        hasher.update(self.constant.to_repr());
    }
}

/// constraint types in the circuit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// A * B = C
    Mul {
        a: LinearCombination,
        b: LinearCombination,
        c: LinearCombination,
    },

    /// A = B
    Eq {
        a: LinearCombination,
        b: LinearCombination,
    },

    /// wire is 0 or 1
    Boolean { wire: WireId },

    /// wire equals constant
    AssertConst { wire: WireId, value: Fp },
}

impl Constraint {
    /// check if constraint is satisfied by witness
    pub fn check(&self, values: &[Fp]) -> bool {
        match self {
            Constraint::Mul { a, b, c } => {
                a.evaluate(values) * b.evaluate(values) == c.evaluate(values)
            }
            Constraint::Eq { a, b } => a.evaluate(values) == b.evaluate(values),
            Constraint::Boolean { wire } => {
                let v = values[wire.0];
                v * (v - Fp::ONE) == Fp::ZERO
            }
            Constraint::AssertConst { wire, value } => values[wire.0] == *value,
        }
    }

    fn tag(&self) -> u8 {
        match self {
            Constraint::Mul { .. } => 0,
            Constraint::Eq { .. } => 1,
            Constraint::Boolean { .. } => 2,
            Constraint::AssertConst { .. } => 3,
        }
    }

    fn max_wire(&self) -> Option<usize> {
        match self {
            Constraint::Mul { a, b, c } => a.max_wire().max(b.max_wire()).max(c.max_wire()),
            Constraint::Eq { a, b } => a.max_wire().max(b.max_wire()),
            Constraint::Boolean { wire } | Constraint::AssertConst { wire, .. } => Some(wire.0),
        }
    }

    fn absorb(&self, hasher: &mut Sha256) {
        hasher.update([self.tag()]);
        match self {
            Constraint::Mul { a, b, c } => {
                a.absorb(hasher);
                b.absorb(hasher);
                c.absorb(hasher);
            }
            Constraint::Eq { a, b } => {
                a.absorb(hasher);
                b.absorb(hasher);
            }
            Constraint::Boolean { wire } => hasher.update((wire.0 as u64).to_le_bytes()),
            Constraint::AssertConst { wire, value } => {
                hasher.update((wire.0 as u64).to_le_bytes());
                hasher.update(value.to_repr());
            }
        }
    }
}

/// builder that allocates wires with values and records constraints
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    values: Vec<Fp>,
    public: Vec<WireId>,
    constraints: Vec<Constraint>,
    labels: Vec<String>,
}

impl CircuitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// allocate a public input wire
    pub fn add_public(&mut self, value: Fp) -> WireId {
        let wire = self.add_witness(value);
        self.public.push(wire);
        wire
    }

    /// allocate a private witness wire
    pub fn add_witness(&mut self, value: Fp) -> WireId {
        let wire = WireId(self.values.len());
        self.values.push(value);
        wire
    }

    /// assigned value of a wire
    pub fn value(&self, wire: WireId) -> Fp {
        self.values[wire.0]
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn constrain(&mut self, label: impl Into<String>, constraint: Constraint) {
        self.constraints.push(constraint);
        self.labels.push(label.into());
    }

    pub fn assert_eq(&mut self, label: impl Into<String>, a: LinearCombination, b: LinearCombination) {
        self.constrain(label, Constraint::Eq { a, b });
    }

    pub fn assert_boolean(&mut self, label: impl Into<String>, wire: WireId) {
        self.constrain(label, Constraint::Boolean { wire });
    }

    pub fn assert_const(&mut self, label: impl Into<String>, wire: WireId, value: Fp) {
        self.constrain(label, Constraint::AssertConst { wire, value });
    }

    /// allocate `a * b` as a new wire
    pub fn mul(&mut self, label: impl Into<String>, a: WireId, b: WireId) -> WireId {
        let c = self.add_witness(self.value(a) * self.value(b));
        self.constrain(
            label,
            Constraint::Mul {
                a: LinearCombination::from_wire(a),
                b: LinearCombination::from_wire(b),
                c: LinearCombination::from_wire(c),
            },
        );
        c
    }

    /// materialise a linear combination as a new wire
    pub fn linear(&mut self, label: impl Into<String>, lc: LinearCombination) -> WireId {
        let out = self.add_witness(lc.evaluate(&self.values));
        self.assert_eq(label, LinearCombination::from_wire(out), lc);
        out
    }

    /// allocate `a + b` as a new wire
    pub fn add(&mut self, label: impl Into<String>, a: WireId, b: WireId) -> WireId {
        self.linear(label, LinearCombination::from_wire(a).with_wire(b))
    }

    /// finish synthesis
    pub fn build(self) -> (Circuit, Witness) {
        let circuit = Circuit {
            num_wires: self.values.len(),
            public: self.public.clone(),
            constraints: self.constraints,
            labels: self.labels,
        };
        let witness = Witness { values: self.values, public: self.public };
        (circuit, witness)
    }
}

/// circuit shape
#[derive(Debug, Clone)]
pub struct Circuit {
    pub num_wires: usize,
    pub public: Vec<WireId>,
    pub constraints: Vec<Constraint>,
    labels: Vec<String>,
}

impl Circuit {
    /// sha256 over the constraint shape (labels excluded)
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"sumchain-circuit-v1");
        hasher.update((self.num_wires as u64).to_le_bytes());
        hasher.update((self.public.len() as u64).to_le_bytes());
        for wire in &self.public {
            hasher.update((wire.0 as u64).to_le_bytes());
        }
        hasher.update((self.constraints.len() as u64).to_le_bytes());
        for constraint in &self.constraints {
            constraint.absorb(&mut hasher);
        }
        hasher.finalize().into()
    }

    /// label attached to a constraint at synthesis time
    pub fn label(&self, index: usize) -> &str {
        self.labels.get(index).map(String::as_str).unwrap_or("")
    }

    /// index of the first constraint the witness violates
    ///
    /// a witness that does not cover exactly the circuit's wires is a wiring
    /// error, not a constraint violation.
    pub fn first_unsatisfied(&self, witness: &Witness) -> Result<Option<usize>, WitnessLength> {
        if witness.values.len() != self.num_wires {
            return Err(WitnessLength {
                expected: self.num_wires,
                actual: witness.values.len(),
            });
        }
        Ok(self.constraints.iter().position(|c| !c.check(&witness.values)))
    }

    pub fn is_satisfied(&self, witness: &Witness) -> bool {
        matches!(self.first_unsatisfied(witness), Ok(None))
    }

    /// structural checks: constraints exist and reference allocated wires
    pub fn validate(&self) -> Result<(), String> {
        if self.constraints.is_empty() {
            return Err("circuit has no constraints".into());
        }
        if self.public.is_empty() {
            return Err("circuit has no public input".into());
        }
        for (i, constraint) in self.constraints.iter().enumerate() {
            if let Some(max) = constraint.max_wire() {
                if max >= self.num_wires {
                    return Err(format!("constraint {} references unallocated wire {}", i, max));
                }
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> CircuitStats {
        let mut stats = CircuitStats {
            public_inputs: self.public.len(),
            wires: self.num_wires,
            constraints: self.constraints.len(),
            ..Default::default()
        };
        for constraint in &self.constraints {
            match constraint {
                Constraint::Mul { .. } => stats.mul += 1,
                Constraint::Eq { .. } => stats.eq += 1,
                Constraint::Boolean { .. } => stats.boolean += 1,
                Constraint::AssertConst { .. } => stats.constant += 1,
            }
        }
        stats
    }
}

/// witness length differs from the circuit's wire count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WitnessLength {
    pub expected: usize,
    pub actual: usize,
}

/// assigned wire values
#[derive(Debug, Clone)]
pub struct Witness {
    values: Vec<Fp>,
    public: Vec<WireId>,
}

impl Witness {
    pub fn values(&self) -> &[Fp] {
        &self.values
    }

    pub fn public_inputs(&self) -> Vec<Fp> {
        self.public.iter().map(|w| self.values[w.0]).collect()
    }

    /// overwrite a wire value
    pub fn set(&mut self, wire: WireId, value: Fp) {
        self.values[wire.0] = value;
    }
}

/// constraint counts for one circuit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CircuitStats {
    pub public_inputs: usize,
    pub wires: usize,
    pub constraints: usize,
    pub mul: usize,
    pub eq: usize,
    pub boolean: usize,
    pub constant: usize,
}

impl fmt::Display for CircuitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} constraints ({} mul, {} eq, {} boolean, {} const), {} wires",
            self.constraints, self.mul, self.eq, self.boolean, self.constant, self.wires
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::fp_from_u64;

    #[test]
    fn test_mul_and_eq() {
        let mut cs = CircuitBuilder::new();
        let a = cs.add_public(fp_from_u64(6));
        let b = cs.add_witness(fp_from_u64(7));
        let c = cs.mul("a*b", a, b);
        cs.assert_const("c = 42", c, fp_from_u64(42));
        let (circuit, witness) = cs.build();

        assert!(circuit.is_satisfied(&witness));
        assert_eq!(witness.public_inputs(), vec![fp_from_u64(6)]);
        assert!(circuit.validate().is_ok());
    }

    #[test]
    fn test_unsatisfied_reports_index() {
        let mut cs = CircuitBuilder::new();
        let a = cs.add_public(fp_from_u64(5));
        let b = cs.add_witness(fp_from_u64(3));
        let sum = cs.add("a+b", a, b);
        cs.assert_const("sum = 8", sum, fp_from_u64(8));
        cs.assert_boolean("b is a bit", b);
        let (circuit, mut witness) = cs.build();

        // 3 is not boolean
        assert_eq!(circuit.first_unsatisfied(&witness), Ok(Some(2)));
        assert_eq!(circuit.label(2), "b is a bit");

        witness.set(sum, fp_from_u64(9));
        assert_eq!(circuit.first_unsatisfied(&witness), Ok(Some(0)));
    }

    #[test]
    fn test_witness_length_mismatch_is_not_a_constraint_failure() {
        let mut cs = CircuitBuilder::new();
        let a = cs.add_public(fp_from_u64(1));
        cs.assert_boolean("a is a bit", a);
        let (circuit, mut witness) = cs.build();
        assert_eq!(circuit.first_unsatisfied(&witness), Ok(None));

        witness.values.push(Fp::ZERO);
        assert_eq!(
            circuit.first_unsatisfied(&witness),
            Err(WitnessLength { expected: 1, actual: 2 })
        );
        assert!(!circuit.is_satisfied(&witness));

        witness.values.clear();
        assert_eq!(
            circuit.first_unsatisfied(&witness),
            Err(WitnessLength { expected: 1, actual: 0 })
        );
    }

    #[test]
    fn test_digest_ignores_values() {
        let shape = |x: u64| {
            let mut cs = CircuitBuilder::new();
            let a = cs.add_public(fp_from_u64(x));
            let b = cs.add_witness(fp_from_u64(x + 1));
            let _ = cs.add("a+b", a, b);
            cs.build().0.digest()
        };
        assert_eq!(shape(1), shape(1000));

        let mut cs = CircuitBuilder::new();
        let a = cs.add_public(fp_from_u64(1));
        cs.assert_boolean("a", a);
        assert_ne!(cs.build().0.digest(), shape(1));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let mut cs = CircuitBuilder::new();
        cs.add_public(Fp::ZERO);
        let (circuit, _) = cs.build();
        assert!(circuit.validate().is_err());
    }

    #[test]
    fn test_stats() {
        let mut cs = CircuitBuilder::new();
        let a = cs.add_public(Fp::ONE);
        cs.assert_boolean("a", a);
        let sq = cs.mul("a*a", a, a);
        cs.assert_const("a*a = 1", sq, Fp::ONE);
        let stats = cs.build().0.stats();
        assert_eq!(stats.constraints, 3);
        assert_eq!(stats.boolean, 1);
        assert_eq!(stats.mul, 1);
        assert_eq!(stats.constant, 1);
        assert_eq!(stats.wires, 2);
    }
}
