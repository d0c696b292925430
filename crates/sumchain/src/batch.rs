//! bit-batch adder
//!
//! adds a witness to a running target by rebuilding it from its bits
//! instead of adding it directly, and does so [`BATCH_ROUNDS`] times.
//!
//! ```text
//! x ──decompose──▶ b251 … b0          (252 boolean wires, range-checked)
//!
//! pass k:  r = 0
//!          for each 3-bit group (b0, b1, b2), most significant first:
//!              r = 8·r + 4·b0 + 2·b1 + b2
//!          target = target + r        (r == x)
//! ```
//!
//! the ten passes are algebraically `target + 10·x`. the redundant form is
//! kept so the circuit carries the full reconstruction cost.

use ff::Field;

use crate::constraint::{CircuitBuilder, LinearCombination, WireId};
use crate::field::{fp_from_u64, fp_to_bits_le, Fp};
use crate::Result;

/// width of the decomposition
pub const BATCH_BITS: usize = 252;
/// bits per reconstruction group
pub const GROUP_SIZE: usize = 3;
/// groups per reconstruction pass
pub const GROUPS: usize = BATCH_BITS / GROUP_SIZE;
/// reconstruction passes per batch
pub const BATCH_ROUNDS: usize = 10;

/// decompose `x` into little-endian bit wires
///
/// every bit is constrained boolean and the weighted sum is constrained to
/// equal `x`. witness generation fails if `x` does not fit in
/// [`BATCH_BITS`] bits.
pub fn decompose(cs: &mut CircuitBuilder, x: WireId) -> Result<Vec<WireId>> {
    let bits = fp_to_bits_le(&cs.value(x), BATCH_BITS)?;

    let mut wires = Vec::with_capacity(BATCH_BITS);
    let mut packed = LinearCombination::new();
    let mut weight = Fp::ONE;
    for (i, bit) in bits.into_iter().enumerate() {
        let wire = cs.add_witness(if bit { Fp::ONE } else { Fp::ZERO });
        cs.assert_boolean(format!("batch bit {} is boolean", i), wire);
        packed = packed.with_term(wire, weight);
        weight = weight.double();
        wires.push(wire);
    }
    cs.assert_eq("batch bits pack to witness", LinearCombination::from_wire(x), packed);

    Ok(wires)
}

/// one reconstruction pass over little-endian bit wires
pub fn reconstruct(cs: &mut CircuitBuilder, bits: &[WireId], pass: usize) -> WireId {
    debug_assert_eq!(bits.len(), BATCH_BITS);

    let four = fp_from_u64(4);
    let two = fp_from_u64(2);
    let eight = fp_from_u64(8);

    let mut acc: Option<WireId> = None;
    for group in 0..GROUPS {
        let base = BATCH_BITS - GROUP_SIZE * (group + 1);
        let (b0, b1, b2) = (bits[base + 2], bits[base + 1], bits[base]);

        let mut lc = LinearCombination::new()
            .with_term(b0, four)
            .with_term(b1, two)
            .with_wire(b2);
        if let Some(prev) = acc {
            lc = lc.with_term(prev, eight);
        }
        acc = Some(cs.linear(format!("batch pass {} group {}", pass, group), lc));
    }

    // GROUPS > 0
    acc.unwrap_or(bits[0])
}

/// add `x` to `start` through [`BATCH_ROUNDS`] bit reconstructions
pub fn add_batch(cs: &mut CircuitBuilder, start: WireId, x: WireId) -> Result<WireId> {
    let bits = decompose(cs, x)?;

    let mut target = start;
    for pass in 0..BATCH_ROUNDS {
        let rebuilt = reconstruct(cs, &bits, pass);
        target = cs.add(format!("batch pass {} accumulate", pass), target, rebuilt);
    }
    Ok(target)
}

/// native counterpart of [`add_batch`]
pub fn batch_sum(start: Fp, x: Fp) -> Fp {
    start + x * fp_from_u64(BATCH_ROUNDS as u64)
}
