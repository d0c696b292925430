//! composition protocol
//!
//! ```text
//!   init ──▶ addBatch ──▶ addNumber ──┐
//!                                      ├──▶ merge ──▶ …
//!   init ──▶ addBatch ─────────────────┘
//! ```
//!
//! a [`Chain`] holds only its head proof and extends it linearly. `merge`
//! joins any two proofs, so the proof graph is a tree rooted at `init`
//! proofs. branches without a parent/child relation are independent and
//! can be built in parallel; merge is the synchronisation point.

use tracing::debug;

use crate::field::Fp;
use crate::program::Program;
use crate::proof::Proof;
use crate::relation::Method;
use crate::{Error, Result};

/// linear chain of proofs, tracking only the head
#[derive(Debug, Clone)]
pub struct Chain<'p> {
    program: &'p Program,
    head: Proof,
}

impl<'p> Chain<'p> {
    /// start a chain at zero
    pub fn init(program: &'p Program) -> Result<Self> {
        let head = program.init(next(Method::Init, None, &[])?)?;
        Ok(Self { program, head })
    }

    /// continue from an existing proof
    pub fn from_proof(program: &'p Program, head: Proof) -> Self {
        Self { program, head }
    }

    pub fn head(&self) -> &Proof {
        &self.head
    }

    pub fn value(&self) -> Fp {
        self.head.public_input()
    }

    pub fn into_head(self) -> Proof {
        self.head
    }

    /// prove `head + x`. on failure the head is unchanged
    pub fn add_number(&mut self, x: Fp) -> Result<&Proof> {
        let value = next(Method::AddNumber, Some(x), &[self.value()])?;
        self.head = self.program.add_number(value, &self.head, x)?;
        Ok(&self.head)
    }

    /// prove `head + 10·x`. on failure the head is unchanged
    pub fn add_batch(&mut self, x: Fp) -> Result<&Proof> {
        let value = next(Method::AddBatch, Some(x), &[self.value()])?;
        self.head = self.program.add_batch(value, &self.head, x)?;
        Ok(&self.head)
    }

    /// fold another proof into this chain
    pub fn merge(&mut self, other: &Proof) -> Result<&Proof> {
        self.head = merge_pair(self.program, &self.head, other)?;
        Ok(&self.head)
    }
}

fn next(method: Method, witness: Option<Fp>, parents: &[Fp]) -> Result<Fp> {
    method.next_value(witness, parents).ok_or_else(|| Error::InvalidInputs {
        method,
        reason: "inputs do not fit the method".into(),
    })
}

/// merge two proofs, claiming the sum of their values
pub fn merge_pair(program: &Program, left: &Proof, right: &Proof) -> Result<Proof> {
    let value = next(Method::Merge, None, &[left.public_input(), right.public_input()])?;
    program.merge(value, left, right)
}

/// run two independent constructions, in parallel when enabled
pub fn par_branches<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    #[cfg(feature = "parallel")]
    {
        rayon::join(a, b)
    }
    #[cfg(not(feature = "parallel"))]
    {
        (a(), b())
    }
}

/// merge any number of proofs as a balanced tree
///
/// halves are merged independently, so every level of the tree proves in
/// parallel. a single proof is returned unchanged.
pub fn merge_all(program: &Program, proofs: &[Proof]) -> Result<Proof> {
    match proofs {
        [] => Err(Error::EmptyMerge),
        [single] => Ok(single.clone()),
        _ => {
            let (left, right) = proofs.split_at(proofs.len() / 2);
            let (left, right) = par_branches(
                || merge_all(program, left),
                || merge_all(program, right),
            );
            let (left, right) = (left?, right?);
            debug!(leaves = proofs.len(), "merging subtrees");
            merge_pair(program, &left, &right)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProgramConfig;
    use crate::field::fp_from_u64;
    use ff::Field;

    fn program() -> Program {
        Program::compile(ProgramConfig::default().with_seed([21u8; 32])).unwrap()
    }

    #[test]
    fn test_chain_tracks_value() {
        let program = program();
        let mut chain = Chain::init(&program).unwrap();
        assert_eq!(chain.value(), Fp::ZERO);

        chain.add_batch(fp_from_u64(5)).unwrap();
        chain.add_number(fp_from_u64(4)).unwrap();
        assert_eq!(chain.value(), fp_from_u64(54));
        assert!(program.verify(chain.head()));
    }

    #[test]
    fn test_failed_step_keeps_head() {
        let program = program();
        let mut chain = Chain::init(&program).unwrap();
        chain.add_number(fp_from_u64(3)).unwrap();
        let before = chain.head().clone();

        // 2^252 does not fit the batch decomposition
        let too_big = crate::field::two_pow(252);
        assert!(matches!(
            chain.add_batch(too_big),
            Err(Error::OutOfRange { .. })
        ));
        assert_eq!(chain.head(), &before);
    }

    #[test]
    fn test_merge_all_empty() {
        let program = program();
        assert!(matches!(merge_all(&program, &[]), Err(Error::EmptyMerge)));
    }

    #[test]
    fn test_merge_all_sums() {
        let program = program();
        let leaves: Vec<Proof> = (1..=5u64)
            .map(|x| {
                let mut chain = Chain::init(&program).unwrap();
                chain.add_number(fp_from_u64(x)).unwrap();
                chain.into_head()
            })
            .collect();

        let root = merge_all(&program, &leaves).unwrap();
        assert_eq!(root.public_input(), fp_from_u64(15));
        assert_eq!(root.method(), Method::Merge);
        assert!(program.verify(&root));

        let single = merge_all(&program, &leaves[..1]).unwrap();
        assert_eq!(single, leaves[0]);
    }

    #[test]
    fn test_par_branches() {
        let program = program();
        let (a, b) = par_branches(
            || {
                let mut chain = Chain::init(&program)?;
                chain.add_batch(fp_from_u64(5))?;
                Ok::<_, Error>(chain.into_head())
            },
            || {
                let mut chain = Chain::init(&program)?;
                chain.add_number(fp_from_u64(7))?;
                Ok::<_, Error>(chain.into_head())
            },
        );
        let merged = merge_pair(&program, &a.unwrap(), &b.unwrap()).unwrap();
        assert_eq!(merged.public_input(), fp_from_u64(57));
    }
}
