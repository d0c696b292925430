//! composition protocol: chains, merges and verification across keys

use ff::Field;
use sumchain::{
    fp_from_u64, merge_all, merge_pair, par_branches, verify, Chain, Error, Fp, Method, Program,
    ProgramConfig, Proof, BATCH_BITS,
};

fn program(seed: u8) -> Program {
    Program::compile(ProgramConfig::default().with_seed([seed; 32])).unwrap()
}

fn leaf(program: &Program, x: u64) -> Proof {
    let mut chain = Chain::init(program).unwrap();
    chain.add_number(fp_from_u64(x)).unwrap();
    chain.into_head()
}

#[test]
fn test_end_to_end_scenario() {
    let program = program(1);

    let p0 = program.init(Fp::ZERO).unwrap();
    assert_eq!(p0.public_input(), Fp::ZERO);

    let batch = program.add_batch(fp_from_u64(50), &p0, fp_from_u64(5)).unwrap();
    let batch_zero = program.add_batch(fp_from_u64(50), &batch, Fp::ZERO).unwrap();
    assert_eq!(batch_zero.public_input(), fp_from_u64(50));

    let p1 = program.add_number(fp_from_u64(54), &batch_zero, fp_from_u64(4)).unwrap();

    // independent branch
    let other_init = program.init(Fp::ZERO).unwrap();
    let other = program.add_batch(fp_from_u64(50), &other_init, fp_from_u64(5)).unwrap();

    let root = program.merge(fp_from_u64(104), &p1, &other).unwrap();
    assert_eq!(root.public_input(), fp_from_u64(104));
    assert!(verify(&root, program.verification_key()));

    for proof in [&p0, &batch, &batch_zero, &p1, &other_init, &other] {
        assert!(program.verify(proof));
    }
}

#[test]
fn test_benchmark_driver_shape() {
    // the benchmark merges the head with an ancestor of the same chain
    let program = program(2);
    let mut chain = Chain::init(&program).unwrap();
    let batch = chain.add_batch(fp_from_u64(5)).unwrap().clone();
    chain.add_batch(Fp::ZERO).unwrap();
    chain.add_number(fp_from_u64(4)).unwrap();
    chain.merge(&batch).unwrap();
    assert_eq!(chain.value(), fp_from_u64(104));

    for i in 0..3u64 {
        chain.add_number(fp_from_u64(4)).unwrap();
        assert_eq!(chain.value(), fp_from_u64(108 + 4 * i));
    }
    assert!(program.verify(chain.head()));
}

#[test]
fn test_init_requires_zero() {
    let program = program(3);
    for bad in [1u64, 2, 104] {
        assert!(matches!(
            program.init(fp_from_u64(bad)),
            Err(Error::Unsatisfied { method: Method::Init, .. })
        ));
    }
}

#[test]
fn test_add_batch_corners() {
    let program = program(4);
    let p0 = program.init(Fp::ZERO).unwrap();
    let p1 = program.add_number(fp_from_u64(9), &p0, fp_from_u64(9)).unwrap();

    // zero leaves the value unchanged
    let same = program.add_batch(fp_from_u64(9), &p1, Fp::ZERO).unwrap();
    assert_eq!(same.public_input(), fp_from_u64(9));

    // largest 252-bit witness
    let max = Fp::from(2u64).pow_vartime([BATCH_BITS as u64]) - Fp::ONE;
    let expected = fp_from_u64(9) + max * fp_from_u64(10);
    let top = program.add_batch(expected, &p1, max).unwrap();
    assert!(program.verify(&top));

    // one past the width fails at decomposition
    let over = max + Fp::ONE;
    assert!(matches!(
        program.add_batch(fp_from_u64(9) + over * fp_from_u64(10), &p1, over),
        Err(Error::OutOfRange { bits: BATCH_BITS })
    ));
}

#[test]
fn test_add_batch_wrong_claim_fails() {
    let program = program(5);
    let p0 = program.init(Fp::ZERO).unwrap();
    // single addition is not a batch
    assert!(matches!(
        program.add_batch(fp_from_u64(5), &p0, fp_from_u64(5)),
        Err(Error::Unsatisfied { method: Method::AddBatch, .. })
    ));
}

#[test]
fn test_merge_commutes() {
    let program = program(6);
    let a = leaf(&program, 13);
    let b = leaf(&program, 29);

    let ab = merge_pair(&program, &a, &b).unwrap();
    let ba = merge_pair(&program, &b, &a).unwrap();
    assert_eq!(ab.public_input(), ba.public_input());
    assert_eq!(ab.public_input(), fp_from_u64(42));
}

#[test]
fn test_merge_associates() {
    let program = program(7);
    let (a, b, c) = (leaf(&program, 1), leaf(&program, 2), leaf(&program, 3));

    let left = merge_pair(&program, &merge_pair(&program, &a, &b).unwrap(), &c).unwrap();
    let right = merge_pair(&program, &a, &merge_pair(&program, &b, &c).unwrap()).unwrap();
    assert_eq!(left.public_input(), right.public_input());
    assert!(program.verify(&left) && program.verify(&right));
}

#[test]
fn test_merge_same_chain_points() {
    let program = program(8);
    let mut chain = Chain::init(&program).unwrap();
    let early = chain.add_number(fp_from_u64(10)).unwrap().clone();
    chain.add_number(fp_from_u64(5)).unwrap();
    let merged = merge_pair(&program, chain.head(), &early).unwrap();
    assert_eq!(merged.public_input(), fp_from_u64(25));
}

#[test]
fn test_merge_wrong_sum_fails() {
    let program = program(9);
    let a = leaf(&program, 1);
    let b = leaf(&program, 2);
    assert!(matches!(
        program.merge(fp_from_u64(4), &a, &b),
        Err(Error::Unsatisfied { method: Method::Merge, .. })
    ));
}

#[test]
fn test_cross_key_rejection() {
    let ours = program(10);
    let theirs = program(11);
    let proof = leaf(&ours, 3);

    assert!(ours.verify(&proof));
    assert!(!theirs.verify(&proof));
    assert!(!verify(&proof, theirs.verification_key()));

    // a foreign proof cannot be extended or merged
    assert!(theirs.add_number(fp_from_u64(4), &proof, fp_from_u64(1)).is_err());
    let local = leaf(&theirs, 1);
    assert!(merge_pair(&theirs, &local, &proof).is_err());
}

#[test]
fn test_add_batch_rejects_foreign_parent() {
    let ours = program(15);
    let theirs = program(16);
    let foreign_init = theirs.init(Fp::ZERO).unwrap();

    assert!(matches!(
        ours.add_batch(fp_from_u64(50), &foreign_init, fp_from_u64(5)),
        Err(Error::Unsatisfied { method: Method::AddBatch, .. })
    ));

    // a forged value on a genuine proof is rejected the same way
    let genuine = ours.init(Fp::ZERO).unwrap();
    let json = genuine.to_json().unwrap().replace(
        &sumchain::fp_to_hex(&Fp::ZERO),
        &sumchain::fp_to_hex(&fp_from_u64(7)),
    );
    let forged = Proof::from_json(&json).unwrap();
    assert!(matches!(
        ours.add_batch(fp_from_u64(57), &forged, fp_from_u64(5)),
        Err(Error::Unsatisfied { method: Method::AddBatch, .. })
    ));
}

#[test]
fn test_merge_rejects_foreign_left_parent() {
    let ours = program(17);
    let theirs = program(18);
    let foreign = leaf(&theirs, 0);
    let local = leaf(&ours, 0);

    assert!(matches!(
        ours.merge(Fp::ZERO, &foreign, &local),
        Err(Error::Unsatisfied { method: Method::Merge, .. })
    ));
    assert!(matches!(
        ours.merge(Fp::ZERO, &local, &foreign),
        Err(Error::Unsatisfied { method: Method::Merge, .. })
    ));
    assert!(ours.merge(Fp::ZERO, &local, &local).is_ok());
}

#[test]
fn test_renamed_program_is_a_different_relation() {
    let a = Program::compile(ProgramConfig::default().with_seed([12; 32])).unwrap();
    let b = Program::compile(ProgramConfig::default().with_name("other").with_seed([12; 32])).unwrap();
    let proof = a.init(Fp::ZERO).unwrap();
    assert!(!b.verify(&proof));
}

#[test]
fn test_parallel_tree() {
    let program = program(13);
    let (left, right) = par_branches(|| leaf(&program, 20), || leaf(&program, 22));
    let root = merge_pair(&program, &left, &right).unwrap();
    assert_eq!(root.public_input(), fp_from_u64(42));

    let leaves: Vec<Proof> = (0..8u64).map(|x| leaf(&program, x)).collect();
    let root = merge_all(&program, &leaves).unwrap();
    assert_eq!(root.public_input(), fp_from_u64(28));
    assert!(program.verify(&root));
}

#[test]
fn test_serialized_proof_verifies() {
    let program = program(14);
    let proof = leaf(&program, 77);

    let json = proof.to_json().unwrap();
    let restored = Proof::from_json(&json).unwrap();
    assert!(verify(&restored, program.verification_key()));

    let bytes = proof.to_bytes().unwrap();
    assert!(program.verify(&Proof::from_bytes(&bytes).unwrap()));

    let vk_json = program.verification_key().to_json().unwrap();
    let vk = sumchain::VerificationKey::from_json(&vk_json).unwrap();
    assert!(verify(&restored, &vk));
}
