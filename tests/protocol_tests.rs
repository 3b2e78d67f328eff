mod common;

use num_bigint::BigUint;
use zkp_auth::{
    derive_group_with_generators, is_probably_prime, ChaumPedersenProver, ChaumPedersenVerifier,
    Commitment, ErrorKind, GroupParameters, NonInteractiveProof, SchnorrProver, SchnorrVerifier,
    SecureRng,
};

use common::{debug_prover, decrement, init_tracing};

fn prover_and_verifier(params: GroupParameters) -> (ChaumPedersenProver, ChaumPedersenVerifier) {
    let mut rng = SecureRng::new();
    let prover = ChaumPedersenProver::new(params, &mut rng).unwrap();
    let verifier =
        ChaumPedersenVerifier::new(prover.params().clone(), prover.statement().clone()).unwrap();
    (prover, verifier)
}

#[test]
fn known_primes_and_composites() {
    assert!(is_probably_prime(&BigUint::from(101u32), 20));
    assert!(is_probably_prime(&BigUint::from(2_147_483_647u32), 20));
    assert!(!is_probably_prime(&BigUint::from(100u32), 20));
    assert!(!is_probably_prime(&BigUint::from(1024u32), 20));
}

#[test]
fn derived_groups_are_well_formed() {
    init_tracing();

    for bits in [8u64, 16, 32, 48] {
        let params = derive_group_with_generators(bits, 3).unwrap();
        let (p, q) = (params.p(), params.q());

        assert!(p > q);
        assert!(*q > BigUint::from(0u32));
        assert_eq!(p % q, BigUint::from(1u32));
        assert_eq!(params.generators().len(), 3);

        for g in params.generators() {
            assert!(*g > BigUint::from(1u32));
            assert!(g < p);
            assert_eq!(g.modpow(q, p), BigUint::from(1u32));
        }
    }
}

#[test]
fn interactive_transcript_verifies_on_fresh_groups() {
    let mut rng = SecureRng::new();

    for bits in [16u64, 32, 64] {
        let mut prover = ChaumPedersenProver::generate(bits, &mut rng).unwrap();
        let mut verifier =
            ChaumPedersenVerifier::new(prover.params().clone(), prover.statement().clone())
                .unwrap();

        let commitment = prover.commit(&mut rng).unwrap();
        let c = verifier.issue_challenge(commitment, &mut rng);
        let s = prover.respond(&c).unwrap();
        assert!(verifier.check_response(&s).unwrap());
    }
}

#[test]
fn every_interactive_field_matters() {
    let mut rng = SecureRng::new();
    let (mut prover, verifier) = prover_and_verifier(GroupParameters::default_group());
    let p = prover.params().p().clone();
    let q = prover.params().q().clone();

    let commitment = prover.commit(&mut rng).unwrap();
    let c = BigUint::from(987_654_321u32);
    let s = prover.respond(&c).unwrap();
    assert!(verifier.verify_transcript(&commitment, &c, &s));

    let bad_r1 = Commitment::new(decrement(commitment.r1(), &p), commitment.r2().clone());
    assert!(!verifier.verify_transcript(&bad_r1, &c, &s));

    let bad_r2 = Commitment::new(commitment.r1().clone(), decrement(commitment.r2(), &p));
    assert!(!verifier.verify_transcript(&bad_r2, &c, &s));

    assert!(!verifier.verify_transcript(&commitment, &decrement(&c, &p), &s));
    assert!(!verifier.verify_transcript(&commitment, &c, &decrement(&s, &q)));
}

#[test]
fn every_interactive_field_matters_through_check_response() {
    let mut rng = SecureRng::new();
    let (mut prover, mut verifier) = prover_and_verifier(GroupParameters::default_group());
    let q = prover.params().q().clone();

    let commitment = prover.commit(&mut rng).unwrap();
    let c = verifier.issue_challenge(commitment, &mut rng);
    let s = prover.respond(&c).unwrap();

    assert!(!verifier.check_response(&decrement(&s, &q)).unwrap());
}

#[test]
fn every_non_interactive_field_matters() {
    let mut rng = SecureRng::new();
    let (mut prover, verifier) = prover_and_verifier(GroupParameters::default_group());
    let p = prover.params().p().clone();
    let q = prover.params().q().clone();

    let proof = prover.prove_non_interactive(&mut rng).unwrap();
    assert!(verifier.verify_non_interactive(&proof));

    let (r1, r2) = (proof.commitment().r1(), proof.commitment().r2());
    let (c, s) = (proof.challenge(), proof.response());

    let tampered = [
        NonInteractiveProof::new(
            Commitment::new(decrement(r1, &p), r2.clone()),
            c.clone(),
            s.clone(),
        ),
        NonInteractiveProof::new(
            Commitment::new(r1.clone(), decrement(r2, &p)),
            c.clone(),
            s.clone(),
        ),
        NonInteractiveProof::new(proof.commitment().clone(), decrement(c, &p), s.clone()),
        NonInteractiveProof::new(proof.commitment().clone(), c.clone(), decrement(s, &q)),
    ];

    for proof in &tampered {
        assert!(!verifier.verify_non_interactive(proof));
    }
}

#[test]
fn modes_are_not_interchangeable() {
    let mut rng = SecureRng::new();
    let (mut prover, mut verifier) = prover_and_verifier(GroupParameters::default_group());

    let proof = prover.prove_non_interactive(&mut rng).unwrap();
    assert!(verifier.verify_non_interactive(&proof));

    let commitment = prover.commit(&mut rng).unwrap();
    verifier.issue_challenge(commitment, &mut rng);
    assert!(!verifier.check_response(proof.response()).unwrap());

    // the abandoned exchange does not poison the next one
    let commitment = prover.commit(&mut rng).unwrap();
    let c = verifier.issue_challenge(commitment, &mut rng);
    let s = prover.respond(&c).unwrap();
    assert!(verifier.check_response(&s).unwrap());
}

#[test]
fn proof_for_one_user_does_not_verify_for_another() {
    let mut rng = SecureRng::new();
    let (mut alice, _) = prover_and_verifier(GroupParameters::default_group());
    let (_, bob_verifier) = prover_and_verifier(GroupParameters::default_group());

    let proof = alice.prove_non_interactive(&mut rng).unwrap();
    assert!(!bob_verifier.verify_non_interactive(&proof));
}

#[test]
fn commitments_never_repeat() {
    let mut rng = SecureRng::new();
    let (mut prover, _) = prover_and_verifier(GroupParameters::default_group());

    let mut seen = std::collections::HashSet::new();
    for _ in 0..200 {
        let commitment = prover.commit(&mut rng).unwrap();
        assert!(seen.insert(commitment.r1().clone()));
    }
    assert_eq!(prover.nonces_used(), 200);
}

#[test]
fn small_group_commitments_stay_distinct_until_exhausted() {
    let mut rng = SecureRng::new();
    let mut prover = debug_prover(6);
    let mut verifier =
        ChaumPedersenVerifier::new(prover.params().clone(), prover.statement().clone()).unwrap();

    // q = 11: ten usable nonces, each giving its own r1
    let mut seen = std::collections::HashSet::new();
    for _ in 0..10 {
        let commitment = prover.commit(&mut rng).unwrap();
        assert!(seen.insert(commitment.r1().clone()));

        let c = verifier.issue_challenge(commitment, &mut rng);
        let s = prover.respond(&c).unwrap();
        assert!(verifier.check_response(&s).unwrap());
    }

    let err = prover.commit(&mut rng).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn small_group_proofs_stay_distinct_until_exhausted() {
    let mut rng = SecureRng::new();
    let mut prover = debug_prover(6);

    let mut seen = std::collections::HashSet::new();
    for _ in 0..10 {
        let proof = prover.prove_non_interactive(&mut rng).unwrap();
        assert!(seen.insert(proof.commitment().r1().clone()));
    }
    assert_eq!(prover.nonces_used(), 10);
    assert!(prover.prove_non_interactive(&mut rng).is_err());
}

#[test]
fn small_group_schnorr_commitments_stay_distinct() {
    let mut rng = SecureRng::new();
    let mut prover = SchnorrProver::new(GroupParameters::debug_group(), &mut rng);

    let mut seen = std::collections::HashSet::new();
    for _ in 0..10 {
        assert!(seen.insert(prover.prove(&mut rng).unwrap().r));
    }
    assert!(prover.prove(&mut rng).is_err());
}

#[test]
fn schnorr_round_trip_and_tamper() {
    let mut rng = SecureRng::new();
    let mut prover = SchnorrProver::generate(32, &mut rng).unwrap();
    let verifier = SchnorrVerifier::new(prover.params().clone());
    let q = prover.params().q().clone();

    let proof = prover.prove(&mut rng).unwrap();
    assert!(verifier.verify(&proof));

    let mut bad = proof.clone();
    bad.s = decrement(&bad.s, &q);
    assert!(!verifier.verify(&bad));
}
