use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use super::{Commitment, NonInteractiveProof, ProtocolState, Statement};
use crate::primitives::rng::random_exponent_below;
use crate::{Error, GroupParameters, Result, Transcript};

/// Derives the Fiat-Shamir challenge `H(r1 ∥ r2 ∥ y1 ∥ y2) mod p`.
pub fn fiat_shamir_challenge(
    params: &GroupParameters,
    commitment: &Commitment,
    statement: &Statement,
) -> BigUint {
    let mut transcript = Transcript::chaum_pedersen();
    transcript.append_commitment(&commitment.to_vec());
    transcript.append_statement(&statement.to_vec());
    transcript.challenge_mod(params.p())
}

enum VerifierState {
    AwaitingCommitment,
    Challenged {
        commitment: Commitment,
        challenge: BigUint,
    },
}

/// Verifier for the Chaum-Pedersen zero-knowledge protocol.
///
/// Checks that the prover knows `x` with `y1 = g^x` and `y2 = h^x` (mod p).
/// The interactive side holds at most one outstanding `(r1, r2, c)`; the
/// non-interactive side is stateless.
pub struct ChaumPedersenVerifier {
    params: GroupParameters,
    h: BigUint,
    statement: Statement,
    state: VerifierState,
}

impl ChaumPedersenVerifier {
    /// Creates a verifier bound to a user's public values.
    ///
    /// # Errors
    ///
    /// Returns an error if the group has fewer than two generators.
    pub fn new(params: GroupParameters, statement: Statement) -> Result<Self> {
        let h = params
            .generator_h()
            .cloned()
            .ok_or_else(|| Error::InvalidParams("Chaum-Pedersen needs two generators".to_string()))?;

        Ok(Self {
            params,
            h,
            statement,
            state: VerifierState::AwaitingCommitment,
        })
    }

    /// Returns the statement this verifier checks against.
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Returns where the interactive exchange currently stands.
    pub fn state(&self) -> ProtocolState {
        match self.state {
            VerifierState::AwaitingCommitment => ProtocolState::Uncommitted,
            VerifierState::Challenged { .. } => ProtocolState::Challenged,
        }
    }

    /// Returns the outstanding challenge, if any.
    pub fn challenge(&self) -> Option<&BigUint> {
        match &self.state {
            VerifierState::Challenged { challenge, .. } => Some(challenge),
            VerifierState::AwaitingCommitment => None,
        }
    }

    /// Interactive protocol: stores the commitment and answers with `c ∈ [1, p - 2]`.
    ///
    /// A commitment received while another challenge is outstanding replaces it.
    pub fn issue_challenge<R: RngCore + CryptoRng>(
        &mut self,
        commitment: Commitment,
        rng: &mut R,
    ) -> BigUint {
        let challenge = random_exponent_below(rng, self.params.p());
        self.state = VerifierState::Challenged {
            commitment,
            challenge: challenge.clone(),
        };
        challenge
    }

    /// Interactive protocol: checks the response against the stored commitment
    /// and challenge, consuming them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if no challenge is outstanding.
    pub fn check_response(&mut self, s: &BigUint) -> Result<bool> {
        match std::mem::replace(&mut self.state, VerifierState::AwaitingCommitment) {
            VerifierState::Challenged {
                commitment,
                challenge,
            } => Ok(self.verify_transcript(&commitment, &challenge, s)),
            VerifierState::AwaitingCommitment => Err(Error::InvalidState(
                "check_response called without an outstanding challenge".to_string(),
            )),
        }
    }

    /// Non-interactive protocol: recomputes the challenge from the commitment
    /// and rejects a mismatching one before checking the response.
    pub fn verify_non_interactive(&self, proof: &NonInteractiveProof) -> bool {
        let expected = fiat_shamir_challenge(&self.params, proof.commitment(), &self.statement);
        if expected != *proof.challenge() {
            tracing::debug!("challenge does not match commitment");
            return false;
        }

        self.verify_transcript(proof.commitment(), proof.challenge(), proof.response())
    }

    /// Checks `r1 ≡ g^s · y1^c` and `r2 ≡ h^s · y2^c (mod p)`.
    pub fn verify_transcript(&self, commitment: &Commitment, c: &BigUint, s: &BigUint) -> bool {
        let p = self.params.p();
        let g = self.params.generator_g();

        let rhs1 = (g.modpow(s, p) * self.statement.y1().modpow(c, p)) % p;
        let rhs2 = (self.h.modpow(s, p) * self.statement.y2().modpow(c, p)) % p;

        *commitment.r1() == rhs1 && *commitment.r2() == rhs2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChaumPedersenProver, KeyPair, SecureRng};

    fn debug_prover() -> ChaumPedersenProver {
        let params = GroupParameters::debug_group();
        let key_pair = KeyPair::from_secret(&params, BigUint::from(6u32)).unwrap();
        ChaumPedersenProver::with_key_pair(params, key_pair).unwrap()
    }

    #[test]
    fn small_number_transcript() {
        let params = GroupParameters::debug_group();
        let statement = Statement::new(BigUint::from(2u32), BigUint::from(3u32));
        let verifier = ChaumPedersenVerifier::new(params, statement).unwrap();

        // k = 7, c = 4, x = 6: s = 7 - 24 mod 11 = 5
        let commitment = Commitment::new(BigUint::from(8u32), BigUint::from(4u32));
        assert!(verifier.verify_transcript(
            &commitment,
            &BigUint::from(4u32),
            &BigUint::from(5u32)
        ));

        // response computed from a forged secret x = 7
        assert!(!verifier.verify_transcript(
            &commitment,
            &BigUint::from(4u32),
            &BigUint::from(1u32)
        ));
    }

    #[test]
    fn interactive_round_trip() {
        let mut rng = SecureRng::new();
        let mut prover = debug_prover();
        let mut verifier =
            ChaumPedersenVerifier::new(prover.params().clone(), prover.statement().clone())
                .unwrap();

        let commitment = prover.commit(&mut rng).unwrap();
        let c = verifier.issue_challenge(commitment, &mut rng);
        assert_eq!(verifier.state(), ProtocolState::Challenged);
        assert_eq!(verifier.challenge(), Some(&c));

        let s = prover.respond(&c).unwrap();
        assert!(verifier.check_response(&s).unwrap());
        assert_eq!(verifier.state(), ProtocolState::Uncommitted);
    }

    #[test]
    fn check_response_requires_challenge() {
        let params = GroupParameters::debug_group();
        let statement = Statement::new(BigUint::from(2u32), BigUint::from(3u32));
        let mut verifier = ChaumPedersenVerifier::new(params, statement).unwrap();

        let err = verifier.check_response(&BigUint::from(5u32)).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn challenge_is_consumed_by_check() {
        let mut rng = SecureRng::new();
        let mut prover = debug_prover();
        let mut verifier =
            ChaumPedersenVerifier::new(prover.params().clone(), prover.statement().clone())
                .unwrap();

        let commitment = prover.commit(&mut rng).unwrap();
        let c = verifier.issue_challenge(commitment, &mut rng);
        let s = prover.respond(&c).unwrap();

        assert!(verifier.check_response(&s).unwrap());
        assert!(verifier.check_response(&s).is_err());
    }

    #[test]
    fn rejects_single_generator_group() {
        let params = GroupParameters::new(
            BigUint::from(23u32),
            BigUint::from(11u32),
            vec![BigUint::from(4u32)],
        )
        .unwrap();
        let statement = Statement::new(BigUint::from(2u32), BigUint::from(3u32));
        assert!(ChaumPedersenVerifier::new(params, statement).is_err());
    }

    #[test]
    fn non_interactive_rejects_substituted_challenge() {
        let mut rng = SecureRng::new();
        let mut prover = ChaumPedersenProver::new(GroupParameters::default_group(), &mut rng)
            .unwrap();
        let verifier =
            ChaumPedersenVerifier::new(prover.params().clone(), prover.statement().clone())
                .unwrap();

        let proof = prover.prove_non_interactive(&mut rng).unwrap();
        assert!(verifier.verify_non_interactive(&proof));

        let forged = NonInteractiveProof::new(
            proof.commitment().clone(),
            proof.challenge() + 1u32,
            proof.response().clone(),
        );
        assert!(!verifier.verify_non_interactive(&forged));
    }
}
