//! Common test utilities shared across integration tests.

use num_bigint::BigUint;
use zkp_auth::{ChaumPedersenProver, GroupParameters, KeyPair};

/// Initialize test tracing (call once at the beginning of tests).
///
/// Subsequent calls are safe and will be ignored.
#[allow(dead_code)]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new("zkp_auth=debug");

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

/// Prover over the tiny debug group with a fixed secret.
#[allow(dead_code)]
pub fn debug_prover(x: u32) -> ChaumPedersenProver {
    let params = GroupParameters::debug_group();
    let key_pair = KeyPair::from_secret(&params, BigUint::from(x)).unwrap();
    ChaumPedersenProver::with_key_pair(params, key_pair).unwrap()
}

/// `(v - 1) mod m`, without underflow at zero.
#[allow(dead_code)]
pub fn decrement(v: &BigUint, m: &BigUint) -> BigUint {
    (v + m - 1u32) % m
}
