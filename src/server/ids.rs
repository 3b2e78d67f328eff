use std::collections::{HashMap, HashSet};

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::SecureRng;

/// A live key set that new identifiers must not collide with.
pub trait Namespace {
    /// Whether `id` is already taken.
    fn contains_id(&self, id: &str) -> bool;
}

impl<V> Namespace for HashMap<String, V> {
    fn contains_id(&self, id: &str) -> bool {
        self.contains_key(id)
    }
}

impl Namespace for HashSet<String> {
    fn contains_id(&self, id: &str) -> bool {
        self.contains(id)
    }
}

/// Allocates collision-free identifiers.
///
/// A candidate is the hex SHA-256 digest of a random 64-bit value; candidates
/// are redrawn while they collide with the namespace. The allocator only
/// checks: the caller inserts the identifier while still holding the lock it
/// checked under, so check and insert form one atomic region.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentifierAllocator;

impl IdentifierAllocator {
    /// Length of every identifier in hex characters.
    pub const ID_LEN: usize = 64;

    /// Returns an identifier absent from `namespace`.
    pub fn allocate<N: Namespace + ?Sized>(&self, namespace: &N) -> String {
        let mut rng = SecureRng::new();
        loop {
            let candidate = Self::digest(rng.next_u64());
            if !namespace.contains_id(&candidate) {
                return candidate;
            }
            tracing::debug!("identifier collision, redrawing");
        }
    }

    fn digest(seed: u64) -> String {
        hex::encode(Sha256::digest(seed.to_string().as_bytes()))
    }
}
