//! Pseudo-random index assignment used to shard requests across oracles.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::flight::Address;

/// The indexes an oracle owns. Pairwise distinct, fixed for the oracle's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OracleIndexes(Vec<u8>);

impl OracleIndexes {
    pub fn contains(&self, index: u8) -> bool {
        self.0.contains(&index)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OracleIndexes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.0.iter().map(u8::to_string).collect();
        f.write_str(&joined.join(", "))
    }
}

/// Source of request and registration indexes.
///
/// The entropy plays the role of recent chain state: it is seeded once and
/// then folded with every transaction the contract executes, so a caller
/// cannot predict (or grind) the index it will be handed.
pub struct IndexAssigner {
    entropy: [u8; 32],
    nonce: u64,
    range: u8,
}

impl IndexAssigner {
    pub fn new(range: u8) -> Self {
        Self::from_seed(rand::random(), range)
    }

    pub fn from_seed(seed: [u8; 32], range: u8) -> Self {
        Self {
            entropy: seed,
            nonce: 0,
            range: range.max(1),
        }
    }

    pub fn range(&self) -> u8 {
        self.range
    }

    /// Folds transaction data into the entropy.
    pub fn absorb(&mut self, material: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(self.entropy);
        hasher.update(material);
        self.entropy = hasher.finalize().into();
    }

    /// One index in `[0, range)`.
    pub fn random_index(&mut self, account: &Address) -> u8 {
        let mut hasher = Sha256::new();
        hasher.update(self.entropy);
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(account.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        self.nonce = self.nonce.wrapping_add(1);

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(head) % u64::from(self.range)) as u8
    }

    /// `count` pairwise-distinct indexes for `account`.
    ///
    /// `count` must not exceed the range; configuration validation enforces it.
    pub fn assign(&mut self, account: &Address, count: usize) -> OracleIndexes {
        let count = count.min(usize::from(self.range));
        let mut indexes = Vec::with_capacity(count);

        while indexes.len() < count {
            let candidate = self.random_index(account);
            if !indexes.contains(&candidate) {
                indexes.push(candidate);
            }
        }

        OracleIndexes(indexes)
    }
}
