//! Vote counting for a single oracle request.
//!
//! A request finalizes on the first status code whose set of distinct voters
//! reaches the quorum. The tally itself never un-finalizes; the contract
//! stops feeding it votes once the flight status is written.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::flight::{Address, StatusCode};

/// Result of recording one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    /// The oracle already answered this request; nothing changed.
    Duplicate,
    Counted { status: StatusCode, responses: usize },
    /// This vote brought `status` to the quorum.
    QuorumReached { status: StatusCode, responses: usize },
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseTally {
    quorum: usize,
    votes: BTreeMap<StatusCode, Vec<Address>>,
}

impl ResponseTally {
    pub fn new(quorum: usize) -> Self {
        Self {
            quorum: quorum.max(1),
            votes: BTreeMap::new(),
        }
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn has_voted(&self, oracle: &Address) -> bool {
        self.votes.values().any(|voters| voters.contains(oracle))
    }

    /// Records `oracle`'s answer. Each oracle gets one vote per request.
    pub fn record(&mut self, oracle: &Address, status: StatusCode) -> Vote {
        if self.has_voted(oracle) {
            return Vote::Duplicate;
        }

        let voters = self.votes.entry(status).or_default();
        voters.push(oracle.clone());
        let responses = voters.len();

        if responses == self.quorum {
            Vote::QuorumReached { status, responses }
        } else {
            Vote::Counted { status, responses }
        }
    }

    pub fn responses_for(&self, status: StatusCode) -> usize {
        self.votes.get(&status).map(Vec::len).unwrap_or(0)
    }

    pub fn voters_for(&self, status: StatusCode) -> &[Address] {
        self.votes.get(&status).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_responses(&self) -> usize {
        self.votes.values().map(Vec::len).sum()
    }
}
