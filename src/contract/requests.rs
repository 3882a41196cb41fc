//! Open oracle requests, keyed by `(index, airline, flight, timestamp)`.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::consensus::ResponseTally;
use crate::flight::{Address, FlightKey, FlightRef, StatusCode};

/// Identifies one request: the chosen index plus the flight it is about.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey([u8; 32]);

impl RequestKey {
    pub fn derive(index: u8, flight_key: &FlightKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([index]);
        hasher.update(flight_key.as_bytes());
        RequestKey(hasher.finalize().into())
    }
}

impl fmt::Debug for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestKey(0x{})", hex::encode(self.0))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OracleRequest {
    pub id: Uuid,
    #[serde(skip)]
    pub key: RequestKey,
    pub index: u8,
    pub flight: FlightRef,
    pub flight_key: FlightKey,
    pub requester: Address,
    pub opened_at: DateTime<Utc>,
    pub tally: ResponseTally,
    pub resolution: Option<StatusCode>,
}

impl OracleRequest {
    pub fn is_open(&self) -> bool {
        self.resolution.is_none()
    }
}

/// Result of [`RequestTracker::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opened {
    New,
    /// An identical request was still open; its votes were kept.
    Existing,
}

#[derive(Default)]
pub struct RequestTracker {
    quorum: usize,
    requests: HashMap<RequestKey, OracleRequest>,
    by_flight: HashMap<FlightKey, Vec<RequestKey>>,
}

impl RequestTracker {
    pub fn new(quorum: usize) -> Self {
        Self {
            quorum,
            ..Self::default()
        }
    }

    /// Opens a request for `flight` at `index`.
    ///
    /// Re-opening an identical open request returns it untouched, so votes
    /// already cast are not lost. A closed request with the same key is
    /// replaced by a fresh one.
    pub fn open(&mut self, index: u8, flight: &FlightRef, requester: &Address) -> (&OracleRequest, Opened) {
        let flight_key = flight.key();
        let key = RequestKey::derive(index, &flight_key);

        let reusable = self.requests.get(&key).map(OracleRequest::is_open).unwrap_or(false);
        if reusable {
            return (&self.requests[&key], Opened::Existing);
        }

        let request = OracleRequest {
            id: Uuid::new_v4(),
            key,
            index,
            flight: flight.clone(),
            flight_key,
            requester: requester.clone(),
            opened_at: Utc::now(),
            tally: ResponseTally::new(self.quorum),
            resolution: None,
        };

        let keys = self.by_flight.entry(flight_key).or_default();
        if !keys.contains(&key) {
            keys.push(key);
        }
        self.requests.insert(key, request);

        (&self.requests[&key], Opened::New)
    }

    pub fn get(&self, key: &RequestKey) -> Option<&OracleRequest> {
        self.requests.get(key)
    }

    pub fn get_mut(&mut self, key: &RequestKey) -> Option<&mut OracleRequest> {
        self.requests.get_mut(key)
    }

    /// Marks every request for the flight as resolved with `status`.
    pub fn close_flight(&mut self, flight_key: &FlightKey, status: StatusCode) -> usize {
        let Some(keys) = self.by_flight.get(flight_key) else {
            return 0;
        };

        let mut closed = 0;
        for key in keys {
            if let Some(request) = self.requests.get_mut(key) {
                if request.is_open() {
                    request.resolution = Some(status);
                    closed += 1;
                }
            }
        }
        closed
    }

    /// Every request ever opened for the flight, open or resolved.
    pub fn requests_for(&self, flight_key: &FlightKey) -> Vec<&OracleRequest> {
        self.by_flight
            .get(flight_key)
            .map(|keys| keys.iter().filter_map(|key| self.requests.get(key)).collect())
            .unwrap_or_default()
    }

    pub fn open_count(&self) -> usize {
        self.requests.values().filter(|request| request.is_open()).count()
    }
}
