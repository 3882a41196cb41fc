//! Finalized flight statuses. Written once per flight key.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ContractError;
use crate::flight::{FlightKey, FlightRef, StatusCode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightStatusRecord {
    pub flight_key: FlightKey,
    pub flight: FlightRef,
    pub status: StatusCode,
    /// Index of the request whose quorum finalized the flight.
    pub request_index: u8,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct FlightStatusLedger {
    records: HashMap<FlightKey, FlightStatusRecord>,
}

impl FlightStatusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the record. A second write for the same flight is rejected.
    pub fn finalize(&mut self, record: FlightStatusRecord) -> Result<&FlightStatusRecord, ContractError> {
        if self.records.contains_key(&record.flight_key) {
            return Err(ContractError::AlreadyResolved);
        }

        let key = record.flight_key;
        Ok(self.records.entry(key).or_insert(record))
    }

    pub fn is_resolved(&self, key: &FlightKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn record(&self, key: &FlightKey) -> Option<&FlightStatusRecord> {
        self.records.get(key)
    }

    /// Status as the claims logic sees it: `Unknown` until finalized.
    pub fn status(&self, key: &FlightKey) -> StatusCode {
        self.records
            .get(key)
            .map(|record| record.status)
            .unwrap_or(StatusCode::Unknown)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
