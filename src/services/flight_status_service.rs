//! Status fetches that wait for oracle consensus.

use std::sync::Arc;

use tokio::time::Duration;
use tracing::{info, warn};

use crate::contract::{ContractEvent, FlightStatusRecord, FlightSuretyContract};
use crate::error::ContractError;
use crate::flight::{Address, FlightRef};

/// Result of asking the oracles for a flight's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The ledger already had the status; no request was opened.
    AlreadyResolved(FlightStatusRecord),
    Resolved(FlightStatusRecord),
    /// No quorum within the timeout. The request stays open.
    TimedOut { request_index: u8 },
}

/// Triggers status requests and waits for oracle consensus.
#[derive(Clone)]
pub struct FlightStatusService {
    contract: Arc<FlightSuretyContract>,
    requester: Address,
    timeout: Duration,
}

impl FlightStatusService {
    pub fn new(contract: Arc<FlightSuretyContract>, requester: Address, timeout: Duration) -> Self {
        Self {
            contract,
            requester,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn fetch_status(&self, flight: &FlightRef) -> Result<FetchOutcome, ContractError> {
        let flight_key = flight.key();
        if let Some(record) = self.contract.flight_status(&flight_key).await {
            return Ok(FetchOutcome::AlreadyResolved(record));
        }

        // Subscribe before opening so a fast quorum cannot be missed
        let finalized = self.contract.events().once(move |event| {
            matches!(event, ContractEvent::FlightStatusInfo { flight_key: key, .. } if *key == flight_key)
        });

        let opened = match self.contract.fetch_flight_status(&self.requester, flight).await {
            Ok(opened) => opened,
            Err(ContractError::AlreadyResolved) => {
                return self
                    .contract
                    .flight_status(&flight_key)
                    .await
                    .map(FetchOutcome::AlreadyResolved)
                    .ok_or(ContractError::AlreadyResolved);
            }
            Err(e) => return Err(e),
        };

        let event = finalized.wait(self.timeout).await;

        // The ledger is authoritative; the event only tells us when to look
        match self.contract.flight_status(&flight_key).await {
            Some(record) => {
                info!(flight = %flight, status = %record.status, "flight status resolved");
                Ok(FetchOutcome::Resolved(record))
            }
            None => {
                if event.is_some() {
                    warn!(flight = %flight, "status event seen without a ledger record");
                }
                warn!(
                    flight = %flight,
                    index = opened.index,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "no oracle consensus before timeout"
                );
                Ok(FetchOutcome::TimedOut {
                    request_index: opened.index,
                })
            }
        }
    }

    pub async fn check_status(&self, flight: &FlightRef) -> Option<FlightStatusRecord> {
        self.contract.flight_status(&flight.key()).await
    }
}
