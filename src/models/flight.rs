//! Flight, insurance and operator bodies.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::SignedAction;
use crate::contract::{FlightStatusRecord, Policy};
use crate::flight::{wei_string, Address, FlightKey, FlightRef, StatusCode, Wei};

/// Identifies a flight in request bodies and query strings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FlightQuery {
    #[validate(length(min = 1))]
    pub airline: String,
    #[validate(length(min = 1))]
    pub flight: String,
    pub timestamp: u64,
}

impl FlightQuery {
    pub fn flight_ref(&self) -> FlightRef {
        FlightRef::new(self.airline.as_str(), self.flight.as_str(), self.timestamp)
    }
}

impl From<&FlightRef> for FlightQuery {
    fn from(flight: &FlightRef) -> Self {
        Self {
            airline: flight.airline.to_string(),
            flight: flight.flight.clone(),
            timestamp: flight.timestamp,
        }
    }
}

/// Current knowledge about a flight's status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightStatusView {
    pub flight_key: FlightKey,
    pub resolved: bool,
    pub status: StatusCode,
    pub label: String,
    pub record: Option<FlightStatusRecord>,
}

impl FlightStatusView {
    pub fn new(flight_key: FlightKey, record: Option<FlightStatusRecord>) -> Self {
        let status = record
            .as_ref()
            .map(|record| record.status)
            .unwrap_or(StatusCode::Unknown);

        Self {
            flight_key,
            resolved: record.is_some(),
            status,
            label: status.label().to_string(),
            record,
        }
    }
}

/// Signed by the passenger over the flight key and the premium.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BuyInsuranceRequest {
    #[validate(length(min = 1))]
    pub airline: String,
    #[validate(length(min = 1))]
    pub flight: String,
    pub timestamp: u64,
    #[serde(with = "wei_string")]
    pub premium: Wei,
    pub auth: SignedAction,
}

impl BuyInsuranceRequest {
    pub fn flight_ref(&self) -> FlightRef {
        FlightRef::new(self.airline.as_str(), self.flight.as_str(), self.timestamp)
    }
}

/// Signed by the passenger over the flight key.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClaimRequest {
    #[validate(length(min = 1))]
    pub airline: String,
    #[validate(length(min = 1))]
    pub flight: String,
    pub timestamp: u64,
    pub auth: SignedAction,
}

impl ClaimRequest {
    pub fn flight_ref(&self) -> FlightRef {
        FlightRef::new(self.airline.as_str(), self.flight.as_str(), self.timestamp)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyView {
    pub flight_key: FlightKey,
    pub passenger: Address,
    #[serde(with = "wei_string")]
    pub premium: Wei,
    #[serde(with = "wei_string")]
    pub payout: Wei,
    pub paid: bool,
}

impl PolicyView {
    pub fn new(flight_key: FlightKey, passenger: Address, policy: &Policy) -> Self {
        Self {
            flight_key,
            passenger,
            premium: policy.premium,
            payout: policy.payout(),
            paid: policy.paid,
        }
    }
}

/// Balance after a credit, a query or a withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceView {
    pub passenger: Address,
    #[serde(with = "wei_string")]
    pub amount: Wei,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationalView {
    pub operational: bool,
}

/// Signed by an existing pauser over the new account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddPauserRequest {
    #[validate(length(equal = 64))]
    pub account: String,
    pub auth: SignedAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PausersView {
    pub pausers: Vec<Address>,
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_status_view_defaults_to_unknown() {
        let flight = FlightRef::new("0xairline", "ND1309", 100);
        let pending = FlightStatusView::new(flight.key(), None);

        assert!(!pending.resolved);
        assert_eq!(pending.status, StatusCode::Unknown);

        let resolved = FlightStatusView::new(
            flight.key(),
            Some(FlightStatusRecord {
                flight_key: flight.key(),
                flight,
                status: StatusCode::LateWeather,
                request_index: 1,
                resolved_at: Utc::now(),
            }),
        );
        assert!(resolved.resolved);
        assert_eq!(resolved.label, "Late: Weather");
    }

    #[test]
    fn test_flight_query_validation() {
        let query = FlightQuery {
            airline: String::new(),
            flight: "ND1309".to_string(),
            timestamp: 1,
        };
        assert!(query.validate().is_err());
    }
}
