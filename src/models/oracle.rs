//! Oracle registration and response bodies.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::contract::{OracleIndexes, OracleResponse};
use crate::error::ContractError;
use crate::flight::{wei_string, Address, FlightRef, StatusCode, Wei};

#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrationFee {
    #[serde(with = "wei_string")]
    pub fee: Wei,
}

/// Signed oracle registration. `address` is the hex ed25519 public key.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterOracleRequest {
    #[validate(length(equal = 64))]
    pub address: String,
    #[serde(with = "wei_string")]
    pub fee: Wei,
    #[validate(length(equal = 128))]
    pub signature: String, // hex, over `register:{address}:{fee}`
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRegistration {
    pub address: Address,
    pub indexes: OracleIndexes,
}

/// Signed oracle response.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitResponseRequest {
    #[validate(length(equal = 64))]
    pub address: String,
    pub index: u8,
    #[validate(length(min = 1))]
    pub airline: String,
    #[validate(length(min = 1))]
    pub flight: String,
    pub timestamp: u64,
    pub status: u8,
    #[validate(length(equal = 128))]
    pub signature: String, // hex, over `respond:{index}:{flight_key}:{status}`
}

impl SubmitResponseRequest {
    pub fn new(address: &Address, response: &OracleResponse, signature: String) -> Self {
        Self {
            address: address.to_string(),
            index: response.index,
            airline: response.flight.airline.to_string(),
            flight: response.flight.flight.clone(),
            timestamp: response.flight.timestamp,
            status: response.status.code(),
            signature,
        }
    }

    pub fn response(&self) -> Result<OracleResponse, ContractError> {
        Ok(OracleResponse {
            index: self.index,
            flight: FlightRef::new(self.airline.as_str(), self.flight.as_str(), self.timestamp),
            status: StatusCode::try_from(self.status)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn request(status: u8) -> SubmitResponseRequest {
        SubmitResponseRequest {
            address: "a".repeat(64),
            index: 2,
            airline: "0xairline".to_string(),
            flight: "ND1309".to_string(),
            timestamp: 100,
            status,
            signature: "b".repeat(128),
        }
    }

    #[test]
    fn test_submit_request_validation() {
        assert!(request(20).validate().is_ok());

        let mut short = request(20);
        short.signature = "abcd".to_string();
        assert!(short.validate().is_err());

        let mut empty = request(20);
        empty.flight = String::new();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_submit_request_status_conversion() {
        let response = request(20).response().unwrap();
        assert_eq!(response.status, StatusCode::LateAirline);
        assert_eq!(response.flight, FlightRef::new("0xairline", "ND1309", 100));

        assert_eq!(request(21).response(), Err(ContractError::InvalidStatusCode(21)));
    }

    #[test]
    fn test_registration_fee_accepts_number_or_string() {
        let text: RegisterOracleRequest = serde_json::from_str(
            r#"{"address":"aa","fee":"1000000000000000000","signature":"bb"}"#,
        )
        .unwrap();
        let number: RegisterOracleRequest =
            serde_json::from_str(r#"{"address":"aa","fee":5,"signature":"bb"}"#).unwrap();

        assert_eq!(text.fee, 1_000_000_000_000_000_000);
        assert_eq!(number.fee, 5);
    }
}
