//! Flight identity, addresses and the canonical status codes.
//!
//! Every component that needs to refer to a flight (registration, insurance
//! purchase, status requests and the status ledger) goes through
//! [`FlightRef::key`], so lookups always agree on the same bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::ContractError;

/// Smallest currency unit (wei).
pub type Wei = u128;

pub const ONE_ETHER: Wei = 1_000_000_000_000_000_000;

/// Serializes [`Wei`] as a decimal string; accepts a string or a plain number.
pub mod wei_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::Wei;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(value: &Wei, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Wei, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.trim().parse().map_err(de::Error::custom),
            Raw::Number(number) => Ok(Wei::from(number)),
        }
    }
}

/// Account identity of an oracle, airline, passenger or operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Flight status as reported by oracles.
///
/// Only [`StatusCode::LateAirline`] makes a policy claimable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum StatusCode {
    Unknown = 0,
    OnTime = 10,
    LateAirline = 20,
    LateWeather = 30,
    LateTechnical = 40,
    LateOther = 50,
}

impl StatusCode {
    pub const ALL: [StatusCode; 6] = [
        StatusCode::Unknown,
        StatusCode::OnTime,
        StatusCode::LateAirline,
        StatusCode::LateWeather,
        StatusCode::LateTechnical,
        StatusCode::LateOther,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusCode::Unknown => "Unknown",
            StatusCode::OnTime => "On Time",
            StatusCode::LateAirline => "Late: Airline",
            StatusCode::LateWeather => "Late: Weather",
            StatusCode::LateTechnical => "Late: Technical",
            StatusCode::LateOther => "Late: Other",
        }
    }

    pub fn is_claimable(self) -> bool {
        self == StatusCode::LateAirline
    }
}

impl TryFrom<u8> for StatusCode {
    type Error = ContractError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        StatusCode::ALL
            .into_iter()
            .find(|status| status.code() == value)
            .ok_or(ContractError::InvalidStatusCode(value))
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> Self {
        status.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

/// Deterministic identifier of a flight instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlightKey([u8; 32]);

impl FlightKey {
    /// Hashes `(airline, flight, timestamp)`.
    ///
    /// Variable-length fields are length-prefixed so that distinct triples
    /// never share a preimage (`"AB" + "C1"` vs `"A" + "BC1"`).
    pub fn derive(airline: &Address, flight: &str, timestamp: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((airline.as_bytes().len() as u32).to_be_bytes());
        hasher.update(airline.as_bytes());
        hasher.update((flight.len() as u32).to_be_bytes());
        hasher.update(flight.as_bytes());
        hasher.update(timestamp.to_be_bytes());
        FlightKey(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for FlightKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlightKey({})", self)
    }
}

impl FromStr for FlightKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.strip_prefix("0x").unwrap_or(value);
        let bytes = hex::decode(trimmed).map_err(|e| format!("Invalid flight key hex: {}", e))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| "Flight key must be 32 bytes".to_string())?;
        Ok(FlightKey(bytes))
    }
}

impl Serialize for FlightKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FlightKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The `(airline, flight, timestamp)` triple a request is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlightRef {
    pub airline: Address,
    pub flight: String,
    pub timestamp: u64,
}

impl FlightRef {
    pub fn new(airline: impl Into<Address>, flight: impl Into<String>, timestamp: u64) -> Self {
        Self {
            airline: airline.into(),
            flight: flight.into(),
            timestamp,
        }
    }

    pub fn key(&self) -> FlightKey {
        FlightKey::derive(&self.airline, &self.flight, self.timestamp)
    }
}

impl fmt::Display for FlightRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.flight, self.timestamp, self.airline)
    }
}
