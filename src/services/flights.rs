//! Mock airlines and flights offered to passengers.

use std::collections::HashSet;

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::flight::{Address, FlightKey, FlightRef};

const MAX_FLIGHT_NUMBER: u16 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Airline {
    pub designator: String,
    pub address: Address,
}

impl Airline {
    pub fn new(designator: impl Into<String>) -> Self {
        let designator = designator.into();
        let digest = Sha256::digest(designator.as_bytes());
        let address = Address::new(format!("0x{}", hex::encode(&digest[..20])));
        Self { designator, address }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flight {
    pub designator: String,
    pub airline: Address,
    /// Designator followed by the flight number, e.g. `ND1309`.
    pub flight: String,
    pub timestamp: u64,
    pub flight_key: FlightKey,
}

impl Flight {
    pub fn flight_ref(&self) -> FlightRef {
        FlightRef::new(self.airline.clone(), self.flight.clone(), self.timestamp)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FlightBoard {
    pub airlines: Vec<Airline>,
    pub flights: Vec<Flight>,
}

impl FlightBoard {
    /// Random airlines with unique two-letter designators and flights with
    /// unique numbers, all departing now.
    pub fn generate(airline_count: usize, flight_count: usize, rng: &mut impl Rng) -> Self {
        let airline_count = airline_count.min(26 * 26);
        let flight_count = flight_count.min(usize::from(MAX_FLIGHT_NUMBER));

        let mut designators = HashSet::new();
        let mut airlines = Vec::with_capacity(airline_count);
        while airlines.len() < airline_count {
            let designator: String = (0..2).map(|_| rng.gen_range(b'A'..=b'Z') as char).collect();
            if designators.insert(designator.clone()) {
                airlines.push(Airline::new(designator));
            }
        }

        if airlines.is_empty() {
            return Self::default();
        }

        let timestamp = Utc::now().timestamp().max(0) as u64;
        let mut numbers = HashSet::new();
        let mut flights = Vec::with_capacity(flight_count);
        while flights.len() < flight_count {
            let number = rng.gen_range(1..=MAX_FLIGHT_NUMBER);
            if !numbers.insert(number) {
                continue;
            }

            let airline = &airlines[rng.gen_range(0..airlines.len())];
            let flight = format!("{}{}", airline.designator, number);
            flights.push(Flight {
                designator: airline.designator.clone(),
                airline: airline.address.clone(),
                flight_key: FlightKey::derive(&airline.address, &flight, timestamp),
                flight,
                timestamp,
            });
        }

        Self { airlines, flights }
    }

    pub fn find(&self, flight: &str) -> Option<&Flight> {
        self.flights.iter().find(|candidate| candidate.flight == flight)
    }
}
