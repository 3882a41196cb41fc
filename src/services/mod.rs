//! Business logic services for FlightSurety

pub mod flight_status_service;
pub mod flights;

pub use flight_status_service::{FetchOutcome, FlightStatusService};
pub use flights::{Airline, Flight, FlightBoard};
