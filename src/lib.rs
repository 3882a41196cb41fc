//! FlightSurety oracle network
//!
//! An in-process rendition of the FlightSurety contract's oracle protocol:
//! registered oracles receive pseudo-random indexes, status requests are
//! announced per index, and the first status to collect a quorum of
//! matching responses is written to the flight status ledger, where the
//! insurance logic reads it. The crate also carries the HTTP/WebSocket API
//! and the oracle clients, both in-process and remote.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod contract;
pub mod error;
pub mod flight;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod oracle;
pub mod routes;
pub mod services;
