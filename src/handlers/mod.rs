//! HTTP and WebSocket handlers for the FlightSurety API

pub mod events;
pub mod flight;
pub mod insurance;
pub mod operational;
pub mod oracle;

pub use events::*;
pub use flight::*;
pub use insurance::*;
pub use operational::*;
pub use oracle::*;

pub async fn root() -> &'static str {
    "FlightSurety Oracle Server"
}

pub async fn health_check() -> &'static str {
    "OK"
}
