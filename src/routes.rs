//! Route definitions for the FlightSurety API

use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::*;

// Flight board and status routes
pub fn flight_routes() -> Router<AppState> {
    Router::new()
        .route("/api/flights", get(list_flights))
        .route(
            "/api/flights/status",
            post(fetch_flight_status).get(check_flight_status),
        )
}

// Oracle registration and response routes
pub fn oracle_routes() -> Router<AppState> {
    Router::new()
        .route("/api/oracles", post(register_oracle))
        .route("/api/oracles/fee", get(registration_fee))
        .route("/api/oracles/:address/indexes", get(oracle_indexes))
        .route("/api/oracles/responses", post(submit_response))
}

// Insurance and passenger balance routes
pub fn insurance_routes() -> Router<AppState> {
    Router::new()
        .route("/api/insurance", post(buy_insurance))
        .route("/api/insurance/claim", post(claim_insurance))
        .route("/api/passengers/:address/balance", get(passenger_balance))
        .route("/api/passengers/:address/withdraw", post(withdraw))
}

// Operational status and pauser routes
pub fn operational_routes() -> Router<AppState> {
    Router::new()
        .route("/api/operational", get(operational_status))
        .route("/api/operational/pause", post(pause))
        .route("/api/operational/unpause", post(unpause))
        .route("/api/operational/pausers", get(list_pausers).post(add_pauser))
        .route("/api/operational/pausers/renounce", post(renounce_pauser))
}

// Contract event stream
pub fn event_routes() -> Router<AppState> {
    Router::new().route("/ws/events", get(event_socket))
}

/// Every route, bound to `state`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(flight_routes())
        .merge(oracle_routes())
        .merge(insurance_routes())
        .merge(operational_routes())
        .merge(event_routes())
        .with_state(state)
}
