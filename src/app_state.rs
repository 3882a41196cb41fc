//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::RequestAuthenticator;
use crate::contract::{EventBus, FlightSuretyContract};
use crate::services::{FlightBoard, FlightStatusService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub contract: Arc<FlightSuretyContract>,
    pub status_service: FlightStatusService,
    pub flight_board: Arc<FlightBoard>,
    pub authenticator: Arc<RequestAuthenticator>,
}

impl AppState {
    pub fn new(
        contract: Arc<FlightSuretyContract>,
        status_service: FlightStatusService,
        flight_board: Arc<FlightBoard>,
        authenticator: RequestAuthenticator,
    ) -> Self {
        Self {
            contract,
            status_service,
            flight_board,
            authenticator: Arc::new(authenticator),
        }
    }
}

impl FromRef<AppState> for Arc<FlightSuretyContract> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.contract.clone()
    }
}

impl FromRef<AppState> for FlightStatusService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.status_service.clone()
    }
}

impl FromRef<AppState> for Arc<FlightBoard> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.flight_board.clone()
    }
}

impl FromRef<AppState> for Arc<RequestAuthenticator> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.authenticator.clone()
    }
}

impl FromRef<AppState> for EventBus {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.contract.events().clone()
    }
}
