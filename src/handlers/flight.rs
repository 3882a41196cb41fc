//! Flight board and status fetch handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{ApiResponse, FlightQuery, FlightStatusView};
use crate::services::{FetchOutcome, FlightBoard, FlightStatusService};

pub async fn list_flights(State(board): State<Arc<FlightBoard>>) -> ApiResult<FlightBoard> {
    Ok(Json(ApiResponse::success(board.as_ref().clone())))
}

/// Asks the oracles for a status and waits for consensus.
pub async fn fetch_flight_status(
    State(service): State<FlightStatusService>,
    Json(request): Json<FlightQuery>,
) -> ApiResult<FlightStatusView> {
    request.validate()?;
    let flight = request.flight_ref();

    match service.fetch_status(&flight).await? {
        FetchOutcome::AlreadyResolved(record) | FetchOutcome::Resolved(record) => Ok(Json(
            ApiResponse::success(FlightStatusView::new(record.flight_key, Some(record))),
        )),
        FetchOutcome::TimedOut { request_index } => Err(ApiError::ConsensusTimeout { request_index }),
    }
}

pub async fn check_flight_status(
    State(service): State<FlightStatusService>,
    Query(query): Query<FlightQuery>,
) -> ApiResult<FlightStatusView> {
    query.validate()?;
    let flight = query.flight_ref();
    let record = service.check_status(&flight).await;

    Ok(Json(ApiResponse::success(FlightStatusView::new(flight.key(), record))))
}
