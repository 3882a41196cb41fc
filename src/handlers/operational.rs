//! Operational status and the pauser role.

use std::sync::Arc;

use axum::{extract::State, Json};
use validator::Validate;

use crate::auth::{Action, RequestAuthenticator, SignedAction};
use crate::contract::FlightSuretyContract;
use crate::error::ApiResult;
use crate::flight::Address;
use crate::models::{AddPauserRequest, ApiResponse, OperationalView, PausersView};

pub async fn operational_status(State(contract): State<Arc<FlightSuretyContract>>) -> ApiResult<OperationalView> {
    Ok(Json(ApiResponse::success(OperationalView {
        operational: contract.is_operational().await,
    })))
}

pub async fn pause(
    State(contract): State<Arc<FlightSuretyContract>>,
    State(auth): State<Arc<RequestAuthenticator>>,
    request: Option<Json<SignedAction>>,
) -> ApiResult<OperationalView> {
    let caller = auth
        .authenticate_body(Action::Pause, request.as_deref())
        .await?;
    contract.pause(&caller).await?;

    Ok(Json(ApiResponse::success(OperationalView { operational: false })))
}

pub async fn unpause(
    State(contract): State<Arc<FlightSuretyContract>>,
    State(auth): State<Arc<RequestAuthenticator>>,
    request: Option<Json<SignedAction>>,
) -> ApiResult<OperationalView> {
    let caller = auth
        .authenticate_body(Action::Unpause, request.as_deref())
        .await?;
    contract.unpause(&caller).await?;

    Ok(Json(ApiResponse::success(OperationalView { operational: true })))
}

pub async fn list_pausers(State(contract): State<Arc<FlightSuretyContract>>) -> ApiResult<PausersView> {
    Ok(Json(ApiResponse::success(PausersView {
        pausers: contract.pausers().await,
    })))
}

pub async fn add_pauser(
    State(contract): State<Arc<FlightSuretyContract>>,
    State(auth): State<Arc<RequestAuthenticator>>,
    Json(request): Json<AddPauserRequest>,
) -> ApiResult<PausersView> {
    request.validate()?;
    let account = Address::new(request.account.to_lowercase());
    let caller = auth
        .authenticate(Action::AddPauser, &request.auth, &[account.as_str()])
        .await?;

    contract.add_pauser(&caller, &account).await?;

    Ok(Json(ApiResponse::success(PausersView {
        pausers: contract.pausers().await,
    })))
}

/// Drops the signer's own pauser role.
pub async fn renounce_pauser(
    State(contract): State<Arc<FlightSuretyContract>>,
    State(auth): State<Arc<RequestAuthenticator>>,
    request: Option<Json<SignedAction>>,
) -> ApiResult<PausersView> {
    let caller = auth
        .authenticate_body(Action::RenouncePauser, request.as_deref())
        .await?;
    contract.renounce_pauser(&caller).await?;

    Ok(Json(ApiResponse::success(PausersView {
        pausers: contract.pausers().await,
    })))
}
