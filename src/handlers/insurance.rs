//! Passenger policies, claims and withdrawals.
//!
//! Every mutation is signed by the passenger it acts for.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::auth::{Action, RequestAuthenticator, SignedAction};
use crate::contract::FlightSuretyContract;
use crate::error::{ApiError, ApiResult};
use crate::flight::Address;
use crate::models::{ApiResponse, BalanceView, BuyInsuranceRequest, ClaimRequest, PolicyView};

/// The signer becomes the insured passenger.
pub async fn buy_insurance(
    State(contract): State<Arc<FlightSuretyContract>>,
    State(auth): State<Arc<RequestAuthenticator>>,
    Json(request): Json<BuyInsuranceRequest>,
) -> ApiResult<PolicyView> {
    request.validate()?;
    let key = request.flight_ref().key();
    let passenger = auth
        .authenticate(
            Action::BuyInsurance,
            &request.auth,
            &[&key.to_string(), &request.premium.to_string()],
        )
        .await?;

    let policy = contract.buy_insurance(&passenger, &key, request.premium).await?;

    Ok(Json(ApiResponse::success(PolicyView::new(key, passenger, &policy))))
}

/// Credits the payout to the signer's balance.
pub async fn claim_insurance(
    State(contract): State<Arc<FlightSuretyContract>>,
    State(auth): State<Arc<RequestAuthenticator>>,
    Json(request): Json<ClaimRequest>,
) -> ApiResult<BalanceView> {
    request.validate()?;
    let key = request.flight_ref().key();
    let passenger = auth
        .authenticate(Action::Claim, &request.auth, &[&key.to_string()])
        .await?;

    contract.claim(&passenger, &key).await?;
    let amount = contract.balance_of(&passenger).await;

    Ok(Json(ApiResponse::success(BalanceView { passenger, amount })))
}

pub async fn passenger_balance(
    State(contract): State<Arc<FlightSuretyContract>>,
    Path(passenger): Path<String>,
) -> ApiResult<BalanceView> {
    let passenger = Address::new(passenger.to_lowercase());
    let amount = contract.balance_of(&passenger).await;

    Ok(Json(ApiResponse::success(BalanceView { passenger, amount })))
}

/// Pays out the whole balance; the response carries the amount withdrawn.
pub async fn withdraw(
    State(contract): State<Arc<FlightSuretyContract>>,
    State(auth): State<Arc<RequestAuthenticator>>,
    Path(passenger): Path<String>,
    request: Option<Json<SignedAction>>,
) -> ApiResult<BalanceView> {
    let signer = auth
        .authenticate_body(Action::Withdraw, request.as_deref())
        .await?;
    let passenger = Address::new(passenger.to_lowercase());
    if signer != passenger {
        return Err(ApiError::Unauthorized("Signer is not the passenger".to_string()));
    }

    let amount = contract.withdraw(&passenger).await?;

    Ok(Json(ApiResponse::success(BalanceView { passenger, amount })))
}
