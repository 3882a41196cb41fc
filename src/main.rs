//! FlightSurety Oracle Server
//!
//! Hosts the contract core, launches the in-process oracle pool, registers
//! the mock flight board and serves the HTTP/WebSocket API.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flightsurety_oracle::app_state::AppState;
use flightsurety_oracle::auth::RequestAuthenticator;
use flightsurety_oracle::config::AppConfig;
use flightsurety_oracle::contract::{EventBus, FlightSuretyContract};
use flightsurety_oracle::identity::Identity;
use flightsurety_oracle::oracle::{NormalStatusPolicy, OraclePool, PolicyFactory, StatusPolicy};
use flightsurety_oracle::routes;
use flightsurety_oracle::services::{FlightBoard, FlightStatusService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let owner = match &config.contract_owner {
        Some(owner) => owner.clone(),
        None => {
            let throwaway = Identity::generate();
            warn!(
                owner = %throwaway.address(),
                "CONTRACT_OWNER is not set; using a throwaway owner key, pausing is unavailable"
            );
            throwaway.address().clone()
        }
    };

    let contract = Arc::new(FlightSuretyContract::new(
        owner.clone(),
        config.contract.clone(),
        EventBus::new(config.event_bus_capacity),
    ));

    // Mock flights passengers can insure
    let board = FlightBoard::generate(config.airline_count, config.flight_count, &mut rand::thread_rng());
    for flight in &board.flights {
        if let Err(e) = contract.register_flight(&flight.flight_ref()).await {
            warn!(flight = %flight.flight, error = %e, "could not register flight");
        }
    }
    info!(airlines = board.airlines.len(), flights = board.flights.len(), "flight board ready");

    let policy: PolicyFactory = Arc::new(|_| Box::new(NormalStatusPolicy::new()) as Box<dyn StatusPolicy>);
    let pool = OraclePool::launch(contract.clone(), config.oracle_count, policy).await;

    let status_service = FlightStatusService::new(contract.clone(), owner, config.status_fetch_timeout);
    let state = AppState::new(
        contract,
        status_service,
        Arc::new(board),
        RequestAuthenticator::new(config.signature_window),
    );

    let app = routes::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config.cors_allowed_origins));

    let addr = config.socket_addr();
    info!("Server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(false)
}
