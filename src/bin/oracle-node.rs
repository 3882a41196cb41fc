//! Standalone oracle node
//!
//! Registers one oracle with a running server over HTTP and answers the
//! requests for its indexes from the `/ws/events` stream.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flightsurety_oracle::flight::StatusCode;
use flightsurety_oracle::identity::Identity;
use flightsurety_oracle::oracle::{
    FixedStatusPolicy, HttpGateway, NormalStatusPolicy, OracleGateway, OraclePool,
    PolicyFactory, StatusPolicy,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let server_url = std::env::var("SERVER_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());

    let identity = match std::env::var("ORACLE_SECRET_KEY") {
        Ok(secret) if !secret.trim().is_empty() => {
            Identity::from_secret_hex(&secret).context("invalid ORACLE_SECRET_KEY")?
        }
        _ => {
            let identity = Identity::generate();
            warn!("ORACLE_SECRET_KEY not set; using a fresh key for this run");
            identity
        }
    };

    let policy: PolicyFactory = match std::env::var("ORACLE_STATUS") {
        Ok(code) if !code.trim().is_empty() => {
            let code: u8 = code.trim().parse().context("ORACLE_STATUS must be a status code")?;
            let status = StatusCode::try_from(code).map_err(|e| anyhow!(e))?;
            info!(status = %status, "reporting a fixed status");
            Arc::new(move |_| Box::new(FixedStatusPolicy(status)) as Box<dyn StatusPolicy>)
        }
        _ => Arc::new(|_| Box::new(NormalStatusPolicy::new()) as Box<dyn StatusPolicy>),
    };

    info!(oracle = %identity.address(), server = %server_url, "oracle node starting");
    let gateway: Arc<dyn OracleGateway> = Arc::new(HttpGateway::new(server_url, identity));
    let pool = OraclePool::launch_with(vec![gateway], policy).await;
    if pool.is_empty() {
        return Err(anyhow!("oracle could not register with the server"));
    }

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    pool.shutdown();
    Ok(())
}
