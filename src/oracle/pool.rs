//! Supervised set of oracle clients.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use super::client::{ListenSummary, OracleClient};
use super::gateway::{LocalGateway, OracleGateway};
use super::status::StatusPolicy;
use crate::contract::{EventStream, FlightSuretyContract};
use crate::flight::Address;

const ORACLE_SUPERVISOR_MAX_BACKOFF_SECONDS: u64 = 30;

/// Builds the status policy for the oracle in the given slot.
pub type PolicyFactory = Arc<dyn Fn(usize) -> Box<dyn StatusPolicy> + Send + Sync>;

pub struct OraclePool {
    addresses: Vec<Address>,
    supervisors: Vec<JoinHandle<()>>,
}

impl OraclePool {
    /// Registers `count` in-process oracles against `contract` and starts them.
    pub async fn launch(contract: Arc<FlightSuretyContract>, count: usize, policy: PolicyFactory) -> Self {
        let gateways = (1..=count)
            .map(|n| {
                let address = Address::new(format!("oracle-{:02}", n));
                Arc::new(LocalGateway::new(contract.clone(), address)) as Arc<dyn OracleGateway>
            })
            .collect();

        Self::launch_with(gateways, policy).await
    }

    /// Registers each gateway's oracle in order, then supervises its listener.
    ///
    /// Every started oracle is subscribed by the time this returns. Oracles
    /// that fail to register are logged and left out.
    pub async fn launch_with(gateways: Vec<Arc<dyn OracleGateway>>, policy: PolicyFactory) -> Self {
        let mut addresses = Vec::new();
        let mut supervisors = Vec::new();

        for (slot, gateway) in gateways.into_iter().enumerate() {
            let mut client = OracleClient::new(gateway.clone(), policy(slot));
            let events = match client.connect().await {
                Ok(events) => events,
                Err(e) => {
                    error!(oracle = %gateway.address(), error = %e, "oracle failed to start");
                    continue;
                }
            };

            addresses.push(gateway.address().clone());
            supervisors.push(tokio::spawn(supervise(
                gateway,
                policy.clone(),
                slot,
                (client, events),
            )));
        }

        info!(oracles = addresses.len(), "oracle pool started");
        Self {
            addresses,
            supervisors,
        }
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Stops every oracle. Listeners die with their supervisors.
    pub fn shutdown(self) {
        for supervisor in self.supervisors {
            supervisor.abort();
        }
        info!("oracle pool stopped");
    }
}

/// Aborts the listener when the supervisor itself is dropped or aborted.
struct ListenerTask(JoinHandle<ListenSummary>);

impl Drop for ListenerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn supervise(
    gateway: Arc<dyn OracleGateway>,
    policy: PolicyFactory,
    slot: usize,
    first: (OracleClient, EventStream),
) {
    let mut restart_count: u32 = 0;
    let mut ready = Some(first);

    loop {
        let started = match ready.take() {
            Some(started) => Some(started),
            None => {
                let mut client = OracleClient::new(gateway.clone(), policy(slot));
                match client.connect().await {
                    Ok(events) => Some((client, events)),
                    Err(e) => {
                        warn!(oracle = %gateway.address(), error = %e, "oracle reconnect failed");
                        None
                    }
                }
            }
        };

        if let Some((mut client, events)) = started {
            let mut task = ListenerTask(tokio::spawn(async move { client.listen(events).await }));

            match (&mut task.0).await {
                Ok(summary) => {
                    info!(
                        oracle = %gateway.address(),
                        submitted = summary.submitted,
                        rejected = summary.rejected,
                        failed = summary.failed,
                        "event stream ended; resubscribing"
                    );
                    restart_count = 0;
                }
                Err(join_error) if join_error.is_panic() => {
                    error!(oracle = %gateway.address(), "oracle listener panicked; restarting");
                }
                Err(join_error) => {
                    error!(oracle = %gateway.address(), error = %join_error, "oracle listener failed; restarting");
                }
            }
        }

        restart_count = restart_count.saturating_add(1);
        let backoff_seconds =
            (2u64.saturating_pow(restart_count.min(5))).min(ORACLE_SUPERVISOR_MAX_BACKOFF_SECONDS);
        warn!(oracle = %gateway.address(), restart_count, backoff_seconds, "oracle restart backoff");
        sleep(Duration::from_secs(backoff_seconds)).await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::contract::{ContractParams, EventBus, IndexAssigner};
    use crate::flight::{StatusCode, ONE_ETHER};
    use crate::oracle::status::FixedStatusPolicy;

    fn fixed(status: StatusCode) -> PolicyFactory {
        Arc::new(move |_| Box::new(FixedStatusPolicy(status)) as Box<dyn StatusPolicy>)
    }

    #[tokio::test]
    async fn test_launch_registers_every_oracle() {
        let contract = Arc::new(FlightSuretyContract::with_assigner(
            Address::new("owner"),
            ContractParams::default(),
            EventBus::new(256),
            IndexAssigner::from_seed([3; 32], 10),
        ));

        let pool = OraclePool::launch(contract.clone(), 5, fixed(StatusCode::OnTime)).await;

        assert_eq!(pool.len(), 5);
        assert_eq!(contract.oracle_count().await, 5);
        assert_eq!(contract.collected_fees().await, 5 * ONE_ETHER);
        assert_eq!(contract.events().subscriber_count(), 5);
        for address in pool.addresses() {
            assert_eq!(contract.oracle_indexes(address).await.unwrap().len(), 3);
        }

        pool.shutdown();
    }

    #[tokio::test]
    async fn test_paused_contract_starts_no_oracles() {
        let contract = Arc::new(FlightSuretyContract::new(
            Address::new("owner"),
            ContractParams::default(),
            EventBus::new(16),
        ));
        contract.pause(&Address::new("owner")).await.unwrap();

        let pool = OraclePool::launch(contract.clone(), 3, fixed(StatusCode::OnTime)).await;

        assert!(pool.is_empty());
        assert_eq!(contract.oracle_count().await, 0);
    }
}
