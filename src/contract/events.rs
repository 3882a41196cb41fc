//! Contract events and the in-process bus that carries them.

use std::time::Duration;

use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

use super::indexes::OracleIndexes;
use crate::flight::{wei_string, Address, FlightKey, StatusCode, Wei};

/// Everything the contract announces. Serialized with an `event` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ContractEvent {
    OracleRegistered {
        oracle: Address,
        indexes: OracleIndexes,
    },
    /// Oracles owning `index` are expected to answer.
    OracleRequest {
        index: u8,
        airline: Address,
        flight: String,
        timestamp: u64,
    },
    /// One counted oracle response.
    OracleReport {
        airline: Address,
        flight: String,
        timestamp: u64,
        status: StatusCode,
    },
    /// Emitted once per flight when its status is finalized.
    FlightStatusInfo {
        airline: Address,
        flight: String,
        timestamp: u64,
        status: StatusCode,
        flight_key: FlightKey,
    },
    FlightRegistered {
        flight_key: FlightKey,
        airline: Address,
        flight: String,
        timestamp: u64,
    },
    InsurancePurchased {
        flight_key: FlightKey,
        passenger: Address,
        #[serde(with = "wei_string")]
        premium: Wei,
    },
    InsuranceClaimed {
        flight_key: FlightKey,
        passenger: Address,
        #[serde(with = "wei_string")]
        credit: Wei,
    },
    BalanceWithdrawn {
        passenger: Address,
        #[serde(with = "wei_string")]
        amount: Wei,
    },
    OperationalStatusChanged {
        operational: bool,
    },
    PauserAdded {
        account: Address,
    },
    PauserRemoved {
        account: Address,
    },
}

pub type EventStream = BoxStream<'static, ContractEvent>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ContractEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: ContractEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContractEvent> {
        self.sender.subscribe()
    }

    pub fn stream(&self) -> EventStream {
        receiver_stream(self.subscribe())
    }

    /// Subscribes for the first event accepted by `filter`.
    ///
    /// The subscription is live from this call on, so create it before
    /// triggering whatever produces the event.
    pub fn once<F>(&self, filter: F) -> OnceSubscription<F>
    where
        F: Fn(&ContractEvent) -> bool,
    {
        OnceSubscription {
            receiver: self.subscribe(),
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Adapts a broadcast receiver into a stream. Lagging drops the missed
/// events with a warning; the stream ends when the bus is gone.
pub fn receiver_stream(receiver: broadcast::Receiver<ContractEvent>) -> EventStream {
    stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => return Some((event, receiver)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged; events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}

/// One-shot filtered subscription. Dropping it unsubscribes.
pub struct OnceSubscription<F> {
    receiver: broadcast::Receiver<ContractEvent>,
    filter: F,
}

impl<F> OnceSubscription<F>
where
    F: Fn(&ContractEvent) -> bool,
{
    pub async fn recv(mut self) -> Option<ContractEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if (self.filter)(&event) => return Some(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "one-shot subscriber lagged; events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Resolves with the matching event, or `None` after `timeout`.
    /// The receiver is released either way.
    pub async fn wait(self, timeout: Duration) -> Option<ContractEvent> {
        tokio::time::timeout(timeout, self.recv()).await.ok().flatten()
    }
}
