//! FlightSurety contract core
//!
//! The on-chain half of the system, run in-process. Every mutating call
//! takes the state lock for its whole duration and publishes its events
//! before releasing it, which gives the same guarantees as serialized
//! blockchain transactions: votes never interleave and event order equals
//! execution order.

pub mod consensus;
pub mod events;
pub mod indexes;
pub mod insurance;
pub mod ledger;
pub mod registry;
pub mod requests;

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ConfigError, ContractError};
use crate::flight::{Address, FlightKey, FlightRef, StatusCode, Wei, ONE_ETHER};

pub use consensus::{ResponseTally, Vote};
pub use events::{ContractEvent, EventBus, EventStream, OnceSubscription};
pub use indexes::{IndexAssigner, OracleIndexes};
pub use insurance::{InsuranceBook, Policy};
pub use ledger::{FlightStatusLedger, FlightStatusRecord};
pub use registry::{Oracle, OracleRegistry};
pub use requests::{OracleRequest, RequestKey, RequestTracker};

use requests::Opened;

/// Tunables fixed at deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractParams {
    pub registration_fee: Wei,
    /// Matching responses needed to finalize a status.
    pub quorum: usize,
    /// Indexes are drawn from `[0, index_range)`.
    pub index_range: u8,
    pub indexes_per_oracle: usize,
}

impl Default for ContractParams {
    fn default() -> Self {
        Self {
            registration_fee: ONE_ETHER,
            quorum: 3,
            index_range: 10,
            indexes_per_oracle: 3,
        }
    }
}

impl ContractParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.quorum == 0 {
            return Err(ConfigError::Invalid("quorum must be at least 1".to_string()));
        }
        if self.index_range == 0 {
            return Err(ConfigError::Invalid("index range must be at least 1".to_string()));
        }
        if self.indexes_per_oracle == 0 || self.indexes_per_oracle > usize::from(self.index_range) {
            return Err(ConfigError::Invalid(format!(
                "indexes per oracle must be between 1 and the index range ({}), got {}",
                self.index_range, self.indexes_per_oracle
            )));
        }
        Ok(())
    }
}

/// An oracle's answer to an open request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleResponse {
    pub index: u8,
    pub flight: FlightRef,
    pub status: StatusCode,
}

/// Returned to whoever triggered a status fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenedRequest {
    pub id: Uuid,
    pub index: u8,
    pub flight_key: FlightKey,
    /// An identical request was already open and was reused.
    pub reused: bool,
}

/// What happened to an accepted oracle submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Recorded { status: StatusCode, responses: usize },
    /// The oracle had already answered this request.
    Duplicate,
    /// The flight was finalized before this response arrived.
    Ignored,
    Finalized { record: FlightStatusRecord },
}

struct ContractState {
    /// Accounts allowed to pause and unpause. Seeded with the owner.
    pausers: BTreeSet<Address>,
    operational: bool,
    assigner: IndexAssigner,
    registry: OracleRegistry,
    requests: RequestTracker,
    ledger: FlightStatusLedger,
    insurance: InsuranceBook,
}

impl ContractState {
    fn ensure_operational(&self) -> Result<(), ContractError> {
        if self.operational {
            Ok(())
        } else {
            Err(ContractError::Paused)
        }
    }

    fn ensure_pauser(&self, caller: &Address) -> Result<(), ContractError> {
        if self.pausers.contains(caller) {
            Ok(())
        } else {
            Err(ContractError::Unauthorized)
        }
    }
}

pub struct FlightSuretyContract {
    params: ContractParams,
    state: Mutex<ContractState>,
    events: EventBus,
}

impl FlightSuretyContract {
    pub fn new(owner: Address, params: ContractParams, events: EventBus) -> Self {
        let assigner = IndexAssigner::new(params.index_range);
        Self::with_assigner(owner, params, events, assigner)
    }

    pub fn with_assigner(
        owner: Address,
        params: ContractParams,
        events: EventBus,
        assigner: IndexAssigner,
    ) -> Self {
        let state = ContractState {
            pausers: BTreeSet::from([owner]),
            operational: true,
            assigner,
            registry: OracleRegistry::new(params.registration_fee, params.indexes_per_oracle),
            requests: RequestTracker::new(params.quorum),
            ledger: FlightStatusLedger::new(),
            insurance: InsuranceBook::new(),
        };

        Self {
            params,
            state: Mutex::new(state),
            events,
        }
    }

    pub fn params(&self) -> &ContractParams {
        &self.params
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn registration_fee(&self) -> Wei {
        self.params.registration_fee
    }

    // ===== Operational status =====

    pub async fn is_operational(&self) -> bool {
        self.state.lock().await.operational
    }

    pub async fn pause(&self, caller: &Address) -> Result<(), ContractError> {
        let mut state = self.state.lock().await;
        state.ensure_pauser(caller)?;
        state.ensure_operational()?;

        state.operational = false;
        self.events
            .publish(ContractEvent::OperationalStatusChanged { operational: false });
        info!(caller = %caller, "contract paused");

        Ok(())
    }

    pub async fn unpause(&self, caller: &Address) -> Result<(), ContractError> {
        let mut state = self.state.lock().await;
        state.ensure_pauser(caller)?;

        if !state.operational {
            state.operational = true;
            self.events
                .publish(ContractEvent::OperationalStatusChanged { operational: true });
            info!(caller = %caller, "contract unpaused");
        }

        Ok(())
    }

    // ===== Pauser role =====

    pub async fn is_pauser(&self, account: &Address) -> bool {
        self.state.lock().await.pausers.contains(account)
    }

    pub async fn pausers(&self) -> Vec<Address> {
        self.state.lock().await.pausers.iter().cloned().collect()
    }

    /// Grants the pauser role. Only an existing pauser may call this.
    pub async fn add_pauser(&self, caller: &Address, account: &Address) -> Result<(), ContractError> {
        let mut state = self.state.lock().await;
        state.ensure_pauser(caller)?;

        if !state.pausers.insert(account.clone()) {
            return Err(ContractError::AlreadyPauser);
        }
        self.events.publish(ContractEvent::PauserAdded {
            account: account.clone(),
        });
        info!(caller = %caller, account = %account, "pauser added");

        Ok(())
    }

    /// Gives up the caller's own pauser role.
    pub async fn renounce_pauser(&self, caller: &Address) -> Result<(), ContractError> {
        let mut state = self.state.lock().await;
        state.ensure_pauser(caller)?;

        state.pausers.remove(caller);
        self.events.publish(ContractEvent::PauserRemoved {
            account: caller.clone(),
        });
        info!(account = %caller, "pauser renounced");

        Ok(())
    }

    // ===== Oracle registry =====

    /// Registers `oracle` if `paid` covers the fee and returns its indexes.
    pub async fn register_oracle(&self, oracle: &Address, paid: Wei) -> Result<OracleIndexes, ContractError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.ensure_operational()?;

        let indexes = state
            .registry
            .register(oracle, paid, &mut state.assigner)?
            .indexes
            .clone();
        state.assigner.absorb(oracle.as_bytes());

        self.events.publish(ContractEvent::OracleRegistered {
            oracle: oracle.clone(),
            indexes: indexes.clone(),
        });
        info!(oracle = %oracle, indexes = %indexes, "oracle registered");

        Ok(indexes)
    }

    pub async fn is_oracle_registered(&self, oracle: &Address) -> bool {
        self.state.lock().await.registry.is_registered(oracle)
    }

    pub async fn oracle_indexes(&self, oracle: &Address) -> Result<OracleIndexes, ContractError> {
        self.state.lock().await.registry.indexes_of(oracle).cloned()
    }

    pub async fn oracle_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }

    pub async fn collected_fees(&self) -> Wei {
        self.state.lock().await.registry.collected_fees()
    }

    // ===== Status requests and consensus =====

    /// Opens a request at a fresh pseudo-random index and announces it.
    ///
    /// Only registered flights can be queried, which bounds the request
    /// table by the number of flights times the index range.
    pub async fn fetch_flight_status(
        &self,
        requester: &Address,
        flight: &FlightRef,
    ) -> Result<OpenedRequest, ContractError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.ensure_operational()?;

        let flight_key = flight.key();
        if !state.insurance.is_flight_registered(&flight_key) {
            return Err(ContractError::FlightNotRegistered);
        }
        if state.ledger.is_resolved(&flight_key) {
            return Err(ContractError::AlreadyResolved);
        }

        let index = state.assigner.random_index(requester);
        let (request, opened) = state.requests.open(index, flight, requester);
        let opened = OpenedRequest {
            id: request.id,
            index,
            flight_key,
            reused: opened == Opened::Existing,
        };
        state.assigner.absorb(flight_key.as_bytes());

        self.events.publish(ContractEvent::OracleRequest {
            index,
            airline: flight.airline.clone(),
            flight: flight.flight.clone(),
            timestamp: flight.timestamp,
        });
        info!(
            flight = %flight,
            index,
            request_id = %opened.id,
            reused = opened.reused,
            "oracle request opened"
        );

        Ok(opened)
    }

    /// Records one oracle's answer and finalizes the flight on quorum.
    pub async fn submit_oracle_response(
        &self,
        submitter: &Address,
        response: &OracleResponse,
    ) -> Result<SubmissionOutcome, ContractError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.ensure_operational()?;

        if !state.registry.indexes_of(submitter)?.contains(response.index) {
            return Err(ContractError::IndexMismatch {
                index: response.index,
            });
        }
        if response.status == StatusCode::Unknown {
            return Err(ContractError::UnknownStatus);
        }

        let flight_key = response.flight.key();
        let request = state
            .requests
            .get_mut(&RequestKey::derive(response.index, &flight_key))
            .ok_or(ContractError::RequestNotFound)?;

        if !request.is_open() || state.ledger.is_resolved(&flight_key) {
            debug!(oracle = %submitter, flight = %response.flight, "response after finalization ignored");
            return Ok(SubmissionOutcome::Ignored);
        }

        let vote = request.tally.record(submitter, response.status);
        state.assigner.absorb(submitter.as_bytes());

        let (status, responses) = match vote {
            Vote::Duplicate => {
                debug!(oracle = %submitter, flight = %response.flight, "duplicate response ignored");
                return Ok(SubmissionOutcome::Duplicate);
            }
            Vote::Counted { status, responses } | Vote::QuorumReached { status, responses } => {
                (status, responses)
            }
        };

        self.events.publish(ContractEvent::OracleReport {
            airline: response.flight.airline.clone(),
            flight: response.flight.flight.clone(),
            timestamp: response.flight.timestamp,
            status,
        });
        debug!(
            oracle = %submitter,
            flight = %response.flight,
            status = %status,
            responses,
            "oracle response counted"
        );

        if !matches!(vote, Vote::QuorumReached { .. }) {
            return Ok(SubmissionOutcome::Recorded { status, responses });
        }

        let record = state
            .ledger
            .finalize(FlightStatusRecord {
                flight_key,
                flight: response.flight.clone(),
                status,
                request_index: response.index,
                resolved_at: Utc::now(),
            })?
            .clone();
        state.requests.close_flight(&flight_key, status);

        self.events.publish(ContractEvent::FlightStatusInfo {
            airline: record.flight.airline.clone(),
            flight: record.flight.flight.clone(),
            timestamp: record.flight.timestamp,
            status,
            flight_key,
        });
        info!(flight = %record.flight, status = %status, responses, "flight status finalized");

        Ok(SubmissionOutcome::Finalized { record })
    }

    pub async fn flight_status(&self, key: &FlightKey) -> Option<FlightStatusRecord> {
        self.state.lock().await.ledger.record(key).cloned()
    }

    /// `Unknown` until the flight is finalized.
    pub async fn status_code(&self, key: &FlightKey) -> StatusCode {
        self.state.lock().await.ledger.status(key)
    }

    /// Every request opened for the flight, open or resolved.
    pub async fn requests_for(&self, key: &FlightKey) -> Vec<OracleRequest> {
        self.state
            .lock()
            .await
            .requests
            .requests_for(key)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn open_request_count(&self) -> usize {
        self.state.lock().await.requests.open_count()
    }

    // ===== Flights and insurance =====

    pub async fn register_flight(&self, flight: &FlightRef) -> Result<FlightKey, ContractError> {
        let mut state = self.state.lock().await;
        state.ensure_operational()?;

        let key = state.insurance.register_flight(flight)?;
        self.events.publish(ContractEvent::FlightRegistered {
            flight_key: key,
            airline: flight.airline.clone(),
            flight: flight.flight.clone(),
            timestamp: flight.timestamp,
        });
        debug!(flight = %flight, key = %key, "flight registered");

        Ok(key)
    }

    pub async fn is_flight_registered(&self, key: &FlightKey) -> bool {
        self.state.lock().await.insurance.is_flight_registered(key)
    }

    pub async fn buy_insurance(
        &self,
        passenger: &Address,
        key: &FlightKey,
        premium: Wei,
    ) -> Result<Policy, ContractError> {
        let mut state = self.state.lock().await;
        state.ensure_operational()?;

        let policy = state.insurance.buy(passenger, key, premium)?.clone();
        self.events.publish(ContractEvent::InsurancePurchased {
            flight_key: *key,
            passenger: passenger.clone(),
            premium,
        });
        info!(passenger = %passenger, key = %key, premium, "insurance purchased");

        Ok(policy)
    }

    /// Credits the passenger when the finalized status is `LateAirline`.
    pub async fn claim(&self, passenger: &Address, key: &FlightKey) -> Result<Wei, ContractError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        state.ensure_operational()?;

        let status = state.ledger.status(key);
        let credit = state.insurance.claim(passenger, key, status)?;
        self.events.publish(ContractEvent::InsuranceClaimed {
            flight_key: *key,
            passenger: passenger.clone(),
            credit,
        });
        info!(passenger = %passenger, key = %key, credit, "insurance claimed");

        Ok(credit)
    }

    pub async fn balance_of(&self, passenger: &Address) -> Wei {
        self.state.lock().await.insurance.balance_of(passenger)
    }

    pub async fn withdraw(&self, passenger: &Address) -> Result<Wei, ContractError> {
        let mut state = self.state.lock().await;
        state.ensure_operational()?;

        let amount = state.insurance.withdraw(passenger)?;
        self.events.publish(ContractEvent::BalanceWithdrawn {
            passenger: passenger.clone(),
            amount,
        });
        info!(passenger = %passenger, amount, "balance withdrawn");

        Ok(amount)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use futures_util::StreamExt;

    /// Every oracle owns every index when the range equals the per-oracle count.
    fn all_indexes(quorum: usize) -> ContractParams {
        ContractParams {
            registration_fee: ONE_ETHER,
            quorum,
            index_range: 3,
            indexes_per_oracle: 3,
        }
    }

    /// A contract with `flight()` already registered.
    async fn contract(params: ContractParams) -> FlightSuretyContract {
        let range = params.index_range;
        let contract = FlightSuretyContract::with_assigner(
            Address::new("owner"),
            params,
            EventBus::new(64),
            IndexAssigner::from_seed([5; 32], range),
        );
        contract.register_flight(&flight()).await.unwrap();
        contract
    }

    fn flight() -> FlightRef {
        FlightRef::new("0xairline", "ND1309", 1_600_000_000)
    }

    async fn oracles(contract: &FlightSuretyContract, count: usize) -> Vec<Address> {
        let mut addresses = Vec::new();
        for n in 0..count {
            let address = Address::new(format!("oracle{}", n));
            contract.register_oracle(&address, ONE_ETHER).await.unwrap();
            addresses.push(address);
        }
        addresses
    }

    fn answer(index: u8, status: StatusCode) -> OracleResponse {
        OracleResponse {
            index,
            flight: flight(),
            status,
        }
    }

    #[tokio::test]
    async fn test_quorum_finalizes_and_late_votes_are_ignored() {
        let contract = contract(all_indexes(3)).await;
        let oracles = oracles(&contract, 4).await;
        let opened = contract
            .fetch_flight_status(&Address::new("owner"), &flight())
            .await
            .unwrap();

        for oracle in &oracles[..2] {
            let outcome = contract
                .submit_oracle_response(oracle, &answer(opened.index, StatusCode::LateAirline))
                .await
                .unwrap();
            assert!(matches!(outcome, SubmissionOutcome::Recorded { .. }));
        }

        let outcome = contract
            .submit_oracle_response(&oracles[2], &answer(opened.index, StatusCode::LateAirline))
            .await
            .unwrap();
        let record = match outcome {
            SubmissionOutcome::Finalized { record } => record,
            other => panic!("expected finalization, got {:?}", other),
        };
        assert_eq!(record.status, StatusCode::LateAirline);
        assert_eq!(record.flight_key, flight().key());
        assert_eq!(record.request_index, opened.index);

        let late = contract
            .submit_oracle_response(&oracles[3], &answer(opened.index, StatusCode::LateWeather))
            .await
            .unwrap();
        assert_eq!(late, SubmissionOutcome::Ignored);
        assert_eq!(contract.status_code(&flight().key()).await, StatusCode::LateAirline);
        assert_eq!(contract.flight_status(&flight().key()).await, Some(record));
        assert_eq!(contract.open_request_count().await, 0);
    }

    #[tokio::test]
    async fn test_first_code_to_reach_quorum_wins() {
        let contract = contract(all_indexes(2)).await;
        let oracles = oracles(&contract, 4).await;
        let index = contract
            .fetch_flight_status(&Address::new("owner"), &flight())
            .await
            .unwrap()
            .index;

        let votes = [
            StatusCode::LateWeather,
            StatusCode::OnTime,
            StatusCode::OnTime,
            StatusCode::LateWeather,
        ];
        let mut outcomes = Vec::new();
        for (oracle, status) in oracles.iter().zip(votes) {
            outcomes.push(
                contract
                    .submit_oracle_response(oracle, &answer(index, status))
                    .await
                    .unwrap(),
            );
        }

        assert!(matches!(outcomes[2], SubmissionOutcome::Finalized { .. }));
        // LateWeather would have reached quorum here, but OnTime got there first
        assert_eq!(outcomes[3], SubmissionOutcome::Ignored);
        assert_eq!(contract.status_code(&flight().key()).await, StatusCode::OnTime);
    }

    #[tokio::test]
    async fn test_repeat_votes_do_not_double_count() {
        let contract = contract(all_indexes(3)).await;
        let oracles = oracles(&contract, 2).await;
        let index = contract
            .fetch_flight_status(&Address::new("owner"), &flight())
            .await
            .unwrap()
            .index;

        for _ in 0..3 {
            contract
                .submit_oracle_response(&oracles[0], &answer(index, StatusCode::LateAirline))
                .await
                .unwrap();
        }
        let outcome = contract
            .submit_oracle_response(&oracles[1], &answer(index, StatusCode::LateAirline))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SubmissionOutcome::Recorded {
                status: StatusCode::LateAirline,
                responses: 2
            }
        );
        assert_eq!(contract.status_code(&flight().key()).await, StatusCode::Unknown);
    }

    #[tokio::test]
    async fn test_registering_twice_fails() {
        let contract = contract(ContractParams::default()).await;
        let oracle = Address::new("oracle");

        let indexes = contract.register_oracle(&oracle, ONE_ETHER).await.unwrap();
        assert_eq!(
            contract.register_oracle(&oracle, ONE_ETHER).await,
            Err(ContractError::AlreadyRegistered)
        );
        assert_eq!(contract.oracle_indexes(&oracle).await.unwrap(), indexes);
        assert_eq!(contract.collected_fees().await, ONE_ETHER);
        assert_eq!(
            contract.register_oracle(&Address::new("cheap"), ONE_ETHER / 2).await,
            Err(ContractError::InsufficientFee {
                required: ONE_ETHER,
                paid: ONE_ETHER / 2
            })
        );
    }

    #[tokio::test]
    async fn test_index_mismatch_records_nothing() {
        let contract = contract(ContractParams::default()).await;
        let oracle = Address::new("oracle");
        let indexes = contract.register_oracle(&oracle, ONE_ETHER).await.unwrap();
        contract
            .fetch_flight_status(&Address::new("owner"), &flight())
            .await
            .unwrap();

        let foreign = (0..10u8)
            .find(|index| !indexes.contains(*index))
            .expect("three indexes cannot cover ten");
        assert_eq!(
            contract
                .submit_oracle_response(&oracle, &answer(foreign, StatusCode::OnTime))
                .await,
            Err(ContractError::IndexMismatch { index: foreign })
        );

        let requests = contract.requests_for(&flight().key()).await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tally.total_responses(), 0);
    }

    #[tokio::test]
    async fn test_submission_rejections() {
        let contract = contract(all_indexes(3)).await;
        let oracle = oracles(&contract, 1).await.remove(0);

        assert_eq!(
            contract
                .submit_oracle_response(&Address::new("stranger"), &answer(0, StatusCode::OnTime))
                .await,
            Err(ContractError::NotRegistered)
        );
        assert_eq!(
            contract
                .submit_oracle_response(&oracle, &answer(0, StatusCode::OnTime))
                .await,
            Err(ContractError::RequestNotFound)
        );

        let index = contract
            .fetch_flight_status(&Address::new("owner"), &flight())
            .await
            .unwrap()
            .index;
        assert_eq!(
            contract
                .submit_oracle_response(&oracle, &answer(index, StatusCode::Unknown))
                .await,
            Err(ContractError::UnknownStatus)
        );
    }

    #[tokio::test]
    async fn test_finalization_closes_duplicate_requests() {
        let contract = contract(all_indexes(2)).await;
        let oracles = oracles(&contract, 3).await;
        let owner = Address::new("owner");

        let mut indexes = Vec::new();
        while indexes.len() < 2 {
            let opened = contract.fetch_flight_status(&owner, &flight()).await.unwrap();
            if !indexes.contains(&opened.index) {
                indexes.push(opened.index);
            } else {
                assert!(opened.reused);
            }
        }

        for oracle in &oracles[..2] {
            contract
                .submit_oracle_response(oracle, &answer(indexes[0], StatusCode::LateOther))
                .await
                .unwrap();
        }

        assert_eq!(
            contract
                .submit_oracle_response(&oracles[2], &answer(indexes[1], StatusCode::OnTime))
                .await
                .unwrap(),
            SubmissionOutcome::Ignored
        );
        assert!(contract
            .requests_for(&flight().key())
            .await
            .iter()
            .all(|request| request.resolution == Some(StatusCode::LateOther)));
        assert_eq!(
            contract.fetch_flight_status(&owner, &flight()).await,
            Err(ContractError::AlreadyResolved)
        );
    }

    #[tokio::test]
    async fn test_fetch_publishes_request_event() {
        let contract = contract(ContractParams::default()).await;
        let subscription = contract
            .events()
            .once(|event| matches!(event, ContractEvent::OracleRequest { .. }));

        let opened = contract
            .fetch_flight_status(&Address::new("owner"), &flight())
            .await
            .unwrap();
        assert!(opened.index < 10);

        let event = subscription.recv().await.unwrap();
        assert_eq!(
            event,
            ContractEvent::OracleRequest {
                index: opened.index,
                airline: flight().airline,
                flight: flight().flight,
                timestamp: flight().timestamp,
            }
        );
    }

    #[tokio::test]
    async fn test_pause_blocks_mutations() {
        let contract = contract(all_indexes(3)).await;
        let owner = Address::new("owner");

        assert_eq!(
            contract.pause(&Address::new("intruder")).await,
            Err(ContractError::Unauthorized)
        );
        assert!(contract.is_pauser(&owner).await);
        contract.pause(&owner).await.unwrap();
        assert!(!contract.is_operational().await);
        assert_eq!(contract.pause(&owner).await, Err(ContractError::Paused));

        assert_eq!(
            contract.register_oracle(&Address::new("oracle"), ONE_ETHER).await,
            Err(ContractError::Paused)
        );
        assert_eq!(
            contract.fetch_flight_status(&owner, &flight()).await,
            Err(ContractError::Paused)
        );
        assert_eq!(
            contract
                .submit_oracle_response(&Address::new("oracle"), &answer(0, StatusCode::OnTime))
                .await,
            Err(ContractError::Paused)
        );

        contract.unpause(&owner).await.unwrap();
        assert!(contract.is_operational().await);
        assert!(contract.register_oracle(&Address::new("oracle"), ONE_ETHER).await.is_ok());
    }

    #[tokio::test]
    async fn test_claim_depends_on_finalized_status() {
        let contract = contract(all_indexes(1)).await;
        let oracle = oracles(&contract, 1).await.remove(0);
        let passenger = Address::new("passenger");
        let key = flight().key();

        contract
            .buy_insurance(&passenger, &key, ONE_ETHER / 2)
            .await
            .unwrap();
        assert_eq!(
            contract.claim(&passenger, &key).await,
            Err(ContractError::NotClaimable)
        );

        let index = contract
            .fetch_flight_status(&Address::new("owner"), &flight())
            .await
            .unwrap()
            .index;
        contract
            .submit_oracle_response(&oracle, &answer(index, StatusCode::LateAirline))
            .await
            .unwrap();

        assert_eq!(contract.claim(&passenger, &key).await, Ok(ONE_ETHER * 3 / 4));
        assert_eq!(contract.balance_of(&passenger).await, ONE_ETHER * 3 / 4);
        assert_eq!(contract.withdraw(&passenger).await, Ok(ONE_ETHER * 3 / 4));
        assert_eq!(contract.balance_of(&passenger).await, 0);
    }

    #[tokio::test]
    async fn test_unregistered_flights_cannot_be_queried() {
        let contract = contract(ContractParams::default()).await;
        let unknown = FlightRef::new("0xairline", "ND9999", 1_600_000_000);

        assert_eq!(
            contract.fetch_flight_status(&Address::new("owner"), &unknown).await,
            Err(ContractError::FlightNotRegistered)
        );
        assert!(contract.requests_for(&unknown.key()).await.is_empty());
        assert_eq!(contract.open_request_count().await, 0);
    }

    #[tokio::test]
    async fn test_request_table_is_bounded_per_flight() {
        let contract = contract(ContractParams::default()).await;
        let owner = Address::new("owner");

        for _ in 0..200 {
            contract.fetch_flight_status(&owner, &flight()).await.unwrap();
        }
        // At most one request per index, however often the flight is fetched
        assert!(contract.requests_for(&flight().key()).await.len() <= 10);
        assert!(contract.open_request_count().await <= 10);
    }

    #[tokio::test]
    async fn test_pauser_role() {
        let contract = contract(all_indexes(3)).await;
        let owner = Address::new("owner");
        let deputy = Address::new("deputy");
        let mut events = contract.events().stream();

        assert_eq!(contract.pause(&deputy).await, Err(ContractError::Unauthorized));
        assert_eq!(
            contract.add_pauser(&deputy, &deputy).await,
            Err(ContractError::Unauthorized)
        );

        contract.add_pauser(&owner, &deputy).await.unwrap();
        assert_eq!(
            contract.add_pauser(&owner, &deputy).await,
            Err(ContractError::AlreadyPauser)
        );
        assert_eq!(contract.pausers().await, vec![deputy.clone(), owner.clone()]);

        contract.pause(&deputy).await.unwrap();
        contract.unpause(&deputy).await.unwrap();

        contract.renounce_pauser(&deputy).await.unwrap();
        assert!(!contract.is_pauser(&deputy).await);
        assert_eq!(contract.pause(&deputy).await, Err(ContractError::Unauthorized));

        assert_eq!(
            events.next().await,
            Some(ContractEvent::PauserAdded { account: deputy.clone() })
        );
        assert_eq!(
            events.next().await,
            Some(ContractEvent::OperationalStatusChanged { operational: false })
        );
        assert_eq!(
            events.next().await,
            Some(ContractEvent::OperationalStatusChanged { operational: true })
        );
        assert_eq!(
            events.next().await,
            Some(ContractEvent::PauserRemoved { account: deputy })
        );
    }

    #[test]
    fn test_params_validation() {
        assert!(ContractParams::default().validate().is_ok());
        assert!(ContractParams {
            indexes_per_oracle: 11,
            ..ContractParams::default()
        }
        .validate()
        .is_err());
        assert!(ContractParams {
            quorum: 0,
            ..ContractParams::default()
        }
        .validate()
        .is_err());
    }
}
