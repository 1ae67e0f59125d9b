//! The wired-up in-memory environment
//!
//! [`TestEnv`] assembles the whole system against one [`MemoryStore`] and a
//! [`ManualClock`], so integration tests drive check-in through
//! reconciliation without any real time passing. The [`RecordingEventSink`]
//! captures everything the engines publish.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use core_kernel::{Clock, Currency, DomainEvent, EventSink, ManualClock, Versioned};
use domain_ledger::LedgerEngine;
use domain_occupancy::{
    CleaningTimer, HousekeepingPolicy, OccupancyService, Room, RoomStore,
};
use domain_stay::{
    ChargeCalculator, ChargeSheet, CalculationError, HotelPolicy, PolicyCalculator,
    StayController,
};
use infra_store::MemoryStore;
use reconciliation::{ReconciliationScheduler, SchedulerConfig};

use crate::fixtures::TemporalFixtures;

/// Installs a per-test tracing subscriber honoring `RUST_LOG`
///
/// Safe to call from every test; only the first call wins.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Sink that records every published event for later assertion
#[derive(Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of everything published so far
    pub fn snapshot(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("event recorder poisoned").clone()
    }

    /// Drains the recorded events
    pub fn take(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.events.lock().expect("event recorder poisoned"))
    }

    pub fn count_matching(&self, predicate: impl Fn(&DomainEvent) -> bool) -> usize {
        self.snapshot().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for RecordingEventSink {
    fn publish(&self, event: DomainEvent) {
        self.events
            .lock()
            .expect("event recorder poisoned")
            .push(event);
    }
}

/// A calculator that always refuses, for exercising the flat-charge
/// fallback path
pub struct RefusingCalculator;

impl ChargeCalculator for RefusingCalculator {
    fn calculate(
        &self,
        _period: core_kernel::StayPeriod,
        _nightly_price: core_kernel::Money,
    ) -> Result<ChargeSheet, CalculationError> {
        Err(CalculationError::Policy("calculator offline".into()))
    }
}

/// Everything wired against one in-memory store and one manual clock
pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub events: Arc<RecordingEventSink>,
    pub ledger: Arc<LedgerEngine>,
    pub occupancy: Arc<OccupancyService>,
    pub timer: Arc<CleaningTimer>,
    pub controller: Arc<StayController>,
    pub policy: HotelPolicy,
    pub currency: Currency,
}

impl TestEnv {
    /// The default environment: policy calculator, default hotel policy,
    /// clock at the standard arrival instant
    pub fn new() -> Self {
        TestEnvBuilder::new().build()
    }

    pub fn builder() -> TestEnvBuilder {
        TestEnvBuilder::new()
    }

    /// Provisions an available room directly in the store
    pub async fn provision_room(
        &self,
        number: &str,
        nightly_price: core_kernel::Money,
    ) -> Versioned<Room> {
        let room = Room::provision(number, 2, nightly_price, self.clock.now());
        RoomStore::create(self.store.as_ref(), room)
            .await
            .expect("room provisioning failed")
    }

    /// A scheduler over this environment
    pub fn scheduler(&self, config: SchedulerConfig) -> Arc<ReconciliationScheduler> {
        Arc::new(ReconciliationScheduler::new(
            Arc::clone(&self.controller),
            Arc::clone(&self.occupancy),
            self.store.clone() as Arc<dyn RoomStore>,
            self.store.clone() as Arc<dyn domain_stay::GuestStore>,
            self.clock.clone() as Arc<dyn Clock>,
            config,
        ))
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`TestEnv`] variations
pub struct TestEnvBuilder {
    start: chrono::DateTime<chrono::Utc>,
    policy: HotelPolicy,
    housekeeping: HousekeepingPolicy,
    currency: Currency,
    calculator: Option<Arc<dyn ChargeCalculator>>,
}

impl Default for TestEnvBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnvBuilder {
    pub fn new() -> Self {
        Self {
            start: TemporalFixtures::arrival(),
            policy: HotelPolicy::default(),
            housekeeping: HousekeepingPolicy::default(),
            currency: Currency::USD,
            calculator: None,
        }
    }

    pub fn starting_at(mut self, when: chrono::DateTime<chrono::Utc>) -> Self {
        self.start = when;
        self
    }

    pub fn with_policy(mut self, policy: HotelPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shortens (or stretches) the cleaning dwell
    pub fn with_dwell(mut self, dwell: Duration) -> Self {
        self.housekeeping.dwell = dwell;
        self
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn ChargeCalculator>) -> Self {
        self.calculator = Some(calculator);
        self
    }

    pub fn build(self) -> TestEnv {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(self.start));
        let events = Arc::new(RecordingEventSink::new());

        let ledger = Arc::new(LedgerEngine::new(
            store.clone(),
            events.clone(),
            clock.clone(),
        ));
        let occupancy = Arc::new(OccupancyService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            events.clone(),
            clock.clone(),
        ));
        let timer = Arc::new(CleaningTimer::new(
            Arc::clone(&occupancy),
            &self.housekeeping,
        ));
        let calculator = self
            .calculator
            .unwrap_or_else(|| Arc::new(PolicyCalculator::new(self.policy.clone())));
        let controller = Arc::new(StayController::new(
            store.clone(),
            Arc::clone(&occupancy),
            Arc::clone(&timer),
            Arc::clone(&ledger),
            calculator,
            self.policy.clone(),
            self.currency,
            events.clone(),
            clock.clone(),
        ));

        TestEnv {
            store,
            clock,
            events,
            ledger,
            occupancy,
            timer,
            controller,
            policy: self.policy,
            currency: self.currency,
        }
    }
}
