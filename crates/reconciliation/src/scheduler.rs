//! The reconciliation scheduler
//!
//! Owns the two periodic passes and the plumbing to run them on an
//! interval. Each pass is also callable one-shot (`run_billing_once`,
//! `run_sweep_once`) so tests and operators can drive it directly.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use core_kernel::Clock;
use domain_occupancy::{OccupancyService, RoomStore, RoomStatus};
use domain_stay::{GuestStore, StayController, StayError};

/// Cadence and thresholds of the reconciliation passes
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SchedulerConfig {
    pub billing_interval: Duration,
    pub sweep_interval: Duration,
    /// Cleaning dwell honored by the sweep; rooms younger than this are
    /// left for their timer
    pub dwell: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            billing_interval: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
            dwell: Duration::from_secs(2 * 60 * 60),
        }
    }
}

/// Outcome of one billing pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillingReport {
    /// Checked-in guests examined
    pub examined: usize,
    /// Line items appended across all bills
    pub charges_appended: usize,
    /// Guests whose bill already carried every expected charge
    pub untouched: usize,
    /// Guests that changed status between listing and processing
    pub skipped: usize,
    /// Guests whose reconciliation failed; each is logged and the pass
    /// continues
    pub failed: usize,
}

/// Outcome of one cleaning sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Rooms in cleaning examined
    pub examined: usize,
    /// Rooms released back to available
    pub released: usize,
    /// Rooms whose status changed under the sweep (manual override won)
    pub superseded: usize,
    /// Rooms still inside their dwell window
    pub still_dwelling: usize,
    pub failed: usize,
}

/// Handle to a spawned reconciliation loop
pub struct TaskHandle {
    name: &'static str,
    shutdown: mpsc::Sender<()>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Signals the loop to stop and waits for it to drain
    pub async fn stop(self) {
        let _ = self.shutdown.send(()).await;
        if let Err(e) = self.join.await {
            if !e.is_cancelled() {
                tracing::warn!(task = self.name, error = %e, "reconciliation task panicked");
            }
        }
    }
}

/// Runs the billing pass and the cleaning sweep
pub struct ReconciliationScheduler {
    controller: Arc<StayController>,
    occupancy: Arc<OccupancyService>,
    rooms: Arc<dyn RoomStore>,
    guests: Arc<dyn GuestStore>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl ReconciliationScheduler {
    pub fn new(
        controller: Arc<StayController>,
        occupancy: Arc<OccupancyService>,
        rooms: Arc<dyn RoomStore>,
        guests: Arc<dyn GuestStore>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            controller,
            occupancy,
            rooms,
            guests,
            clock,
            config,
        }
    }

    /// One billing pass over every checked-in guest
    ///
    /// Re-derives each guest's automatic charges and appends the missing
    /// ones. A failure on one guest is logged and counted; the pass moves
    /// on to the next.
    pub async fn run_billing_once(&self) -> BillingReport {
        let guests = match self.guests.list_checked_in().await {
            Ok(guests) => guests,
            Err(e) => {
                tracing::error!(error = %e, "billing pass could not list guests");
                return BillingReport {
                    failed: 1,
                    ..BillingReport::default()
                };
            }
        };

        let mut report = BillingReport {
            examined: guests.len(),
            ..BillingReport::default()
        };
        for guest in guests {
            let guest_id = guest.data.id;
            match self.controller.recalculate(guest_id).await {
                Ok((_, 0)) => report.untouched += 1,
                Ok((bill, appended)) => {
                    report.charges_appended += appended;
                    tracing::info!(
                        %guest_id,
                        bill_number = %bill.data.bill_number,
                        appended,
                        "billing pass appended missing charges"
                    );
                }
                Err(StayError::NotCheckedIn { .. }) => report.skipped += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(%guest_id, error = %e, "billing pass failed for guest");
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            appended = report.charges_appended,
            failed = report.failed,
            "billing pass complete"
        );
        report
    }

    /// One sweep over rooms stuck in cleaning
    ///
    /// Releases rooms whose dwell has elapsed; a room whose timer already
    /// fired, or that was manually moved on, is counted, not an error.
    pub async fn run_sweep_once(&self) -> SweepReport {
        let rooms = match self.rooms.list_by_status(RoomStatus::Cleaning).await {
            Ok(rooms) => rooms,
            Err(e) => {
                tracing::error!(error = %e, "cleaning sweep could not list rooms");
                return SweepReport {
                    failed: 1,
                    ..SweepReport::default()
                };
            }
        };

        let now = self.clock.now();
        let dwell_secs = self.config.dwell.as_secs() as i64;
        let mut report = SweepReport {
            examined: rooms.len(),
            ..SweepReport::default()
        };
        for room in rooms {
            let room_id = room.data.id;
            let elapsed = match room.data.cleaning_since {
                Some(since) => (now - since).num_seconds(),
                // No timestamp to judge by; treat the room as overdue
                None => i64::MAX,
            };
            if elapsed < dwell_secs {
                report.still_dwelling += 1;
                continue;
            }

            match self.occupancy.try_complete_cleaning(room_id).await {
                Ok(true) => {
                    report.released += 1;
                    tracing::info!(
                        room_number = %room.data.number,
                        "sweep released an overdue cleaning room"
                    );
                }
                Ok(false) => report.superseded += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(room_number = %room.data.number, error = %e, "sweep failed for room");
                }
            }
        }

        tracing::info!(
            examined = report.examined,
            released = report.released,
            failed = report.failed,
            "cleaning sweep complete"
        );
        report
    }

    /// Spawns the billing pass on its interval
    pub fn spawn_billing(self: &Arc<Self>) -> TaskHandle {
        let scheduler = Arc::clone(self);
        let interval = scheduler.config.billing_interval;
        Self::spawn_loop("billing", interval, move || {
            let scheduler = Arc::clone(&scheduler);
            async move {
                scheduler.run_billing_once().await;
            }
        })
    }

    /// Spawns the cleaning sweep on its interval
    pub fn spawn_sweep(self: &Arc<Self>) -> TaskHandle {
        let scheduler = Arc::clone(self);
        let interval = scheduler.config.sweep_interval;
        Self::spawn_loop("sweep", interval, move || {
            let scheduler = Arc::clone(&scheduler);
            async move {
                scheduler.run_sweep_once().await;
            }
        })
    }

    fn spawn_loop<F, Fut>(name: &'static str, every: Duration, run: F) -> TaskHandle
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick fires immediately; skip it so startup does not
            // race the live write paths.
            ticker.tick().await;
            tracing::info!(task = name, every_secs = every.as_secs(), "reconciliation loop started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => run().await,
                    _ = shutdown_rx.recv() => {
                        tracing::info!(task = name, "reconciliation loop stopping");
                        break;
                    }
                }
            }
        });

        TaskHandle {
            name,
            shutdown: shutdown_tx,
            join,
        }
    }
}
