//! The stay lifecycle controller
//!
//! Check-in, checkout, extension and the administrative closings each span
//! the guest record, the room state machine and the bill. There is no
//! cross-entity transaction; the controller sequences the writes so that a
//! crash mid-way leaves a state the next retry (or the reconciliation pass)
//! converges from:
//!
//! - check-in: guest record first, then the room, then the bill. A failure
//!   after the guest write compensates by closing the record again.
//! - checkout: bill finalized first, then the guest, then the room. Each
//!   step is idempotent, so re-running a half-finished checkout completes
//!   it instead of failing.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use core_kernel::{
    Clock, Currency, DomainEvent, EventSink, GuestId, RoomId, StayPeriod, Versioned,
};
use domain_ledger::{Bill, BillSnapshot, ChargeDraft, ChargeType, LedgerEngine};
use domain_occupancy::{CleaningTimer, OccupancyService, Room, RoomStatus};

use crate::charges::ChargeCalculator;
use crate::error::StayError;
use crate::guard::CheckoutGuard;
use crate::guest::{Guest, GuestStatus, IdDocument};
use crate::policy::HotelPolicy;
use crate::ports::GuestStore;

/// Upper bound on conflict retries before giving up
const MAX_WRITE_ATTEMPTS: u32 = 5;

/// Check-in request
#[derive(Debug, Clone)]
pub struct NewGuest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub id_document: Option<IdDocument>,
    /// Defaults to now; a future arrival may be stamped explicitly
    pub check_in_date: Option<DateTime<Utc>>,
    /// Defaults to the next day at the standard check-out time
    pub check_out_date: Option<DateTime<Utc>>,
}

/// The cross-entity view of a stay after an operation
#[derive(Debug, Clone)]
pub struct StaySnapshot {
    pub guest: Versioned<Guest>,
    pub room: Versioned<Room>,
    pub bill: Option<Versioned<Bill>>,
}

/// Orchestrates the stay lifecycle across guests, rooms and bills
pub struct StayController {
    guests: Arc<dyn GuestStore>,
    occupancy: Arc<OccupancyService>,
    timer: Arc<CleaningTimer>,
    ledger: Arc<LedgerEngine>,
    guard: CheckoutGuard,
    calculator: Arc<dyn ChargeCalculator>,
    policy: HotelPolicy,
    currency: Currency,
    events: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl StayController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        guests: Arc<dyn GuestStore>,
        occupancy: Arc<OccupancyService>,
        timer: Arc<CleaningTimer>,
        ledger: Arc<LedgerEngine>,
        calculator: Arc<dyn ChargeCalculator>,
        policy: HotelPolicy,
        currency: Currency,
        events: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let guard = CheckoutGuard::new(Arc::clone(&ledger), currency);
        Self {
            guests,
            occupancy,
            timer,
            ledger,
            guard,
            calculator,
            policy,
            currency,
            events,
            clock,
        }
    }

    /// The guard used before checkout; exposed for front-desk previews
    pub fn checkout_guard(&self) -> &CheckoutGuard {
        &self.guard
    }

    /// Fetches the current snapshot of a guest
    pub async fn guest(&self, id: GuestId) -> Result<Versioned<Guest>, StayError> {
        Ok(self.guests.get(id).await?)
    }

    /// Checks a guest into a room: guest record, room occupation, bill with
    /// the automatic charges
    pub async fn check_in(
        &self,
        room_id: RoomId,
        request: NewGuest,
    ) -> Result<StaySnapshot, StayError> {
        if request.name.trim().is_empty() {
            return Err(StayError::Validation("guest name must not be empty".into()));
        }
        if request.phone.trim().is_empty() {
            return Err(StayError::Validation("guest phone must not be empty".into()));
        }

        let room = self.occupancy.room(room_id).await?;
        if !room.data.active {
            return Err(StayError::Validation(format!(
                "room {} is deactivated",
                room.data.number
            )));
        }
        match room.data.status {
            RoomStatus::Available => {}
            RoomStatus::Occupied => {
                return Err(match room.data.current_guest {
                    Some(guest_id) => StayError::RoomOccupiedByOther {
                        room_number: room.data.number.clone(),
                        guest_id,
                    },
                    None => StayError::RoomUnavailable {
                        room_number: room.data.number.clone(),
                        status: RoomStatus::Occupied,
                    },
                });
            }
            status => {
                return Err(StayError::RoomUnavailable {
                    room_number: room.data.number.clone(),
                    status,
                });
            }
        }
        // Room and guest state are not written transactionally; re-check
        // the guest store so drift cannot double-book the room.
        if let Some(holder) = self.guests.find_checked_in_by_room(room_id).await? {
            return Err(StayError::RoomOccupiedByOther {
                room_number: room.data.number.clone(),
                guest_id: holder.data.id,
            });
        }

        let now = self.clock.now();
        let period = self.resolve_period(&request, now)?;
        let guest = Guest::check_in(
            request.name,
            request.phone,
            request.email,
            request.id_document,
            room_id,
            room.data.number.clone(),
            period,
            now,
        );
        let guest = self.guests.create(guest).await?;
        let guest_id = guest.data.id;

        let room = match self.occupancy.occupy(room_id, guest_id).await {
            Ok(room) => room,
            Err(e) => {
                self.compensate_guest(&guest).await;
                return Err(e.into());
            }
        };

        let drafts = self.charges_for(&guest.data, &room.data, period);
        let snapshot = BillSnapshot {
            guest_id,
            guest_name: guest.data.name.clone(),
            room_id,
            room_number: room.data.number.clone(),
        };
        let bill = match self.ledger.open_bill(snapshot, self.currency, drafts).await {
            Ok(bill) => bill,
            Err(e) => {
                self.compensate_guest(&guest).await;
                self.compensate_room(room_id, guest_id).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            %guest_id,
            room_number = %room.data.number,
            bill_number = %bill.data.bill_number,
            nights = period.nights(),
            "guest checked in"
        );
        self.events.publish(DomainEvent::GuestCheckedIn {
            guest_id,
            room_id,
            bill_id: bill.data.id,
        });

        Ok(StaySnapshot {
            guest,
            room,
            bill: Some(bill),
        })
    }

    /// Checks a guest out: balance guard, bill finalization, guest record,
    /// room into cleaning with the release timer armed
    ///
    /// Safe to retry: every step skips itself when already done.
    pub async fn check_out(
        &self,
        guest_id: GuestId,
        checked_out_by: impl Into<String>,
    ) -> Result<StaySnapshot, StayError> {
        let checked_out_by = checked_out_by.into();
        let current = self.guests.get(guest_id).await?;
        if current.data.status != GuestStatus::CheckedIn
            && current.data.status != GuestStatus::CheckedOut
        {
            return Err(StayError::NotCheckedIn {
                guest_id,
                status: current.data.status,
            });
        }
        let room_id = current.data.room_id;

        self.guard.ensure_clear(guest_id).await?;
        let bill = match self.ledger.open_bill_for_guest(guest_id).await? {
            Some(open) => Some(self.ledger.finalize(open.data.id).await?),
            // Already finalized by an earlier attempt, or never billed
            None => None,
        };

        let guest = self
            .mutate_guest(guest_id, |guest, now| {
                if guest.status == GuestStatus::CheckedOut {
                    return Ok(false);
                }
                guest.complete_checkout(checked_out_by.clone(), now)?;
                Ok(true)
            })
            .await?;

        let room = self.room_to_cleaning(room_id, guest_id).await?;

        let checked_out_at = guest
            .data
            .actual_check_out_date
            .unwrap_or_else(|| self.clock.now());
        tracing::info!(
            %guest_id,
            room_number = %room.data.number,
            "guest checked out"
        );
        self.events.publish(DomainEvent::GuestCheckedOut {
            guest_id,
            room_id,
            checked_out_at,
        });

        Ok(StaySnapshot { guest, room, bill })
    }

    /// Extends the contracted check-out and appends the delta of automatic
    /// charges
    ///
    /// The guest record is the source of truth: if charging fails after the
    /// extension is stored, the stay stays extended and the reconciliation
    /// pass posts the missing nights later.
    pub async fn extend_stay(
        &self,
        guest_id: GuestId,
        new_check_out: DateTime<Utc>,
        extended_by: impl Into<String>,
    ) -> Result<StaySnapshot, StayError> {
        let extended_by = extended_by.into();
        let guest = self
            .mutate_guest(guest_id, |guest, now| {
                guest.extend(new_check_out, now)?;
                Ok(true)
            })
            .await?;
        self.events.publish(DomainEvent::StayExtended {
            guest_id,
            new_check_out,
        });

        let room = self.occupancy.room(guest.data.room_id).await?;
        let bill = match self.recalculate(guest_id).await {
            Ok((bill, appended)) => {
                tracing::info!(
                    %guest_id,
                    new_check_out = %new_check_out,
                    extended_by = %extended_by,
                    appended,
                    "stay extended"
                );
                Some(bill)
            }
            Err(e) => {
                tracing::warn!(
                    %guest_id,
                    error = %e,
                    "stay extended but charging failed; reconciliation will post the missing nights"
                );
                self.ledger.open_bill_for_guest(guest_id).await?
            }
        };

        Ok(StaySnapshot { guest, room, bill })
    }

    /// Recomputes the automatic charges for the guest's current period and
    /// appends whatever is missing from the bill
    ///
    /// Idempotent; this is the unit of work of the billing reconciliation
    /// pass.
    pub async fn recalculate(
        &self,
        guest_id: GuestId,
    ) -> Result<(Versioned<Bill>, usize), StayError> {
        let guest = self.guests.get(guest_id).await?;
        if guest.data.status != GuestStatus::CheckedIn {
            return Err(StayError::NotCheckedIn {
                guest_id,
                status: guest.data.status,
            });
        }
        let bill = self
            .ledger
            .open_bill_for_guest(guest_id)
            .await?
            .ok_or_else(|| {
                StayError::Validation(format!("guest {guest_id} has no open bill"))
            })?;

        let room = self.occupancy.room(guest.data.room_id).await?;
        let period = guest.data.period()?;
        let drafts = self.charges_for(&guest.data, &room.data, period);
        Ok(self.ledger.append_charges(bill.data.id, &drafts).await?)
    }

    /// Cancels a stay that will not be used; the unpaid bill is voided
    pub async fn cancel_stay(&self, guest_id: GuestId) -> Result<StaySnapshot, StayError> {
        self.close_stay(guest_id, GuestStatus::Cancelled).await
    }

    /// Marks a stay whose guest never arrived
    pub async fn mark_no_show(&self, guest_id: GuestId) -> Result<StaySnapshot, StayError> {
        self.close_stay(guest_id, GuestStatus::NoShow).await
    }

    /// Archives a terminal stay record
    pub async fn archive(&self, guest_id: GuestId) -> Result<Versioned<Guest>, StayError> {
        self.mutate_guest(guest_id, |guest, now| {
            if guest.status == GuestStatus::Archived {
                return Ok(false);
            }
            guest.archive(now)?;
            Ok(true)
        })
        .await
    }

    async fn close_stay(
        &self,
        guest_id: GuestId,
        to: GuestStatus,
    ) -> Result<StaySnapshot, StayError> {
        let current = self.guests.get(guest_id).await?;
        let room_id = current.data.room_id;

        let bill = match self.ledger.open_bill_for_guest(guest_id).await? {
            Some(open) => Some(self.ledger.cancel(open.data.id).await?),
            None => None,
        };

        let guest = self
            .mutate_guest(guest_id, |guest, now| {
                if guest.status == to {
                    return Ok(false);
                }
                guest.close(to, now)?;
                Ok(true)
            })
            .await?;

        let room = self.room_to_cleaning(room_id, guest_id).await?;
        tracing::info!(%guest_id, status = %to, "stay closed");
        Ok(StaySnapshot { guest, room, bill })
    }

    /// Occupied → cleaning with the release timer armed, but only while
    /// the room still belongs to this stay
    ///
    /// A retry after the room already cycled on, even into the next
    /// guest's stay, leaves the room untouched and reports it as-is.
    async fn room_to_cleaning(
        &self,
        room_id: RoomId,
        guest_id: GuestId,
    ) -> Result<Versioned<Room>, StayError> {
        match self.occupancy.release_by_guest(room_id, guest_id).await? {
            Some(room) => {
                self.timer.arm(room_id);
                Ok(room)
            }
            None => Ok(self.occupancy.room(room_id).await?),
        }
    }

    /// The automatic charges for a period, falling back to a single summary
    /// charge when the calculator refuses the input
    fn charges_for(&self, guest: &Guest, room: &Room, period: StayPeriod) -> Vec<ChargeDraft> {
        match self.calculator.calculate(period, room.nightly_price) {
            Ok(sheet) => sheet.items,
            Err(e) => {
                tracing::warn!(
                    guest_id = %guest.id,
                    room_number = %room.number,
                    error = %e,
                    "charge calculation failed, posting a flat room charge instead"
                );
                let nights = period.nights();
                let amount = room.nightly_price.multiply(Decimal::from(nights));
                vec![ChargeDraft::new(
                    ChargeType::RoomCharge,
                    format!("Room charge ({nights} nights, flat)"),
                    amount,
                )
                .with_charge_key(format!(
                    "room-fallback:{}..{}",
                    period.check_in().date_naive(),
                    period.check_out().date_naive()
                ))]
            }
        }
    }

    fn resolve_period(&self, request: &NewGuest, now: DateTime<Utc>) -> Result<StayPeriod, StayError> {
        let check_in = match request.check_in_date {
            Some(when) if when > now => when,
            _ => now,
        };
        let check_out = match request.check_out_date {
            Some(when) if when > check_in => when,
            Some(when) => {
                tracing::warn!(
                    requested = %when,
                    "requested check-out is not after check-in, using the standard default"
                );
                self.default_check_out(check_in)
            }
            None => self.default_check_out(check_in),
        };
        Ok(StayPeriod::new(check_in, check_out)?)
    }

    /// Next day at the property's standard check-out time
    fn default_check_out(&self, check_in: DateTime<Utc>) -> DateTime<Utc> {
        (check_in.date_naive() + Duration::days(1))
            .and_time(self.policy.standard_check_out)
            .and_utc()
    }

    /// Read-modify-write loop over the guest record with conflict retry
    ///
    /// The closure returns false to skip the write (idempotent re-run).
    async fn mutate_guest<F>(&self, guest_id: GuestId, op: F) -> Result<Versioned<Guest>, StayError>
    where
        F: Fn(&mut Guest, DateTime<Utc>) -> Result<bool, StayError>,
    {
        let mut attempts = 0;
        loop {
            let current = self.guests.get(guest_id).await?;
            let mut guest = current.data;
            let now = self.clock.now();
            if !op(&mut guest, now)? {
                return Ok(Versioned::new(guest, current.version));
            }

            match self.guests.update(current.version, guest).await {
                Ok(saved) => return Ok(saved),
                Err(e) if e.is_conflict() && attempts < MAX_WRITE_ATTEMPTS => {
                    attempts += 1;
                    tracing::debug!(%guest_id, attempts, "guest write conflict, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Best-effort rollback of a freshly-created guest record
    async fn compensate_guest(&self, guest: &Versioned<Guest>) {
        let mut cancelled = guest.data.clone();
        if cancelled.close(GuestStatus::Cancelled, self.clock.now()).is_err() {
            return;
        }
        if let Err(e) = self.guests.update(guest.version, cancelled).await {
            tracing::warn!(
                guest_id = %guest.data.id,
                error = %e,
                "failed to roll back guest record after check-in failure"
            );
        }
    }

    /// Best-effort release of a room occupied by a failed check-in
    async fn compensate_room(&self, room_id: RoomId, guest_id: GuestId) {
        let release = async {
            if self.occupancy.release_by_guest(room_id, guest_id).await?.is_none() {
                return Ok(());
            }
            self.occupancy.make_available(room_id).await.map(|_| ())
        };
        if let Err(e) = release.await {
            tracing::warn!(
                %room_id,
                error = %e,
                "failed to release room after check-in failure; the sweep will reclaim it"
            );
        }
    }
}
