//! The Guest aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{GuestId, PeriodError, RoomId, StayPeriod};

use crate::error::StayError;

/// Lifecycle status of a guest record
///
/// `CheckedIn` is the only live state; everything else is terminal and the
/// record becomes immutable history (`Archived` is reachable only from a
/// terminal state, for administrative cleanup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuestStatus {
    CheckedIn,
    CheckedOut,
    Cancelled,
    NoShow,
    Archived,
}

impl GuestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GuestStatus::CheckedIn)
    }
}

impl fmt::Display for GuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuestStatus::CheckedIn => "checked_in",
            GuestStatus::CheckedOut => "checked_out",
            GuestStatus::Cancelled => "cancelled",
            GuestStatus::NoShow => "no_show",
            GuestStatus::Archived => "archived",
        };
        write!(f, "{name}")
    }
}

/// Identity document presented at check-in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdDocument {
    pub doc_type: String,
    pub number: String,
}

/// A guest's stay record
///
/// Created at check-in, mutated only by extend and the terminal
/// transitions. `room_number` is denormalized for display; `room_id` is the
/// reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub id_document: Option<IdDocument>,
    pub room_id: RoomId,
    pub room_number: String,
    pub check_in_date: DateTime<Utc>,
    /// Contracted check-out; extended stays move this forward
    pub check_out_date: DateTime<Utc>,
    /// When the guest actually left; set by checkout
    pub actual_check_out_date: Option<DateTime<Utc>>,
    pub checked_out_by: Option<String>,
    pub status: GuestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    /// Creates a checked-in guest for the given stay window
    #[allow(clippy::too_many_arguments)]
    pub fn check_in(
        name: impl Into<String>,
        phone: impl Into<String>,
        email: Option<String>,
        id_document: Option<IdDocument>,
        room_id: RoomId,
        room_number: impl Into<String>,
        period: StayPeriod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: GuestId::new_v7(),
            name: name.into(),
            phone: phone.into(),
            email,
            id_document,
            room_id,
            room_number: room_number.into(),
            check_in_date: period.check_in(),
            check_out_date: period.check_out(),
            actual_check_out_date: None,
            checked_out_by: None,
            status: GuestStatus::CheckedIn,
            created_at: now,
            updated_at: now,
        }
    }

    /// The contracted stay window
    pub fn period(&self) -> Result<StayPeriod, PeriodError> {
        StayPeriod::new(self.check_in_date, self.check_out_date)
    }

    /// Moves the contracted check-out forward
    ///
    /// # Errors
    ///
    /// - `NotCheckedIn` on a terminal record
    /// - `InvalidDate` unless strictly later than the current check-out
    pub fn extend(&mut self, new_check_out: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), StayError> {
        self.ensure_checked_in()?;
        if new_check_out <= self.check_out_date {
            return Err(StayError::InvalidDate {
                current: self.check_out_date,
                requested: new_check_out,
            });
        }
        self.check_out_date = new_check_out;
        self.updated_at = now;
        Ok(())
    }

    /// Terminal transition: checked_in → checked_out
    pub fn complete_checkout(
        &mut self,
        checked_out_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), StayError> {
        self.ensure_checked_in()?;
        self.status = GuestStatus::CheckedOut;
        self.actual_check_out_date = Some(now);
        self.checked_out_by = Some(checked_out_by.into());
        self.updated_at = now;
        Ok(())
    }

    /// Terminal transition: checked_in → cancelled / no_show
    pub fn close(&mut self, to: GuestStatus, now: DateTime<Utc>) -> Result<(), StayError> {
        if !matches!(to, GuestStatus::Cancelled | GuestStatus::NoShow) {
            return Err(StayError::Validation(format!(
                "cannot close a stay into status {to}"
            )));
        }
        self.ensure_checked_in()?;
        self.status = to;
        self.updated_at = now;
        Ok(())
    }

    /// Administrative transition: any terminal state → archived
    pub fn archive(&mut self, now: DateTime<Utc>) -> Result<(), StayError> {
        match self.status {
            GuestStatus::CheckedOut | GuestStatus::Cancelled | GuestStatus::NoShow => {
                self.status = GuestStatus::Archived;
                self.updated_at = now;
                Ok(())
            }
            status => Err(StayError::Validation(format!(
                "only a terminal stay can be archived, status is {status}"
            ))),
        }
    }

    fn ensure_checked_in(&self) -> Result<(), StayError> {
        if self.status != GuestStatus::CheckedIn {
            return Err(StayError::NotCheckedIn {
                guest_id: self.id,
                status: self.status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn guest() -> Guest {
        let period = StayPeriod::new(at(1, 15), at(3, 11)).unwrap();
        Guest::check_in(
            "Avery Quinn",
            "+1-555-0100",
            None,
            None,
            RoomId::new(),
            "101",
            period,
            at(1, 15),
        )
    }

    #[test]
    fn checkout_is_terminal() {
        let mut g = guest();
        g.complete_checkout("desk", at(3, 10)).unwrap();
        assert_eq!(g.status, GuestStatus::CheckedOut);
        assert_eq!(g.actual_check_out_date, Some(at(3, 10)));

        assert!(matches!(
            g.complete_checkout("desk", at(3, 11)),
            Err(StayError::NotCheckedIn { .. })
        ));
    }

    #[test]
    fn extend_requires_later_date() {
        let mut g = guest();
        assert!(matches!(
            g.extend(at(2, 11), at(1, 16)),
            Err(StayError::InvalidDate { .. })
        ));

        g.extend(at(5, 11), at(1, 16)).unwrap();
        assert_eq!(g.check_out_date, at(5, 11));
    }

    #[test]
    fn archive_only_from_terminal() {
        let mut g = guest();
        assert!(g.archive(at(2, 0)).is_err());

        g.close(GuestStatus::NoShow, at(2, 0)).unwrap();
        g.archive(at(2, 1)).unwrap();
        assert_eq!(g.status, GuestStatus::Archived);
    }

    #[test]
    fn close_rejects_non_terminal_targets() {
        let mut g = guest();
        assert!(g.close(GuestStatus::CheckedIn, at(2, 0)).is_err());
        assert!(g.close(GuestStatus::Archived, at(2, 0)).is_err());
    }
}
