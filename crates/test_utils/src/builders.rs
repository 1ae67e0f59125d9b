//! Test Data Builders
//!
//! Builders let tests specify only the fields they care about and take
//! sensible defaults for the rest.

use chrono::{DateTime, Utc};
use core_kernel::Money;
use domain_ledger::{ChargeDraft, ChargeType, PaymentDraft, PaymentMethod};
use domain_stay::{IdDocument, NewGuest};

use crate::fixtures::{MoneyFixtures, StringFixtures, TemporalFixtures};

/// Builder for check-in requests
pub struct NewGuestBuilder {
    name: String,
    phone: String,
    email: Option<String>,
    id_document: Option<IdDocument>,
    check_in_date: Option<DateTime<Utc>>,
    check_out_date: Option<DateTime<Utc>>,
}

impl Default for NewGuestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewGuestBuilder {
    /// Two-night stay for the standard fixture guest
    pub fn new() -> Self {
        Self {
            name: StringFixtures::guest_name().to_string(),
            phone: StringFixtures::guest_phone().to_string(),
            email: None,
            id_document: None,
            check_in_date: Some(TemporalFixtures::arrival()),
            check_out_date: Some(TemporalFixtures::departure()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_document(mut self, doc_type: impl Into<String>, number: impl Into<String>) -> Self {
        self.id_document = Some(IdDocument {
            doc_type: doc_type.into(),
            number: number.into(),
        });
        self
    }

    pub fn with_check_in(mut self, when: DateTime<Utc>) -> Self {
        self.check_in_date = Some(when);
        self
    }

    pub fn with_check_out(mut self, when: DateTime<Utc>) -> Self {
        self.check_out_date = Some(when);
        self
    }

    /// Leaves both dates unset so the controller applies its defaults
    pub fn with_default_dates(mut self) -> Self {
        self.check_in_date = None;
        self.check_out_date = None;
        self
    }

    pub fn build(self) -> NewGuest {
        NewGuest {
            name: self.name,
            phone: self.phone,
            email: self.email,
            id_document: self.id_document,
            check_in_date: self.check_in_date,
            check_out_date: self.check_out_date,
        }
    }
}

/// A service charge draft with a throwaway description
pub fn service_charge(description: impl Into<String>, amount: Money) -> ChargeDraft {
    ChargeDraft::new(ChargeType::ServiceCharge, description, amount)
}

/// A cash payment draft
pub fn cash_payment(amount: Money) -> PaymentDraft {
    PaymentDraft::new(amount, PaymentMethod::Cash, StringFixtures::desk_clerk())
}

/// The standard full settlement for a two-night stay at the fixture rate
pub fn settle_two_nights() -> PaymentDraft {
    cash_payment(MoneyFixtures::nightly_100().multiply(rust_decimal::Decimal::TWO))
}
