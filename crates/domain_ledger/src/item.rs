//! Bill line items

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{Money, OrderId};

/// Classification of a bill line item
///
/// `Tax` and `Discount` are excluded from the subtotal and folded into the
/// total separately; everything else is a plain charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeType {
    RoomCharge,
    FoodOrder,
    ServiceCharge,
    Tax,
    Discount,
    Other,
}

impl ChargeType {
    /// Returns true if items of this type sum into the subtotal
    pub fn counts_toward_subtotal(&self) -> bool {
        !matches!(self, ChargeType::Tax | ChargeType::Discount)
    }
}

/// A posted line item on a bill
///
/// Items are append-only: corrections are new items (e.g. a `Discount`),
/// never edits to existing ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub id: Uuid,
    pub charge_type: ChargeType,
    pub description: String,
    /// Line total; for tax/discount lines this is the tax/discount amount
    pub amount: Money,
    pub quantity: Decimal,
    pub unit_price: Money,
    /// External order that produced this item, if any
    pub source_order_id: Option<OrderId>,
    /// Identity of an automatic charge (type + date window), used to
    /// de-duplicate append-delta recalculation
    pub charge_key: Option<String>,
    pub posted_at: DateTime<Utc>,
}

/// A line item not yet posted to a bill
///
/// The engine materializes a draft into a [`BillItem`], stamping the id and
/// posting time, once the mutation guard has passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeDraft {
    pub charge_type: ChargeType,
    pub description: String,
    pub amount: Money,
    pub quantity: Decimal,
    pub unit_price: Money,
    pub source_order_id: Option<OrderId>,
    pub charge_key: Option<String>,
}

impl ChargeDraft {
    /// Creates a single-quantity draft where the line total is the amount
    pub fn new(charge_type: ChargeType, description: impl Into<String>, amount: Money) -> Self {
        Self {
            charge_type,
            description: description.into(),
            amount,
            quantity: Decimal::ONE,
            unit_price: amount,
            source_order_id: None,
            charge_key: None,
        }
    }

    /// Sets quantity and unit price; the line total becomes their product
    pub fn with_quantity(mut self, quantity: Decimal, unit_price: Money) -> Self {
        self.quantity = quantity;
        self.unit_price = unit_price;
        self.amount = unit_price.multiply(quantity);
        self
    }

    /// Tags this draft as an automatic charge with the given identity
    pub fn with_charge_key(mut self, key: impl Into<String>) -> Self {
        self.charge_key = Some(key.into());
        self
    }

    /// Links this draft to the external order that produced it
    pub fn with_source_order(mut self, order_id: OrderId) -> Self {
        self.source_order_id = Some(order_id);
        self
    }

    /// Posts the draft, producing the immutable line item
    pub fn post(self, posted_at: DateTime<Utc>) -> BillItem {
        BillItem {
            id: Uuid::new_v4(),
            charge_type: self.charge_type,
            description: self.description,
            amount: self.amount,
            quantity: self.quantity,
            unit_price: self.unit_price,
            source_order_id: self.source_order_id,
            charge_key: self.charge_key,
            posted_at,
        }
    }
}
