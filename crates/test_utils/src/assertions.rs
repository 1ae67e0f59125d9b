//! Custom Test Assertions
//!
//! Assertion helpers for domain types that give more meaningful error
//! messages than the standard macros.

use core_kernel::Money;
use domain_ledger::{Bill, BillStatus};
use domain_occupancy::{Room, RoomStatus};

/// Asserts that a bill derives the expected status
///
/// # Panics
///
/// Panics with the bill number and both statuses on mismatch.
pub fn assert_bill_status(bill: &Bill, expected: BillStatus) {
    let actual = bill.status();
    assert_eq!(
        actual, expected,
        "bill {} derived status {actual}, expected {expected}",
        bill.bill_number
    );
}

/// Asserts that a bill's balance equals the expected amount
pub fn assert_balance(bill: &Bill, expected: Money) {
    assert_eq!(
        bill.balance_amount, expected,
        "bill {} has balance {}, expected {expected}",
        bill.bill_number, bill.balance_amount
    );
}

/// Asserts that a room is in the expected occupancy status
pub fn assert_room_status(room: &Room, expected: RoomStatus) {
    assert_eq!(
        room.status, expected,
        "room {} is {}, expected {expected}",
        room.number, room.status
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(
        money.is_zero(),
        "expected zero money, got {} {}",
        money.currency().symbol(),
        money.amount()
    );
}
