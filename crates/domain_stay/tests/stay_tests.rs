//! Stay lifecycle tests across the wired-up environment

use rust_decimal_macros::dec;
use std::sync::Arc;

use core_kernel::DomainEvent;
use domain_ledger::BillStatus;
use domain_occupancy::RoomStatus;
use domain_stay::{Guest, GuestStatus, GuestStore, StayError};
use test_utils::{
    assert_balance, assert_bill_status, assert_room_status, cash_payment, settle_two_nights,
    MoneyFixtures, NewGuestBuilder, RefusingCalculator, TemporalFixtures, TestEnv,
};

#[tokio::test]
async fn check_in_occupies_the_room_and_opens_a_charged_bill() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;

    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();

    assert_eq!(stay.guest.data.status, GuestStatus::CheckedIn);
    assert_room_status(&stay.room.data, RoomStatus::Occupied);
    assert_eq!(stay.room.data.current_guest, Some(stay.guest.data.id));

    let bill = stay.bill.expect("check-in opens a bill");
    assert_eq!(bill.data.items.len(), 2);
    assert_eq!(bill.data.total_amount, MoneyFixtures::usd(dec!(200)));
    assert_bill_status(&bill.data, BillStatus::Active);

    assert_eq!(
        env.events
            .count_matching(|e| matches!(e, DomainEvent::GuestCheckedIn { .. })),
        1
    );
}

#[tokio::test]
async fn check_in_rejects_an_occupied_room() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    env.controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();

    let err = env
        .controller
        .check_in(
            room.data.id,
            NewGuestBuilder::new().with_name("Second Guest").build(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StayError::RoomOccupiedByOther { .. }));
}

#[tokio::test]
async fn check_in_rejects_a_room_in_cleaning() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    env.occupancy
        .occupy(room.data.id, core_kernel::GuestId::new())
        .await
        .unwrap();
    env.occupancy.begin_cleaning(room.data.id).await.unwrap();

    let err = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StayError::RoomUnavailable {
            status: RoomStatus::Cleaning,
            ..
        }
    ));
}

#[tokio::test]
async fn check_in_requires_name_and_phone() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;

    let err = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().with_name("  ").build())
        .await
        .unwrap_err();
    assert!(matches!(err, StayError::Validation(_)));

    let err = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().with_phone("").build())
        .await
        .unwrap_err();
    assert!(matches!(err, StayError::Validation(_)));
}

#[tokio::test]
async fn missing_dates_default_to_one_night_until_standard_check_out() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;

    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().with_default_dates().build())
        .await
        .unwrap();

    // Clock starts at 2024-01-01 15:00; default departure is next day 11:00
    assert_eq!(stay.guest.data.check_in_date, TemporalFixtures::arrival());
    assert_eq!(
        stay.guest.data.check_out_date,
        TemporalFixtures::jan(2, 11, 0)
    );
    let bill = stay.bill.unwrap();
    assert_eq!(bill.data.total_amount, MoneyFixtures::usd(dec!(100)));
}

#[tokio::test]
async fn early_arrival_is_surcharged() {
    let env = TestEnv::builder()
        .starting_at(TemporalFixtures::jan(1, 9, 0))
        .build();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;

    let stay = env
        .controller
        .check_in(
            room.data.id,
            NewGuestBuilder::new()
                .with_check_in(TemporalFixtures::jan(1, 9, 0))
                .with_check_out(TemporalFixtures::jan(3, 9, 0))
                .build(),
        )
        .await
        .unwrap();

    let bill = stay.bill.unwrap();
    // Two nights plus half a night for the 09:00 arrival
    assert_eq!(bill.data.total_amount, MoneyFixtures::usd(dec!(250)));
    assert!(bill
        .data
        .items
        .iter()
        .any(|i| i.charge_key.as_deref() == Some("early-checkin:2024-01-01")));
}

#[tokio::test]
async fn checkout_is_blocked_until_the_balance_is_zero() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();
    let guest_id = stay.guest.data.id;
    let bill_id = stay.bill.as_ref().unwrap().data.id;

    let err = env.controller.check_out(guest_id, "front-desk").await.unwrap_err();
    assert!(matches!(err, StayError::BalanceOutstanding { .. }));

    // One cent short is still blocked
    env.ledger
        .add_payment(bill_id, cash_payment(MoneyFixtures::usd(dec!(199.99))))
        .await
        .unwrap();
    let err = env.controller.check_out(guest_id, "front-desk").await.unwrap_err();
    assert!(matches!(
        err,
        StayError::BalanceOutstanding { balance, .. } if balance == MoneyFixtures::usd(dec!(0.01))
    ));

    // Nothing moved
    let guest = env.controller.guest(guest_id).await.unwrap();
    assert_eq!(guest.data.status, GuestStatus::CheckedIn);
    let current = env.occupancy.room(room.data.id).await.unwrap();
    assert_room_status(&current.data, RoomStatus::Occupied);
}

#[tokio::test]
async fn settled_checkout_finalizes_and_releases_the_room_to_cleaning() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();
    let guest_id = stay.guest.data.id;
    let bill_id = stay.bill.as_ref().unwrap().data.id;

    env.ledger
        .add_payment(bill_id, settle_two_nights())
        .await
        .unwrap();

    let done = env.controller.check_out(guest_id, "front-desk").await.unwrap();
    assert_eq!(done.guest.data.status, GuestStatus::CheckedOut);
    assert_eq!(done.guest.data.checked_out_by.as_deref(), Some("front-desk"));
    assert_room_status(&done.room.data, RoomStatus::Cleaning);

    let bill = done.bill.expect("checkout finalizes the bill");
    assert_bill_status(&bill.data, BillStatus::Finalized);
    assert_balance(&bill.data, MoneyFixtures::usd_zero());

    assert_eq!(
        env.events
            .count_matching(|e| matches!(e, DomainEvent::GuestCheckedOut { .. })),
        1
    );

    // Retrying a completed checkout converges instead of failing
    let again = env.controller.check_out(guest_id, "front-desk").await.unwrap();
    assert_eq!(again.guest.data.status, GuestStatus::CheckedOut);
    assert_room_status(&again.room.data, RoomStatus::Cleaning);
}

#[tokio::test]
async fn stale_checkout_retry_leaves_the_next_stay_alone() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    let first = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();
    let first_id = first.guest.data.id;
    env.ledger
        .add_payment(first.bill.unwrap().data.id, settle_two_nights())
        .await
        .unwrap();
    env.controller.check_out(first_id, "front-desk").await.unwrap();

    // The room turns over and the next guest moves in
    env.occupancy.make_available(room.data.id).await.unwrap();
    let second = env
        .controller
        .check_in(
            room.data.id,
            NewGuestBuilder::new().with_name("Next Guest").build(),
        )
        .await
        .unwrap();

    // A delayed retry of the finished checkout must not evict them
    let again = env.controller.check_out(first_id, "front-desk").await.unwrap();
    assert_eq!(again.guest.data.status, GuestStatus::CheckedOut);
    assert_room_status(&again.room.data, RoomStatus::Occupied);

    let current = env.occupancy.room(room.data.id).await.unwrap();
    assert_room_status(&current.data, RoomStatus::Occupied);
    assert_eq!(current.data.current_guest, Some(second.guest.data.id));
    let holder = env.controller.guest(second.guest.data.id).await.unwrap();
    assert_eq!(holder.data.status, GuestStatus::CheckedIn);
}

#[tokio::test]
async fn check_in_rejects_a_room_a_guest_record_still_holds() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;

    // Drifted state: the room reads available while a checked-in record
    // still references it
    let holder = Guest::check_in(
        "Lingering Guest",
        "+1-555-0100",
        None,
        None,
        room.data.id,
        room.data.number.clone(),
        TemporalFixtures::two_night_stay(),
        TemporalFixtures::arrival(),
    );
    let holder = GuestStore::create(env.store.as_ref(), holder).await.unwrap();

    let err = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StayError::RoomOccupiedByOther { guest_id, .. } if guest_id == holder.data.id
    ));
}

#[tokio::test]
async fn extend_appends_only_the_new_nights() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();
    let guest_id = stay.guest.data.id;

    let extended = env
        .controller
        .extend_stay(guest_id, TemporalFixtures::jan(5, 11, 0), "front-desk")
        .await
        .unwrap();
    assert_eq!(
        extended.guest.data.check_out_date,
        TemporalFixtures::jan(5, 11, 0)
    );
    let bill = extended.bill.unwrap();
    assert_eq!(bill.data.items.len(), 4);
    assert_eq!(bill.data.total_amount, MoneyFixtures::usd(dec!(400)));

    // Recalculating over the same period finds nothing missing
    let (_, appended) = env.controller.recalculate(guest_id).await.unwrap();
    assert_eq!(appended, 0);
}

#[tokio::test]
async fn extend_rejects_a_non_forward_date() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();

    let err = env
        .controller
        .extend_stay(stay.guest.data.id, TemporalFixtures::jan(2, 11, 0), "front-desk")
        .await
        .unwrap_err();
    assert!(matches!(err, StayError::InvalidDate { .. }));
}

#[tokio::test]
async fn calculator_failure_falls_back_to_a_flat_room_charge() {
    let env = TestEnv::builder()
        .with_calculator(Arc::new(RefusingCalculator))
        .build();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;

    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();

    let bill = stay.bill.unwrap();
    assert_eq!(bill.data.items.len(), 1);
    assert_eq!(bill.data.total_amount, MoneyFixtures::usd(dec!(200)));
    assert!(bill.data.items[0]
        .charge_key
        .as_deref()
        .unwrap()
        .starts_with("room-fallback:"));
}

#[tokio::test]
async fn cancelled_stay_voids_the_bill_and_frees_the_room() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();

    let closed = env.controller.cancel_stay(stay.guest.data.id).await.unwrap();
    assert_eq!(closed.guest.data.status, GuestStatus::Cancelled);
    assert_room_status(&closed.room.data, RoomStatus::Cleaning);
    assert_bill_status(&closed.bill.unwrap().data, BillStatus::Cancelled);
}

#[tokio::test]
async fn no_show_closes_the_stay() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();

    let closed = env.controller.mark_no_show(stay.guest.data.id).await.unwrap();
    assert_eq!(closed.guest.data.status, GuestStatus::NoShow);
}

#[tokio::test]
async fn archive_requires_a_terminal_stay() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();
    let guest_id = stay.guest.data.id;

    let err = env.controller.archive(guest_id).await.unwrap_err();
    assert!(matches!(err, StayError::Validation(_)));

    env.controller.cancel_stay(guest_id).await.unwrap();
    let archived = env.controller.archive(guest_id).await.unwrap();
    assert_eq!(archived.data.status, GuestStatus::Archived);

    // Idempotent
    let again = env.controller.archive(guest_id).await.unwrap();
    assert_eq!(again.data.status, GuestStatus::Archived);
}

#[tokio::test]
async fn checkout_preview_reports_the_outstanding_balance() {
    let env = TestEnv::new();
    let room = env.provision_room("101", MoneyFixtures::nightly_100()).await;
    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();
    let guest_id = stay.guest.data.id;

    let clearance = env
        .controller
        .checkout_guard()
        .can_check_out(guest_id)
        .await
        .unwrap();
    assert!(!clearance.allowed);
    assert_eq!(clearance.balance, MoneyFixtures::usd(dec!(200)));

    env.ledger
        .add_payment(stay.bill.unwrap().data.id, settle_two_nights())
        .await
        .unwrap();
    let clearance = env
        .controller
        .checkout_guard()
        .can_check_out(guest_id)
        .await
        .unwrap();
    assert!(clearance.allowed);
}
