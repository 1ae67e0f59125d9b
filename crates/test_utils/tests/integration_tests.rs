//! End-to-end: a full stay from check-in to the room coming back online

use rust_decimal_macros::dec;
use std::time::Duration;

use core_kernel::OrderId;
use domain_ledger::{BillStatus, OrderLine};
use domain_occupancy::RoomStatus;
use domain_stay::GuestStatus;
use test_utils::{
    assert_bill_status, assert_room_status, cash_payment, MoneyFixtures, NewGuestBuilder,
    TemporalFixtures, TestEnv,
};

#[tokio::test(start_paused = true)]
async fn full_stay_lifecycle() {
    let env = TestEnv::new();
    let room = env.provision_room("301", MoneyFixtures::nightly_250()).await;

    // Arrival: two contracted nights at 250
    let stay = env
        .controller
        .check_in(room.data.id, NewGuestBuilder::new().build())
        .await
        .unwrap();
    let guest_id = stay.guest.data.id;
    let bill_id = stay.bill.as_ref().unwrap().data.id;
    assert_eq!(
        stay.bill.as_ref().unwrap().data.total_amount,
        MoneyFixtures::usd(dec!(500))
    );

    // Room service during the stay
    let order = OrderId::new();
    env.ledger
        .fold_order(
            bill_id,
            order,
            &[OrderLine {
                food_name: "Club sandwich".into(),
                quantity: dec!(2),
                unit_price: MoneyFixtures::usd(dec!(12.50)),
                total_price: MoneyFixtures::usd(dec!(25)),
            }],
        )
        .await
        .unwrap();

    // A deposit at the desk
    env.ledger
        .add_payment(bill_id, cash_payment(MoneyFixtures::usd(dec!(200))))
        .await
        .unwrap();
    let bill = env.ledger.bill(bill_id).await.unwrap();
    assert_bill_status(&bill.data, BillStatus::PartiallyPaid);

    // The guest stays two more nights
    env.controller
        .extend_stay(guest_id, TemporalFixtures::jan(5, 11, 0), "front-desk")
        .await
        .unwrap();
    let bill = env.ledger.bill(bill_id).await.unwrap();
    assert_eq!(bill.data.total_amount, MoneyFixtures::usd(dec!(1025)));

    // Settle the remainder and leave
    env.ledger
        .add_payment(bill_id, cash_payment(bill.data.balance_amount))
        .await
        .unwrap();
    let done = env.controller.check_out(guest_id, "front-desk").await.unwrap();
    assert_eq!(done.guest.data.status, GuestStatus::CheckedOut);
    assert_room_status(&done.room.data, RoomStatus::Cleaning);
    assert_bill_status(&done.bill.unwrap().data, BillStatus::Finalized);

    // Housekeeping's dwell elapses and the one-shot timer frees the room
    tokio::time::sleep(Duration::from_secs(2 * 60 * 60 + 1)).await;
    let current = env.occupancy.room(room.data.id).await.unwrap();
    assert_room_status(&current.data, RoomStatus::Available);

    // Nothing left for reconciliation to do
    let report = env
        .scheduler(reconciliation::SchedulerConfig::default())
        .run_billing_once()
        .await;
    assert_eq!(report.examined, 0);
}
