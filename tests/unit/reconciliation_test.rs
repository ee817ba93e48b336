// Settlement aggregation and money conversion properties

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use settlepay::core::{AppError, Currency};
use settlepay::modules::orders::OrderType;
use settlepay::modules::payments::{Payment, PaymentMethod, PaymentStatus, Settlement};

fn payment(amount: Decimal, method: PaymentMethod, status: PaymentStatus) -> Payment {
    let mut payment = Payment::cash(Some("B1".to_string()), "O1".to_string(), amount, None).unwrap();
    payment.method = method;
    payment.status = status;
    payment
}

fn status_strategy() -> impl Strategy<Value = PaymentStatus> {
    prop_oneof![
        Just(PaymentStatus::Pending),
        Just(PaymentStatus::Completed),
        Just(PaymentStatus::Failed),
        Just(PaymentStatus::Refunded),
    ]
}

#[test]
fn test_one_cash_payment_covers_bill() {
    let payments = vec![payment(dec!(500000), PaymentMethod::Cash, PaymentStatus::Completed)];
    assert!(Settlement::compute(dec!(500000), &payments).is_fully_paid);
}

#[test]
fn test_gateway_plus_cash_covers_bill() {
    let payments = vec![
        payment(dec!(300000), PaymentMethod::Vnpay, PaymentStatus::Completed),
        payment(dec!(200000), PaymentMethod::Cash, PaymentStatus::Completed),
    ];
    let settlement = Settlement::compute(dec!(500000), &payments);
    assert!(settlement.is_fully_paid);
    assert_eq!(settlement.total_paid, dec!(500000));
}

#[test]
fn test_pending_gateway_payment_does_not_count() {
    let payments = vec![
        payment(dec!(300000), PaymentMethod::Vnpay, PaymentStatus::Pending),
        payment(dec!(200000), PaymentMethod::Cash, PaymentStatus::Completed),
    ];
    let settlement = Settlement::compute(dec!(500000), &payments);
    assert!(!settlement.is_fully_paid);
    assert_eq!(settlement.balance, dec!(300000));
}

#[tokio::test]
async fn test_bill_falls_back_to_legacy_order_payments() {
    let ctx = TestContext::new();
    let order = ctx.seed_order(OrderType::Sale, 500000).await;
    let bill = ctx.seed_bill(&[&order.id], 500000).await;
    ctx.seed_payment(None, &order.id, 500000, PaymentMethod::Cash, PaymentStatus::Completed);

    let settlement = ctx.reconciliation.compute_settlement(&bill.id).await.unwrap();
    assert!(settlement.is_fully_paid);
}

#[tokio::test]
async fn test_linked_payments_shadow_legacy_rows() {
    let ctx = TestContext::new();
    let order = ctx.seed_order(OrderType::Sale, 500000).await;
    let bill = ctx.seed_bill(&[&order.id], 500000).await;
    ctx.seed_payment(None, &order.id, 500000, PaymentMethod::Cash, PaymentStatus::Completed);
    ctx.seed_payment(Some(&bill.id), &order.id, 100000, PaymentMethod::Cash, PaymentStatus::Completed);

    let settlement = ctx.reconciliation.compute_settlement(&bill.id).await.unwrap();
    assert_eq!(settlement.total_paid, dec!(100000));
    assert!(!settlement.is_fully_paid);
}

#[tokio::test]
async fn test_multi_order_bill_ignores_legacy_rows() {
    let ctx = TestContext::new();
    let first = ctx.seed_order(OrderType::Sale, 200000).await;
    let second = ctx.seed_order(OrderType::Sale, 300000).await;
    let bill = ctx.seed_bill(&[&first.id, &second.id], 500000).await;
    ctx.seed_payment(None, &first.id, 500000, PaymentMethod::Cash, PaymentStatus::Completed);

    let settlement = ctx.reconciliation.compute_settlement(&bill.id).await.unwrap();
    assert_eq!(settlement.total_paid, Decimal::ZERO);
}

#[tokio::test]
async fn test_order_settlement_without_bill() {
    let ctx = TestContext::new();
    let order = ctx.seed_order(OrderType::Sale, 150000).await;
    ctx.seed_payment(None, &order.id, 150000, PaymentMethod::Cash, PaymentStatus::Completed);

    let settlement = ctx
        .reconciliation
        .compute_order_settlement(&order.id)
        .await
        .unwrap();
    assert!(settlement.is_fully_paid);
}

#[tokio::test]
async fn test_billed_order_ignores_bill_linked_rows() {
    let ctx = TestContext::new();
    let small = ctx.seed_order(OrderType::Sale, 100).await;
    let large = ctx.seed_order(OrderType::Sale, 900).await;
    let bill = ctx.seed_bill(&[&small.id, &large.id], 1000).await;
    ctx.seed_payment(Some(&bill.id), &small.id, 950, PaymentMethod::Cash, PaymentStatus::Completed);

    for order in [&small, &large] {
        let settlement = ctx
            .reconciliation
            .compute_order_settlement(&order.id)
            .await
            .unwrap();
        assert_eq!(settlement.total_paid, Decimal::ZERO);
        assert!(!settlement.is_fully_paid);
    }
}

#[tokio::test]
async fn test_unknown_bill_is_not_found() {
    let ctx = TestContext::new();
    let err = ctx.reconciliation.compute_settlement("missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn test_minor_units_example() {
    assert_eq!(Currency::VND.to_minor_units(dec!(50000)).unwrap(), 5_000_000);
}

#[test]
fn test_fractional_vnd_rejected() {
    assert!(Currency::VND.to_minor_units(dec!(50000.5)).is_err());
}

proptest! {
    #[test]
    fn test_is_fully_paid_formula(
        total in 0i64..10_000_000,
        rows in prop::collection::vec((1i64..5_000_000, status_strategy()), 0..8)
    ) {
        let payments: Vec<Payment> = rows
            .iter()
            .map(|(amount, status)| payment(Decimal::from(*amount), PaymentMethod::Cash, *status))
            .collect();

        let completed_sum: i64 = rows
            .iter()
            .filter(|(_, status)| *status == PaymentStatus::Completed)
            .map(|(amount, _)| *amount)
            .sum();

        let settlement = Settlement::compute(Decimal::from(total), &payments);
        prop_assert_eq!(settlement.is_fully_paid, total > 0 && completed_sum >= total);
        prop_assert_eq!(settlement.total_paid, Decimal::from(completed_sum));
        prop_assert!(settlement.balance >= Decimal::ZERO);
    }

    #[test]
    fn test_cash_always_completed_with_timestamp(amount in 1i64..1_000_000_000) {
        let payment = Payment::cash(None, "O1".to_string(), Decimal::from(amount), None).unwrap();
        prop_assert_eq!(payment.status, PaymentStatus::Completed);
        prop_assert!(payment.payment_date.is_some());
    }

    #[test]
    fn test_minor_unit_conversion_is_exact(amount in 1i64..10_000_000_000_000) {
        let minor = Currency::VND.to_minor_units(Decimal::from(amount)).unwrap();
        prop_assert_eq!(minor, amount * 100);
    }
}
