// Gateway return handling
//
// Only verified callbacks change state, a transaction reference is applied
// at most once, and stale pending payments are reaped.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use helpers::*;
use rust_decimal_macros::dec;
use settlepay::core::AppError;
use settlepay::modules::bills::{Bill, BillStatus};
use settlepay::modules::gateways::models::GatewayProvider;
use settlepay::modules::orders::OrderType;
use settlepay::modules::payments::services::payment_service::EXPIRED_NOTE;
use settlepay::modules::payments::services::{CheckoutRequest, CheckoutResponse, ReturnOutcome};
use settlepay::modules::payments::models::UpdatePaymentRequest;
use settlepay::modules::payments::{Payment, PaymentMethod, PaymentStatus, PendingPaymentSweeper};

/// Bill of 500000 with 200000 already paid in cash, and a VNPay checkout for the rest
async fn bill_with_pending_checkout(ctx: &TestContext) -> (Bill, CheckoutResponse) {
    let order = ctx.seed_order(OrderType::Sale, 500000).await;
    let bill = ctx.seed_bill(&[&order.id], 500000).await;
    ctx.seed_payment(
        Some(&bill.id),
        &order.id,
        200000,
        PaymentMethod::Cash,
        PaymentStatus::Completed,
    );

    let checkout = ctx
        .payments
        .initiate_gateway_checkout(
            GatewayProvider::Vnpay,
            CheckoutRequest {
                bill_id: Some(bill.id.clone()),
                order_id: Some(order.id.clone()),
                ..Default::default()
            },
            "10.0.0.7",
        )
        .await
        .unwrap();

    (bill, checkout)
}

#[tokio::test]
async fn test_success_completes_payment_and_settles_bill() {
    let ctx = TestContext::new();
    let (bill, checkout) = bill_with_pending_checkout(&ctx).await;

    let params = signed_vnpay_return(&checkout.transaction_ref, 30_000_000, "00");
    let outcome = ctx
        .payments
        .handle_gateway_return(GatewayProvider::Vnpay, &params)
        .await
        .unwrap();

    assert!(!outcome.is_duplicate());
    let payment = outcome.payment();
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert!(payment.payment_date.is_some());

    let bill = ctx.bills.get(&bill.id).await.unwrap();
    assert_eq!(bill.status, BillStatus::Paid);

    let settlement = ctx.bills.settlement(&bill.id).await.unwrap();
    assert!(settlement.is_fully_paid);
    assert_eq!(settlement.total_paid, dec!(500000));
}

#[tokio::test]
async fn test_duplicate_delivery_applies_once() {
    let ctx = TestContext::new();
    let (bill, checkout) = bill_with_pending_checkout(&ctx).await;
    let params = signed_vnpay_return(&checkout.transaction_ref, 30_000_000, "00");

    let first = ctx
        .payments
        .handle_gateway_return(GatewayProvider::Vnpay, &params)
        .await
        .unwrap();
    let second = ctx
        .payments
        .handle_gateway_return(GatewayProvider::Vnpay, &params)
        .await
        .unwrap();

    assert!(matches!(first, ReturnOutcome::Applied { .. }));
    assert!(matches!(second, ReturnOutcome::Duplicate { .. }));
    assert_eq!(second.payment().payment_date, first.payment().payment_date);

    let settlement = ctx.bills.settlement(&bill.id).await.unwrap();
    assert_eq!(settlement.total_paid, dec!(500000));
    assert_eq!(settlement.completed_payments, 2);
}

#[tokio::test]
async fn test_concurrent_duplicates_apply_once() {
    let ctx = TestContext::new();
    let (bill, checkout) = bill_with_pending_checkout(&ctx).await;
    let params = signed_vnpay_return(&checkout.transaction_ref, 30_000_000, "00");

    let service = ctx.payments.clone();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            let params = params.clone();
            tokio::spawn(async move {
                service
                    .handle_gateway_return(GatewayProvider::Vnpay, &params)
                    .await
            })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        if !handle.await.unwrap().unwrap().is_duplicate() {
            applied += 1;
        }
    }

    assert_eq!(applied, 1);
    let settlement = ctx.bills.settlement(&bill.id).await.unwrap();
    assert_eq!(settlement.total_paid, dec!(500000));
}

#[tokio::test]
async fn test_tampered_callback_leaves_payment_pending() {
    let ctx = TestContext::new();
    let (bill, checkout) = bill_with_pending_checkout(&ctx).await;

    let mut params = signed_vnpay_return(&checkout.transaction_ref, 30_000_000, "24");
    params.insert("vnp_ResponseCode", "00");

    let err = ctx
        .payments
        .handle_gateway_return(GatewayProvider::Vnpay, &params)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SignatureMismatch(_)));
    assert_eq!(err.public_message(), "Payment verification failed");

    let payment = ctx.payments.get(&checkout.payment_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(ctx.bills.get(&bill.id).await.unwrap().status, BillStatus::Pending);
}

#[tokio::test]
async fn test_missing_signature_rejected() {
    let ctx = TestContext::new();
    let (_, checkout) = bill_with_pending_checkout(&ctx).await;

    let mut params = signed_vnpay_return(&checkout.transaction_ref, 30_000_000, "00");
    params.remove("vnp_SecureHash");

    let err = ctx
        .payments
        .handle_gateway_return(GatewayProvider::Vnpay, &params)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SignatureMismatch(_)));
}

#[tokio::test]
async fn test_failure_code_marks_payment_failed() {
    let ctx = TestContext::new();
    let (bill, checkout) = bill_with_pending_checkout(&ctx).await;

    let params = signed_vnpay_return(&checkout.transaction_ref, 30_000_000, "24");
    let outcome = ctx
        .payments
        .handle_gateway_return(GatewayProvider::Vnpay, &params)
        .await
        .unwrap();

    let payment = outcome.payment();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert!(payment.payment_date.is_none());
    assert_eq!(payment.notes.as_deref(), Some("vnpay response code 24"));

    let settlement = ctx.bills.settlement(&bill.id).await.unwrap();
    assert_eq!(settlement.total_paid, dec!(200000));
    assert_eq!(ctx.bills.get(&bill.id).await.unwrap().status, BillStatus::Pending);
}

#[tokio::test]
async fn test_amount_mismatch_is_rejected_without_change() {
    let ctx = TestContext::new();
    let (_, checkout) = bill_with_pending_checkout(&ctx).await;

    let params = signed_vnpay_return(&checkout.transaction_ref, 100, "00");
    let err = ctx
        .payments
        .handle_gateway_return(GatewayProvider::Vnpay, &params)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    let payment = ctx.payments.get(&checkout.payment_id).await.unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_unknown_transaction_is_not_found() {
    let ctx = TestContext::new();
    let params = signed_vnpay_return("nope-20251101100405", 100, "00");

    let err = ctx
        .payments
        .handle_gateway_return(GatewayProvider::Vnpay, &params)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_gateway_payment_cannot_be_completed_by_admin() {
    let ctx = TestContext::new();
    let (_, checkout) = bill_with_pending_checkout(&ctx).await;

    let err = ctx
        .payments
        .update(
            &checkout.payment_id,
            UpdatePaymentRequest {
                status: Some(PaymentStatus::Completed),
                notes: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_sweeper_expires_stale_pending_payments() {
    let ctx = TestContext::new();
    let order = ctx.seed_order(OrderType::Sale, 500000).await;

    let mut stale = Payment::gateway_pending(
        None,
        order.id.clone(),
        dec!(500000),
        GatewayProvider::Vnpay,
        format!("{}-20250101000000", order.id),
    )
    .unwrap();
    stale.created_at = Utc::now() - chrono::Duration::hours(2);
    ctx.store.put_payment(stale.clone());

    let fresh = Payment::gateway_pending(
        None,
        order.id.clone(),
        dec!(500000),
        GatewayProvider::Vnpay,
        format!("{}-20250101000001", order.id),
    )
    .unwrap();
    ctx.store.put_payment(fresh.clone());

    let sweeper = PendingPaymentSweeper::new(
        ctx.payments.clone(),
        ctx.locks.clone(),
        Duration::from_secs(60),
        chrono::Duration::minutes(60),
    );

    assert_eq!(sweeper.sweep().await, 1);

    let stale = ctx.payments.get(&stale.id).await.unwrap();
    assert_eq!(stale.status, PaymentStatus::Failed);
    assert_eq!(stale.notes.as_deref(), Some(EXPIRED_NOTE));
    assert_eq!(
        ctx.payments.get(&fresh.id).await.unwrap().status,
        PaymentStatus::Pending
    );

    // A late callback for the expired payment is a duplicate, not a credit
    let params = signed_vnpay_return(stale.transaction_id.as_deref().unwrap(), 50_000_000, "00");
    let outcome = ctx
        .payments
        .handle_gateway_return(GatewayProvider::Vnpay, &params)
        .await
        .unwrap();
    assert!(outcome.is_duplicate());

    assert_eq!(sweeper.sweep().await, 0);
    assert!(ctx.locks.is_empty());
}
