//! Integration tests for the Transaction Batch Aggregator.
//!
//! These tests require a running PostgreSQL database and skip otherwise.

mod common;

use chrono::Utc;
use rust_decimal_macros::dec;

use coopledger_core::batch::{BatchError, BatchSignOff, CashCount};
use coopledger_core::ledger::{LedgerSource, PostingHeader, PostingLine};
use coopledger_db::entities::sea_orm_active_enums::{BatchBalanceStatus, RemittanceKind};
use coopledger_db::repositories::{FundingInput, RemittanceInput};
use coopledger_shared::types::{TransactionBatchId, UserId};

use common::{Fixture, connect, deposit_lines, open_batch_input, services, setup};

fn sign_off() -> BatchSignOff {
    BatchSignOff {
        name: "Teller One".to_string(),
        position: "Teller".to_string(),
        signature_media_id: None,
    }
}

fn payment_lines(fx: &Fixture, amount: rust_decimal::Decimal) -> Vec<PostingLine> {
    vec![
        PostingLine::debit(fx.cash_on_hand, amount),
        PostingLine::credit(fx.savings, amount).for_member(fx.member),
    ]
}

#[tokio::test]
async fn test_one_open_batch_per_employee() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);

    let first = repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();
    let second = repos.batches.open(fx.tenant, open_batch_input(fx.teller), fx.teller).await;
    assert!(matches!(second, Err(BatchError::AlreadyOpen { .. })));

    let current = repos.batches.ensure_open(fx.tenant, fx.teller).await.unwrap();
    assert_eq!(current.id, first.id);

    let stranger = UserId::new();
    assert!(repos.batches.current(fx.tenant, stranger).await.unwrap().is_none());
    assert!(matches!(
        repos.batches.ensure_open(fx.tenant, stranger).await,
        Err(BatchError::NoOpenBatch(_))
    ));

    // Once closed, the employee may open a new one.
    repos
        .batches
        .close(fx.tenant, TransactionBatchId::from(first.id), sign_off(), fx.teller)
        .await
        .unwrap();
    let reopened = repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();
    assert_ne!(reopened.id, first.id);
}

#[tokio::test]
async fn test_balanced_teller_day() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);

    let batch = repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();
    let batch_id = TransactionBatchId::from(batch.id);

    repos
        .batches
        .add_funding(
            fx.tenant,
            batch_id,
            FundingInput {
                provided_by_user_id: None,
                name: Some("Vault".to_string()),
                description: None,
                amount: dec!(1000),
            },
            fx.teller,
        )
        .await
        .unwrap();

    let header = PostingHeader::new(LedgerSource::Payment, Utc::now().date_naive(), fx.teller).in_batch(batch_id);
    repos
        .posting
        .post(fx.tenant, header, payment_lines(&fx, dec!(500)))
        .await
        .unwrap();

    repos
        .batches
        .add_disbursement(fx.tenant, batch_id, Some("Snacks".to_string()), dec!(100), fx.teller)
        .await
        .unwrap();
    repos
        .batches
        .add_remittance(
            fx.tenant,
            batch_id,
            RemittanceInput {
                kind: RemittanceKind::Check,
                reference_number: Some("CHK-1".to_string()),
                amount: dec!(200),
            },
            fx.teller,
        )
        .await
        .unwrap();
    let live = repos
        .batches
        .add_cash_count(
            fx.tenant,
            batch_id,
            CashCount {
                bill_amount: dec!(100),
                quantity: 12,
            },
            fx.teller,
        )
        .await
        .unwrap();

    // handled 1500, supposed 1400, actual 200 + 1200.
    assert_eq!(live.total_cash_collection, dec!(500));
    assert_eq!(live.beginning_balance, dec!(1000));
    assert_eq!(live.total_cash_handled, dec!(1500));
    assert_eq!(live.petty_cash, dec!(100));
    assert_eq!(live.total_supposed_remittance, dec!(1400));
    assert_eq!(live.total_actual_remittance, dec!(1400));
    assert_eq!(live.balance_status, Some(BatchBalanceStatus::Balanced));

    let closed = repos
        .batches
        .close(fx.tenant, batch_id, sign_off(), fx.teller)
        .await
        .unwrap();
    assert!(closed.is_closed);
    assert!(closed.ended_at.is_some());
    assert_eq!(closed.employee_by_name.as_deref(), Some("Teller One"));
    assert_eq!(closed.total_actual_supposed_comparison, dec!(0));

    let today = repos.batches.closed_today(fx.tenant, Utc::now()).await.unwrap();
    assert!(today.iter().any(|b| b.id == batch.id));

    let err = repos
        .batches
        .add_funding(
            fx.tenant,
            batch_id,
            FundingInput {
                provided_by_user_id: None,
                name: None,
                description: None,
                amount: dec!(1),
            },
            fx.teller,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::BatchClosed(_)));
}

#[tokio::test]
async fn test_short_drawer_is_flagged() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);

    let batch = repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();
    let batch_id = TransactionBatchId::from(batch.id);

    let header = PostingHeader::new(LedgerSource::Payment, Utc::now().date_naive(), fx.teller).in_batch(batch_id);
    repos
        .posting
        .post(fx.tenant, header, payment_lines(&fx, dec!(300)))
        .await
        .unwrap();
    repos
        .batches
        .add_cash_count(
            fx.tenant,
            batch_id,
            CashCount {
                bill_amount: dec!(50),
                quantity: 5,
            },
            fx.teller,
        )
        .await
        .unwrap();

    let closed = repos
        .batches
        .close(fx.tenant, batch_id, sign_off(), fx.teller)
        .await
        .unwrap();
    assert_eq!(closed.total_actual_supposed_comparison, dec!(-50));
    assert_eq!(closed.balance_status, Some(BatchBalanceStatus::BalanceShortage));
}

#[tokio::test]
async fn test_deposits_outside_batch_are_not_counted() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);

    let batch = repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();
    let batch_id = TransactionBatchId::from(batch.id);

    let loose = PostingHeader::new(LedgerSource::Deposit, Utc::now().date_naive(), fx.teller);
    repos
        .posting
        .post(fx.tenant, loose, deposit_lines(&fx, dec!(40)))
        .await
        .unwrap();
    let stamped = PostingHeader::new(LedgerSource::Deposit, Utc::now().date_naive(), fx.teller).in_batch(batch_id);
    repos
        .posting
        .post(fx.tenant, stamped, deposit_lines(&fx, dec!(60)))
        .await
        .unwrap();

    let totals = repos.batches.recompute(fx.tenant, batch_id).await.unwrap();
    assert_eq!(totals.total_deposit_entry, dec!(60));
    assert_eq!(totals.total_cash_collection, dec!(0));
}

#[tokio::test]
async fn test_negative_inputs_rejected() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);

    let batch = repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();
    let batch_id = TransactionBatchId::from(batch.id);

    let err = repos
        .batches
        .record_deposit_in_bank(fx.tenant, batch_id, dec!(-1), fx.teller)
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::NegativeDeposit));

    let err = repos
        .batches
        .add_cash_count(
            fx.tenant,
            batch_id,
            CashCount {
                bill_amount: dec!(20),
                quantity: -1,
            },
            fx.teller,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::NegativeQuantity));

    let err = repos
        .batches
        .add_cash_count(
            fx.tenant,
            batch_id,
            CashCount {
                bill_amount: dec!(-20),
                quantity: 3,
            },
            fx.teller,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::NegativeAmount { input: "cash count bill" }));

    let err = repos
        .batches
        .add_funding(
            fx.tenant,
            batch_id,
            FundingInput {
                provided_by_user_id: None,
                name: None,
                description: None,
                amount: dec!(-500),
            },
            fx.teller,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::NegativeAmount { input: "funding" }));

    let err = repos
        .batches
        .add_remittance(
            fx.tenant,
            batch_id,
            RemittanceInput {
                kind: RemittanceKind::Online,
                reference_number: None,
                amount: dec!(-75),
            },
            fx.teller,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::NegativeAmount { input: "remittance" }));

    let err = repos
        .batches
        .add_disbursement(fx.tenant, batch_id, None, dec!(-10), fx.teller)
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::NegativeAmount { input: "disbursement" }));

    let untouched = repos.batches.get(fx.tenant, batch_id).await.unwrap();
    assert_eq!(untouched.beginning_balance, rust_decimal::Decimal::ZERO);
    assert_eq!(untouched.cash_count_total, rust_decimal::Decimal::ZERO);
    assert_eq!(untouched.petty_cash, rust_decimal::Decimal::ZERO);

    let updated = repos
        .batches
        .record_deposit_in_bank(fx.tenant, batch_id, dec!(250), fx.teller)
        .await
        .unwrap();
    assert_eq!(updated.deposit_in_bank, dec!(250));
    assert_eq!(updated.total_cash_handled, dec!(250));
    assert_eq!(updated.total_actual_remittance, dec!(250));
}

#[tokio::test]
async fn test_supervisor_view_gate() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);
    let supervisor = UserId::new();

    let batch = repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();
    let batch_id = TransactionBatchId::from(batch.id);

    let err = repos
        .batches
        .request_view(fx.tenant, batch_id, fx.teller)
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::StillOpen(_)));

    repos
        .batches
        .close(fx.tenant, batch_id, sign_off(), fx.teller)
        .await
        .unwrap();

    let err = repos
        .batches
        .grant_view(fx.tenant, batch_id, supervisor)
        .await
        .unwrap_err();
    assert!(matches!(err, BatchError::ViewNotRequested(_)));

    let requested = repos.batches.request_view(fx.tenant, batch_id, fx.teller).await.unwrap();
    assert!(requested.request_view && !requested.can_view);
    let pending = repos.batches.pending_view(fx.tenant).await.unwrap();
    assert!(pending.iter().any(|b| b.id == batch.id));

    let granted = repos.batches.grant_view(fx.tenant, batch_id, supervisor).await.unwrap();
    assert!(granted.can_view);
    let pending = repos.batches.pending_view(fx.tenant).await.unwrap();
    assert!(pending.iter().all(|b| b.id != batch.id));
}
