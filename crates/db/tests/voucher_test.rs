//! Integration tests for journal and cash check voucher lifecycles.
//!
//! These tests require a running PostgreSQL database and skip otherwise.

mod common;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};

use coopledger_core::ledger::BalanceScope;
use coopledger_core::voucher::{Actor, Signatory, SignatoryRole, StageFilter, VoucherError, VoucherStage};
use coopledger_db::entities::journal_vouchers;
use coopledger_db::entities::sea_orm_active_enums::{
    CashCheckVoucherStatus, JournalVoucherStatus, LedgerSource as StoredSource,
};
use coopledger_db::repositories::{LedgerFilter, NewCashCheckVoucher, NewJournalVoucher, VoucherEntryInput};
use coopledger_shared::types::{
    AccountId, CashCheckVoucherId, Currency, JournalVoucherId, TransactionBatchId, UserId,
};

use common::{Fixture, connect, open_batch_input, services, setup};

fn entry(account_id: AccountId, debit: Decimal, credit: Decimal) -> VoucherEntryInput {
    VoucherEntryInput {
        account_id,
        member_profile_id: None,
        employee_user_id: None,
        loan_transaction_id: None,
        debit,
        credit,
        description: None,
    }
}

fn supplies(fx: &Fixture, amount: Decimal) -> Vec<VoucherEntryInput> {
    vec![
        entry(fx.expense, amount, Decimal::ZERO),
        entry(fx.cash_on_hand, Decimal::ZERO, amount),
    ]
}

fn new_journal() -> NewJournalVoucher {
    NewJournalVoucher {
        voucher_number: Some("JV-1001".to_string()),
        voucher_date: Utc::now().date_naive(),
        description: Some("Office supplies".to_string()),
        reference: None,
        currency: Currency::default(),
    }
}

fn teller(fx: &Fixture) -> Actor {
    Actor {
        user_id: fx.teller,
        name: Some("Teller One".to_string()),
        position: Some("Teller".to_string()),
        signature_media_id: None,
    }
}

#[tokio::test]
async fn test_journal_voucher_full_lifecycle() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);
    let actor = teller(&fx);
    let batch = repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();

    // Drafts may be unbalanced.
    let draft = repos
        .journal
        .create(fx.tenant, new_journal(), vec![entry(fx.expense, dec!(75), Decimal::ZERO)], fx.teller)
        .await
        .unwrap();
    let id = JournalVoucherId::from(draft.voucher.id);
    assert_eq!(draft.state().unwrap().stage(), VoucherStage::Draft);

    let err = repos.journal.print(fx.tenant, id, &actor).await.unwrap_err();
    assert!(matches!(err, VoucherError::Unbalanced { .. }));

    let fixed = repos
        .journal
        .replace_entries(fx.tenant, id, supplies(&fx, dec!(75)), fx.teller)
        .await
        .unwrap();
    assert_eq!(fixed.entries.len(), 2);
    assert_eq!(fixed.voucher.total_credit, dec!(75));

    let printed = repos.journal.print(fx.tenant, id, &actor).await.unwrap();
    assert_eq!(printed.voucher.print_count, 1);
    assert_eq!(printed.voucher.printed_by_name.as_deref(), Some("Teller One"));
    let reprinted = repos.journal.print(fx.tenant, id, &actor).await.unwrap();
    assert_eq!(reprinted.voucher.print_count, 2);
    assert_eq!(reprinted.voucher.printed_date, printed.voucher.printed_date);

    let err = repos
        .journal
        .replace_entries(fx.tenant, id, supplies(&fx, dec!(80)), fx.teller)
        .await
        .unwrap_err();
    assert!(matches!(err, VoucherError::EntriesFrozen { .. }));

    repos.journal.approve(fx.tenant, id, &actor).await.unwrap();
    let undone = repos.journal.undo_approve(fx.tenant, id, fx.teller).await.unwrap();
    assert_eq!(undone.state().unwrap().stage(), VoucherStage::Printed);
    repos.journal.approve(fx.tenant, id, &actor).await.unwrap();

    let released = repos.journal.release(fx.tenant, id, &actor).await.unwrap();
    assert_eq!(released.voucher.status, JournalVoucherStatus::Posted);
    assert_eq!(released.voucher.transaction_batch_id, Some(batch.id));
    assert_eq!(released.state().unwrap().stage(), VoucherStage::Released);

    let posted = repos
        .ledger
        .list_entries(
            fx.tenant,
            LedgerFilter {
                transaction_batch_id: Some(TransactionBatchId::from(batch.id)),
                ..LedgerFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(posted.len(), 2);
    assert!(posted.iter().all(|line| line.source == StoredSource::JournalVoucher));
    assert!(posted.iter().all(|line| line.journal_voucher_id == Some(released.voucher.id)));

    let cash = BalanceScope::cash_on_hand(fx.tenant, fx.cash_on_hand);
    let latest = repos.ledger.current_balance_for_read(&cash).await.unwrap().unwrap();
    assert_eq!(latest.balance, dec!(-75));

    let err = repos.journal.undo_approve(fx.tenant, id, fx.teller).await.unwrap_err();
    assert!(matches!(err, VoucherError::InvalidTransition { .. }));
    let err = repos.journal.release(fx.tenant, id, &actor).await.unwrap_err();
    assert!(matches!(err, VoucherError::InvalidTransition { .. }));

    let released_today = repos
        .journal
        .list(fx.tenant, StageFilter::ReleasedToday, Utc::now())
        .await
        .unwrap();
    assert!(released_today.iter().any(|v| v.id == released.voucher.id));
    let drafts = repos.journal.list(fx.tenant, StageFilter::Draft, Utc::now()).await.unwrap();
    assert!(drafts.iter().all(|v| v.id != released.voucher.id));
}

#[tokio::test]
async fn test_release_requires_open_batch() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);
    let actor = teller(&fx);

    let draft = repos
        .journal
        .create(fx.tenant, new_journal(), supplies(&fx, dec!(10)), fx.teller)
        .await
        .unwrap();
    let id = JournalVoucherId::from(draft.voucher.id);
    repos.journal.print(fx.tenant, id, &actor).await.unwrap();
    repos.journal.approve(fx.tenant, id, &actor).await.unwrap();

    let err = repos.journal.release(fx.tenant, id, &actor).await.unwrap_err();
    assert!(matches!(err, VoucherError::NoOpenBatch(user) if user == fx.teller.into_inner()));

    // The failed release left the voucher approved and nothing posted.
    let after = repos.journal.get(fx.tenant, id).await.unwrap();
    assert_eq!(after.state().unwrap().stage(), VoucherStage::Approved);
    assert_eq!(after.voucher.status, JournalVoucherStatus::Draft);
    let cash = BalanceScope::cash_on_hand(fx.tenant, fx.cash_on_hand);
    assert!(repos.ledger.current_balance_for_read(&cash).await.unwrap().is_none());
}

#[tokio::test]
async fn test_release_with_unknown_currency_posts_nothing() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);
    let actor = teller(&fx);
    repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();

    let draft = repos
        .journal
        .create(fx.tenant, new_journal(), supplies(&fx, dec!(10)), fx.teller)
        .await
        .unwrap();
    let id = JournalVoucherId::from(draft.voucher.id);
    repos.journal.print(fx.tenant, id, &actor).await.unwrap();
    let approved = repos.journal.approve(fx.tenant, id, &actor).await.unwrap();

    let mut corrupted: journal_vouchers::ActiveModel = approved.voucher.into();
    corrupted.currency = Set("XYZ".to_string());
    corrupted.update(&db).await.unwrap();

    let err = repos.journal.release(fx.tenant, id, &actor).await.unwrap_err();
    assert!(matches!(
        err,
        VoucherError::InvalidCurrency { voucher_id, ref code } if voucher_id == id.into_inner() && code == "XYZ"
    ));

    let after = repos.journal.get(fx.tenant, id).await.unwrap();
    assert_eq!(after.state().unwrap().stage(), VoucherStage::Approved);
    let cash = BalanceScope::cash_on_hand(fx.tenant, fx.cash_on_hand);
    assert!(repos.ledger.current_balance_for_read(&cash).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancel_only_from_draft() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);
    let actor = teller(&fx);

    let draft = repos
        .journal
        .create(fx.tenant, new_journal(), supplies(&fx, dec!(10)), fx.teller)
        .await
        .unwrap();
    let id = JournalVoucherId::from(draft.voucher.id);
    let cancelled = repos.journal.cancel(fx.tenant, id, fx.teller).await.unwrap();
    assert_eq!(cancelled.status, JournalVoucherStatus::Cancelled);

    let err = repos.journal.print(fx.tenant, id, &actor).await.unwrap_err();
    assert!(matches!(err, VoucherError::Cancelled(_)));
    let listed = repos.journal.list(fx.tenant, StageFilter::Draft, Utc::now()).await.unwrap();
    assert!(listed.iter().all(|v| v.id != cancelled.id));

    let printed = repos
        .journal
        .create(fx.tenant, new_journal(), supplies(&fx, dec!(10)), fx.teller)
        .await
        .unwrap();
    let printed_id = JournalVoucherId::from(printed.voucher.id);
    repos.journal.print(fx.tenant, printed_id, &actor).await.unwrap();
    let err = repos.journal.cancel(fx.tenant, printed_id, fx.teller).await.unwrap_err();
    assert!(matches!(err, VoucherError::EntriesFrozen { .. }));

    let undone = repos.journal.undo_print(fx.tenant, printed_id, fx.teller).await.unwrap();
    assert_eq!(undone.voucher.print_count, 0);
    assert!(undone.voucher.printed_by.is_none());
}

#[tokio::test]
async fn test_missing_voucher_is_not_found() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);

    let err = repos.journal.get(fx.tenant, JournalVoucherId::new()).await.unwrap_err();
    assert!(matches!(err, VoucherError::NotFound { .. }));
    let err = repos
        .cash_check
        .approve(fx.tenant, CashCheckVoucherId::new(), &teller(&fx))
        .await
        .unwrap_err();
    assert!(matches!(err, VoucherError::NotFound { .. }));
}

#[tokio::test]
async fn test_cash_check_voucher_release_feeds_batch() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);
    let actor = teller(&fx);
    let batch = repos
        .batches
        .open(fx.tenant, open_batch_input(fx.teller), fx.teller)
        .await
        .unwrap();

    let voucher = repos
        .cash_check
        .create(
            fx.tenant,
            NewCashCheckVoucher {
                voucher_number: Some("CV-2001".to_string()),
                pay_to: Some("Hardware Store".to_string()),
                check_number: None,
                check_date: None,
                description: None,
                currency: Currency::default(),
            },
            supplies(&fx, dec!(120)),
            fx.teller,
        )
        .await
        .unwrap();
    assert_eq!(voucher.voucher.status, CashCheckVoucherStatus::Pending);
    let id = CashCheckVoucherId::from(voucher.voucher.id);

    let printed = repos.cash_check.print(fx.tenant, id, &actor).await.unwrap();
    assert_eq!(printed.voucher.status, CashCheckVoucherStatus::Printed);

    let signed = repos
        .cash_check
        .assign_signatory(
            fx.tenant,
            id,
            SignatoryRole::Certified,
            Some(Signatory {
                name: "Branch Manager".to_string(),
                position: Some("Manager".to_string()),
                signature_media_id: None,
            }),
            UserId::new(),
        )
        .await
        .unwrap();
    assert_eq!(signed.signatories["certified"]["name"], "Branch Manager");

    let approved = repos.cash_check.approve(fx.tenant, id, &actor).await.unwrap();
    assert_eq!(approved.voucher.status, CashCheckVoucherStatus::Approved);
    let released = repos.cash_check.release(fx.tenant, id, &actor).await.unwrap();
    assert_eq!(released.voucher.status, CashCheckVoucherStatus::Released);
    assert_eq!(released.voucher.transaction_batch_id, Some(batch.id));
    assert_eq!(
        released.signatories().unwrap().get(SignatoryRole::Certified).map(|s| s.name.as_str()),
        Some("Branch Manager")
    );

    let batch = repos
        .batches
        .get(fx.tenant, TransactionBatchId::from(batch.id))
        .await
        .unwrap();
    assert_eq!(batch.cash_check_voucher_total, dec!(120));
}
