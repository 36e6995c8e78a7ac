//! Integration tests for the general ledger read paths.
//!
//! These tests require a running PostgreSQL database and skip otherwise.

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use coopledger_core::ledger::{
    AccountTransactionSource, BalanceScope, LedgerError, LedgerSource, PostingHeader, PostingLine,
};
use coopledger_db::entities::sea_orm_active_enums::LedgerSource as StoredSource;
use coopledger_shared::types::LedgerEntryId;

use common::{connect, deposit_lines, services, setup};

#[tokio::test]
async fn test_member_statement_leaves_out_cash_on_hand() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);

    let header = PostingHeader::new(LedgerSource::Deposit, Utc::now().date_naive(), fx.teller)
        .with_description("Savings deposit");
    repos
        .posting
        .post(fx.tenant, header.clone(), deposit_lines(&fx, dec!(100)))
        .await
        .unwrap();
    repos
        .posting
        .post(fx.tenant, header, deposit_lines(&fx, dec!(40)))
        .await
        .unwrap();

    let statement = repos
        .ledger
        .member_statement(fx.tenant, fx.member, None)
        .await
        .unwrap();
    assert_eq!(statement.len(), 2);
    assert!(statement.iter().all(|line| line.account_id == fx.savings));
    assert!(statement.iter().all(|line| line.tenant == fx.tenant));
    assert!(statement.iter().all(|line| line.status.is_active()));
    assert_eq!(statement.last().map(|line| line.balance), Some(dec!(140)));
    assert_eq!(statement.last().map(|line| line.balance_version), Some(2));

    let totals = repos
        .ledger
        .member_totals(fx.tenant, fx.member, fx.savings)
        .await
        .unwrap();
    assert_eq!(totals.balance, dec!(140));
    assert_eq!(totals.total_credit, dec!(140));
    assert_eq!(totals.total_debit, Decimal::ZERO);

    let printed = repos
        .ledger
        .max_print_number(fx.tenant, fx.member, fx.savings)
        .await
        .unwrap();
    assert_eq!(printed, 0);
}

#[tokio::test]
async fn test_print_numbers_run_per_member_account() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);

    let header = PostingHeader::new(LedgerSource::Deposit, Utc::now().date_naive(), fx.teller);
    let mut member_lines = Vec::new();
    let mut cash_line = None;
    for amount in [dec!(100), dec!(40)] {
        let posted = repos
            .posting
            .post(fx.tenant, header.clone(), deposit_lines(&fx, amount))
            .await
            .unwrap();
        for line in posted.entries {
            if line.member_profile_id.is_some() {
                member_lines.push(LedgerEntryId::from(line.id));
            } else {
                cash_line = Some(LedgerEntryId::from(line.id));
            }
        }
    }
    assert_eq!(member_lines.len(), 2);

    let first = repos.ledger.assign_print_number(fx.tenant, member_lines[0]).await.unwrap();
    let second = repos.ledger.assign_print_number(fx.tenant, member_lines[1]).await.unwrap();
    assert_eq!((first, second), (1, 2));
    assert_eq!(
        repos.ledger.max_print_number(fx.tenant, fx.member, fx.savings).await.unwrap(),
        2
    );

    let statement = repos.ledger.member_statement(fx.tenant, fx.member, None).await.unwrap();
    let numbers: Vec<i32> = statement.iter().map(|line| line.print_number).collect();
    assert_eq!(numbers, vec![1, 2]);

    let cash_line = cash_line.expect("deposit has a cash line");
    let err = repos.ledger.assign_print_number(fx.tenant, cash_line).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotAMemberEntry(_)));

    let err = repos
        .ledger
        .assign_print_number(fx.tenant, LedgerEntryId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::EntryNotFound(_)));
}

#[tokio::test]
async fn test_daily_book_picks_its_sources() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);
    let today = Utc::now().date_naive();

    repos
        .posting
        .post(
            fx.tenant,
            PostingHeader::new(LedgerSource::Deposit, today, fx.teller),
            deposit_lines(&fx, dec!(25)),
        )
        .await
        .unwrap();
    repos
        .posting
        .post(
            fx.tenant,
            PostingHeader::new(LedgerSource::Journal, today, fx.teller),
            vec![
                PostingLine::debit(fx.expense, dec!(5)),
                PostingLine::credit(fx.cash_on_hand, dec!(5)),
            ],
        )
        .await
        .unwrap();

    let collection = repos
        .ledger
        .daily_book(fx.tenant, AccountTransactionSource::DailyCollectionBook, Utc::now())
        .await
        .unwrap();
    assert_eq!(collection.len(), 2);
    assert!(collection.iter().all(|line| line.source == StoredSource::Deposit));

    let journal = repos
        .ledger
        .daily_book(fx.tenant, AccountTransactionSource::GeneralJournal, Utc::now())
        .await
        .unwrap();
    assert_eq!(journal.len(), 2);
}

#[tokio::test]
async fn test_daily_balances_carry_forward() {
    let Some(db) = connect().await else { return };
    let fx = setup(&db).await.expect("setup failed");
    let repos = services(&db);
    let today = Utc::now().date_naive();

    repos
        .posting
        .post(
            fx.tenant,
            PostingHeader::new(LedgerSource::Deposit, today, fx.teller),
            deposit_lines(&fx, dec!(60)),
        )
        .await
        .unwrap();

    let scope = repos.ledger.cash_on_hand_scope(fx.tenant).await.unwrap();
    assert_eq!(scope, BalanceScope::cash_on_hand(fx.tenant, fx.cash_on_hand));

    let yesterday = today - Duration::days(1);
    let balances = repos.ledger.daily_balances(&scope, yesterday, today).await.unwrap();
    assert_eq!(balances, vec![(yesterday, Decimal::ZERO), (today, dec!(60))]);
}
