//! `SeaORM` active enums mirroring the Postgres enum types, with conversions
//! to and from the domain enums in `coopledger-core`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use coopledger_core::batch::BalanceStatus;
use coopledger_core::ledger::{
    AccountKind as DomainAccountKind, AccountTransactionSource as DomainAccountTransactionSource,
    GeneralLedgerType as DomainGeneralLedgerType, LedgerSource as DomainLedgerSource,
    PaymentKind as DomainPaymentKind,
};
use coopledger_core::voucher::{
    CashCheckVoucherStatus as DomainCashCheckVoucherStatus,
    JournalVoucherStatus as DomainJournalVoucherStatus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "ledger_source")]
pub enum LedgerSource {
    #[sea_orm(string_value = "withdraw")]
    Withdraw,
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "journal")]
    Journal,
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
    #[sea_orm(string_value = "journal-voucher")]
    JournalVoucher,
    #[sea_orm(string_value = "check-voucher")]
    CheckVoucher,
    #[sea_orm(string_value = "loan")]
    Loan,
    #[sea_orm(string_value = "savings-interest")]
    SavingsInterest,
    #[sea_orm(string_value = "mutual-contribution")]
    MutualContribution,
    #[sea_orm(string_value = "disbursement")]
    Disbursement,
    #[sea_orm(string_value = "blotter")]
    Blotter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_transaction_source")]
pub enum AccountTransactionSource {
    #[sea_orm(string_value = "daily-collection-book")]
    DailyCollectionBook,
    #[sea_orm(string_value = "cash-check-disbursement-book")]
    CashCheckDisbursementBook,
    #[sea_orm(string_value = "general-journal")]
    GeneralJournal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_kind")]
pub enum PaymentKind {
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "online")]
    Online,
    #[sea_orm(string_value = "adjustment")]
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "general_ledger_type")]
pub enum GeneralLedgerType {
    #[sea_orm(string_value = "assets")]
    Assets,
    #[sea_orm(string_value = "liabilities")]
    Liabilities,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "expenses")]
    Expenses,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_kind")]
pub enum AccountKind {
    #[sea_orm(string_value = "deposit")]
    Deposit,
    #[sea_orm(string_value = "loan")]
    Loan,
    #[sea_orm(string_value = "fines")]
    Fines,
    #[sea_orm(string_value = "other")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cash_check_voucher_status")]
pub enum CashCheckVoucherStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "printed")]
    Printed,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "released")]
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_voucher_status")]
pub enum JournalVoucherStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "posted")]
    Posted,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "batch_balance_status")]
pub enum BatchBalanceStatus {
    #[sea_orm(string_value = "balanced")]
    Balanced,
    #[sea_orm(string_value = "balance overage")]
    BalanceOverage,
    #[sea_orm(string_value = "balance shortage")]
    BalanceShortage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "remittance_kind")]
pub enum RemittanceKind {
    #[sea_orm(string_value = "check")]
    Check,
    #[sea_orm(string_value = "online")]
    Online,
}

/// Generates `From` impls in both directions between a column enum and its
/// domain counterpart, variant by variant.
macro_rules! mirror_enum {
    ($column:ident <=> $domain:ident { $($variant:ident => $domain_variant:ident),+ $(,)? }) => {
        impl From<$domain> for $column {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$domain_variant => Self::$variant,)+
                }
            }
        }

        impl From<$column> for $domain {
            fn from(value: $column) -> Self {
                match value {
                    $($column::$variant => $domain::$domain_variant,)+
                }
            }
        }
    };
}

mirror_enum!(LedgerSource <=> DomainLedgerSource {
    Withdraw => Withdraw,
    Deposit => Deposit,
    Journal => Journal,
    Payment => Payment,
    Adjustment => Adjustment,
    JournalVoucher => JournalVoucher,
    CheckVoucher => CheckVoucher,
    Loan => Loan,
    SavingsInterest => SavingsInterest,
    MutualContribution => MutualContribution,
    Disbursement => Disbursement,
    Blotter => Blotter,
});

mirror_enum!(AccountTransactionSource <=> DomainAccountTransactionSource {
    DailyCollectionBook => DailyCollectionBook,
    CashCheckDisbursementBook => CashCheckDisbursementBook,
    GeneralJournal => GeneralJournal,
});

mirror_enum!(PaymentKind <=> DomainPaymentKind {
    Cash => Cash,
    Check => Check,
    Online => Online,
    Adjustment => Adjustment,
});

mirror_enum!(GeneralLedgerType <=> DomainGeneralLedgerType {
    Assets => Assets,
    Liabilities => Liabilities,
    Equity => Equity,
    Revenue => Revenue,
    Expenses => Expenses,
});

mirror_enum!(AccountKind <=> DomainAccountKind {
    Deposit => Deposit,
    Loan => Loan,
    Fines => Fines,
    Other => Other,
});

mirror_enum!(CashCheckVoucherStatus <=> DomainCashCheckVoucherStatus {
    Pending => Pending,
    Printed => Printed,
    Approved => Approved,
    Released => Released,
});

mirror_enum!(JournalVoucherStatus <=> DomainJournalVoucherStatus {
    Draft => Draft,
    Posted => Posted,
    Cancelled => Cancelled,
});

mirror_enum!(BatchBalanceStatus <=> BalanceStatus {
    Balanced => Balanced,
    BalanceOverage => Overage,
    BalanceShortage => Shortage,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_source_values_match_domain() {
        for source in DomainLedgerSource::ALL {
            let column = LedgerSource::from(source);
            assert_eq!(column.to_value(), source.as_str());
            assert_eq!(DomainLedgerSource::from(column), source);
        }
    }

    #[test]
    fn test_balance_status_values_match_domain() {
        for status in [BalanceStatus::Balanced, BalanceStatus::Overage, BalanceStatus::Shortage] {
            assert_eq!(BatchBalanceStatus::from(status).to_value(), status.as_str());
        }
    }
}
