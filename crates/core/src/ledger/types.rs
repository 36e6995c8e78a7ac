//! Ledger classification types.
//!
//! Sources say which business event produced a general ledger line; books say
//! which daily register that line is reported under.

use serde::{Deserialize, Serialize};

/// The business event that produced a general ledger line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerSource {
    /// Savings withdrawal at the teller.
    Withdraw,
    /// Savings deposit at the teller.
    Deposit,
    /// Direct journal posting.
    Journal,
    /// Member payment (loan amortization, fees, share capital).
    Payment,
    /// Adjustment entry.
    Adjustment,
    /// Released journal voucher.
    JournalVoucher,
    /// Released cash check voucher.
    CheckVoucher,
    /// Loan release.
    Loan,
    /// Savings interest computation.
    SavingsInterest,
    /// Mutual aid contribution.
    MutualContribution,
    /// Petty cash disbursement.
    Disbursement,
    /// Blotter entry.
    Blotter,
}

impl LedgerSource {
    /// All sources, in declaration order.
    pub const ALL: [Self; 12] = [
        Self::Withdraw,
        Self::Deposit,
        Self::Journal,
        Self::Payment,
        Self::Adjustment,
        Self::JournalVoucher,
        Self::CheckVoucher,
        Self::Loan,
        Self::SavingsInterest,
        Self::MutualContribution,
        Self::Disbursement,
        Self::Blotter,
    ];

    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Withdraw => "withdraw",
            Self::Deposit => "deposit",
            Self::Journal => "journal",
            Self::Payment => "payment",
            Self::Adjustment => "adjustment",
            Self::JournalVoucher => "journal-voucher",
            Self::CheckVoucher => "check-voucher",
            Self::Loan => "loan",
            Self::SavingsInterest => "savings-interest",
            Self::MutualContribution => "mutual-contribution",
            Self::Disbursement => "disbursement",
            Self::Blotter => "blotter",
        }
    }

    /// Parses the persisted representation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|source| source.as_str() == value)
    }

    /// The daily book lines of this source are reported under, if any.
    #[must_use]
    pub const fn book(self) -> Option<AccountTransactionSource> {
        match self {
            Self::Payment | Self::Deposit => Some(AccountTransactionSource::DailyCollectionBook),
            Self::Withdraw | Self::CheckVoucher | Self::Loan => {
                Some(AccountTransactionSource::CashCheckDisbursementBook)
            }
            Self::JournalVoucher | Self::Adjustment | Self::Journal => {
                Some(AccountTransactionSource::GeneralJournal)
            }
            Self::SavingsInterest | Self::MutualContribution | Self::Disbursement | Self::Blotter => {
                None
            }
        }
    }
}

impl std::fmt::Display for LedgerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily book an account transaction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountTransactionSource {
    /// Teller collections: payments and deposits.
    DailyCollectionBook,
    /// Cash and check outflows: withdrawals, check vouchers, loan releases.
    CashCheckDisbursementBook,
    /// Journal vouchers, adjustments and direct journals.
    GeneralJournal,
}

impl AccountTransactionSource {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DailyCollectionBook => "daily-collection-book",
            Self::CashCheckDisbursementBook => "cash-check-disbursement-book",
            Self::GeneralJournal => "general-journal",
        }
    }

    /// The ledger sources whose lines appear in this book.
    #[must_use]
    pub fn sources(self) -> Vec<LedgerSource> {
        LedgerSource::ALL
            .into_iter()
            .filter(|source| source.book() == Some(self))
            .collect()
    }
}

/// How a teller line was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    /// Cash over the counter.
    Cash,
    /// Check.
    Check,
    /// Online transfer.
    Online,
    /// Book adjustment.
    Adjustment,
}

impl PaymentKind {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Check => "check",
            Self::Online => "online",
            Self::Adjustment => "adjustment",
        }
    }
}

/// General ledger classification of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneralLedgerType {
    /// Resources owned.
    Assets,
    /// Obligations owed.
    Liabilities,
    /// Members' equity and share capital.
    Equity,
    /// Income.
    Revenue,
    /// Costs.
    Expenses,
}

/// Whether balances on an account are tracked per member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountKind {
    /// Member deposit accounts (savings, time deposit, share capital).
    Deposit,
    /// Member loan accounts.
    Loan,
    /// Fines, fees and other member-tracked receivables.
    Fines,
    /// Not tracked per member.
    Other,
}

impl AccountKind {
    /// Returns true when running balances are kept per member on this account.
    #[must_use]
    pub const fn is_member_scoped(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Role an account plays for a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamedAccount {
    /// The branch's cash-on-hand account.
    CashOnHand,
}
