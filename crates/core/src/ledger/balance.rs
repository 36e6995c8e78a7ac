//! Running balance arithmetic and balance scopes.
//!
//! A scope identifies one running balance: `(organization, branch, account)`
//! optionally narrowed to one member. Every general ledger line stores the
//! balance of its scope right after the line was applied.

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use coopledger_shared::types::{AccountId, MemberProfileId, Tenant};

use crate::ledger::types::{AccountKind, GeneralLedgerType, NamedAccount};

/// Which side increases an account's balance.
///
/// - Assets/Expenses: balance += debit - credit (debit-normal)
/// - Liabilities/Equity/Revenue: balance += credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalSide {
    /// Debit-normal accounts (Assets, Expenses).
    DebitNormal,
    /// Credit-normal accounts (Liabilities, Equity, Revenue).
    CreditNormal,
}

impl NormalSide {
    /// Determines the normal side from the general ledger type.
    ///
    /// Lines without a classified account are treated as debit-normal.
    #[must_use]
    pub const fn for_type(general_ledger_type: Option<GeneralLedgerType>) -> Self {
        match general_ledger_type {
            Some(GeneralLedgerType::Liabilities | GeneralLedgerType::Equity | GeneralLedgerType::Revenue) => {
                Self::CreditNormal
            }
            Some(GeneralLedgerType::Assets | GeneralLedgerType::Expenses) | None => Self::DebitNormal,
        }
    }

    /// Calculates the balance change for a line.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::DebitNormal => debit - credit,
            Self::CreditNormal => credit - debit,
        }
    }
}

/// What a running balance is kept against within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScopeTarget {
    /// One member's position on a member-scoped account.
    MemberAccount {
        /// The account.
        account_id: AccountId,
        /// The member.
        member_profile_id: MemberProfileId,
    },
    /// The whole account, regardless of member.
    Subsidiary {
        /// The account.
        account_id: AccountId,
    },
    /// An account resolved through a branch role.
    Named {
        /// The role the account plays.
        role: NamedAccount,
        /// The account currently holding that role.
        account_id: AccountId,
    },
}

/// Identifies one running balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BalanceScope {
    /// Owning organization and branch.
    pub tenant: Tenant,
    /// Account (and member) within the tenant.
    pub target: ScopeTarget,
}

impl BalanceScope {
    /// The scope a posted line updates.
    ///
    /// Member-scoped accounts keep one balance per member; every other
    /// line updates the account-wide balance.
    #[must_use]
    pub const fn for_line(
        tenant: Tenant,
        account_id: AccountId,
        kind: AccountKind,
        member_profile_id: Option<MemberProfileId>,
    ) -> Self {
        let target = match member_profile_id {
            Some(member_profile_id) if kind.is_member_scoped() => ScopeTarget::MemberAccount {
                account_id,
                member_profile_id,
            },
            _ => ScopeTarget::Subsidiary { account_id },
        };
        Self { tenant, target }
    }

    /// Scope of a member's position on an account.
    #[must_use]
    pub const fn member(tenant: Tenant, account_id: AccountId, member_profile_id: MemberProfileId) -> Self {
        Self {
            tenant,
            target: ScopeTarget::MemberAccount {
                account_id,
                member_profile_id,
            },
        }
    }

    /// Scope of a whole account.
    #[must_use]
    pub const fn subsidiary(tenant: Tenant, account_id: AccountId) -> Self {
        Self {
            tenant,
            target: ScopeTarget::Subsidiary { account_id },
        }
    }

    /// Scope of the branch's cash-on-hand account.
    #[must_use]
    pub const fn cash_on_hand(tenant: Tenant, account_id: AccountId) -> Self {
        Self {
            tenant,
            target: ScopeTarget::Named {
                role: NamedAccount::CashOnHand,
                account_id,
            },
        }
    }

    /// The account the scope reads.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        match self.target {
            ScopeTarget::MemberAccount { account_id, .. }
            | ScopeTarget::Subsidiary { account_id }
            | ScopeTarget::Named { account_id, .. } => account_id,
        }
    }

    /// The member the scope is narrowed to, if any.
    #[must_use]
    pub const fn member_profile_id(&self) -> Option<MemberProfileId> {
        match self.target {
            ScopeTarget::MemberAccount {
                member_profile_id, ..
            } => Some(member_profile_id),
            ScopeTarget::Subsidiary { .. } | ScopeTarget::Named { .. } => None,
        }
    }

    /// Stable key used for advisory locking; equal scopes yield equal keys.
    #[must_use]
    pub fn lock_key(&self) -> String {
        match self.member_profile_id() {
            Some(member) => format!(
                "ledger:{}:{}:{}:{}",
                self.tenant.organization_id,
                self.tenant.branch_id,
                self.account_id(),
                member
            ),
            None => format!(
                "ledger:{}:{}:{}",
                self.tenant.organization_id,
                self.tenant.branch_id,
                self.account_id()
            ),
        }
    }
}

impl std::fmt::Display for BalanceScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/account:{}", self.tenant, self.account_id())?;
        if let Some(member) = self.member_profile_id() {
            write!(f, "/member:{member}")?;
        }
        Ok(())
    }
}

/// Running balance information for a ledger line.
///
/// - `version`: per-scope counter, 1 for the first line
/// - `previous_balance`: balance before this line
/// - `current_balance`: balance after this line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Per-scope version (monotonically increasing).
    pub version: i64,
    /// Balance before this line.
    pub previous_balance: Decimal,
    /// Balance after this line.
    pub current_balance: Decimal,
}

impl RunningBalance {
    /// Running balance for the first line on a scope.
    #[must_use]
    pub fn first_entry(balance_change: Decimal) -> Self {
        Self {
            version: 1,
            previous_balance: Decimal::ZERO,
            current_balance: balance_change,
        }
    }

    /// Running balance for the line after `previous`.
    ///
    /// - current_balance[N] = previous_balance[N] + balance_change
    /// - previous_balance[N] = current_balance[N-1]
    #[must_use]
    pub fn next_entry(previous: &Self, balance_change: Decimal) -> Self {
        Self {
            version: previous.version + 1,
            previous_balance: previous.current_balance,
            current_balance: previous.current_balance + balance_change,
        }
    }

    /// Applies a change on top of the resolved prior balance, if there is one.
    #[must_use]
    pub fn apply(prior: Option<&Self>, balance_change: Decimal) -> Self {
        match prior {
            Some(previous) => Self::next_entry(previous, balance_change),
            None => Self::first_entry(balance_change),
        }
    }
}

/// A stored line as seen by continuity checks and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceSnapshot {
    /// When the line takes economic effect.
    pub entry_date: DateTime<Utc>,
    /// Per-scope version.
    pub version: i64,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Stored running balance after the line.
    pub balance: Decimal,
}

/// First line whose stored balance does not follow from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuityBreak {
    /// Version of the offending line.
    pub version: i64,
    /// Balance the chain implies.
    pub expected: Decimal,
    /// Balance actually stored.
    pub stored: Decimal,
}

/// Checks that each line's stored balance equals its predecessor's plus its own change.
///
/// Lines are taken in version order; the chain starts from zero.
pub fn verify_continuity(side: NormalSide, lines: &[BalanceSnapshot]) -> Result<(), ContinuityBreak> {
    let mut ordered: Vec<&BalanceSnapshot> = lines.iter().collect();
    ordered.sort_by_key(|line| line.version);

    let mut running = Decimal::ZERO;
    for line in ordered {
        let expected = running + side.balance_change(line.debit, line.credit);
        if expected != line.balance {
            return Err(ContinuityBreak {
                version: line.version,
                expected,
                stored: line.balance,
            });
        }
        running = line.balance;
    }
    Ok(())
}

/// Balance and turnover of one member on one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MemberLedgerTotal {
    /// Latest running balance.
    pub balance: Decimal,
    /// Σ debit.
    pub total_debit: Decimal,
    /// Σ credit.
    pub total_credit: Decimal,
}

impl MemberLedgerTotal {
    /// Folds a member's lines into totals; the balance is taken from the highest version.
    #[must_use]
    pub fn from_lines(lines: &[BalanceSnapshot]) -> Self {
        let balance = lines
            .iter()
            .max_by_key(|line| line.version)
            .map_or(Decimal::ZERO, |line| line.balance);
        Self {
            balance,
            total_debit: lines.iter().map(|line| line.debit).sum(),
            total_credit: lines.iter().map(|line| line.credit).sum(),
        }
    }
}

/// Ending balance of a scope on each day of `[from, to]` (UTC days).
///
/// `opening` is the balance before `from`. Days without lines carry the
/// previous day's ending balance forward.
#[must_use]
pub fn daily_ending_balances(
    opening: Decimal,
    lines: &[BalanceSnapshot],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<(NaiveDate, Decimal)> {
    let mut last_by_day: BTreeMap<NaiveDate, (i64, Decimal)> = BTreeMap::new();
    for line in lines {
        let day = line.entry_date.date_naive();
        let slot = last_by_day.entry(day).or_insert((line.version, line.balance));
        if line.version >= slot.0 {
            *slot = (line.version, line.balance);
        }
    }

    let mut balances = Vec::new();
    let mut running = opening;
    let mut day = from;
    while day <= to {
        if let Some((_, balance)) = last_by_day.get(&day) {
            running = *balance;
        }
        balances.push((day, running));
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => break,
        }
    }
    balances
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use coopledger_shared::types::{BranchId, OrganizationId};
    use rust_decimal_macros::dec;

    fn tenant() -> Tenant {
        Tenant::new(OrganizationId::new(), BranchId::new())
    }

    fn line(day: u32, version: i64, debit: Decimal, credit: Decimal, balance: Decimal) -> BalanceSnapshot {
        BalanceSnapshot {
            entry_date: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
            version,
            debit,
            credit,
            balance,
        }
    }

    #[test]
    fn test_normal_side_for_type() {
        assert_eq!(NormalSide::for_type(Some(GeneralLedgerType::Assets)), NormalSide::DebitNormal);
        assert_eq!(NormalSide::for_type(Some(GeneralLedgerType::Expenses)), NormalSide::DebitNormal);
        assert_eq!(NormalSide::for_type(Some(GeneralLedgerType::Liabilities)), NormalSide::CreditNormal);
        assert_eq!(NormalSide::for_type(Some(GeneralLedgerType::Equity)), NormalSide::CreditNormal);
        assert_eq!(NormalSide::for_type(Some(GeneralLedgerType::Revenue)), NormalSide::CreditNormal);
        assert_eq!(NormalSide::for_type(None), NormalSide::DebitNormal);
    }

    #[test]
    fn test_balance_change_by_side() {
        assert_eq!(NormalSide::DebitNormal.balance_change(dec!(100), dec!(30)), dec!(70));
        assert_eq!(NormalSide::CreditNormal.balance_change(dec!(100), dec!(30)), dec!(-70));
    }

    #[test]
    fn test_scope_for_member_scoped_account() {
        let tenant = tenant();
        let account = AccountId::new();
        let member = MemberProfileId::new();

        let scope = BalanceScope::for_line(tenant, account, AccountKind::Deposit, Some(member));
        assert_eq!(scope.member_profile_id(), Some(member));
        assert_eq!(scope.account_id(), account);

        let scope = BalanceScope::for_line(tenant, account, AccountKind::Other, Some(member));
        assert_eq!(scope.member_profile_id(), None);

        let scope = BalanceScope::for_line(tenant, account, AccountKind::Loan, None);
        assert_eq!(scope.target, ScopeTarget::Subsidiary { account_id: account });
    }

    #[test]
    fn test_lock_key_distinguishes_members() {
        let tenant = tenant();
        let account = AccountId::new();
        let a = BalanceScope::member(tenant, account, MemberProfileId::new());
        let b = BalanceScope::member(tenant, account, MemberProfileId::new());
        assert_ne!(a.lock_key(), b.lock_key());
        assert_eq!(a.lock_key(), a.lock_key());
        assert_eq!(
            BalanceScope::cash_on_hand(tenant, account).lock_key(),
            BalanceScope::subsidiary(tenant, account).lock_key()
        );
    }

    #[test]
    fn test_running_balance_apply() {
        let first = RunningBalance::apply(None, dec!(500));
        assert_eq!(first, RunningBalance { version: 1, previous_balance: dec!(0), current_balance: dec!(500) });

        let second = RunningBalance::apply(Some(&first), dec!(-200));
        assert_eq!(second.version, 2);
        assert_eq!(second.previous_balance, dec!(500));
        assert_eq!(second.current_balance, dec!(300));
    }

    #[test]
    fn test_verify_continuity_detects_break() {
        let lines = [
            line(1, 1, dec!(100), dec!(0), dec!(100)),
            line(1, 2, dec!(0), dec!(40), dec!(60)),
            line(2, 3, dec!(10), dec!(0), dec!(75)),
        ];
        let err = verify_continuity(NormalSide::DebitNormal, &lines).unwrap_err();
        assert_eq!(err, ContinuityBreak { version: 3, expected: dec!(70), stored: dec!(75) });
        assert!(verify_continuity(NormalSide::DebitNormal, &lines[..2]).is_ok());
    }

    #[test]
    fn test_member_ledger_total() {
        let lines = [
            line(1, 2, dec!(0), dec!(40), dec!(60)),
            line(1, 1, dec!(100), dec!(0), dec!(100)),
        ];
        let total = MemberLedgerTotal::from_lines(&lines);
        assert_eq!(total.balance, dec!(60));
        assert_eq!(total.total_debit, dec!(100));
        assert_eq!(total.total_credit, dec!(40));
        assert_eq!(MemberLedgerTotal::from_lines(&[]), MemberLedgerTotal::default());
    }

    #[test]
    fn test_daily_ending_balances_carry_forward() {
        let lines = [
            line(2, 1, dec!(100), dec!(0), dec!(100)),
            line(2, 2, dec!(50), dec!(0), dec!(150)),
            line(4, 3, dec!(0), dec!(20), dec!(130)),
        ];
        let from = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let balances: Vec<Decimal> = daily_ending_balances(dec!(0), &lines, from, to)
            .into_iter()
            .map(|(_, balance)| balance)
            .collect();
        assert_eq!(balances, vec![dec!(0), dec!(150), dec!(150), dec!(130), dec!(130)]);
    }
}
