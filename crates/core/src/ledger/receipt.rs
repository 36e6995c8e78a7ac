//! Official receipt (OR) number series.
//!
//! Each branch keeps one series per receipt kind. Issuing hands out the
//! current number and advances it; once past the end the series wraps to
//! its start and bumps the iteration counter.

use serde::{Deserialize, Serialize};

/// Which branch series a receipt number is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReceiptKind {
    /// Withdrawal slips.
    Withdraw,
    /// Deposit slips.
    Deposit,
    /// Loan releases.
    Loan,
    /// Cash check vouchers.
    CheckVoucher,
}

/// State of one receipt series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptSeries {
    /// First number of the series.
    pub start: i64,
    /// Next number to issue.
    pub current: i64,
    /// Last number of the series.
    pub end: i64,
    /// How many times the series has been exhausted and restarted, starting at 1.
    pub iteration: i64,
}

/// A receipt number handed out by [`ReceiptSeries::issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedReceipt {
    /// The number.
    pub number: i64,
    /// The iteration it was issued in.
    pub iteration: i64,
}

impl IssuedReceipt {
    /// Printed form: zero-padded number, prefixed with the iteration after the first wrap.
    #[must_use]
    pub fn reference(&self) -> String {
        if self.iteration > 1 {
            format!("{}-{:06}", self.iteration, self.number)
        } else {
            format!("{:06}", self.number)
        }
    }
}

impl ReceiptSeries {
    /// Issues the current number and advances the series.
    pub fn issue(&mut self) -> IssuedReceipt {
        if self.current < self.start || self.current > self.end {
            self.current = self.start;
            self.iteration += 1;
        }
        let issued = IssuedReceipt {
            number: self.current,
            iteration: self.iteration,
        };
        self.current += 1;
        issued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_advances_current() {
        let mut series = ReceiptSeries { start: 1, current: 1, end: 999_999, iteration: 1 };
        assert_eq!(series.issue(), IssuedReceipt { number: 1, iteration: 1 });
        assert_eq!(series.issue(), IssuedReceipt { number: 2, iteration: 1 });
        assert_eq!(series.current, 3);
    }

    #[test]
    fn test_issue_wraps_past_end() {
        let mut series = ReceiptSeries { start: 10, current: 12, end: 12, iteration: 1 };
        assert_eq!(series.issue().number, 12);
        let wrapped = series.issue();
        assert_eq!(wrapped, IssuedReceipt { number: 10, iteration: 2 });
        assert_eq!(wrapped.reference(), "2-000010");
    }

    #[test]
    fn test_reference_first_iteration() {
        let receipt = IssuedReceipt { number: 42, iteration: 1 };
        assert_eq!(receipt.reference(), "000042");
    }
}
