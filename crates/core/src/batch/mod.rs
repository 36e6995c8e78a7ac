//! Transaction batch aggregation.
//!
//! A batch is one teller's working session. This module computes its totals
//! and reconciliation status and owns the supervisor view gate. Opening,
//! attaching postings and closing live in the database layer.

pub mod error;
pub mod totals;
pub mod types;
pub mod view;

#[cfg(test)]
mod totals_props;

pub use error::BatchError;
pub use totals::{
    BatchAggregator, BatchInputs, BatchLedgerLine, BatchTotals, CashCount, non_negative, source_turnover,
};
pub use types::{BalanceStatus, BatchSignOff, ViewGate};
pub use view::BatchView;
