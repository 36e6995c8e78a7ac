//! Core business logic for Coopledger.
//!
//! This crate contains pure business logic with ZERO database dependencies.
//! Posting rules, balance arithmetic, voucher state and batch reconciliation
//! all live here; the `coopledger-db` crate runs them inside transactions.
//!
//! # Modules
//!
//! - `ledger` - Double-entry posting validation and running balances
//! - `voucher` - Journal and cash/check voucher lifecycle
//! - `batch` - Teller batch totals and supervisor view gate
//! - `events` - Domain events published after commit

pub mod batch;
pub mod events;
pub mod ledger;
pub mod voucher;
