//! This module contains the domain logic to process transactions
//!
//! The [`LedgerPaymentsEngine`] is the state machine implementing a [`PaymentsEngine`].
//! It keeps the accounts in memory and delegates the lookup of disputed transactions to a
//! [`Ledger`](ledger::Ledger), which by default is the [`InMemoryLedger`] but could be backed by a database.
//! Engines running in parallel share one through a [`SharedLedger`].
//!
//! Amounts are represented with the fixed-point [`Money`] type.
//

mod account;
mod engine;
mod ledger;
mod money;
mod transaction;

pub(crate) use account::AccountReport;

#[cfg(test)]
pub(crate) use engine::Result as EngineResult;
#[cfg(test)]
pub(crate) use ledger::DisputeState;
#[cfg(test)]
pub(crate) use money::money;

pub use engine::{
  AccountsReportIter, InMemoryPaymentsEngine, LedgerPaymentsEngine, PaymentsEngine,
  PaymentsEngineError,
};
pub use ledger::{InMemoryLedger, SharedLedger};
pub use money::Money;
pub use transaction::{ClientId, Transaction, TransactionId, ValidationError};
