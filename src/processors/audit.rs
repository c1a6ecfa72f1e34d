use std::fmt;

use log::warn;

use crate::io::ReadError;
use crate::payments::{PaymentsEngineError, Transaction};

/// Something that was not applied to the accounts
#[derive(Debug)]
pub enum Rejection {
  /// The row could not be turned into a transaction
  InvalidRow(ReadError),
  /// The engine refused the transaction
  Transaction {
    transaction: Transaction,
    error: PaymentsEngineError,
  },
}

impl fmt::Display for Rejection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Rejection::InvalidRow(error) => write!(f, "Skipped row: {}", error),
      Rejection::Transaction { transaction, error } => write!(
        f,
        "Rejected {:?} {} for client {}: {}",
        transaction.kind(),
        transaction.transaction_id(),
        transaction.client_id(),
        error
      ),
    }
  }
}

/// Channel where processors report everything they could not apply, for operators to review.
/// Nothing is retried.
pub trait RejectionsAudit {
  fn record(&mut self, rejection: Rejection);
}

/// Audit that logs every rejection as a warning and keeps count of them.
#[derive(Debug, Default)]
pub struct LogRejectionsAudit {
  invalid_rows: usize,
  rejected_transactions: usize,
}

impl LogRejectionsAudit {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn invalid_rows(&self) -> usize {
    self.invalid_rows
  }

  pub fn rejected_transactions(&self) -> usize {
    self.rejected_transactions
  }
}

impl RejectionsAudit for LogRejectionsAudit {
  fn record(&mut self, rejection: Rejection) {
    match rejection {
      Rejection::InvalidRow(_) => self.invalid_rows += 1,
      Rejection::Transaction { .. } => self.rejected_transactions += 1,
    }
    warn!("{}", rejection);
  }
}

#[cfg(test)]
impl RejectionsAudit for Vec<Rejection> {
  fn record(&mut self, rejection: Rejection) {
    self.push(rejection);
  }
}
