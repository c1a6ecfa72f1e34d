use thiserror::Error;

use super::money::{Money, MoneyParseError};

/// Alias for a client ID
pub type ClientId = u64;

/// Alias for a transaction ID
pub type TransactionId = u64;

/// The kinds of transactions recognised in the input stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
  Deposit,
  Withdrawal,
  Dispute,
  Resolve,
  Chargeback,
}

impl TransactionKind {
  /// Kind literals are matched ignoring case and surrounding whitespace.
  pub fn parse(text: &str) -> Option<Self> {
    match text.trim().to_ascii_lowercase().as_str() {
      "deposit" => Some(Self::Deposit),
      "withdrawal" => Some(Self::Withdrawal),
      "dispute" => Some(Self::Dispute),
      "resolve" => Some(Self::Resolve),
      "chargeback" => Some(Self::Chargeback),
      _ => None,
    }
  }

  pub fn carries_amount(&self) -> bool {
    matches!(self, Self::Deposit | Self::Withdrawal)
  }
}

/// Reasons for rejecting an input row before it reaches the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
  #[error("Unknown transaction type: {0:?}")]
  UnknownKind(String),

  #[error("Malformed {field} id: {value:?}")]
  MalformedId { field: &'static str, value: String },

  #[error("Missing amount")]
  MissingAmount,

  #[error("Unexpected amount for a transaction without value")]
  UnexpectedAmount,

  #[error("Invalid negative amount")]
  NegativeAmount,

  #[error("Malformed amount: {0}")]
  MalformedAmount(#[from] MoneyParseError),
}

/// Representation of the transactions types supported by a payments engine.
///
/// Dispute, resolve and chargeback reuse `transaction_id` to reference
/// the original deposit or withdrawal.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
  Deposit {
    client_id: ClientId,
    transaction_id: TransactionId,
    amount: Money,
  },
  Withdrawal {
    client_id: ClientId,
    transaction_id: TransactionId,
    amount: Money,
  },
  Dispute {
    client_id: ClientId,
    transaction_id: TransactionId,
  },
  Resolve {
    client_id: ClientId,
    transaction_id: TransactionId,
  },
  Chargeback {
    client_id: ClientId,
    transaction_id: TransactionId,
  },
}

impl Transaction {
  /// Validates the raw fields of an input row.
  /// An empty `amount` is treated the same as a missing one.
  pub fn parse(
    kind: &str,
    client_id: &str,
    transaction_id: &str,
    amount: Option<&str>,
  ) -> Result<Self, ValidationError> {
    let kind =
      TransactionKind::parse(kind).ok_or_else(|| ValidationError::UnknownKind(kind.to_string()))?;
    let client_id = parse_id("client", client_id)?;
    let transaction_id = parse_id("tx", transaction_id)?;
    let amount = amount.map(str::trim).filter(|text| !text.is_empty());

    match (kind.carries_amount(), amount) {
      (true, None) => Err(ValidationError::MissingAmount),
      (false, Some(_)) => Err(ValidationError::UnexpectedAmount),
      (true, Some(text)) => {
        let amount = Money::from_decimal_string(text)?;
        if amount.is_negative() {
          return Err(ValidationError::NegativeAmount);
        }
        Ok(match kind {
          TransactionKind::Deposit => Transaction::Deposit {
            client_id,
            transaction_id,
            amount,
          },
          _ => Transaction::Withdrawal {
            client_id,
            transaction_id,
            amount,
          },
        })
      }
      (false, None) => Ok(match kind {
        TransactionKind::Dispute => Transaction::Dispute {
          client_id,
          transaction_id,
        },
        TransactionKind::Resolve => Transaction::Resolve {
          client_id,
          transaction_id,
        },
        _ => Transaction::Chargeback {
          client_id,
          transaction_id,
        },
      }),
    }
  }

  pub fn kind(&self) -> TransactionKind {
    match self {
      Transaction::Deposit { .. } => TransactionKind::Deposit,
      Transaction::Withdrawal { .. } => TransactionKind::Withdrawal,
      Transaction::Dispute { .. } => TransactionKind::Dispute,
      Transaction::Resolve { .. } => TransactionKind::Resolve,
      Transaction::Chargeback { .. } => TransactionKind::Chargeback,
    }
  }

  pub fn client_id(&self) -> ClientId {
    match *self {
      Transaction::Deposit { client_id, .. }
      | Transaction::Withdrawal { client_id, .. }
      | Transaction::Dispute { client_id, .. }
      | Transaction::Resolve { client_id, .. }
      | Transaction::Chargeback { client_id, .. } => client_id,
    }
  }

  pub fn transaction_id(&self) -> TransactionId {
    match *self {
      Transaction::Deposit { transaction_id, .. }
      | Transaction::Withdrawal { transaction_id, .. }
      | Transaction::Dispute { transaction_id, .. }
      | Transaction::Resolve { transaction_id, .. }
      | Transaction::Chargeback { transaction_id, .. } => transaction_id,
    }
  }
}

fn parse_id(field: &'static str, value: &str) -> Result<u64, ValidationError> {
  value
    .trim()
    .parse()
    .map_err(|_| ValidationError::MalformedId {
      field,
      value: value.to_string(),
    })
}
