use std::convert::TryFrom;

use serde::Deserialize;

use crate::payments::{self, ValidationError};

/// A deserializable transaction row.
///
/// Fields are kept as text so that the validation of the domain
/// reports exactly what was wrong with the row.
#[derive(Debug, Clone, Deserialize)]
pub struct Transaction {
  #[serde(rename = "type")]
  kind: String,

  #[serde(rename = "client")]
  client_id: String,

  #[serde(rename = "tx")]
  transaction_id: String,

  #[serde(default)]
  amount: Option<String>,
}

impl TryFrom<Transaction> for payments::Transaction {
  type Error = ValidationError;

  /// Conversion from a deserializable Transaction into one that can be used by the domain logic.
  fn try_from(transaction: Transaction) -> Result<Self, Self::Error> {
    payments::Transaction::parse(
      &transaction.kind,
      &transaction.client_id,
      &transaction.transaction_id,
      transaction.amount.as_deref(),
    )
  }
}

#[cfg(test)]
mod tests {

  use super::*;
  use crate::payments::money;

  fn row(kind: &str, client_id: &str, transaction_id: &str, amount: Option<&str>) -> Transaction {
    Transaction {
      kind: kind.to_string(),
      client_id: client_id.to_string(),
      transaction_id: transaction_id.to_string(),
      amount: amount.map(str::to_string),
    }
  }

  #[test]
  fn payments_transaction_try_from() {
    let cases = vec![
      (
        row("deposit", "1", "101", Some("100")),
        Ok(payments::Transaction::Deposit {
          client_id: 1,
          transaction_id: 101,
          amount: money("100"),
        }),
      ),
      (
        row("withdrawal", "2", "102", Some("200")),
        Ok(payments::Transaction::Withdrawal {
          client_id: 2,
          transaction_id: 102,
          amount: money("200"),
        }),
      ),
      (
        row("dispute", "3", "103", None),
        Ok(payments::Transaction::Dispute {
          client_id: 3,
          transaction_id: 103,
        }),
      ),
      (
        row("resolve", "4", "104", Some("")),
        Ok(payments::Transaction::Resolve {
          client_id: 4,
          transaction_id: 104,
        }),
      ),
      (
        row("chargeback", "5", "105", None),
        Ok(payments::Transaction::Chargeback {
          client_id: 5,
          transaction_id: 105,
        }),
      ),
      (
        row("deposit", "6", "106", None),
        Err(ValidationError::MissingAmount),
      ),
      (
        row("dispute", "7", "107", Some("1.0")),
        Err(ValidationError::UnexpectedAmount),
      ),
    ];

    for (input, expected) in cases {
      assert_eq!(payments::Transaction::try_from(input), expected)
    }
  }
}
