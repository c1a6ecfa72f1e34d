use serde::Serialize;

use crate::payments::{self, ClientId, Money};

/// A report on an account state used to serialize into a CSV file.
/// Amounts are rendered with the fixed precision of [`Money`].
#[derive(Debug, PartialEq, Serialize)]
pub struct AccountReport {
  client: ClientId,
  available: Money,
  held: Money,
  total: Money,
  locked: bool,
}

impl From<payments::AccountReport> for AccountReport {
  /// A conversion between the domain representation of an account report into a serializable structure
  fn from(account_report: payments::AccountReport) -> Self {
    AccountReport {
      client: account_report.client_id,
      available: account_report.available,
      held: account_report.held,
      total: account_report.total,
      locked: account_report.locked,
    }
  }
}

#[cfg(test)]
mod tests {

  use super::*;
  use crate::payments::money;

  #[test]
  fn from_payments_account_report() {
    let payments_account_report =
      payments::AccountReport::new(1, money("100.1234"), money("10.5"), money("110.6234"), true);

    let account_report: AccountReport = payments_account_report.into();

    assert_eq!(
      account_report,
      AccountReport {
        client: 1,
        available: money("100.1234"),
        held: money("10.5"),
        total: money("110.6234"),
        locked: true
      }
    )
  }
}
