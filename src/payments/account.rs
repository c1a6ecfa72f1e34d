use thiserror::Error;

use super::money::Money;
use super::transaction::ClientId;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AccountError {
  #[error("Not enough available funds")]
  InsufficientFunds,

  #[error("Not enough held funds")]
  InsufficientHeldFunds,

  #[error("Balance overflow")]
  Overflow,
}

pub type Result<T> = core::result::Result<T, AccountError>;

/// This represents the state of a client account while processing transactions.
///
/// Every operation computes the new [`Funds`] before assigning them,
/// so a failed operation leaves the account untouched.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Account {
  pub locked: bool,
  pub funds: Funds,
}

impl Account {
  pub fn deposit(&mut self, amount: Money) -> Result<()> {
    self.funds = self.funds.deposited(amount)?;
    Ok(())
  }

  pub fn withdraw(&mut self, amount: Money) -> Result<()> {
    self.funds = self.funds.withdrawn(amount)?;
    Ok(())
  }

  /// Moves `amount` from available to held.
  /// A hold never drives the available funds negative.
  pub fn hold(&mut self, amount: Money) -> Result<()> {
    self.funds = self.funds.held(amount)?;
    Ok(())
  }

  /// Moves `amount` from held back to available.
  pub fn release(&mut self, amount: Money) -> Result<()> {
    self.funds = self.funds.released(amount)?;
    Ok(())
  }

  /// Removes `amount` from held and locks the account.
  pub fn chargeback(&mut self, amount: Money) -> Result<()> {
    self.funds = self.funds.charged_back(amount)?;
    self.locked = true;
    Ok(())
  }
}

/// Representation of the different states in which funds can be, either available or in held.
///
/// Operations are pure, they return the resulting funds and leave `self` as it was.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Funds {
  pub available: Money,
  pub held: Money,
}

impl Funds {
  #[cfg(test)]
  pub fn new(available: Money, held: Money) -> Self {
    Self { available, held }
  }

  #[cfg(test)]
  pub fn zero() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub fn available(available: Money) -> Self {
    Self {
      available,
      held: Money::ZERO,
    }
  }

  pub fn total(&self) -> Option<Money> {
    self.available.checked_add(self.held)
  }

  fn deposited(&self, amount: Money) -> Result<Self> {
    let available = self
      .available
      .checked_add(amount)
      .ok_or(AccountError::Overflow)?;
    Self::checked(available, self.held)
  }

  fn withdrawn(&self, amount: Money) -> Result<Self> {
    if amount > self.available {
      return Err(AccountError::InsufficientFunds);
    }
    let available = self
      .available
      .checked_sub(amount)
      .ok_or(AccountError::Overflow)?;
    Ok(Self {
      available,
      held: self.held,
    })
  }

  fn held(&self, amount: Money) -> Result<Self> {
    if amount > self.available {
      return Err(AccountError::InsufficientFunds);
    }
    let available = self
      .available
      .checked_sub(amount)
      .ok_or(AccountError::Overflow)?;
    let held = self.held.checked_add(amount).ok_or(AccountError::Overflow)?;
    Self::checked(available, held)
  }

  fn released(&self, amount: Money) -> Result<Self> {
    if amount > self.held {
      return Err(AccountError::InsufficientHeldFunds);
    }
    let held = self.held.checked_sub(amount).ok_or(AccountError::Overflow)?;
    let available = self
      .available
      .checked_add(amount)
      .ok_or(AccountError::Overflow)?;
    Self::checked(available, held)
  }

  fn charged_back(&self, amount: Money) -> Result<Self> {
    if amount > self.held {
      return Err(AccountError::InsufficientHeldFunds);
    }
    let held = self.held.checked_sub(amount).ok_or(AccountError::Overflow)?;
    Ok(Self {
      available: self.available,
      held,
    })
  }

  /// The total has to stay representable for the report
  fn checked(available: Money, held: Money) -> Result<Self> {
    available.checked_add(held).ok_or(AccountError::Overflow)?;
    Ok(Self { available, held })
  }
}

/// Account report structure used to export information about the state of the client accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountReport {
  pub client_id: ClientId,
  pub available: Money,
  pub held: Money,
  pub total: Money,
  pub locked: bool,
}

impl AccountReport {
  pub fn new(
    client_id: ClientId,
    available: Money,
    held: Money,
    total: Money,
    locked: bool,
  ) -> Self {
    Self {
      client_id,
      available,
      held,
      total,
      locked,
    }
  }

  pub fn from_account(client_id: ClientId, account: &Account) -> Self {
    let funds = account.funds;
    Self::new(
      client_id,
      funds.available,
      funds.held,
      funds.total().unwrap_or(Money::from_units(i64::MAX)),
      account.locked,
    )
  }
}

#[cfg(test)]
mod tests {

  use super::*;
  use crate::payments::money::money;

  #[test]
  fn deposit_increases_available() {
    let mut account = Account::default();

    assert_eq!(account.deposit(money("5")), Ok(()));
    assert_eq!(account.deposit(money("0.1234")), Ok(()));

    assert_eq!(account.funds, Funds::available(money("5.1234")));
  }

  #[test]
  fn deposit_overflow() {
    let mut account = Account {
      locked: false,
      funds: Funds::available(Money::from_units(i64::MAX - 1)),
    };

    assert_eq!(account.deposit(money("1")), Err(AccountError::Overflow));
    assert_eq!(account.funds, Funds::available(Money::from_units(i64::MAX - 1)));
  }

  #[test]
  fn deposit_overflowing_total() {
    let mut account = Account {
      locked: false,
      funds: Funds::new(Money::from_units(i64::MAX - 20_000), money("2")),
    };

    assert_eq!(account.deposit(money("1")), Err(AccountError::Overflow));
  }

  #[test]
  fn withdraw() {
    let mut account = Account {
      locked: false,
      funds: Funds::available(money("5")),
    };

    assert_eq!(account.withdraw(money("3")), Ok(()));
    assert_eq!(account.funds, Funds::available(money("2")));

    assert_eq!(account.withdraw(money("2")), Ok(()));
    assert_eq!(account.funds, Funds::zero());
  }

  #[test]
  fn withdraw_insufficient_funds() {
    let mut account = Account {
      locked: false,
      funds: Funds::new(money("2"), money("10")),
    };

    assert_eq!(
      account.withdraw(money("2.0001")),
      Err(AccountError::InsufficientFunds)
    );
    assert_eq!(account.funds, Funds::new(money("2"), money("10")));
  }

  #[test]
  fn hold_and_release() {
    let mut account = Account {
      locked: false,
      funds: Funds::available(money("10")),
    };

    assert_eq!(account.hold(money("4")), Ok(()));
    assert_eq!(account.funds, Funds::new(money("6"), money("4")));

    assert_eq!(account.release(money("4")), Ok(()));
    assert_eq!(account.funds, Funds::available(money("10")));
  }

  #[test]
  fn hold_insufficient_funds() {
    let mut account = Account {
      locked: false,
      funds: Funds::available(money("3")),
    };

    assert_eq!(account.hold(money("5")), Err(AccountError::InsufficientFunds));
    assert_eq!(account.funds, Funds::available(money("3")));
  }

  #[test]
  fn release_insufficient_held_funds() {
    let mut account = Account {
      locked: false,
      funds: Funds::new(money("3"), money("1")),
    };

    assert_eq!(
      account.release(money("2")),
      Err(AccountError::InsufficientHeldFunds)
    );
    assert_eq!(account.funds, Funds::new(money("3"), money("1")));
  }

  #[test]
  fn chargeback_locks() {
    let mut account = Account {
      locked: false,
      funds: Funds::new(money("3"), money("5")),
    };

    assert_eq!(account.chargeback(money("5")), Ok(()));
    assert_eq!(
      account,
      Account {
        locked: true,
        funds: Funds::available(money("3")),
      }
    );
  }

  #[test]
  fn chargeback_insufficient_held_funds_does_not_lock() {
    let mut account = Account {
      locked: false,
      funds: Funds::new(money("3"), money("1")),
    };

    assert_eq!(
      account.chargeback(money("2")),
      Err(AccountError::InsufficientHeldFunds)
    );
    assert!(!account.locked);
  }

  #[test]
  fn funds_constructors() {
    assert_eq!(
      Funds::new(money("1"), money("2")),
      Funds {
        available: money("1"),
        held: money("2")
      }
    );

    assert_eq!(
      Funds::zero(),
      Funds {
        available: Money::ZERO,
        held: Money::ZERO
      }
    );

    assert_eq!(Funds::new(money("1"), money("2")).total(), Some(money("3")));
  }

  #[test]
  fn account_report_from_account() {
    let account = Account {
      locked: true,
      funds: Funds::new(money("100"), money("10")),
    };

    assert_eq!(
      AccountReport::from_account(1, &account),
      AccountReport {
        client_id: 1,
        available: money("100"),
        held: money("10"),
        total: money("110"),
        locked: true,
      }
    )
  }
}
