use std::collections::BTreeMap;

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

use super::{
  account::{Account, AccountError, AccountReport},
  ledger::{DisputeState, InMemoryLedger, Ledger, LedgerEntry, LedgerError, OriginalKind},
  money::Money,
  transaction::{ClientId, Transaction, TransactionId},
};

pub type Result<T> = core::result::Result<T, PaymentsEngineError>;

/// Possible errors that can happen while processing transactions.
/// We are dealing with sensible information, so it is important to be as detailed as possible.
/// None of them is fatal, the stream goes on with the next transaction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PaymentsEngineError {
  #[error("Account is locked: {0}")]
  AccountLocked(ClientId),

  #[error("Not enough available funds for client {0}")]
  InsufficientFunds(ClientId),

  #[error("Not enough held funds for client {0}")]
  InsufficientHeldFunds(ClientId),

  #[error("Balance overflow for client {0}")]
  AmountOverflow(ClientId),

  #[error("Duplicated transaction: {0}")]
  DuplicateId(TransactionId),

  #[error("Referenced transaction not found: {0}")]
  ReferenceNotFound(TransactionId),

  #[error("Transaction {transaction_id} belongs to client {owner}, not to client {client_id}")]
  ClientMismatch {
    transaction_id: TransactionId,
    client_id: ClientId,
    owner: ClientId,
  },

  #[error("Transaction {transaction_id} is {actual}, expected {expected}")]
  StaleState {
    transaction_id: TransactionId,
    expected: DisputeState,
    actual: DisputeState,
  },

  #[error("Ledger unavailable: {0}")]
  LedgerUnavailable(String),
}

impl From<LedgerError> for PaymentsEngineError {
  fn from(error: LedgerError) -> Self {
    match error {
      LedgerError::DuplicateId(transaction_id) => PaymentsEngineError::DuplicateId(transaction_id),
      LedgerError::NotFound(transaction_id) => PaymentsEngineError::ReferenceNotFound(transaction_id),
      LedgerError::StaleState {
        transaction_id,
        expected,
        actual,
      } => PaymentsEngineError::StaleState {
        transaction_id,
        expected,
        actual,
      },
      LedgerError::Unavailable(reason) => PaymentsEngineError::LedgerUnavailable(reason),
    }
  }
}

impl PaymentsEngineError {
  fn from_account(client_id: ClientId, error: AccountError) -> Self {
    match error {
      AccountError::InsufficientFunds => PaymentsEngineError::InsufficientFunds(client_id),
      AccountError::InsufficientHeldFunds => PaymentsEngineError::InsufficientHeldFunds(client_id),
      AccountError::Overflow => PaymentsEngineError::AmountOverflow(client_id),
    }
  }
}

/// Interface implemented by payments processors
#[async_trait]
pub trait PaymentsEngine {
  /// Operation called to process a transaction. It will return whether or not succeeded and detailed information about the error.
  /// The operation is `async` to allow interaction of the engine with external systems involving IO (database, file system, ...)
  async fn process(&mut self, transaction: Transaction) -> Result<()>;
  /// It will return an [`Iterator`] of [`AccountReport`] sorted by client, useful to generate account reports.
  fn accounts_report(&self) -> AccountsReportIter<'_>;
}

/// Implementation of the [`PaymentsEngine`] that keeps the accounts in memory
/// and looks up the original transactions of disputes in a [`Ledger`].
///
/// Every transaction is validated completely before anything is mutated.
/// The new account state is computed on a copy, the ledger is updated,
/// and only then the copy replaces the account.
#[derive(Debug)]
pub struct LedgerPaymentsEngine<L> {
  accounts: BTreeMap<ClientId, Account>,
  ledger: L,
}

/// The default engine, everything lives in memory.
pub type InMemoryPaymentsEngine = LedgerPaymentsEngine<InMemoryLedger>;

impl InMemoryPaymentsEngine {
  pub fn new() -> Self {
    Self::with_ledger(InMemoryLedger::new())
  }
}

impl<L> LedgerPaymentsEngine<L>
where
  L: Ledger,
{
  pub fn with_ledger(ledger: L) -> Self {
    Self {
      accounts: BTreeMap::default(),
      ledger,
    }
  }

  async fn deposit(
    &mut self,
    client_id: ClientId,
    transaction_id: TransactionId,
    amount: Money,
  ) -> Result<()> {
    let account = self.accounts.entry(client_id).or_default();
    if account.locked {
      return Err(PaymentsEngineError::AccountLocked(client_id));
    }

    let mut updated = account.clone();
    updated
      .deposit(amount)
      .map_err(|err| PaymentsEngineError::from_account(client_id, err))?;

    self
      .ledger
      .record_original(transaction_id, client_id, amount, OriginalKind::Deposit)
      .await?;

    *account = updated;
    debug!("Deposited {} to client {} ({})", amount, client_id, transaction_id);
    Ok(())
  }

  async fn withdrawal(
    &mut self,
    client_id: ClientId,
    transaction_id: TransactionId,
    amount: Money,
  ) -> Result<()> {
    let account = self.accounts.entry(client_id).or_default();
    if account.locked {
      return Err(PaymentsEngineError::AccountLocked(client_id));
    }

    let mut updated = account.clone();
    updated
      .withdraw(amount)
      .map_err(|err| PaymentsEngineError::from_account(client_id, err))?;

    self
      .ledger
      .record_original(transaction_id, client_id, amount, OriginalKind::Withdrawal)
      .await?;

    *account = updated;
    debug!("Withdrew {} from client {} ({})", amount, client_id, transaction_id);
    Ok(())
  }

  async fn dispute(&mut self, client_id: ClientId, transaction_id: TransactionId) -> Result<()> {
    let account = self.accounts.entry(client_id).or_default();
    let original = find_original(&self.ledger, client_id, transaction_id).await?;

    // Only deposits can be disputed for now
    if original.kind != OriginalKind::Deposit {
      return Err(PaymentsEngineError::ReferenceNotFound(transaction_id));
    }
    expect_state(&original, DisputeState::None)?;

    let mut updated = account.clone();
    updated
      .hold(original.amount)
      .map_err(|err| PaymentsEngineError::from_account(client_id, err))?;

    self
      .ledger
      .transition_dispute_state(transaction_id, DisputeState::None, DisputeState::Disputed)
      .await?;

    *account = updated;
    debug!(
      "Held {} from client {} disputing {}",
      original.amount, client_id, transaction_id
    );
    Ok(())
  }

  async fn resolve(&mut self, client_id: ClientId, transaction_id: TransactionId) -> Result<()> {
    let account = self.accounts.entry(client_id).or_default();
    let original = find_original(&self.ledger, client_id, transaction_id).await?;
    expect_state(&original, DisputeState::Disputed)?;

    let mut updated = account.clone();
    updated
      .release(original.amount)
      .map_err(|err| PaymentsEngineError::from_account(client_id, err))?;

    self
      .ledger
      .transition_dispute_state(
        transaction_id,
        DisputeState::Disputed,
        DisputeState::Resolved,
      )
      .await?;

    *account = updated;
    debug!(
      "Released {} to client {} resolving {}",
      original.amount, client_id, transaction_id
    );
    Ok(())
  }

  async fn chargeback(&mut self, client_id: ClientId, transaction_id: TransactionId) -> Result<()> {
    let account = self.accounts.entry(client_id).or_default();
    let original = find_original(&self.ledger, client_id, transaction_id).await?;
    expect_state(&original, DisputeState::Disputed)?;

    let mut updated = account.clone();
    updated
      .chargeback(original.amount)
      .map_err(|err| PaymentsEngineError::from_account(client_id, err))?;

    self
      .ledger
      .transition_dispute_state(
        transaction_id,
        DisputeState::Disputed,
        DisputeState::ChargedBack,
      )
      .await?;

    *account = updated;
    debug!(
      "Charged back {} from client {} for {}, account locked",
      original.amount, client_id, transaction_id
    );
    Ok(())
  }

  fn accounts_report_iter(&self) -> impl Iterator<Item = AccountReport> + '_ {
    self
      .accounts
      .iter()
      .map(|(client_id, account)| AccountReport::from_account(*client_id, account))
  }
}

/// Looks up the original transaction referenced by a dispute, resolve or chargeback
/// and checks that it belongs to the same client.
async fn find_original<L: Ledger>(
  ledger: &L,
  client_id: ClientId,
  transaction_id: TransactionId,
) -> Result<LedgerEntry> {
  let original = ledger
    .lookup(transaction_id)
    .await?
    .ok_or(PaymentsEngineError::ReferenceNotFound(transaction_id))?;

  if original.client_id != client_id {
    Err(PaymentsEngineError::ClientMismatch {
      transaction_id,
      client_id,
      owner: original.client_id,
    })
  } else {
    Ok(original)
  }
}

fn expect_state(original: &LedgerEntry, expected: DisputeState) -> Result<()> {
  if original.dispute_state == expected {
    Ok(())
  } else {
    Err(PaymentsEngineError::StaleState {
      transaction_id: original.transaction_id,
      expected,
      actual: original.dispute_state,
    })
  }
}

#[async_trait]
impl<L> PaymentsEngine for LedgerPaymentsEngine<L>
where
  L: Ledger,
{
  async fn process(&mut self, transaction: Transaction) -> Result<()> {
    match transaction {
      Transaction::Deposit {
        client_id,
        transaction_id,
        amount,
      } => self.deposit(client_id, transaction_id, amount).await,
      Transaction::Withdrawal {
        client_id,
        transaction_id,
        amount,
      } => self.withdrawal(client_id, transaction_id, amount).await,
      Transaction::Dispute {
        client_id,
        transaction_id,
      } => self.dispute(client_id, transaction_id).await,
      Transaction::Resolve {
        client_id,
        transaction_id,
      } => self.resolve(client_id, transaction_id).await,
      Transaction::Chargeback {
        client_id,
        transaction_id,
      } => self.chargeback(client_id, transaction_id).await,
    }
  }

  fn accounts_report(&self) -> AccountsReportIter<'_> {
    AccountsReportIter::new(self.accounts_report_iter())
  }
}

pub struct AccountsReportIter<'a>(Box<dyn Iterator<Item = AccountReport> + 'a>);

impl<'a> AccountsReportIter<'a> {
  pub(crate) fn new<T>(iter: T) -> Self
  where
    T: Iterator<Item = AccountReport> + 'a,
  {
    Self(Box::new(iter))
  }
}

impl<'a> Iterator for AccountsReportIter<'a> {
  type Item = AccountReport;

  fn next(&mut self) -> Option<Self::Item> {
    self.0.next()
  }
}
