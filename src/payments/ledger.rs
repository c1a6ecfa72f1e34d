use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use super::money::Money;
use super::transaction::{ClientId, TransactionId};

/// The kind of an original transaction kept by a [`Ledger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OriginalKind {
  Deposit,
  Withdrawal,
}

/// Where an original transaction is within the dispute lifecycle.
///
/// The only valid transitions are `None -> Disputed -> {Resolved, ChargedBack}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisputeState {
  None,
  Disputed,
  Resolved,
  ChargedBack,
}

impl DisputeState {
  pub fn can_transition_to(self, next: DisputeState) -> bool {
    matches!(
      (self, next),
      (DisputeState::None, DisputeState::Disputed)
        | (DisputeState::Disputed, DisputeState::Resolved)
        | (DisputeState::Disputed, DisputeState::ChargedBack)
    )
  }
}

impl fmt::Display for DisputeState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      DisputeState::None => "none",
      DisputeState::Disputed => "disputed",
      DisputeState::Resolved => "resolved",
      DisputeState::ChargedBack => "charged back",
    };
    f.write_str(name)
  }
}

/// Snapshot of an original deposit or withdrawal as recorded by a [`Ledger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
  pub transaction_id: TransactionId,
  pub client_id: ClientId,
  pub amount: Money,
  pub kind: OriginalKind,
  pub dispute_state: DisputeState,
}

impl LedgerEntry {
  pub fn new(
    transaction_id: TransactionId,
    client_id: ClientId,
    amount: Money,
    kind: OriginalKind,
  ) -> Self {
    Self {
      transaction_id,
      client_id,
      amount,
      kind,
      dispute_state: DisputeState::None,
    }
  }

  #[cfg(test)]
  pub fn with_state(mut self, dispute_state: DisputeState) -> Self {
    self.dispute_state = dispute_state;
    self
  }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
  #[error("Transaction {0} already recorded")]
  DuplicateId(TransactionId),

  #[error("Transaction {0} not found")]
  NotFound(TransactionId),

  #[error("Transaction {transaction_id} is {actual}, expected {expected}")]
  StaleState {
    transaction_id: TransactionId,
    expected: DisputeState,
    actual: DisputeState,
  },

  #[error("Ledger unavailable: {0}")]
  Unavailable(String),
}

pub type Result<T> = core::result::Result<T, LedgerError>;

/// Lookup store for the original transactions that disputes refer to.
///
/// Operations are `async` so that the store can live outside of the process
/// (a database, a remote service, ...) and only keep hot entries in memory.
#[async_trait]
pub trait Ledger: Send + Sync {
  /// Records a just applied deposit or withdrawal with no dispute.
  /// Fails with [`LedgerError::DuplicateId`] when the id was already recorded.
  async fn record_original(
    &mut self,
    transaction_id: TransactionId,
    client_id: ClientId,
    amount: Money,
    kind: OriginalKind,
  ) -> Result<()>;

  /// An absent id is not an error at this level.
  async fn lookup(&self, transaction_id: TransactionId) -> Result<Option<LedgerEntry>>;

  /// Atomically moves the dispute state of an entry from `expected` to `next`.
  async fn transition_dispute_state(
    &mut self,
    transaction_id: TransactionId,
    expected: DisputeState,
    next: DisputeState,
  ) -> Result<()>;
}

/// Implementation of the [`Ledger`] that keeps every entry in memory.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
  entries: HashMap<TransactionId, LedgerEntry>,
}

impl InMemoryLedger {
  pub fn new() -> Self {
    Self::default()
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[cfg(test)]
  pub fn with_entries<I>(entries: I) -> Self
  where
    I: IntoIterator<Item = LedgerEntry>,
  {
    Self {
      entries: entries
        .into_iter()
        .map(|entry| (entry.transaction_id, entry))
        .collect(),
    }
  }
}

#[async_trait]
impl Ledger for InMemoryLedger {
  async fn record_original(
    &mut self,
    transaction_id: TransactionId,
    client_id: ClientId,
    amount: Money,
    kind: OriginalKind,
  ) -> Result<()> {
    if self.entries.contains_key(&transaction_id) {
      Err(LedgerError::DuplicateId(transaction_id))
    } else {
      self.entries.insert(
        transaction_id,
        LedgerEntry::new(transaction_id, client_id, amount, kind),
      );
      Ok(())
    }
  }

  async fn lookup(&self, transaction_id: TransactionId) -> Result<Option<LedgerEntry>> {
    Ok(self.entries.get(&transaction_id).cloned())
  }

  async fn transition_dispute_state(
    &mut self,
    transaction_id: TransactionId,
    expected: DisputeState,
    next: DisputeState,
  ) -> Result<()> {
    let entry = self
      .entries
      .get_mut(&transaction_id)
      .ok_or(LedgerError::NotFound(transaction_id))?;

    if entry.dispute_state != expected || !expected.can_transition_to(next) {
      Err(LedgerError::StaleState {
        transaction_id,
        expected,
        actual: entry.dispute_state,
      })
    } else {
      entry.dispute_state = next;
      Ok(())
    }
  }
}

/// Handle to a [`Ledger`] used by several engines at the same time.
///
/// Clones share the same inner ledger, so transaction ids and dispute states are seen by all of them.
/// Every operation holds the lock for its whole duration.
#[derive(Debug)]
pub struct SharedLedger<L>(Arc<Mutex<L>>);

impl<L> SharedLedger<L> {
  pub fn new(ledger: L) -> Self {
    Self(Arc::new(Mutex::new(ledger)))
  }
}

impl<L> Clone for SharedLedger<L> {
  fn clone(&self) -> Self {
    Self(Arc::clone(&self.0))
  }
}

#[async_trait]
impl<L> Ledger for SharedLedger<L>
where
  L: Ledger,
{
  async fn record_original(
    &mut self,
    transaction_id: TransactionId,
    client_id: ClientId,
    amount: Money,
    kind: OriginalKind,
  ) -> Result<()> {
    let mut ledger = self.0.lock().await;
    ledger
      .record_original(transaction_id, client_id, amount, kind)
      .await
  }

  async fn lookup(&self, transaction_id: TransactionId) -> Result<Option<LedgerEntry>> {
    let ledger = self.0.lock().await;
    ledger.lookup(transaction_id).await
  }

  async fn transition_dispute_state(
    &mut self,
    transaction_id: TransactionId,
    expected: DisputeState,
    next: DisputeState,
  ) -> Result<()> {
    let mut ledger = self.0.lock().await;
    ledger
      .transition_dispute_state(transaction_id, expected, next)
      .await
  }
}
