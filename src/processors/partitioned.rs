use std::collections::HashMap;

use anyhow::{anyhow, Result};
use log::debug;
use tokio::sync::{mpsc, watch};
use tokio_stream::StreamExt;

use super::audit::{Rejection, RejectionsAudit};
use crate::io::{AccountsReportWriter, TransactionsReader};
use crate::payments::{AccountReport, PaymentsEngine, Transaction, TransactionId};

/// How many transactions can be waiting for a shard before the reader is slowed down
const SHARD_QUEUE_SIZE: usize = 1024;

/// Position of a transaction in the input stream, starting at 1
type Sequence = u64;

/// A partitioned processor where every shard owns its own [`PaymentsEngine`].
///
/// Transactions are partitioned by `client_id` and sent to the corresponding shard through a channel,
/// so the transactions of a client are always processed in order by the same engine.
///
/// The engines are expected to share their ledger (see [`SharedLedger`](crate::payments::SharedLedger)),
/// so transaction ids are unique across clients and disputes can tell who owns a transaction.
/// A transaction whose id was last seen in another shard waits until that shard has processed it,
/// which makes every ledger entry see its transactions in the order of the stream.
/// The result is the same as processing the whole stream with a single engine.
///
/// Rejections are reported to the [`RejectionsAudit`] from the calling task,
/// and the reports of every shard are merged and sorted by client before being written.
pub async fn run<R, P, F, A, W>(
  mut transactions_reader: R,
  shards: usize,
  create_engine: F,
  audit: &mut A,
  mut accounts_report_writer: W,
) -> Result<()>
where
  R: TransactionsReader,
  P: PaymentsEngine + Send + 'static,
  F: Fn() -> P,
  A: RejectionsAudit,
  W: AccountsReportWriter,
{
  let shards = shards.max(1);
  let (rejections_tx, mut rejections_rx) = mpsc::unbounded_channel();

  let mut senders = Vec::with_capacity(shards);
  let mut progress = Vec::with_capacity(shards);
  let mut handles = Vec::with_capacity(shards);
  for _ in 0..shards {
    let (sender, receiver) = mpsc::channel(SHARD_QUEUE_SIZE);
    let (progress_tx, progress_rx) = watch::channel(0);
    senders.push(sender);
    progress.push(progress_rx);
    handles.push(tokio::spawn(run_shard(
      create_engine(),
      receiver,
      progress_tx,
      rejections_tx.clone(),
    )));
  }
  drop(rejections_tx);

  let mut last_seen: HashMap<TransactionId, (usize, Sequence)> = HashMap::new();
  let mut sequence: Sequence = 0;

  let mut transactions = transactions_reader.read_transactions();
  while let Some(maybe_transaction) = transactions.next().await {
    match maybe_transaction {
      Ok(transaction) => {
        sequence += 1;
        let shard = shard_for(&transaction, shards);
        let previous = last_seen.insert(transaction.transaction_id(), (shard, sequence));
        if let Some((other, other_sequence)) = previous.filter(|(other, _)| *other != shard) {
          wait_for(&mut progress[other], other_sequence)
            .await
            .map_err(|_| anyhow!("Shard {} stopped unexpectedly", other))?;
        }
        senders[shard]
          .send((sequence, transaction))
          .await
          .map_err(|_| anyhow!("Shard {} stopped unexpectedly", shard))?;
      }
      Err(error) if error.is_fatal() => {
        handles.iter().for_each(|handle| handle.abort());
        return Err(error.into());
      }
      Err(error) => audit.record(Rejection::InvalidRow(error)),
    }

    while let Ok(rejection) = rejections_rx.try_recv() {
      audit.record(rejection);
    }
  }
  drop(senders);

  let shard_reports = futures::future::try_join_all(handles).await?;

  while let Some(rejection) = rejections_rx.recv().await {
    audit.record(rejection);
  }

  let mut report: Vec<AccountReport> = shard_reports.into_iter().flatten().collect();
  report.sort_by_key(|account_report| account_report.client_id);
  debug!(
    "Processed {} transactions and {} accounts across {} shards",
    sequence,
    report.len(),
    shards
  );

  accounts_report_writer
    .write_accounts_report(report.into_iter())
    .await
}

fn shard_for(transaction: &Transaction, shards: usize) -> usize {
  (transaction.client_id() % shards as u64) as usize
}

/// Waits until a shard has processed the transaction at `sequence`
async fn wait_for(
  progress: &mut watch::Receiver<Sequence>,
  sequence: Sequence,
) -> core::result::Result<(), watch::error::RecvError> {
  while *progress.borrow() < sequence {
    progress.changed().await?;
  }
  Ok(())
}

async fn run_shard<P>(
  mut payments_engine: P,
  mut transactions: mpsc::Receiver<(Sequence, Transaction)>,
  progress: watch::Sender<Sequence>,
  rejections: mpsc::UnboundedSender<Rejection>,
) -> Vec<AccountReport>
where
  P: PaymentsEngine,
{
  while let Some((sequence, transaction)) = transactions.recv().await {
    if let Err(error) = payments_engine.process(transaction.clone()).await {
      rejections
        .send(Rejection::Transaction { transaction, error })
        .ok();
    }
    progress.send(sequence).ok();
  }
  payments_engine.accounts_report().collect()
}
