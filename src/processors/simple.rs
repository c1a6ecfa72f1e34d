use anyhow::Result;
use log::debug;
use tokio_stream::StreamExt;

use super::audit::{Rejection, RejectionsAudit};
use crate::io::{AccountsReportWriter, TransactionsReader};
use crate::payments::PaymentsEngine;

/// This is a simple processor of payments that
/// - reads transactions from a [`TransactionsReader`]
/// - processes payments in order using a single [`PaymentsEngine`]
/// - writes a report including accounts state using a [`AccountsReportWriter`]
///
/// The idea is that all those components can be replaced with different implementations.
///
/// This processor tries to be as resilient as possible, meaning that:
/// - invalid rows from the transactions reader are reported to the [`RejectionsAudit`] and skipped
/// - transactions rejected by the payments engine are reported to the [`RejectionsAudit`] and skipped
///
/// The only thing that stops it is the transactions source failing, in which case no report is written.
///
pub async fn run<R, P, A, W>(
  mut transactions_reader: R,
  mut payments_engine: P,
  audit: &mut A,
  mut accounts_report_writer: W,
) -> Result<()>
where
  R: TransactionsReader,
  P: PaymentsEngine,
  A: RejectionsAudit,
  W: AccountsReportWriter,
{
  let mut transactions = transactions_reader.read_transactions();
  let mut processed = 0usize;

  while let Some(maybe_transaction) = transactions.next().await {
    match maybe_transaction {
      Ok(transaction) => {
        processed += 1;
        if let Err(error) = payments_engine.process(transaction.clone()).await {
          audit.record(Rejection::Transaction { transaction, error });
        }
      }
      Err(error) if error.is_fatal() => return Err(error.into()),
      Err(error) => audit.record(Rejection::InvalidRow(error)),
    }
  }

  debug!("Processed {} transactions", processed);

  accounts_report_writer
    .write_accounts_report(payments_engine.accounts_report())
    .await
}
