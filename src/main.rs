mod config;
mod io;
mod payments;
mod processors;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tokio::io::AsyncRead;

use crate::config::Config;
use crate::io::{CsvAccountsReportWriter, CsvTransactionsReader};
use crate::processors::audit::LogRejectionsAudit;
use payments::{InMemoryLedger, InMemoryPaymentsEngine, LedgerPaymentsEngine, SharedLedger};

#[tokio::main]
async fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

  let config = Config::parse();
  let reader = get_transactions_async_read(config.input.as_deref()).await?;
  let transactions_reader = CsvTransactionsReader::new(reader);
  let accounts_report_writer = CsvAccountsReportWriter::new(tokio::io::stdout());
  let mut audit = LogRejectionsAudit::new();

  if config.is_partitioned() {
    let ledger = SharedLedger::new(InMemoryLedger::new());
    processors::partitioned::run(
      transactions_reader,
      config.shards.into(),
      || LedgerPaymentsEngine::with_ledger(ledger.clone()),
      &mut audit,
      accounts_report_writer,
    )
    .await?;
  } else {
    processors::simple::run(
      transactions_reader,
      InMemoryPaymentsEngine::new(),
      &mut audit,
      accounts_report_writer,
    )
    .await?;
  }

  info!(
    "Skipped {} invalid rows and rejected {} transactions",
    audit.invalid_rows(),
    audit.rejected_transactions()
  );

  Ok(())
}

type TransactionsAsyncRead = Box<dyn AsyncRead + Unpin + Send + Sync>;

/// This allows to use either a file if the path is specified in the command line,
/// or the stdin otherwise, which might be more convenient for pipe the data.
async fn get_transactions_async_read(path: Option<&Path>) -> Result<TransactionsAsyncRead> {
  match path {
    Some(path) => tokio::fs::File::open(path)
      .await
      .map(|file| Box::new(file) as TransactionsAsyncRead)
      .with_context(|| format!("Unable to open {}", path.display())),
    None => Ok(Box::new(tokio::io::stdin()) as TransactionsAsyncRead),
  }
}
