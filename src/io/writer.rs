use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use tokio::io::AsyncWrite;

use super::account::AccountReport as AccountRow;
use crate::payments::AccountReport;

const HEADER: [&str; 5] = ["client", "available", "held", "total", "locked"];

/// Interface for an account report writer
#[async_trait(?Send)]
pub trait AccountsReportWriter {
  /// Write the accounts information provided by the [`Iterator`] and return whether the operation was successful or not.
  async fn write_accounts_report<'a, T>(&'a mut self, report: T) -> Result<()>
  where
    T: Iterator<Item = AccountReport> + 'a;
}

/// An implementation of [`AccountsReportWriter`] for the CSV format.
///
/// The header is always written, so a run without accounts still produces a valid CSV.
pub struct CsvAccountsReportWriter<W>(W);

impl<W> CsvAccountsReportWriter<W>
where
  W: AsyncWrite + Unpin + Send + Sync,
{
  pub fn new(writer: W) -> Self {
    Self(writer)
  }
}

#[async_trait(?Send)]
impl<W> AccountsReportWriter for CsvAccountsReportWriter<W>
where
  W: AsyncWrite + Unpin + Send + Sync,
{
  async fn write_accounts_report<'a, T>(&'a mut self, report: T) -> Result<()>
  where
    T: Iterator<Item = AccountReport> + 'a,
  {
    let mut serializer = csv_async::AsyncWriterBuilder::new()
      .has_headers(false)
      .create_serializer(&mut self.0);

    serializer.serialize(HEADER).await?;
    let mut rows = 0usize;
    for account_report in report {
      serializer.serialize(AccountRow::from(account_report)).await?;
      rows += 1;
    }
    serializer.flush().await?;

    debug!("Wrote {} accounts", rows);
    Ok(())
  }
}

#[cfg(test)]
mod tests {

  use std::io::Cursor;
  use std::iter;

  use super::*;
  use crate::payments::{money, Money};

  #[tokio::test]
  async fn write_accounts_report_fails() {
    let buff: &mut [u8] = &mut [0u8, 0, 0, 0];
    let mut buffer = Cursor::new(buff);
    let mut writer = CsvAccountsReportWriter::new(&mut buffer);

    let report = vec![
      AccountReport::new(1, money("100"), money("10"), money("110"), false),
      AccountReport::new(2, money("90"), Money::ZERO, money("90"), true),
    ]
    .into_iter();

    let result = writer.write_accounts_report(report).await;

    assert!(result.is_err());
  }

  #[tokio::test]
  async fn write_accounts_empty_keeps_header() {
    let mut buffer = Vec::<u8>::with_capacity(1024);
    let mut writer = CsvAccountsReportWriter::new(&mut buffer);

    let result = writer.write_accounts_report(iter::empty()).await;

    assert!(result.is_ok());
    assert_eq!(
      String::from_utf8_lossy(buffer.as_slice()),
      "client,available,held,total,locked\n"
    )
  }

  #[tokio::test]
  async fn write_accounts_report_success() {
    let mut buffer = Vec::<u8>::with_capacity(1024);
    let mut writer = CsvAccountsReportWriter::new(&mut buffer);

    let report = vec![
      AccountReport::new(1, money("100"), money("10"), money("110"), false),
      AccountReport::new(2, money("1.5"), Money::ZERO, money("1.5"), true),
      AccountReport::new(7, money("0.0001"), Money::ZERO, money("0.0001"), false),
    ]
    .into_iter();

    let result = writer.write_accounts_report(report).await;

    assert!(result.is_ok());
    assert_eq!(
      String::from_utf8_lossy(buffer.as_slice()),
      "client,available,held,total,locked\n\
       1,100.0000,10.0000,110.0000,false\n\
       2,1.5000,0.0000,1.5000,true\n\
       7,0.0001,0.0000,0.0001,false\n"
    )
  }
}
