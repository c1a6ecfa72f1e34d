use std::convert::TryFrom;

use csv_async::StringRecord;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_stream::{Stream, StreamExt};

use crate::payments::{Transaction, ValidationError};

/// Problems found while reading transactions.
///
/// Only [`ReadError::Io`] means that the source can not be read anymore,
/// the rest are about a single row and the stream can go on.
#[derive(Debug, Error)]
pub enum ReadError {
  #[error("Invalid transaction: {0}")]
  Invalid(#[from] ValidationError),

  #[error("Malformed row: {0}")]
  Malformed(csv_async::Error),

  #[error("Failed reading transactions: {0}")]
  Io(csv_async::Error),
}

impl ReadError {
  pub fn is_fatal(&self) -> bool {
    matches!(self, ReadError::Io(_))
  }
}

impl From<csv_async::Error> for ReadError {
  fn from(error: csv_async::Error) -> Self {
    match error.kind() {
      csv_async::ErrorKind::Io(_) => ReadError::Io(error),
      _ => ReadError::Malformed(error),
    }
  }
}

/// Interface to read transactions from an external source
pub trait TransactionsReader {
  /// Read transactions and return an [`Stream`] of possibly successful transactions.
  /// Each item yielded by the stream is either `Ok` if the transaction was read successfully,
  /// or `Err` if there was any kind of problem (like wrong format).
  fn read_transactions<'a>(
    &'a mut self,
  ) -> Box<dyn Stream<Item = Result<Transaction, ReadError>> + Unpin + 'a>;
}

/// Implementation of [`TransactionsReader`] for the CSV format.
///
/// Fields are matched by the names in the header row, so columns can come in any order,
/// and a row without the trailing `amount` column is accepted.
pub struct CsvTransactionsReader<R>(R);

impl<R> CsvTransactionsReader<R>
where
  R: AsyncRead + Unpin + Send + Sync,
{
  pub fn new(reader: R) -> Self {
    Self(reader)
  }
}

impl<R> TransactionsReader for CsvTransactionsReader<R>
where
  R: AsyncRead + Unpin + Send + Sync,
{
  fn read_transactions<'a>(
    &'a mut self,
  ) -> Box<dyn Stream<Item = Result<Transaction, ReadError>> + Unpin + 'a> {
    let mut headers: Option<StringRecord> = None;
    Box::new(
      csv_async::AsyncReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .create_reader(&mut self.0)
        .into_records()
        .filter_map(move |maybe_record| {
          let mut record = match maybe_record {
            Ok(record) => record,
            Err(error) => return Some(Err(ReadError::from(error))),
          };
          record.trim();
          if let Some(headers) = &headers {
            return Some(parse_record(&record, headers));
          }
          headers = Some(record);
          None
        }),
    )
  }
}

fn parse_record(record: &StringRecord, headers: &StringRecord) -> Result<Transaction, ReadError> {
  let transaction = record.deserialize::<super::transaction::Transaction>(Some(headers))?;
  Ok(Transaction::try_from(transaction)?)
}

#[cfg(test)]
pub(crate) mod tests {

  use std::io;
  use std::pin::Pin;
  use std::task::{Context, Poll};

  use indoc::indoc;
  use tokio::io::ReadBuf;

  use super::*;
  use crate::payments::money;

  /// Reader that yields `data` and then fails as if the source went away
  pub(crate) struct FailingRead(pub &'static [u8]);

  impl AsyncRead for FailingRead {
    fn poll_read(
      mut self: Pin<&mut Self>,
      _cx: &mut Context<'_>,
      buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
      if self.0.is_empty() {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "source went away")))
      } else {
        let size = std::cmp::min(buf.remaining(), self.0.len());
        buf.put_slice(&self.0[..size]);
        self.0 = &self.0[size..];
        Poll::Ready(Ok(()))
      }
    }
  }

  #[tokio::test]
  async fn read_transactions_with_format_errors() {
    let input = indoc! { "
      type,      client,     tx,        amount
      deposit
      deposit,,,
       withdrawal,    2,    102,
      withdrawal,    2,    103

      deposit  ,      3,    202 ,
      deposit  ,      3,    203
      unknown,1,2,3
      dispute,   1,   -4,
      deposit,   1,    5,   -1.0
      deposit,   1,    6,   1.00001
      resolve,   1,    7,   2.0
    " }
    .as_bytes();

    let mut reader = CsvTransactionsReader::new(input);

    let errors = reader
      .read_transactions()
      .filter_map(|tx| tx.err())
      .collect::<Vec<ReadError>>()
      .await;

    assert_eq!(errors.len(), 11);
    assert!(errors.iter().all(|err| !err.is_fatal()));
    assert!(matches!(
      errors[1],
      ReadError::Invalid(ValidationError::MalformedId { field: "client", .. })
    ));
    assert!(matches!(
      errors[2],
      ReadError::Invalid(ValidationError::MissingAmount)
    ));
    assert!(matches!(
      errors[6],
      ReadError::Invalid(ValidationError::UnknownKind(_))
    ));
    assert!(matches!(
      errors[8],
      ReadError::Invalid(ValidationError::NegativeAmount)
    ));
    assert!(matches!(
      errors[10],
      ReadError::Invalid(ValidationError::UnexpectedAmount)
    ));
  }

  #[tokio::test]
  async fn read_transactions_success() {
    let input = indoc! { "
      type,       client,   tx,  amount
      deposit,         1,  101,     100
       withdrawal,     2,  102,    10.5
      dispute,         1,  103,
      resolve,         1,  104
      chargeback,      1,  105,
      Deposit,         3,  106,  0.0001
    " }
    .as_bytes();

    let mut reader = CsvTransactionsReader::new(input);

    let transactions = reader
      .read_transactions()
      .map(|tx| tx.map_err(|err| err.to_string()))
      .collect::<Vec<Result<Transaction, String>>>()
      .await;

    assert_eq!(
      transactions,
      vec![
        Ok(Transaction::Deposit {
          client_id: 1,
          transaction_id: 101,
          amount: money("100"),
        }),
        Ok(Transaction::Withdrawal {
          client_id: 2,
          transaction_id: 102,
          amount: money("10.5"),
        }),
        Ok(Transaction::Dispute {
          client_id: 1,
          transaction_id: 103,
        }),
        Ok(Transaction::Resolve {
          client_id: 1,
          transaction_id: 104,
        }),
        Ok(Transaction::Chargeback {
          client_id: 1,
          transaction_id: 105,
        }),
        Ok(Transaction::Deposit {
          client_id: 3,
          transaction_id: 106,
          amount: money("0.0001"),
        })
      ]
    )
  }

  #[tokio::test]
  async fn read_transactions_by_header_names() {
    let input = indoc! { "
      tx,  amount,  type,        client
      101,    2.5,  deposit,     1
      102,       ,  dispute,     3
    " }
    .as_bytes();

    let mut reader = CsvTransactionsReader::new(input);

    let transactions = reader
      .read_transactions()
      .map(|tx| tx.map_err(|err| err.to_string()))
      .collect::<Vec<Result<Transaction, String>>>()
      .await;

    assert_eq!(
      transactions,
      vec![
        Ok(Transaction::Deposit {
          client_id: 1,
          transaction_id: 101,
          amount: money("2.5"),
        }),
        Ok(Transaction::Dispute {
          client_id: 3,
          transaction_id: 102,
        }),
      ]
    )
  }

  #[tokio::test]
  async fn read_transactions_without_amount_column() {
    let input = indoc! { "
      type,     client,  tx
      dispute,       1,   7
      deposit,       1,   8
    " }
    .as_bytes();

    let mut reader = CsvTransactionsReader::new(input);

    let transactions = reader.read_transactions().collect::<Vec<_>>().await;

    assert_eq!(transactions.len(), 2);
    assert!(matches!(
      transactions[0],
      Ok(Transaction::Dispute {
        client_id: 1,
        transaction_id: 7
      })
    ));
    assert!(matches!(
      transactions[1],
      Err(ReadError::Invalid(ValidationError::MissingAmount))
    ));
  }

  #[tokio::test]
  async fn read_transactions_source_failure() {
    let mut reader = CsvTransactionsReader::new(FailingRead(b"type,client,tx,amount\n"));

    let first = reader.read_transactions().next().await;

    assert!(matches!(first, Some(Err(err)) if err.is_fatal()));
  }
}
