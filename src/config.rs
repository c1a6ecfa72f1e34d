use std::path::PathBuf;

use clap::Parser;

/// Replay a stream of payment transactions and report the final state of every account
#[derive(Parser, Debug)]
#[command(name = "ledger-replay", version)]
pub struct Config {
  /// CSV file with the transactions. The standard input is read when missing.
  #[arg(value_name = "INPUT")]
  pub input: Option<PathBuf>,

  /// Number of engines processing clients in parallel
  #[arg(
    long,
    value_name = "N",
    default_value_t = 1,
    value_parser = clap::value_parser!(u16).range(1..)
  )]
  pub shards: u16,
}

impl Config {
  pub fn is_partitioned(&self) -> bool {
    self.shards > 1
  }
}

#[cfg(test)]
mod tests {

  use super::*;

  #[test]
  fn parse_defaults() {
    let config = Config::try_parse_from(["ledger-replay"]).unwrap();

    assert_eq!(config.input, None);
    assert_eq!(config.shards, 1);
    assert!(!config.is_partitioned());
  }

  #[test]
  fn parse_input_and_shards() {
    let config =
      Config::try_parse_from(["ledger-replay", "transactions.csv", "--shards", "4"]).unwrap();

    assert_eq!(config.input, Some(PathBuf::from("transactions.csv")));
    assert_eq!(config.shards, 4);
    assert!(config.is_partitioned());
  }

  #[test]
  fn parse_rejects_zero_shards() {
    assert!(Config::try_parse_from(["ledger-replay", "--shards", "0"]).is_err());
  }

  #[test]
  fn parse_rejects_malformed_shards() {
    assert!(Config::try_parse_from(["ledger-replay", "--shards", "many"]).is_err());
  }
}
