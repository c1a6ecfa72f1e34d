//! Processors wire a [`TransactionsReader`](crate::io::TransactionsReader), one or more
//! [`PaymentsEngine`](crate::payments::PaymentsEngine)s and an
//! [`AccountsReportWriter`](crate::io::AccountsReportWriter) together.
//!
//! - [`simple`] applies every transaction in order with a single engine.
//! - [`partitioned`] shards the clients across several engines running in parallel.
//!
//! Both report what could not be applied through the [`audit`] channel.

pub mod audit;
pub mod partitioned;
pub mod simple;
