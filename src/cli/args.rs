use crate::io::csv_format::parse_timestamp;
use crate::strategy::BatchConfig;
use crate::types::{
    CustomerId, LedgerError, NewTransaction, TransactionId, TransactionPatch, TransactionStatus,
    TransactionType,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Shop ledger with customer balances derived from their transactions
#[derive(Parser, Debug)]
#[command(name = "ledger")]
#[command(about = "Shop ledger with customer balances derived from their transactions", long_about = None)]
pub struct CliArgs {
    /// Directory holding customers.csv and transactions.csv
    #[arg(
        long = "data-dir",
        value_name = "DIR",
        env = "LEDGER_DATA_DIR",
        default_value = "ledger-data"
    )]
    pub data_dir: PathBuf,

    /// Default log filter; RUST_LOG takes precedence when set
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        env = "LEDGER_LOG",
        default_value = "info"
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage customers
    #[command(subcommand)]
    Customer(CustomerCommand),

    /// Manage transactions
    #[command(subcommand)]
    Tx(TxCommand),

    /// Recompute every customer's balances from their transactions
    Recalculate,

    /// List customers whose stored balances have drifted, without changing anything
    Audit,

    /// Confirmed income per month
    Income,

    /// Bulk-import transactions from a CSV file
    Import(ImportArgs),
}

#[derive(Subcommand, Debug)]
pub enum CustomerCommand {
    /// Register a customer
    Add {
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// List all customers with their balances
    List,

    /// Change customer details; pass an empty value to clear phone or address
    Update {
        id: CustomerId,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// Delete a customer, keeping their transactions as walk-in records
    Delete { id: CustomerId },

    /// Delete every customer and every transaction
    DeleteAll,
}

#[derive(Subcommand, Debug)]
pub enum TxCommand {
    /// Record a transaction
    Add(TxAddArgs),

    /// List transactions, newest first
    List {
        /// Only this customer's transactions
        #[arg(long)]
        customer: Option<CustomerId>,
    },

    /// Change fields of a transaction
    Update(TxUpdateArgs),

    /// Delete a transaction
    Delete { id: TransactionId },

    /// Confirm a pending transaction
    Confirm { id: TransactionId },

    /// Delete every transaction and reset all balances
    DeleteAll,
}

#[derive(Args, Debug)]
pub struct TxAddArgs {
    /// cash, credit or cheque
    #[arg(value_name = "TYPE")]
    pub tx_type: TransactionType,

    pub amount: Decimal,

    #[arg(long)]
    pub customer: Option<CustomerId>,

    #[arg(long = "cheque-number")]
    pub cheque_number: Option<String>,

    /// YYYY-MM-DD
    #[arg(long = "cheque-date")]
    pub cheque_date: Option<NaiveDate>,

    /// RFC 3339 timestamp or YYYY-MM-DD; defaults to now
    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<DateTime<Utc>>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct TxUpdateArgs {
    pub id: TransactionId,

    #[arg(long)]
    pub amount: Option<Decimal>,

    #[arg(long = "type", value_name = "TYPE")]
    pub tx_type: Option<TransactionType>,

    #[arg(long, conflicts_with = "walk_in")]
    pub customer: Option<CustomerId>,

    /// Detach the transaction from its customer
    #[arg(long = "walk-in")]
    pub walk_in: bool,

    #[arg(long = "cheque-number")]
    pub cheque_number: Option<String>,

    #[arg(long = "cheque-date")]
    pub cheque_date: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date_arg)]
    pub date: Option<DateTime<Utc>>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub status: Option<TransactionStatus>,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Input CSV file path
    #[arg(value_name = "FILE")]
    pub input_file: PathBuf,

    /// Processing strategy to use for the import
    #[arg(
        long = "strategy",
        value_name = "STRATEGY",
        default_value = "async",
        help = "Processing strategy: 'sync' for synchronous or 'async' for asynchronous"
    )]
    pub strategy: StrategyType,

    /// Number of rows per batch (async mode only)
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of rows per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Number of worker threads (async mode only)
    #[arg(
        long = "max-concurrent",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub max_concurrent_batches: Option<usize>,
}

/// Available import strategies
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyType {
    Sync,
    Async,
}

fn parse_date_arg(value: &str) -> Result<DateTime<Utc>, LedgerError> {
    parse_timestamp("date", value)
}

impl TxAddArgs {
    pub fn to_new_transaction(&self) -> NewTransaction {
        NewTransaction {
            amount: self.amount,
            tx_type: self.tx_type,
            customer_id: self.customer,
            cheque_number: self.cheque_number.clone(),
            cheque_date: self.cheque_date,
            date: self.date,
            description: self.description.clone(),
        }
    }
}

impl TxUpdateArgs {
    /// Build the patch; `--walk-in` clears the customer
    pub fn to_patch(&self) -> TransactionPatch {
        let customer_id = if self.walk_in {
            Some(None)
        } else {
            self.customer.map(Some)
        };

        TransactionPatch {
            amount: self.amount,
            tx_type: self.tx_type,
            customer_id,
            cheque_number: self.cheque_number.clone().map(Some),
            cheque_date: self.cheque_date.map(Some),
            description: self.description.clone().map(Some),
            date: self.date,
            status: self.status,
        }
    }
}

impl ImportArgs {
    /// Create a BatchConfig from CLI arguments
    ///
    /// Values not given on the command line fall back to the defaults.
    pub fn to_batch_config(&self) -> BatchConfig {
        if self.batch_size.is_some() || self.max_concurrent_batches.is_some() {
            let default = BatchConfig::default();
            BatchConfig::new(
                self.batch_size.unwrap_or(default.batch_size),
                self.max_concurrent_batches
                    .unwrap_or(default.max_concurrent_batches),
            )
        } else {
            BatchConfig::default()
        }
    }
}
