//! Shop ledger CLI
//!
//! Keeps customers and their transactions in a data directory and reports
//! balances derived from those transactions.
//!
//! # Usage
//!
//! ```bash
//! ledger customer add "Amal Perera" --phone 0771234567
//! ledger tx add credit 5000 --customer 1
//! ledger tx confirm 1
//! ledger tx add cheque 1200 --customer 1 --cheque-number 000451 --cheque-date 2024-09-30
//! ledger customer list > customers.csv
//! ledger import --strategy async --batch-size 2000 sales.csv
//! ledger --data-dir /srv/shop recalculate
//! ```
//!
//! Listings are written to stdout as CSV. Logs go to stderr; set `RUST_LOG` or
//! `--log-level` to change verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid input, unknown id, unreadable data directory, etc.)

use shop_ledger::cli;
use std::process;

fn main() {
    let args = cli::parse_args();
    cli::init_logging(&args.log_level);

    let mut output = std::io::stdout();
    if let Err(e) = cli::run(&args, &mut output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
