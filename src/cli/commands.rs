use crate::cli::args::{CliArgs, Command, CustomerCommand, ImportArgs, StrategyType, TxCommand};
use crate::core::Ledger;
use crate::io::{
    load_snapshot, save_snapshot, write_customers_csv, write_drift_csv, write_income_csv,
    write_transactions_csv,
};
use crate::strategy::create_strategy;
use crate::types::{CustomerPatch, LedgerError, LedgerSnapshot, NewCustomer};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Execute one command against the data directory
///
/// The data directory is loaded, the command runs in memory and the new state
/// is saved only when the command changed something and succeeded. Output is
/// buffered until the save is done, so nothing is printed for a command whose
/// result did not reach disk.
pub fn run(args: &CliArgs, output: &mut dyn Write) -> Result<(), LedgerError> {
    let snapshot = load_snapshot(&args.data_dir)?;

    if let Command::Import(import) = &args.command {
        return run_import(import, &args.data_dir, snapshot, output);
    }

    let mut ledger = Ledger::from_snapshot(snapshot);
    let mut buffer = Vec::new();
    let changed = execute(&args.command, &mut ledger, &mut buffer)?;

    if changed {
        save_snapshot(&args.data_dir, &ledger.snapshot())?;
    }

    output.write_all(&buffer)?;
    output.flush()?;
    Ok(())
}

/// Run a ledger command; returns whether ledger state changed
fn execute(
    command: &Command,
    ledger: &mut Ledger,
    out: &mut dyn Write,
) -> Result<bool, LedgerError> {
    match command {
        Command::Customer(command) => execute_customer(command, ledger, out),
        Command::Tx(command) => execute_tx(command, ledger, out),
        Command::Recalculate => {
            let report = ledger.recalculate_all();
            writeln!(out, "Recalculated {} customers", report.recalculated.len())?;
            for failure in &report.failures {
                writeln!(out, "Failed customer {}: {}", failure.customer_id, failure.error)?;
            }
            Ok(true)
        }
        Command::Audit => {
            write_drift_csv(&ledger.audit(), out)?;
            Ok(false)
        }
        Command::Income => {
            write_income_csv(&ledger.income_by_month()?, out)?;
            Ok(false)
        }
        Command::Import(_) => Ok(false),
    }
}

fn execute_customer(
    command: &CustomerCommand,
    ledger: &mut Ledger,
    out: &mut dyn Write,
) -> Result<bool, LedgerError> {
    match command {
        CustomerCommand::Add {
            name,
            phone,
            address,
        } => {
            let customer = ledger.create_customer(NewCustomer {
                name: name.clone(),
                phone: phone.clone(),
                address: address.clone(),
            })?;
            write_customers_csv([&customer], out)?;
            Ok(true)
        }
        CustomerCommand::List => {
            write_customers_csv(ledger.customers(), out)?;
            Ok(false)
        }
        CustomerCommand::Update {
            id,
            name,
            phone,
            address,
        } => {
            let patch = CustomerPatch {
                name: name.clone(),
                phone: phone.clone().map(Some),
                address: address.clone().map(Some),
            };
            let customer = ledger.update_customer(*id, patch)?;
            write_customers_csv([&customer], out)?;
            Ok(true)
        }
        CustomerCommand::Delete { id } => {
            let customer = ledger.delete_customer(*id)?;
            writeln!(out, "Deleted customer {} ({})", customer.id, customer.name)?;
            Ok(true)
        }
        CustomerCommand::DeleteAll => {
            let summary = ledger.delete_all_customers();
            writeln!(
                out,
                "Deleted {} customers and {} transactions",
                summary.customers, summary.transactions
            )?;
            Ok(true)
        }
    }
}

fn execute_tx(
    command: &TxCommand,
    ledger: &mut Ledger,
    out: &mut dyn Write,
) -> Result<bool, LedgerError> {
    match command {
        TxCommand::Add(add) => {
            let tx = ledger.create_transaction(add.to_new_transaction())?;
            write_transactions_csv([&tx], out)?;
            Ok(true)
        }
        TxCommand::List { customer } => {
            write_transactions_csv(ledger.transactions(*customer), out)?;
            Ok(false)
        }
        TxCommand::Update(update) => {
            let tx = ledger.update_transaction(update.id, update.to_patch())?;
            write_transactions_csv([&tx], out)?;
            Ok(true)
        }
        TxCommand::Delete { id } => {
            let tx = ledger.delete_transaction(*id)?;
            writeln!(out, "Deleted transaction {}", tx.id)?;
            Ok(true)
        }
        TxCommand::Confirm { id } => {
            let tx = ledger.confirm_transaction(*id)?;
            write_transactions_csv([&tx], out)?;
            Ok(true)
        }
        TxCommand::DeleteAll => {
            let removed = ledger.delete_all_transactions()?;
            writeln!(out, "Deleted {} transactions", removed)?;
            Ok(true)
        }
    }
}

fn run_import(
    import: &ImportArgs,
    data_dir: &Path,
    snapshot: LedgerSnapshot,
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let config = if matches!(import.strategy, StrategyType::Async) {
        Some(import.to_batch_config())
    } else {
        None
    };
    let strategy = create_strategy(import.strategy, config);

    info!(input = %import.input_file.display(), strategy = ?import.strategy, "Starting import");
    let outcome = strategy.import(&import.input_file, snapshot)?;
    save_snapshot(data_dir, &outcome.snapshot)?;

    writeln!(
        output,
        "Imported {} rows, rejected {}",
        outcome.imported,
        outcome.rejected.len()
    )?;
    for rejection in &outcome.rejected {
        writeln!(output, "line {}: {}", rejection.line, rejection.error)?;
    }
    output.flush()?;
    Ok(())
}
