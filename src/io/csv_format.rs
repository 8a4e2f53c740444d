//! CSV format handling for import rows, data files and listings
//!
//! This module centralizes all CSV format concerns, providing:
//! - Row structures for the import file and the two data files
//! - Conversion between rows and domain types
//! - Listing output for customers, transactions, income and drift
//!
//! Conversions are pure; writers take any `Write`.
//!
//! # Formats
//!
//! Import: `type,customer,amount,cheque_number,cheque_date,date,description,status`
//!
//! `customers.csv`: `id,name,phone,address,credit_balance,pending_balance`
//!
//! `transactions.csv`:
//! `id,amount,type,customer_id,cheque_number,cheque_date,date,description,status`
//!
//! Timestamps are RFC 3339 in UTC. Cheque dates are `YYYY-MM-DD`.

use crate::core::{BalanceDrift, MonthlyIncome};
use crate::types::{
    Balances, Customer, CustomerId, ImportRecord, LedgerError, NewCustomer, NewTransaction,
    Transaction, TransactionId, TransactionStatus, TransactionType,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use csv::Writer;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;

const CHEQUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of an import file
///
/// Everything except `type` and `amount` may be blank or missing.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ImportRow {
    #[serde(rename = "type")]
    pub tx_type: String,
    #[serde(default)]
    pub customer: Option<CustomerId>,
    pub amount: String,
    #[serde(default)]
    pub cheque_number: Option<String>,
    #[serde(default)]
    pub cheque_date: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Row of `customers.csv`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CustomerRow {
    pub id: CustomerId,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub credit_balance: String,
    pub pending_balance: String,
}

/// Row of `transactions.csv`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub amount: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub cheque_number: Option<String>,
    #[serde(default)]
    pub cheque_date: Option<String>,
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
}

/// Convert an import row into an [`ImportRecord`]
///
/// This function:
/// - Parses the transaction type (case-insensitive)
/// - Parses the amount as a decimal
/// - Parses the optional cheque date and timestamp
/// - Turns a `Confirmed` status into a confirm request
///
/// Type-specific rules (credit needs a customer, cheque needs its details) are
/// left to the ledger so that imported rows are validated exactly like any
/// other create.
///
/// # Arguments
///
/// * `row` - The deserialized CSV row
/// * `line` - Line of the row in the source file
pub fn convert_import_row(row: ImportRow, line: u64) -> Result<ImportRecord, LedgerError> {
    let tx_type = TransactionType::from_str(&row.tx_type)?;
    let amount = parse_amount(&row.amount)?;

    let mut transaction = NewTransaction::new(tx_type, amount);
    transaction.customer_id = row.customer;
    transaction.cheque_number = row.cheque_number;
    transaction.cheque_date = parse_optional(row.cheque_date, parse_cheque_date)?;
    transaction.date = parse_optional(row.date, |s| parse_timestamp("date", s))?;
    transaction.description = row.description;

    let status = parse_optional(row.status, TransactionStatus::from_str)?;

    Ok(ImportRecord {
        line,
        transaction,
        confirm: status == Some(TransactionStatus::Confirmed),
    })
}

pub fn customer_to_row(customer: &Customer) -> CustomerRow {
    CustomerRow {
        id: customer.id,
        name: customer.name.clone(),
        phone: customer.phone.clone(),
        address: customer.address.clone(),
        credit_balance: customer.credit_balance().to_string(),
        pending_balance: customer.pending_balance().to_string(),
    }
}

/// Rebuild a customer from a data file row, keeping the stored balances
pub fn customer_from_row(row: CustomerRow) -> Result<Customer, LedgerError> {
    let details = NewCustomer {
        name: row.name,
        phone: row.phone,
        address: row.address,
    };
    details.validate()?;

    let mut customer = Customer::new(record_id("customer", row.id)?, details);
    customer.set_balances(Balances::new(
        parse_amount(&row.credit_balance)?,
        parse_amount(&row.pending_balance)?,
    ));
    Ok(customer)
}

pub fn transaction_to_row(tx: &Transaction) -> TransactionRow {
    TransactionRow {
        id: tx.id,
        amount: tx.amount.to_string(),
        tx_type: tx.tx_type.to_string(),
        customer_id: tx.customer_id,
        cheque_number: tx.cheque_number.clone(),
        cheque_date: tx
            .cheque_date
            .map(|d| d.format(CHEQUE_DATE_FORMAT).to_string()),
        date: format_timestamp(&tx.date),
        description: tx.description.clone(),
        status: tx.status.to_string(),
    }
}

/// Rebuild a stored transaction from a data file row
///
/// The row is taken as stored: status is not reset to the type's initial
/// status and the type rules are not re-checked.
pub fn transaction_from_row(row: TransactionRow) -> Result<Transaction, LedgerError> {
    Ok(Transaction {
        id: record_id("transaction", row.id)?,
        amount: parse_amount(&row.amount)?,
        tx_type: TransactionType::from_str(&row.tx_type)?,
        customer_id: row.customer_id,
        cheque_number: row.cheque_number.filter(|s| !s.trim().is_empty()),
        cheque_date: parse_optional(row.cheque_date, parse_cheque_date)?,
        status: TransactionStatus::from_str(&row.status)?,
        date: parse_timestamp("date", &row.date)?,
        description: row.description.filter(|s| !s.trim().is_empty()),
    })
}

/// Stored ids must leave room for the next id to be allocated
fn record_id(record: &str, id: u64) -> Result<u64, LedgerError> {
    if id == u64::MAX {
        return Err(LedgerError::ParseError {
            line: None,
            message: format!("{} id {} is out of range", record, id),
        });
    }
    Ok(id)
}

/// Parse a decimal amount
pub fn parse_amount(value: &str) -> Result<Decimal, LedgerError> {
    Decimal::from_str(value.trim()).map_err(|_| LedgerError::invalid_amount(value))
}

/// Parse a `YYYY-MM-DD` cheque date
pub fn parse_cheque_date(value: &str) -> Result<NaiveDate, LedgerError> {
    NaiveDate::parse_from_str(value.trim(), CHEQUE_DATE_FORMAT)
        .map_err(|_| LedgerError::invalid_date("cheque_date", value))
}

/// Parse an RFC 3339 timestamp, or a bare `YYYY-MM-DD` date taken as midnight UTC
pub fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, LedgerError> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, CHEQUE_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| LedgerError::invalid_date(field, value))
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Two decimal places, half away from zero
pub fn money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

/// Blank text counts as absent; anything else must parse
fn parse_optional<T, F>(value: Option<String>, parse: F) -> Result<Option<T>, LedgerError>
where
    F: FnOnce(&str) -> Result<T, LedgerError>,
{
    match value {
        Some(text) if !text.trim().is_empty() => parse(&text).map(Some),
        _ => Ok(None),
    }
}

/// Write customers with balances rounded to two decimal places
///
/// Customers are written in the order given.
pub fn write_customers_csv<'a, I>(customers: I, output: &mut dyn Write) -> Result<(), LedgerError>
where
    I: IntoIterator<Item = &'a Customer>,
{
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "id",
        "name",
        "phone",
        "address",
        "credit_balance",
        "pending_balance",
    ])?;

    for customer in customers {
        writer.write_record(&[
            customer.id.to_string(),
            customer.name.clone(),
            customer.phone.clone().unwrap_or_default(),
            customer.address.clone().unwrap_or_default(),
            money(customer.credit_balance()),
            money(customer.pending_balance()),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write transactions in the data file layout, in the order given
pub fn write_transactions_csv<'a, I>(
    transactions: I,
    output: &mut dyn Write,
) -> Result<(), LedgerError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "id",
        "amount",
        "type",
        "customer_id",
        "cheque_number",
        "cheque_date",
        "date",
        "description",
        "status",
    ])?;
    for tx in transactions {
        let row = transaction_to_row(tx);
        writer.write_record(&[
            row.id.to_string(),
            row.amount,
            row.tx_type,
            row.customer_id.map(|id| id.to_string()).unwrap_or_default(),
            row.cheque_number.unwrap_or_default(),
            row.cheque_date.unwrap_or_default(),
            row.date,
            row.description.unwrap_or_default(),
            row.status,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_income_csv(months: &[MonthlyIncome], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(["month", "total", "cash", "credit", "cheque"])?;

    for month in months {
        writer.write_record(&[
            format!("{:04}-{:02}", month.year, month.month),
            money(month.total),
            money(month.cash),
            money(month.credit),
            money(month.cheque),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_drift_csv(drift: &[BalanceDrift], output: &mut dyn Write) -> Result<(), LedgerError> {
    let mut writer = Writer::from_writer(output);
    writer.write_record([
        "customer",
        "name",
        "stored_credit",
        "stored_pending",
        "expected_credit",
        "expected_pending",
    ])?;

    for entry in drift {
        writer.write_record(&[
            entry.customer_id.to_string(),
            entry.name.clone(),
            entry.stored.credit().to_string(),
            entry.stored.pending().to_string(),
            entry.expected.credit().to_string(),
            entry.expected.pending().to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn import_row(tx_type: &str, amount: &str) -> ImportRow {
        ImportRow {
            tx_type: tx_type.to_string(),
            customer: None,
            amount: amount.to_string(),
            cheque_number: None,
            cheque_date: None,
            date: None,
            description: None,
            status: None,
        }
    }

    #[rstest]
    #[case("cash", TransactionType::Cash)]
    #[case("Credit", TransactionType::Credit)]
    #[case("CHEQUE", TransactionType::Cheque)]
    fn test_convert_import_row_types(#[case] input: &str, #[case] expected: TransactionType) {
        let record = convert_import_row(import_row(input, "12.50"), 2).unwrap();
        assert_eq!(record.transaction.tx_type, expected);
        assert_eq!(record.transaction.amount, dec!(12.50));
        assert_eq!(record.line, 2);
        assert!(!record.confirm);
    }

    #[test]
    fn test_convert_import_row_full() {
        let row = ImportRow {
            customer: Some(3),
            cheque_number: Some("884512".to_string()),
            cheque_date: Some("2024-07-30".to_string()),
            date: Some("2024-07-01T10:15:00+05:00".to_string()),
            description: Some("July settlement".to_string()),
            status: Some("confirmed".to_string()),
            ..import_row("cheque", "400")
        };

        let record = convert_import_row(row, 9).unwrap();
        assert!(record.confirm);
        assert_eq!(record.customer_id(), Some(3));
        assert_eq!(
            record.transaction.cheque_date,
            NaiveDate::from_ymd_opt(2024, 7, 30)
        );
        assert_eq!(
            record.transaction.date,
            Some(Utc.with_ymd_and_hms(2024, 7, 1, 5, 15, 0).unwrap())
        );
    }

    #[rstest]
    #[case::bad_type(import_row("barter", "1"))]
    #[case::bad_amount(import_row("cash", "ten"))]
    #[case::bad_cheque_date(ImportRow { cheque_date: Some("30/07/2024".to_string()), ..import_row("cheque", "1") })]
    #[case::bad_status(ImportRow { status: Some("maybe".to_string()), ..import_row("cash", "1") })]
    fn test_convert_import_row_rejects(#[case] row: ImportRow) {
        let err = convert_import_row(row, 2).unwrap_err();
        assert_eq!(err.kind(), crate::types::ErrorKind::Validation);
    }

    #[test]
    fn test_blank_optional_fields_are_absent() {
        let row = ImportRow {
            cheque_date: Some("  ".to_string()),
            date: Some(String::new()),
            status: Some(" ".to_string()),
            ..import_row("cash", "1")
        };
        let record = convert_import_row(row, 2).unwrap();
        assert_eq!(record.transaction.cheque_date, None);
        assert_eq!(record.transaction.date, None);
        assert!(!record.confirm);
    }

    #[rstest]
    #[case("2024-03-09T08:30:00Z", Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0).unwrap())]
    #[case("2024-03-09", Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap())]
    fn test_parse_timestamp(#[case] input: &str, #[case] expected: DateTime<Utc>) {
        assert_eq!(parse_timestamp("date", input).unwrap(), expected);
    }

    #[test]
    fn test_transaction_row_keeps_status_and_precision() {
        let tx = Transaction {
            id: 7,
            amount: dec!(10.125),
            tx_type: TransactionType::Credit,
            customer_id: Some(2),
            cheque_number: None,
            cheque_date: None,
            status: TransactionStatus::Confirmed,
            date: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            description: Some("rice".to_string()),
        };

        let row = transaction_to_row(&tx);
        assert_eq!(row.amount, "10.125");
        assert_eq!(row.date, "2024-01-02T03:04:05Z");
        assert_eq!(transaction_from_row(row).unwrap(), tx);
    }

    #[test]
    fn test_customer_row_keeps_stored_balances() {
        let row = CustomerRow {
            id: 4,
            name: "Nadia".to_string(),
            phone: None,
            address: Some("Block 6".to_string()),
            credit_balance: "1500.50".to_string(),
            pending_balance: "-200".to_string(),
        };

        let customer = customer_from_row(row.clone()).unwrap();
        assert_eq!(customer.credit_balance(), dec!(1500.50));
        assert_eq!(customer.pending_balance(), dec!(-200));
        assert_eq!(customer_to_row(&customer), row);
    }

    #[test]
    fn test_largest_id_is_rejected_when_loading() {
        let customer = CustomerRow {
            id: u64::MAX,
            name: "Last".to_string(),
            phone: None,
            address: None,
            credit_balance: "0".to_string(),
            pending_balance: "0".to_string(),
        };
        assert!(matches!(
            customer_from_row(customer),
            Err(LedgerError::ParseError { .. })
        ));

        let mut tx = transaction_to_row(&Transaction {
            id: 1,
            amount: dec!(5),
            tx_type: TransactionType::Cash,
            customer_id: None,
            cheque_number: None,
            cheque_date: None,
            status: TransactionStatus::Confirmed,
            date: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            description: None,
        });
        tx.id = u64::MAX - 1;
        assert_eq!(transaction_from_row(tx.clone()).unwrap().id, u64::MAX - 1);
        tx.id = u64::MAX;
        let err = transaction_from_row(tx).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_write_customers_csv_rounds_balances() {
        let mut customer = Customer::new(1, NewCustomer::new("Imran").phone("0321"));
        customer.set_balances(Balances::new(dec!(3000), dec!(-12.346)));

        let mut output = Vec::new();
        write_customers_csv([&customer], &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(
            text,
            "id,name,phone,address,credit_balance,pending_balance\n1,Imran,0321,,3000.00,-12.35\n"
        );
    }

    #[test]
    fn test_write_income_csv() {
        let months = vec![MonthlyIncome {
            year: 2024,
            month: 3,
            total: dec!(150),
            cash: dec!(100),
            credit: dec!(50),
            cheque: dec!(0),
        }];

        let mut output = Vec::new();
        write_income_csv(&months, &mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "month,total,cash,credit,cheque\n2024-03,150.00,100.00,50.00,0.00\n"
        );
    }
}
