//! Income summaries over confirmed transactions

use crate::types::{LedgerError, Transaction, TransactionType};
use chrono::Datelike;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Confirmed takings for one calendar month
///
/// Amounts are unsigned: a cash payment and a credit sale both count as income.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyIncome {
    pub year: i32,
    /// 1 to 12
    pub month: u32,
    pub total: Decimal,
    pub cash: Decimal,
    pub credit: Decimal,
    pub cheque: Decimal,
}

impl MonthlyIncome {
    fn empty(year: i32, month: u32) -> Self {
        MonthlyIncome {
            year,
            month,
            total: Decimal::ZERO,
            cash: Decimal::ZERO,
            credit: Decimal::ZERO,
            cheque: Decimal::ZERO,
        }
    }
}

/// Group confirmed transactions by (year, month), oldest month first
///
/// Pending transactions are not income yet and are skipped.
///
/// # Errors
///
/// Returns an overflow error if a monthly sum leaves the decimal range.
pub fn income_by_month<'a, I>(transactions: I) -> Result<Vec<MonthlyIncome>, LedgerError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut months: BTreeMap<(i32, u32), MonthlyIncome> = BTreeMap::new();

    for tx in transactions.into_iter().filter(|tx| tx.is_confirmed()) {
        let key = (tx.date.year(), tx.date.month());
        let entry = months
            .entry(key)
            .or_insert_with(|| MonthlyIncome::empty(key.0, key.1));

        let by_type = match tx.tx_type {
            TransactionType::Cash => &mut entry.cash,
            TransactionType::Credit => &mut entry.credit,
            TransactionType::Cheque => &mut entry.cheque,
        };
        *by_type = add_income(*by_type, tx.amount)?;
        entry.total = add_income(entry.total, tx.amount)?;
    }

    Ok(months.into_values().collect())
}

fn add_income(sum: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    sum.checked_add(amount)
        .ok_or_else(|| LedgerError::arithmetic_overflow("monthly income", None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewTransaction, TransactionStatus};
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn confirmed(tx_type: TransactionType, amount: Decimal, y: i32, m: u32) -> Transaction {
        let mut tx = NewTransaction::new(tx_type, amount)
            .dated(Utc.with_ymd_and_hms(y, m, 15, 10, 0, 0).unwrap())
            .into_transaction(1, Utc::now());
        tx.status = TransactionStatus::Confirmed;
        tx
    }

    #[test]
    fn test_groups_by_year_and_month() {
        let transactions = vec![
            confirmed(TransactionType::Cash, dec!(100), 2024, 1),
            confirmed(TransactionType::Credit, dec!(250), 2024, 1),
            confirmed(TransactionType::Cheque, dec!(75), 2024, 2),
            confirmed(TransactionType::Cash, dec!(10), 2023, 1),
        ];

        let summary = income_by_month(&transactions).unwrap();
        assert_eq!(summary.len(), 3);

        assert_eq!((summary[0].year, summary[0].month), (2023, 1));
        assert_eq!(summary[0].total, dec!(10));

        assert_eq!((summary[1].year, summary[1].month), (2024, 1));
        assert_eq!(summary[1].total, dec!(350));
        assert_eq!(summary[1].cash, dec!(100));
        assert_eq!(summary[1].credit, dec!(250));
        assert_eq!(summary[1].cheque, dec!(0));

        assert_eq!(summary[2].cheque, dec!(75));
    }

    #[test]
    fn test_pending_transactions_are_not_income() {
        let mut pending = confirmed(TransactionType::Credit, dec!(500), 2024, 6);
        pending.status = TransactionStatus::Pending;

        assert!(income_by_month(&[pending]).unwrap().is_empty());
    }

    #[test]
    fn test_income_overflow_is_an_error() {
        let transactions = vec![
            confirmed(TransactionType::Cash, Decimal::MAX, 2024, 3),
            confirmed(TransactionType::Credit, dec!(1), 2024, 3),
        ];

        let result = income_by_month(&transactions);
        assert_eq!(
            result,
            Err(LedgerError::arithmetic_overflow("monthly income", None))
        );
    }
}
