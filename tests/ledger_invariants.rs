//! Balance invariant tests
//!
//! Drives the single-writer [`Ledger`] and the concurrent [`SharedLedger`]
//! through the same long, mixed sequence of lifecycle operations and checks
//! after every step that each customer's stored balances equal the signed sums
//! of their confirmed and pending transactions.

use chrono::NaiveDate;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use shop_ledger::types::{CustomerId, CustomerPatch, TransactionPatch};
use shop_ledger::{
    Customer, Ledger, NewCustomer, NewTransaction, SharedLedger, Transaction, TransactionStatus,
    TransactionType,
};

/// Small deterministic generator so failures replay exactly
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

fn expected_balances(transactions: &[Transaction]) -> (Decimal, Decimal) {
    transactions
        .iter()
        .fold((Decimal::ZERO, Decimal::ZERO), |(credit, pending), tx| {
            match tx.status {
                TransactionStatus::Confirmed => (credit + tx.signed_amount(), pending),
                TransactionStatus::Pending => (credit, pending + tx.signed_amount()),
            }
        })
}

fn assert_consistent(
    customers: &[Customer],
    transactions_of: impl Fn(CustomerId) -> Vec<Transaction>,
) {
    for customer in customers {
        let (credit, pending) = expected_balances(&transactions_of(customer.id));
        assert_eq!(customer.credit_balance(), credit, "credit of {}", customer.id);
        assert_eq!(customer.pending_balance(), pending, "pending of {}", customer.id);
    }
}

fn random_transaction(rng: &mut Lcg, customers: u64) -> NewTransaction {
    let amount = Decimal::new(rng.below(100_000) as i64, 2);
    let customer = rng.below(customers + 1);
    let tx_type = match rng.below(3) {
        0 => TransactionType::Cash,
        1 => TransactionType::Credit,
        _ => TransactionType::Cheque,
    };

    let mut new = NewTransaction::new(tx_type, amount);
    if customer > 0 {
        new = new.customer(customer);
    }
    if tx_type == TransactionType::Cheque && rng.below(5) > 0 {
        let date = NaiveDate::from_ymd_opt(2024, 1 + rng.below(12) as u32, 1).unwrap();
        new = new.cheque(format!("CH{:06}", rng.below(1_000_000)), date);
    }
    new
}

fn random_patch(rng: &mut Lcg, customers: u64) -> TransactionPatch {
    let mut patch = TransactionPatch::default();
    match rng.below(4) {
        0 => patch.amount = Some(Decimal::new(rng.below(50_000) as i64, 2)),
        1 => patch.customer_id = Some(Some(1 + rng.below(customers))),
        2 => patch.status = Some(TransactionStatus::Confirmed),
        _ => patch.tx_type = Some(TransactionType::Cash),
    }
    patch
}

#[rstest]
#[case(7)]
#[case(42)]
#[case(20240301)]
fn test_single_writer_ledger_never_drifts(#[case] seed: u64) {
    let mut rng = Lcg(seed);
    let mut ledger = Ledger::new();
    let customers = 5;
    for i in 0..customers {
        ledger
            .create_customer(NewCustomer::new(format!("Customer {}", i + 1)))
            .unwrap();
    }

    for _ in 0..400 {
        let known = ledger.transactions(None).len() as u64 + 5;
        let _ = match rng.below(10) {
            0..=4 => ledger.create_transaction(random_transaction(&mut rng, customers)),
            5 | 6 => ledger.confirm_transaction(1 + rng.below(known)),
            7 | 8 => {
                let target = 1 + rng.below(known);
                ledger.update_transaction(target, random_patch(&mut rng, customers))
            }
            _ => ledger.delete_transaction(1 + rng.below(known)),
        };

        assert!(ledger.audit().is_empty());
    }

    let customers: Vec<Customer> = ledger.customers().into_iter().cloned().collect();
    assert_consistent(&customers, |id| {
        ledger.transactions(Some(id)).into_iter().cloned().collect()
    });
}

#[rstest]
#[case(11)]
#[case(99)]
fn test_shared_ledger_matches_single_writer(#[case] seed: u64) {
    let mut ledger = Ledger::new();
    let shared = SharedLedger::new();
    for name in ["Amal", "Nimal", "Kamal"] {
        ledger.create_customer(NewCustomer::new(name)).unwrap();
        shared.create_customer(NewCustomer::new(name)).unwrap();
    }

    let mut rng = Lcg(seed);
    for _ in 0..300 {
        let choice = rng.below(10);
        let target = 1 + rng.below(40);
        match choice {
            0..=4 => {
                let new = random_transaction(&mut rng, 3);
                assert_eq!(
                    ledger.create_transaction(new.clone()).is_ok(),
                    shared.create_transaction(new).is_ok()
                );
            }
            5 | 6 => assert_eq!(
                ledger.confirm_transaction(target).is_ok(),
                shared.confirm_transaction(target).is_ok()
            ),
            7 | 8 => {
                let patch = random_patch(&mut rng, 3);
                assert_eq!(
                    ledger.update_transaction(target, patch.clone()).is_ok(),
                    shared.update_transaction(target, patch).is_ok()
                );
            }
            _ => assert_eq!(
                ledger.delete_transaction(target).is_ok(),
                shared.delete_transaction(target).is_ok()
            ),
        }
    }

    assert!(shared.audit().is_empty());
    let single: Vec<Customer> = ledger.customers().into_iter().cloned().collect();
    assert_eq!(single, shared.customers());
    assert_consistent(&shared.customers(), |id| shared.transactions(Some(id)));
}

#[test]
fn test_customer_edits_keep_balances() {
    let mut ledger = Ledger::new();
    let id = ledger.create_customer(NewCustomer::new("Amal")).unwrap().id;
    let tx = ledger
        .create_transaction(NewTransaction::new(TransactionType::Credit, dec!(900)).customer(id))
        .unwrap();
    ledger.confirm_transaction(tx.id).unwrap();

    let patch = CustomerPatch {
        name: Some("Amal Perera".to_string()),
        phone: Some(Some("0771234567".to_string())),
        address: None,
    };
    let customer = ledger.update_customer(id, patch).unwrap();

    assert_eq!(customer.name, "Amal Perera");
    assert_eq!(customer.credit_balance(), dec!(900));
    assert!(ledger.audit().is_empty());
}

#[test]
fn test_recalculate_after_delete_all_transactions() {
    let mut ledger = Ledger::new();
    let id = ledger.create_customer(NewCustomer::new("Nimal")).unwrap().id;
    for amount in [dec!(10), dec!(20.5), dec!(30.25)] {
        ledger
            .create_transaction(NewTransaction::new(TransactionType::Credit, amount).customer(id))
            .unwrap();
    }
    assert_eq!(ledger.customer(id).unwrap().pending_balance(), dec!(60.75));

    assert_eq!(ledger.delete_all_transactions().unwrap(), 3);

    let customer = ledger.customer(id).unwrap();
    assert_eq!(customer.credit_balance(), Decimal::ZERO);
    assert_eq!(customer.pending_balance(), Decimal::ZERO);
    assert!(ledger.recalculate_all().is_complete());
}
