//! End-to-end integration tests
//!
//! These tests validate the complete import pipeline using predefined CSV
//! fixtures. Each test:
//! 1. Loads the fixture directory as a data directory (customers.csv and an
//!    optional transactions.csv)
//! 2. Imports input.csv through the selected strategy
//! 3. Saves the result to a fresh data directory and loads it back
//! 4. Compares the customer listing with expected.csv
//!
//! Test fixtures are located in tests/fixtures/ and cover:
//! - Credit, cash and cheque flows with confirmation on import
//! - Rejected rows (unknown types, unknown customers, missing cheque details)
//! - Rounding of listed balances
//! - Importing on top of an existing ledger
//!
//! Each test is run twice: once with the synchronous strategy and once with the async strategy.

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use shop_ledger::cli::StrategyType;
    use shop_ledger::io::{load_snapshot, save_snapshot, write_customers_csv};
    use shop_ledger::strategy::{create_strategy, BatchConfig};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Import a fixture's input.csv into its seed data and compare the listing with expected.csv
    ///
    /// # Arguments
    ///
    /// * `fixture_name` - Name of the fixture directory (e.g., "credit_lifecycle")
    /// * `strategy_type` - Import strategy to use (Sync or Async)
    /// * `imported` - Number of rows expected to create a transaction
    /// * `rejected` - Number of rows expected to be rejected
    fn run_test_fixture(
        fixture_name: &str,
        strategy_type: StrategyType,
        imported: usize,
        rejected: usize,
    ) {
        let fixture_dir = Path::new("tests/fixtures").join(fixture_name);
        let input_path = fixture_dir.join("input.csv");
        let expected_path = fixture_dir.join("expected.csv");

        assert!(input_path.exists(), "Input file not found: {}", input_path.display());
        assert!(
            expected_path.exists(),
            "Expected file not found: {}",
            expected_path.display()
        );

        let seed = load_snapshot(&fixture_dir)
            .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", fixture_name, e));

        // small batches so the async run spans several of them
        let config = BatchConfig::new(2, 4);
        let strategy = create_strategy(strategy_type, Some(config));
        let outcome = strategy
            .import(&input_path, seed)
            .unwrap_or_else(|e| panic!("Failed to import {}: {}", fixture_name, e));

        assert_eq!(outcome.imported, imported, "imported rows for {}", fixture_name);
        assert_eq!(outcome.rejected.len(), rejected, "rejected rows for {}", fixture_name);

        let data_dir = TempDir::new().expect("Failed to create temp dir");
        save_snapshot(data_dir.path(), &outcome.snapshot).expect("Failed to save snapshot");
        let reloaded = load_snapshot(data_dir.path()).expect("Failed to reload snapshot");
        assert_eq!(reloaded, outcome.snapshot.clone().normalize());

        let mut actual = Vec::new();
        write_customers_csv(&reloaded.customers, &mut actual).expect("Failed to write listing");
        let actual_output = String::from_utf8(actual).expect("Listing is not UTF-8");

        let expected_output = fs::read_to_string(&expected_path).unwrap_or_else(|e| {
            panic!("Failed to read expected file {}: {}", expected_path.display(), e)
        });

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures with both import strategies
    #[rstest]
    #[case("credit_lifecycle", 7, 0)]
    #[case("rejected_rows", 3, 7)]
    #[case("precision", 4, 0)]
    #[case("existing_ledger", 2, 0)]
    fn test_fixtures(
        #[case] fixture: &str,
        #[case] imported: usize,
        #[case] rejected: usize,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy, imported, rejected);
    }

    #[rstest]
    fn test_rejected_lines_are_reported_in_file_order(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let fixture_dir = Path::new("tests/fixtures/rejected_rows");
        let seed = load_snapshot(fixture_dir).unwrap();

        let outcome = create_strategy(strategy, Some(BatchConfig::new(3, 2)))
            .import(&fixture_dir.join("input.csv"), seed)
            .unwrap();

        let lines: Vec<u64> = outcome.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![3, 4, 5, 6, 7, 8, 11]);
    }
}
